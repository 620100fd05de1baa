use crate::libquiz::question::{Answer, Question, QuizSet};

macro_rules! question {
    ($text:expr, [$correct:expr $(, $wrong:expr)*], $reasoning:expr) => {{
        let mut answers = vec![Answer {
            id: 0,
            text: $correct.to_string(),
            is_correct: true,
        }];
        $(
            answers.push(Answer {
                id: answers.len() as u32,
                text: $wrong.to_string(),
                is_correct: false,
            });
        )*
        Question {
            text: $text.to_string(),
            answers,
            reasoning: Some($reasoning.to_string()),
        }
    }};
}

/// Questions used when no extraction service is around.
pub fn sample_questions() -> QuizSet {
    vec![
        question!(
            "What is the capital of France?",
            ["Paris", "Lyon", "Marseille", "Nice"],
            "Paris is the capital and most populous city of France."
        ),
        question!(
            "Which element has the chemical symbol 'O'?",
            ["Oxygen", "Gold", "Silver", "Osmium"],
            "The chemical symbol 'O' stands for Oxygen, which is a key element in the periodic table."
        ),
        question!(
            "Who wrote 'Pride and Prejudice'?",
            ["Jane Austen", "Charlotte Brontë", "Mary Shelley", "Emily Brontë"],
            "'Pride and Prejudice' is a novel by Jane Austen, first published in 1813."
        ),
        question!(
            "What is the largest planet in our solar system?",
            ["Jupiter", "Saturn", "Neptune", "Earth"],
            "Jupiter is the largest planet in our solar system, with a diameter of about 142,984 km."
        ),
        question!(
            "In which year did the Titanic sink?",
            ["1912", "1905", "1920", "1918"],
            "The RMS Titanic sank on April 15, 1912, after hitting an iceberg during its maiden voyage."
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_has_one_correct_answer_per_question() {
        for q in sample_questions() {
            assert_eq!(q.answers.len(), 4);
            assert_eq!(q.answers.iter().filter(|a| a.is_correct).count(), 1);
            let ids: Vec<u32> = q.answers.iter().map(|a| a.id).collect();
            assert_eq!(ids, vec![0, 1, 2, 3]);
        }
    }
}
