use crate::libquiz::flow::QuizFlow;
use crate::libquiz::question::Question;
use crate::libquiz::session::{Phase, SessionState};
use crate::Error;
use colored::Colorize;
use log::{debug, error};
use std::io::{self, Write};
use std::path::Path;
use text_io::try_read;

#[derive(Debug, PartialEq)]
enum Choice {
    Answer(usize),
    Next,
    Back,
    Cancel,
    Quit,
    Unknown,
}

impl Choice {
    fn from_str(option_count: usize, input: &str) -> Choice {
        match input.trim() {
            "" | "n" => Choice::Next,
            "b" => Choice::Back,
            "c" => Choice::Cancel,
            "q" => Choice::Quit,
            input => match input.parse::<usize>() {
                Ok(num) if (1..=option_count).contains(&num) => Choice::Answer(num - 1),
                Ok(_) => {
                    println!(
                        "{}",
                        format!("There are only {} options available!", option_count).bright_red()
                    );
                    Choice::Unknown
                }
                Err(_) => Choice::Unknown,
            },
        }
    }
}

/// `None` on end of input.
fn prompt(text: &str) -> Option<String> {
    print!("{} ", text.cyan());
    let _ = io::stdout().flush();
    let line: Result<String, _> = try_read!("{}\n");
    match line {
        Ok(line) => Some(line.trim().to_string()),
        Err(err) => {
            debug!("[CLI] Input closed: {}", err);
            None
        }
    }
}

fn progress_bar(state: &SessionState) -> String {
    let filled = state.progress_percent() as usize / 5;
    format!("[{}{}] {:>3}%", "#".repeat(filled), " ".repeat(20 - filled), state.progress_percent())
}

fn print_question(state: &SessionState, question: &Question) {
    let leading = format!("{}/{}. ", state.current_index() + 1, state.len());
    println!("{}{}", leading.cyan(), question.text.black().bold().on_white());

    let indent = " ".repeat(leading.len());
    for (i, answer) in question.answers.iter().enumerate() {
        let label = format!("{}{}. {}", indent, i + 1, answer.text);
        match (state.selected_answer_id(), state.is_correct()) {
            (Some(id), Some(true)) if id == answer.id => println!("{}", label.bright_green().bold()),
            (Some(id), Some(false)) if id == answer.id => println!("{}", label.bright_red().bold()),
            _ => println!("{}", label),
        }
    }

    if let Some(correct) = state.is_correct() {
        if correct {
            println!("{}", "Correct!".bright_green());
        } else {
            println!("{}", "Oops!".bright_red());
            if let Some(answer) = question.correct_answer() {
                println!("{}", format!("The correct choice was {:?}.", answer.text).green());
            }
        }
        if let Some(reasoning) = &question.reasoning {
            println!("{}", reasoning.italic());
        }
    }
}

/// Returns `false` once the user wants out.
fn upload_screen(flow: &mut QuizFlow) -> bool {
    let Some(staged) = flow.staged().map(|d| d.name.clone()) else {
        let Some(input) = prompt("PDF to upload (q to quit):") else {
            return false;
        };
        match input.as_str() {
            "q" => return false,
            "" => {}
            path => {
                if let Err(err) = flow.select_file(Path::new(path)) {
                    println!("{}", err.to_string().bright_red());
                }
            }
        }
        return true;
    };

    println!("{}", format!("Staged: {}", staged).cyan());
    let Some(input) = prompt("Enter to generate, x to pick another file, q to quit:") else {
        return false;
    };
    match input.as_str() {
        "q" => return false,
        "x" => flow.clear_file(),
        _ => {
            println!("{}", "Generating questions...".cyan());
            match flow.submit_upload() {
                Ok(()) => println!(
                    "{}",
                    format!("Got {} questions.", flow.session().len()).bright_green()
                ),
                Err(err) => {
                    error!("[CLI] Upload failed: {}", err);
                    println!("{}", format!("Could not generate a quiz: {}", err).bright_red());
                }
            }
        }
    }
    true
}

/// Returns `false` once the user wants out.
fn quiz_screen(flow: &mut QuizFlow) -> bool {
    let state = flow.session();
    println!(
        "{} {}",
        progress_bar(state).cyan(),
        format!("score {}", state.score()).bold()
    );

    let option_count = match (state.started(), state.current_question()) {
        (true, Some(question)) => {
            print_question(state, question);
            question.answers.len()
        }
        _ => {
            println!("{}", format!("Quiz 👋 ({} questions)", state.len()).bold());
            0
        }
    };
    if state.is_last_question() && state.phase() == Phase::Answered {
        println!(
            "{}",
            format!("That was the last question! Final score {}/{}.", state.score(), state.len())
                .cyan()
        );
    }

    let text = if state.started() {
        "Answer (1-4), Enter for next, b to go back, c to cancel, q to quit:"
    } else {
        "Enter to start, c to cancel, q to quit:"
    };
    let Some(input) = prompt(text) else {
        return false;
    };
    let choice = Choice::from_str(option_count, &input);
    debug!("[CLI] choice: {:?}", choice);

    let result = match choice {
        Choice::Answer(idx) => match flow.session().current_question().map(|q| q.answers[idx].id) {
            Some(id) => flow.select_answer(id),
            None => Ok(()),
        },
        Choice::Next => flow.next(),
        Choice::Back => flow.go_back(),
        Choice::Cancel => {
            println!("{}", "Quiz cancelled.".cyan());
            flow.cancel_quiz();
            Ok(())
        }
        Choice::Quit => {
            println!("{}", "Quitting Early!".cyan());
            return false;
        }
        Choice::Unknown => Ok(()),
    };
    if let Err(rejected) = result {
        println!("{}", rejected.to_string().yellow());
    }
    true
}

pub fn cli_loop(mut flow: QuizFlow) -> Result<(), Error> {
    loop {
        let keep_going = if flow.session().phase() == Phase::Idle {
            upload_screen(&mut flow)
        } else {
            quiz_screen(&mut flow)
        };
        if !keep_going {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_choices() {
        assert_eq!(Choice::from_str(4, "2"), Choice::Answer(1));
        assert_eq!(Choice::from_str(4, " 4 "), Choice::Answer(3));
        assert_eq!(Choice::from_str(4, ""), Choice::Next);
        assert_eq!(Choice::from_str(4, "n"), Choice::Next);
        assert_eq!(Choice::from_str(4, "b"), Choice::Back);
        assert_eq!(Choice::from_str(4, "c"), Choice::Cancel);
        assert_eq!(Choice::from_str(4, "q"), Choice::Quit);
        assert_eq!(Choice::from_str(4, "what"), Choice::Unknown);
    }

    #[test]
    fn out_of_range_answers_are_unknown() {
        assert_eq!(Choice::from_str(4, "5"), Choice::Unknown);
        assert_eq!(Choice::from_str(4, "0"), Choice::Unknown);
        assert_eq!(Choice::from_str(0, "1"), Choice::Unknown);
    }

    #[test]
    fn progress_bar_is_empty_without_a_quiz() {
        assert_eq!(progress_bar(&SessionState::default()), format!("[{}]   0%", " ".repeat(20)));
    }
}
