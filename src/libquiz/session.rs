//! Quiz session state and the transitions between its phases.
//!
//! Every user action is an [`Intent`]. [`transition`] maps the current state
//! and an intent to the next state without touching the original, so a
//! rejected intent never leaves a half-applied session behind.

use crate::libquiz::question::{AnswerId, Question, QuizSet};
use log::debug;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("a quiz is already loaded, cancel it first")]
    AlreadyLoaded,
    #[error("the quiz has no questions")]
    EmptyQuizSet,
    #[error("no quiz is loaded")]
    NoQuizSet,
    #[error("the quiz has not started yet")]
    NotStarted,
    #[error("answer {0} does not belong to the current question")]
    UnknownAnswer(AnswerId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Load(QuizSet),
    Cancel,
    Begin,
    Advance,
    GoBack,
    SelectAnswer(AnswerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Ready,
    InProgress,
    Answered,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    quiz_set: Option<Arc<QuizSet>>,
    started: bool,
    current_index: usize,
    score: u32,
    selected_answer_id: Option<AnswerId>,
    is_correct: Option<bool>,
    // answer each question was locked in with, indexed like the quiz set
    locked: Vec<Option<AnswerId>>,
}

impl SessionState {
    pub fn quiz_set(&self) -> Option<&[Question]> {
        self.quiz_set.as_deref().map(Vec::as_slice)
    }
    pub fn started(&self) -> bool {
        self.started
    }
    pub fn current_index(&self) -> usize {
        self.current_index
    }
    pub fn score(&self) -> u32 {
        self.score
    }
    pub fn selected_answer_id(&self) -> Option<AnswerId> {
        self.selected_answer_id
    }
    pub fn is_correct(&self) -> Option<bool> {
        self.is_correct
    }

    pub fn len(&self) -> usize {
        self.quiz_set.as_ref().map_or(0, |set| set.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn phase(&self) -> Phase {
        if self.is_empty() {
            Phase::Idle
        } else if !self.started {
            Phase::Ready
        } else if self.is_correct.is_none() {
            Phase::InProgress
        } else {
            Phase::Answered
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.quiz_set.as_ref()?.get(self.current_index)
    }

    pub fn is_last_question(&self) -> bool {
        !self.is_empty() && self.current_index + 1 == self.len()
    }

    /// Share of the quiz already behind the user, in whole percent.
    pub fn progress_percent(&self) -> u32 {
        match self.len() {
            0 => 0,
            len => (100 * self.current_index / len) as u32,
        }
    }

    /// Applies `intent` in place. On rejection the state is left untouched.
    pub fn apply(&mut self, intent: Intent) -> Result<(), Rejected> {
        debug!("[Session] {:?} in phase {:?}", intent, self.phase());
        *self = transition(self, intent)?;
        debug!(
            "[Session] -> {:?} (question {}/{}, score {})",
            self.phase(),
            self.current_index + 1,
            self.len(),
            self.score
        );
        Ok(())
    }

    fn require_quiz_set(&self) -> Result<usize, Rejected> {
        match self.len() {
            0 => Err(Rejected::NoQuizSet),
            len => Ok(len),
        }
    }

    fn require_started(&self) -> Result<usize, Rejected> {
        let len = self.require_quiz_set()?;
        if self.started {
            Ok(len)
        } else {
            Err(Rejected::NotStarted)
        }
    }

    fn restore_locked(&mut self) {
        let locked = self.locked.get(self.current_index).copied().flatten();
        self.is_correct = locked.and_then(|id| {
            self.current_question()
                .and_then(|q| q.answer(id))
                .map(|a| a.is_correct)
        });
        self.selected_answer_id = locked;
    }
}

pub fn transition(state: &SessionState, intent: Intent) -> Result<SessionState, Rejected> {
    let mut next = state.clone();
    match intent {
        Intent::Load(set) => {
            if !state.is_empty() {
                return Err(Rejected::AlreadyLoaded);
            }
            if set.is_empty() {
                return Err(Rejected::EmptyQuizSet);
            }
            next = SessionState {
                locked: vec![None; set.len()],
                quiz_set: Some(Arc::new(set)),
                ..SessionState::default()
            };
        }
        Intent::Cancel => next = SessionState::default(),
        Intent::Begin => {
            state.require_quiz_set()?;
            next.started = true;
        }
        Intent::Advance => {
            let len = state.require_started()?;
            next.selected_answer_id = None;
            next.is_correct = None;
            if next.current_index + 1 < len {
                next.current_index += 1;
                next.restore_locked();
            }
        }
        Intent::GoBack => {
            state.require_started()?;
            if next.current_index > 0 {
                next.current_index -= 1;
                next.restore_locked();
            }
        }
        Intent::SelectAnswer(id) => {
            state.require_started()?;
            let is_correct = state
                .current_question()
                .and_then(|q| q.answer(id))
                .map(|a| a.is_correct)
                .ok_or(Rejected::UnknownAnswer(id))?;

            let idx = next.current_index;
            if next.locked[idx].is_some() {
                next.restore_locked();
            } else {
                next.locked[idx] = Some(id);
                next.selected_answer_id = Some(id);
                next.is_correct = Some(is_correct);
                if is_correct {
                    next.score += 1;
                }
            }
        }
    }
    Ok(next)
}
