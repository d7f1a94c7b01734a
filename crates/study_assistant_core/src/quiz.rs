//! crates/study_assistant_core/src/quiz.rs
//!
//! Linear traversal over a question list with one answer per question.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{QuizQuestion, QuizResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStatus {
    /// No question list is active.
    Configuring,
    InProgress,
}

/// A recorded answer, ready to be reported to analytics and the notebook.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRecord {
    pub question: QuizQuestion,
    pub selected: usize,
    pub result: QuizResult,
}

#[derive(Debug, Clone, Default)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    index: usize,
    selected: Option<usize>,
}

impl QuizSession {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            index: 0,
            selected: None,
        }
    }

    pub fn status(&self) -> QuizStatus {
        if self.questions.is_empty() {
            QuizStatus::Configuring
        } else {
            QuizStatus::InProgress
        }
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.index)
    }

    /// The option picked for the current question, once answered.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_answered(&self) -> bool {
        self.selected.is_some()
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.questions.len()
    }

    /// Records an answer for the current question. Returns `None` if it was
    /// already answered or there is no question.
    pub fn answer(&mut self, option_index: usize, now: DateTime<Utc>) -> Option<AnswerRecord> {
        if self.selected.is_some() {
            return None;
        }
        let question = self.questions.get(self.index)?.clone();
        self.selected = Some(option_index);

        let result = QuizResult {
            category: question.category.clone(),
            is_correct: option_index == question.correct_index,
            timestamp: now,
        };
        Some(AnswerRecord {
            question,
            selected: option_index,
            result,
        })
    }

    /// Moves to the next question. Only valid after answering and before the end.
    pub fn next(&mut self) -> bool {
        if self.selected.is_none() || self.is_last() {
            return false;
        }
        self.index += 1;
        self.selected = None;
        true
    }

    /// Clears the list and returns to configuration.
    pub fn finish(&mut self) {
        *self = Self::default();
    }
}
