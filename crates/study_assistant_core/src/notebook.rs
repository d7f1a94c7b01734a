//! crates/study_assistant_core/src/notebook.rs
//!
//! The error notebook: questions the learner missed and has not yet answered
//! correctly since.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::domain::QuizQuestion;

/// What recording an answer did to the notebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotebookChange {
    Added,
    Removed,
    Unchanged,
}

impl NotebookChange {
    pub fn is_change(self) -> bool {
        self != NotebookChange::Unchanged
    }
}

/// Missed question count for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Insertion-ordered set of questions, unique by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorNotebook {
    questions: Vec<QuizQuestion>,
}

impl ErrorNotebook {
    /// Restores a notebook, dropping any repeated ids from stored data.
    pub fn from_questions(questions: Vec<QuizQuestion>) -> Self {
        let mut notebook = Self::default();
        for question in questions {
            notebook.add(question);
        }
        notebook
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.questions.iter().any(|q| q.id == question_id)
    }

    fn add(&mut self, question: QuizQuestion) -> NotebookChange {
        if self.contains(&question.id) {
            return NotebookChange::Unchanged;
        }
        self.questions.push(question);
        NotebookChange::Added
    }

    fn remove(&mut self, question_id: &str) -> NotebookChange {
        let before = self.questions.len();
        self.questions.retain(|q| q.id != question_id);
        if self.questions.len() == before {
            NotebookChange::Unchanged
        } else {
            NotebookChange::Removed
        }
    }

    /// Adds the question on a miss, removes it on a correct answer.
    pub fn record(&mut self, question: &QuizQuestion, is_correct: bool) -> NotebookChange {
        if is_correct {
            self.remove(&question.id)
        } else {
            self.add(question.clone())
        }
    }

    /// A shuffled copy of the notebook for a review quiz.
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<QuizQuestion> {
        let mut questions = self.questions.clone();
        questions.shuffle(rng);
        questions
    }

    /// Missed questions per category, in order of first appearance.
    /// Blank categories are grouped under "Geral".
    pub fn counts_by_category(&self) -> Vec<CategoryCount> {
        let mut counts: Vec<CategoryCount> = Vec::new();
        for question in &self.questions {
            let category = if question.category.trim().is_empty() {
                "Geral"
            } else {
                question.category.as_str()
            };
            match counts.iter_mut().find(|c| c.category == category) {
                Some(entry) => entry.count += 1,
                None => counts.push(CategoryCount {
                    category: category.to_string(),
                    count: 1,
                }),
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn question(id: &str, category: &str) -> QuizQuestion {
        QuizQuestion {
            id: id.to_string(),
            category: category.to_string(),
            institution: None,
            question: format!("Pergunta {}", id),
            options: vec!["A".into(), "B".into(), "C".into()],
            correct_index: 1,
            explanation: String::new(),
        }
    }

    #[test]
    fn repeated_misses_do_not_duplicate() {
        let mut notebook = ErrorNotebook::default();
        let q = question("q1", "Cardiologia");
        assert_eq!(notebook.record(&q, false), NotebookChange::Added);
        assert_eq!(notebook.record(&q, false), NotebookChange::Unchanged);
        assert_eq!(notebook.len(), 1);
    }

    #[test]
    fn last_answer_decides_membership() {
        let mut notebook = ErrorNotebook::default();
        let q = question("q1", "Cardiologia");
        let history = [false, true, false, false, true, true, false];
        for (i, &correct) in history.iter().enumerate() {
            notebook.record(&q, correct);
            assert_eq!(notebook.contains("q1"), !correct, "after answer {}", i);
        }
    }

    #[test]
    fn correct_answer_on_absent_question_is_a_no_op() {
        let mut notebook = ErrorNotebook::default();
        assert_eq!(notebook.record(&question("q9", "X"), true), NotebookChange::Unchanged);
        assert!(notebook.is_empty());
    }

    #[test]
    fn restoring_drops_duplicate_ids_and_keeps_order() {
        let notebook = ErrorNotebook::from_questions(vec![
            question("b", "X"),
            question("a", "X"),
            question("b", "Y"),
        ]);
        let ids: Vec<&str> = notebook.questions().iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn shuffled_is_a_permutation() {
        let notebook = ErrorNotebook::from_questions(
            (0..8).map(|i| question(&format!("q{}", i), "X")).collect(),
        );
        let mut rng = StdRng::seed_from_u64(7);
        let mut ids: Vec<String> = notebook.shuffled(&mut rng).into_iter().map(|q| q.id).collect();
        ids.sort();
        let mut expected: Vec<String> = notebook.questions().iter().map(|q| q.id.clone()).collect();
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn counts_group_blank_categories_as_general() {
        let notebook = ErrorNotebook::from_questions(vec![
            question("1", "Pediatria"),
            question("2", ""),
            question("3", "Pediatria"),
        ]);
        assert_eq!(
            notebook.counts_by_category(),
            vec![
                CategoryCount { category: "Pediatria".into(), count: 2 },
                CategoryCount { category: "Geral".into(), count: 1 },
            ]
        );
    }
}
