//! crates/study_assistant_core/src/analytics.rs
//!
//! Per-category accuracy derived from the quiz result log.

use serde::Serialize;

use crate::domain::QuizResult;

/// Whether the result log survives a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalyticsPolicy {
    /// The log lives only in process memory.
    #[default]
    SessionOnly,
    /// The log is loaded at startup and saved after every answer.
    Persisted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryScore {
    pub category: String,
    pub correct: usize,
    pub total: usize,
    pub score_percent: u32,
}

/// The aggregated view of the result log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalyticsReport {
    /// No question has been answered yet.
    NoData,
    Scored {
        overall_percent: u32,
        answered: usize,
        categories: Vec<CategoryScore>,
    },
}

fn percent(correct: usize, total: usize) -> u32 {
    (100.0 * correct as f64 / total as f64).round() as u32
}

/// Groups results by category in order of first occurrence.
pub fn aggregate(results: &[QuizResult]) -> AnalyticsReport {
    if results.is_empty() {
        return AnalyticsReport::NoData;
    }

    let mut categories: Vec<CategoryScore> = Vec::new();
    for result in results {
        let entry = match categories.iter().position(|c| c.category == result.category) {
            Some(i) => &mut categories[i],
            None => {
                categories.push(CategoryScore {
                    category: result.category.clone(),
                    correct: 0,
                    total: 0,
                    score_percent: 0,
                });
                let last = categories.len() - 1;
                &mut categories[last]
            }
        };
        entry.total += 1;
        if result.is_correct {
            entry.correct += 1;
        }
    }
    for category in &mut categories {
        category.score_percent = percent(category.correct, category.total);
    }

    let total_correct = results.iter().filter(|r| r.is_correct).count();
    AnalyticsReport::Scored {
        overall_percent: percent(total_correct, results.len()),
        answered: results.len(),
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result(category: &str, is_correct: bool) -> QuizResult {
        QuizResult {
            category: category.to_string(),
            is_correct,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_log_has_no_data() {
        assert_eq!(aggregate(&[]), AnalyticsReport::NoData);
    }

    #[test]
    fn scores_round_to_nearest_percent() {
        let report = aggregate(&[result("catA", true), result("catA", false), result("catB", true)]);
        let AnalyticsReport::Scored { overall_percent, answered, categories } = report else {
            panic!("expected a scored report");
        };
        assert_eq!(overall_percent, 67);
        assert_eq!(answered, 3);
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].category, "catA");
        assert_eq!(categories[0].score_percent, 50);
        assert_eq!((categories[1].correct, categories[1].total), (1, 1));
        assert_eq!(categories[1].score_percent, 100);
    }

    #[test]
    fn categories_keep_first_occurrence_order() {
        let report = aggregate(&[result("Z", false), result("A", true), result("Z", true)]);
        let AnalyticsReport::Scored { categories, .. } = report else {
            panic!("expected a scored report");
        };
        let names: Vec<&str> = categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Z", "A"]);
    }
}
