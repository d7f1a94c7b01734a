//! crates/study_assistant_core/src/review.rs
//!
//! The flashcard review session: a working queue over one batch of cards where
//! a card rated "again" is appended to the end and seen once more before the
//! session finishes. Nothing here persists across sessions.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::Flashcard;

/// Delay between flipping a card to its back and accepting a rating.
pub const FEEDBACK_REVEAL_DELAY: Duration = Duration::from_millis(150);
/// Delay between a rating and showing the next card.
pub const ADVANCE_DELAY: Duration = Duration::from_millis(200);
/// How long a requeue notice stays on screen.
pub const NOTICE_DURATION: Duration = Duration::from_millis(2000);

/// The animation delays a host applies around flips and ratings, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReviewTimings {
    pub reveal_delay_ms: u64,
    pub advance_delay_ms: u64,
    pub notice_ms: u64,
}

impl Default for ReviewTimings {
    fn default() -> Self {
        Self {
            reveal_delay_ms: FEEDBACK_REVEAL_DELAY.as_millis() as u64,
            advance_delay_ms: ADVANCE_DELAY.as_millis() as u64,
            notice_ms: NOTICE_DURATION.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Again,
    Hard,
    Good,
    Easy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    ShowingFront,
    /// The back is visible; rating controls are not yet accepted.
    ShowingBack,
    /// The back is visible and the card can be rated.
    AwaitingRating,
    Finished,
}

/// The result of a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateOutcome {
    pub requeued: bool,
    pub finished: bool,
}

/// The learner's position in the queue, as a fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub position: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.position + 1) as f64 / self.total as f64
    }
}

#[derive(Debug, Clone)]
pub struct ReviewSession {
    batch: Vec<Flashcard>,
    queue: Vec<Flashcard>,
    position: usize,
    state: ReviewState,
}

impl ReviewSession {
    /// Starts a session over `batch` in its original order.
    pub fn new(batch: Vec<Flashcard>) -> Self {
        let state = if batch.is_empty() {
            ReviewState::Finished
        } else {
            ReviewState::ShowingFront
        };
        Self {
            queue: batch.clone(),
            batch,
            position: 0,
            state,
        }
    }

    /// True when `cards` is the batch this session was built from.
    pub fn is_for_batch(&self, cards: &[Flashcard]) -> bool {
        self.batch.len() == cards.len()
            && self.batch.iter().zip(cards).all(|(a, b)| a.id == b.id)
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn current_card(&self) -> Option<&Flashcard> {
        match self.state {
            ReviewState::Finished => None,
            _ => self.queue.get(self.position),
        }
    }

    pub fn batch_len(&self) -> usize {
        self.batch.len()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            position: self.position,
            total: self.queue.len(),
        }
    }

    /// Turns the card over. The host reveals rating controls with
    /// [`ReviewSession::reveal_feedback`] once `FEEDBACK_REVEAL_DELAY` elapsed.
    pub fn flip(&mut self) {
        self.state = match self.state {
            ReviewState::ShowingFront => ReviewState::ShowingBack,
            ReviewState::ShowingBack | ReviewState::AwaitingRating => ReviewState::ShowingFront,
            ReviewState::Finished => ReviewState::Finished,
        };
    }

    /// Accepts ratings for the card on display. No-op unless its back is showing.
    pub fn reveal_feedback(&mut self) {
        if self.state == ReviewState::ShowingBack {
            self.state = ReviewState::AwaitingRating;
        }
    }

    /// Rates the current card and advances. Returns `None` when no rating is
    /// being accepted.
    pub fn rate(&mut self, grade: Grade) -> Option<RateOutcome> {
        if self.state != ReviewState::AwaitingRating {
            return None;
        }

        let requeued = grade == Grade::Again;
        if requeued {
            let card = self.queue[self.position].clone();
            self.queue.push(card);
        }

        if self.position + 1 < self.queue.len() {
            self.position += 1;
            self.state = ReviewState::ShowingFront;
        } else {
            self.state = ReviewState::Finished;
        }

        Some(RateOutcome {
            requeued,
            finished: self.state == ReviewState::Finished,
        })
    }

    /// Starts over from the original batch, dropping every requeued card.
    pub fn restart(&mut self) {
        *self = Self::new(std::mem::take(&mut self.batch));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FlashcardStatus;

    fn batch(n: usize) -> Vec<Flashcard> {
        (0..n)
            .map(|i| Flashcard {
                id: format!("fc-{}", i),
                front: format!("front {}", i),
                back: format!("back {}", i),
                status: FlashcardStatus::New,
            })
            .collect()
    }

    fn flip_and_rate(session: &mut ReviewSession, grade: Grade) -> RateOutcome {
        session.flip();
        session.reveal_feedback();
        session.rate(grade).expect("rating should be accepted")
    }

    #[test]
    fn finishes_after_one_rating_per_card() {
        let mut session = ReviewSession::new(batch(4));
        let mut ratings = 0;
        while session.state() != ReviewState::Finished {
            flip_and_rate(&mut session, Grade::Good);
            ratings += 1;
        }
        assert_eq!(ratings, 4);
    }

    #[test]
    fn each_again_adds_one_rating_and_grows_the_denominator() {
        let mut session = ReviewSession::new(batch(3));
        assert_eq!(session.progress().total, 3);

        let first = flip_and_rate(&mut session, Grade::Again);
        assert!(first.requeued);
        assert_eq!(session.progress().total, 4);

        flip_and_rate(&mut session, Grade::Hard);
        flip_and_rate(&mut session, Grade::Again);
        assert_eq!(session.progress().total, 5);

        let mut ratings = 3;
        while session.state() != ReviewState::Finished {
            flip_and_rate(&mut session, Grade::Easy);
            ratings += 1;
        }
        assert_eq!(ratings, 3 + 2);
    }

    #[test]
    fn again_on_the_last_card_shows_it_once_more() {
        let mut session = ReviewSession::new(batch(1));
        let outcome = flip_and_rate(&mut session, Grade::Again);
        assert!(!outcome.finished);
        assert_eq!(session.current_card().map(|c| c.id.as_str()), Some("fc-0"));
        assert!(flip_and_rate(&mut session, Grade::Good).finished);
    }

    #[test]
    fn rating_needs_revealed_feedback() {
        let mut session = ReviewSession::new(batch(2));
        assert_eq!(session.rate(Grade::Good), None);
        session.flip();
        assert_eq!(session.rate(Grade::Good), None);
        session.reveal_feedback();
        assert!(session.rate(Grade::Good).is_some());
    }

    #[test]
    fn flipping_back_hides_feedback() {
        let mut session = ReviewSession::new(batch(2));
        session.flip();
        session.reveal_feedback();
        session.flip();
        assert_eq!(session.state(), ReviewState::ShowingFront);
        session.reveal_feedback();
        assert_eq!(session.state(), ReviewState::ShowingFront);
    }

    #[test]
    fn flip_is_ignored_when_finished() {
        let mut session = ReviewSession::new(batch(1));
        flip_and_rate(&mut session, Grade::Good);
        session.flip();
        assert_eq!(session.state(), ReviewState::Finished);
        assert!(session.current_card().is_none());
    }

    #[test]
    fn restart_discards_requeued_cards() {
        let mut session = ReviewSession::new(batch(2));
        flip_and_rate(&mut session, Grade::Again);
        flip_and_rate(&mut session, Grade::Again);
        while session.state() != ReviewState::Finished {
            flip_and_rate(&mut session, Grade::Good);
        }
        session.restart();
        assert_eq!(session.progress().total, 2);
        assert_eq!(session.progress().position, 0);
        assert_eq!(session.state(), ReviewState::ShowingFront);
        assert!(session.is_for_batch(&batch(2)));
    }

    #[test]
    fn progress_fraction_counts_the_current_card() {
        let mut session = ReviewSession::new(batch(4));
        assert_eq!(session.progress().fraction(), 0.25);
        flip_and_rate(&mut session, Grade::Good);
        assert_eq!(session.progress().fraction(), 0.5);
    }

    #[test]
    fn timings_are_reported_in_milliseconds() {
        let timings = ReviewTimings::default();
        assert_eq!(timings.reveal_delay_ms, 150);
        assert_eq!(timings.advance_delay_ms, 200);
        assert_eq!(timings.notice_ms, 2000);
    }
}
