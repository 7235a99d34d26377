//! Per-round answer scratch state.
//!
//! [`AnswerBuffer`] holds the player's in-progress answers for the current
//! round, keyed by category index. It is scoped to a single round: the state
//! machine clears it in the same logical step as any lifecycle transition
//! whose new phase is not in-round, so stale answers can never sit beside a
//! new category set.

use crate::protocol::RoundCategory;

/// The player's in-progress answers for the current round, keyed by
/// category index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerBuffer {
    slots: Vec<String>,
}

impl AnswerBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when the buffer holds no slots at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of answer slots currently held.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Discard all answers. Called on every transition out of a round.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Initialize the buffer from the current round's category list, carrying
    /// over any answers the snapshot already holds.
    ///
    /// Lazy initialization: the buffer starts empty each round and is seeded
    /// on the first submission rather than on round start.
    pub fn seed_from(&mut self, categories: &[RoundCategory]) {
        self.slots = categories.iter().map(|c| c.answer.clone()).collect();
    }

    /// Record an answer at `index`, growing the buffer with empty slots if
    /// the index is beyond the current length.
    pub fn set(&mut self, index: usize, value: impl Into<String>) {
        if index >= self.slots.len() {
            self.slots.resize(index + 1, String::new());
        }
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = value.into();
        }
    }

    /// The answer recorded at `index`, if any slot exists there.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.slots.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_empty() {
        let buf = AnswerBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.get(0), None);
    }

    #[test]
    fn set_then_get_returns_value() {
        let mut buf = AnswerBuffer::new();
        buf.set(2, "apple");
        assert_eq!(buf.get(2), Some("apple"));
        // Intermediate slots grow as empty strings.
        assert_eq!(buf.get(0), Some(""));
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn set_overwrites_prior_content() {
        let mut buf = AnswerBuffer::new();
        buf.set(0, "first");
        buf.set(0, "second");
        assert_eq!(buf.get(0), Some("second"));
    }

    #[test]
    fn seed_from_carries_existing_answers() {
        let categories = vec![
            RoundCategory {
                category: "A fruit".into(),
                answer: "apple".into(),
            },
            RoundCategory::new("A city"),
        ];
        let mut buf = AnswerBuffer::new();
        buf.seed_from(&categories);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.get(0), Some("apple"));
        assert_eq!(buf.get(1), Some(""));
    }

    #[test]
    fn clear_empties_the_buffer() {
        let mut buf = AnswerBuffer::new();
        buf.set(0, "apple");
        buf.set(1, "amsterdam");
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.get(0), None);
    }
}
