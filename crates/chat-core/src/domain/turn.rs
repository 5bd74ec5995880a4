//! Turn value stored in session memory

use serde::{Deserialize, Serialize};

/// A completed `(question, answer)` pair replayed into model invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

impl Turn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Keep only the newest `limit` turns, dropping the oldest first.
pub fn truncate_oldest(turns: &mut Vec<Turn>, limit: usize) {
    if turns.len() > limit {
        let excess = turns.len() - limit;
        turns.drain(0..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turns(n: usize) -> Vec<Turn> {
        (0..n).map(|i| Turn::new(format!("q{i}"), format!("a{i}"))).collect()
    }

    #[test]
    fn test_truncate_drops_oldest() {
        let mut history = turns(25);
        truncate_oldest(&mut history, 20);

        assert_eq!(history.len(), 20);
        assert_eq!(history.first().unwrap().question, "q5");
        assert_eq!(history.last().unwrap().question, "q24");
    }

    #[test]
    fn test_truncate_noop_under_limit() {
        let mut history = turns(3);
        truncate_oldest(&mut history, 20);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_truncate_to_zero() {
        let mut history = turns(3);
        truncate_oldest(&mut history, 0);
        assert!(history.is_empty());
    }
}
