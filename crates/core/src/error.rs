// crates/core/src/error.rs
use thiserror::Error;

/// A local action violated a domain constraint. Non-fatal: the action is not
/// transmitted and the caller surfaces the message locally.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("split must allocate the full {expected}; got {alice} + {bob}")]
    SplitSum { alice: f64, bob: f64, expected: i64 },

    #[error("gains must be non-negative; got {alice} / {bob}")]
    NegativeGain { alice: f64, bob: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_sum_display_names_amounts() {
        let err = ValidationError::SplitSum {
            alice: 6000.0,
            bob: 3000.0,
            expected: 10_000,
        };
        let text = err.to_string();
        assert!(text.contains("10000"));
        assert!(text.contains("6000"));
    }
}
