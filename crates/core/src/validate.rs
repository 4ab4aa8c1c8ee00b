// crates/core/src/validate.rs
//! Pre-submission checks for locally composed actions.

use haggle_types::GameParams;

use crate::error::ValidationError;

/// Gains are integers on the wire in practice, but the engine accepts floats;
/// allow for rounding noise when checking the sum.
const SUM_TOLERANCE: f64 = 1e-6;

/// Check that a proposed split allocates exactly the money on the table.
pub fn validate_split(
    alice_gain: f64,
    bob_gain: f64,
    params: &GameParams,
) -> Result<(), ValidationError> {
    if alice_gain < 0.0 || bob_gain < 0.0 {
        return Err(ValidationError::NegativeGain {
            alice: alice_gain,
            bob: bob_gain,
        });
    }
    let expected = params.money_to_divide;
    if (alice_gain + bob_gain - expected as f64).abs() > SUM_TOLERANCE {
        return Err(ValidationError::SplitSum {
            alice: alice_gain,
            bob: bob_gain,
            expected,
        });
    }
    Ok(())
}
