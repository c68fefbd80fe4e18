//! Job line-item constants and set-once rules.
//!
//! A line item is one category/quantity pair on a Job. Sanitisation and
//! grading are each recorded exactly once; the conditional writes in the
//! storage layer enforce that, and this module supplies the accepted
//! values and the resale-value recomputation contract.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Wipe methods
// ---------------------------------------------------------------------------

/// Software wipe to NIST 800-88 clear/purge.
pub const WIPE_METHOD_SOFTWARE: &str = "software_wipe";
/// Degaussing for magnetic media.
pub const WIPE_METHOD_DEGAUSS: &str = "degauss";
/// Physical destruction (shredding); no reuse possible.
pub const WIPE_METHOD_SHRED: &str = "shred";

/// All accepted wipe methods.
pub const VALID_WIPE_METHODS: &[&str] =
    &[WIPE_METHOD_SOFTWARE, WIPE_METHOD_DEGAUSS, WIPE_METHOD_SHRED];

/// Validate that a wipe method string is one of the accepted values.
pub fn validate_wipe_method(method: &str) -> Result<(), CoreError> {
    if VALID_WIPE_METHODS.contains(&method) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid wipe method '{method}'. Must be one of: {}",
            VALID_WIPE_METHODS.join(", ")
        )))
    }
}

// ---------------------------------------------------------------------------
// Grades
// ---------------------------------------------------------------------------

/// Fully working, cosmetically good; resale channel.
pub const GRADE_A: &str = "a";
/// Working with cosmetic wear; discounted resale.
pub const GRADE_B: &str = "b";
/// Functional defects; parts harvest.
pub const GRADE_C: &str = "c";
/// No residual value; recycling stream.
pub const GRADE_SCRAP: &str = "scrap";

/// All accepted grades.
pub const VALID_GRADES: &[&str] = &[GRADE_A, GRADE_B, GRADE_C, GRADE_SCRAP];

/// Validate that a grade string is one of the accepted values.
pub fn validate_grade(grade: &str) -> Result<(), CoreError> {
    if VALID_GRADES.contains(&grade) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid grade '{grade}'. Must be one of: {}",
            VALID_GRADES.join(", ")
        )))
    }
}

/// Validate a line-item quantity.
pub fn validate_quantity(quantity: i32) -> Result<(), CoreError> {
    if quantity > 0 {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Line item quantity must be positive (got {quantity})"
        )))
    }
}
