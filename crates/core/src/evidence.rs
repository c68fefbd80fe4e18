//! Evidence submission validation and cleaning.
//!
//! Evidence records are forensic: they are written once per `(job,
//! status)` pair and never updated or deleted. The storage layer enforces
//! the uniqueness; this module enforces the content rules.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum free-text length for evidence notes.
pub const MAX_EVIDENCE_NOTES_LENGTH: usize = 4_000;

/// Evidence content as submitted by a driver or warehouse operator,
/// before cleaning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewEvidence {
    pub photo_keys: Vec<String>,
    pub signature_key: Option<String>,
    pub seal_numbers: Vec<String>,
    pub notes: Option<String>,
}

impl NewEvidence {
    /// Trim every string field and drop blank entries.
    ///
    /// Cleaning happens before the emptiness check so that a submission
    /// consisting solely of whitespace is rejected.
    pub fn cleaned(self) -> NewEvidence {
        NewEvidence {
            photo_keys: clean_list(self.photo_keys),
            signature_key: clean_opt(self.signature_key),
            seal_numbers: clean_list(self.seal_numbers),
            notes: clean_opt(self.notes),
        }
    }

    /// Validate a cleaned submission: at least one photo or a signature.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.photo_keys.is_empty() && self.signature_key.is_none() {
            return Err(CoreError::EmptyEvidence);
        }
        if let Some(notes) = &self.notes {
            if notes.len() > MAX_EVIDENCE_NOTES_LENGTH {
                return Err(CoreError::Validation(format!(
                    "Evidence notes exceed maximum length of {MAX_EVIDENCE_NOTES_LENGTH} characters"
                )));
            }
        }
        Ok(())
    }
}

/// Trim entries and drop the blank ones.
fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Trim, mapping a blank string to `None`.
fn clean_opt(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
