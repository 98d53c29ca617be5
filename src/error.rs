//! Errors surfaced to whoever triggered an action (a patient or a staff member).
//!
//! Malformed stored data never shows up here: it is decoded to defaults where it
//! is read. Resolving something that is already gone is not an error either.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CareError {
    /// Missing or unusable input, reported at the point of entry. Nothing was written.
    #[error("{0}")]
    Validation(String),

    /// The identifier is already taken. Nothing was written.
    #[error("{0} already exists. Please use a unique ID.")]
    DuplicateKey(String),

    #[error("storage error: {0:#}")]
    Storage(anyhow::Error),
}

impl CareError {
    pub fn validation(message: impl Into<String>) -> Self {
        CareError::Validation(message.into())
    }

    /// True for errors caused by user input rather than the storage medium.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, CareError::Validation(_) | CareError::DuplicateKey(_))
    }
}

impl From<anyhow::Error> for CareError {
    fn from(err: anyhow::Error) -> Self {
        // Domain errors raised inside an atomic update travel back through anyhow.
        match err.downcast::<CareError>() {
            Ok(inner) => inner,
            Err(other) => CareError::Storage(other),
        }
    }
}

pub type CareResult<T> = Result<T, CareError>;
