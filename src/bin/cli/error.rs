//! The CLI's own error type, layered over the library's [`radyx::Error`]
//! so argument-parsing failures get the same `invalid-argument` exit code
//! the session gives library-level validation failures.

use std::process::ExitCode;

#[derive(Debug, thiserror::Error)]
pub enum RadyxError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Session(#[from] radyx::Error),
}

impl RadyxError {
    pub fn exit_code(&self) -> ExitCode {
        let code = match self {
            RadyxError::InvalidArgument(_) => 2,
            RadyxError::Session(e) => e.exit_code(),
        };
        ExitCode::from(code as u8)
    }
}
