// src/core/errors.rs

//! Defines the primary error type for the entire application.

use std::num::{ParseFloatError, ParseIntError};
use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the server.
///
/// The `Display` implementation of each variant is the exact message sent over
/// the wire when the error is encoded as a RESP error frame (the codec adds
/// the mandatory `ERR ` prefix).
#[derive(Error, Debug)]
pub enum CitrineError {
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("incomplete frame in stream")]
    IncompleteData,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("syntax error")]
    SyntaxError,

    #[error("wrong number of arguments for '{0}' command")]
    WrongArgumentCount(String),

    #[error("Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("value is not an integer or out of range")]
    NotAnInteger,

    #[error("value is not a valid float")]
    NotAFloat,

    #[error("The ID specified in XADD must be greater than 0-0")]
    StreamIdZero,

    #[error("The ID specified in XADD is equal or smaller than the target stream top item")]
    StreamIdTooSmall,

    #[error("EXEC without MULTI")]
    ExecWithoutMulti,

    #[error("DISCARD without MULTI")]
    DiscardWithoutMulti,

    #[error(
        "Can't execute '{0}': only (P|S)SUBSCRIBE / (P|S)UNSUBSCRIBE / PING / QUIT / RESET are allowed in this context"
    )]
    SubscribeModeRestricted(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Replication error: {0}")]
    ReplicationError(String),

    #[error("Snapshot error: {0}")]
    SnapshotError(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
// The Arc allows cheap, shared cloning.
impl Clone for CitrineError {
    fn clone(&self) -> Self {
        match self {
            CitrineError::Io(e) => CitrineError::Io(Arc::clone(e)),
            CitrineError::IncompleteData => CitrineError::IncompleteData,
            CitrineError::UnknownCommand(s) => CitrineError::UnknownCommand(s.clone()),
            CitrineError::SyntaxError => CitrineError::SyntaxError,
            CitrineError::WrongArgumentCount(s) => CitrineError::WrongArgumentCount(s.clone()),
            CitrineError::WrongType => CitrineError::WrongType,
            CitrineError::NotAnInteger => CitrineError::NotAnInteger,
            CitrineError::NotAFloat => CitrineError::NotAFloat,
            CitrineError::StreamIdZero => CitrineError::StreamIdZero,
            CitrineError::StreamIdTooSmall => CitrineError::StreamIdTooSmall,
            CitrineError::ExecWithoutMulti => CitrineError::ExecWithoutMulti,
            CitrineError::DiscardWithoutMulti => CitrineError::DiscardWithoutMulti,
            CitrineError::SubscribeModeRestricted(s) => {
                CitrineError::SubscribeModeRestricted(s.clone())
            }
            CitrineError::InvalidState(s) => CitrineError::InvalidState(s.clone()),
            CitrineError::ReplicationError(s) => CitrineError::ReplicationError(s.clone()),
            CitrineError::SnapshotError(s) => CitrineError::SnapshotError(s.clone()),
            CitrineError::Internal(s) => CitrineError::Internal(s.clone()),
        }
    }
}

impl PartialEq for CitrineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CitrineError::Io(e1), CitrineError::Io(e2)) => e1.to_string() == e2.to_string(),
            (CitrineError::UnknownCommand(s1), CitrineError::UnknownCommand(s2)) => s1 == s2,
            (CitrineError::WrongArgumentCount(s1), CitrineError::WrongArgumentCount(s2)) => {
                s1 == s2
            }
            (
                CitrineError::SubscribeModeRestricted(s1),
                CitrineError::SubscribeModeRestricted(s2),
            ) => s1 == s2,
            (CitrineError::InvalidState(s1), CitrineError::InvalidState(s2)) => s1 == s2,
            (CitrineError::ReplicationError(s1), CitrineError::ReplicationError(s2)) => s1 == s2,
            (CitrineError::SnapshotError(s1), CitrineError::SnapshotError(s2)) => s1 == s2,
            (CitrineError::Internal(s1), CitrineError::Internal(s2)) => s1 == s2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for CitrineError {
    fn from(e: std::io::Error) -> Self {
        CitrineError::Io(Arc::new(e))
    }
}

impl From<std::str::Utf8Error> for CitrineError {
    fn from(_: std::str::Utf8Error) -> Self {
        CitrineError::WrongType
    }
}

impl From<std::string::FromUtf8Error> for CitrineError {
    fn from(_: std::string::FromUtf8Error) -> Self {
        CitrineError::WrongType
    }
}

impl From<ParseIntError> for CitrineError {
    fn from(_: ParseIntError) -> Self {
        CitrineError::NotAnInteger
    }
}

impl From<ParseFloatError> for CitrineError {
    fn from(_: ParseFloatError) -> Self {
        CitrineError::NotAFloat
    }
}
