// src/core/commands/helpers.rs

//! Provides helper functions for parsing command arguments from `RespFrame`s.
//! These helpers reduce boilerplate and keep error handling consistent across
//! commands.

use crate::core::CitrineError;
use crate::core::protocol::RespFrame;
use bytes::Bytes;
use std::str::FromStr;

/// A helper struct to parse command arguments sequentially.
/// This simplifies parsing optional flags and option/value pairs.
pub struct ArgParser<'a> {
    args: &'a [RespFrame],
    cursor: usize,
}

impl<'a> ArgParser<'a> {
    /// Creates a new parser over a slice of arguments.
    pub fn new(args: &'a [RespFrame]) -> Self {
        Self { args, cursor: 0 }
    }

    /// Checks if the next argument matches a specific flag (case-insensitively).
    /// If it matches, consumes the argument and returns true.
    pub fn match_flag(&mut self, flag_name: &str) -> bool {
        if let Some(arg_str) = self.peek_str() {
            if arg_str.eq_ignore_ascii_case(flag_name) {
                self.cursor += 1;
                return true;
            }
        }
        false
    }

    /// Checks if the next argument matches an option name. If it matches,
    /// consumes both the option name and its value, parsing the value into `T`.
    pub fn match_option<T>(&mut self, opt_name: &str) -> Result<Option<T>, CitrineError>
    where
        T: FromStr,
    {
        if let Some(arg_str) = self.peek_str() {
            if arg_str.eq_ignore_ascii_case(opt_name) {
                if self.cursor + 1 >= self.args.len() {
                    return Err(CitrineError::SyntaxError);
                }
                let value_str = extract_string(&self.args[self.cursor + 1])?;
                let parsed_value = value_str
                    .parse::<T>()
                    .map_err(|_| CitrineError::SyntaxError)?;
                self.cursor += 2;
                return Ok(Some(parsed_value));
            }
        }
        Ok(None)
    }

    /// Returns the arguments that have not been consumed.
    pub fn remaining_args(&self) -> &'a [RespFrame] {
        &self.args[self.cursor..]
    }

    /// Peeks at the next argument as a string without consuming it.
    fn peek_str(&self) -> Option<String> {
        self.args
            .get(self.cursor)
            .and_then(|frame| extract_string(frame).ok())
    }
}

/// Extracts a `String` from a `RespFrame::BulkString`.
/// Returns a `WrongType` error if the frame is not a bulk string or not valid UTF-8.
pub fn extract_string(frame: &RespFrame) -> Result<String, CitrineError> {
    if let RespFrame::BulkString(bs) = frame {
        String::from_utf8(bs.to_vec()).map_err(|_| CitrineError::WrongType)
    } else {
        Err(CitrineError::WrongType)
    }
}

/// Extracts `Bytes` from a `RespFrame::BulkString`.
pub fn extract_bytes(frame: &RespFrame) -> Result<Bytes, CitrineError> {
    match frame {
        RespFrame::BulkString(bs) => Ok(bs.clone()),
        _ => Err(CitrineError::WrongType),
    }
}

/// Validates that the number of arguments matches an exact expected count.
pub fn validate_arg_count(
    args: &[RespFrame],
    expected: usize,
    cmd: &str,
) -> Result<(), CitrineError> {
    if args.len() != expected {
        Err(CitrineError::WrongArgumentCount(cmd.to_string()))
    } else {
        Ok(())
    }
}

/// Parses arguments for commands following the pattern `COMMAND key value1 [value2 ...]`.
pub fn parse_key_and_values(
    args: &[RespFrame],
    min_args: usize,
    cmd: &str,
) -> Result<(Bytes, Vec<Bytes>), CitrineError> {
    if args.len() < min_args {
        return Err(CitrineError::WrongArgumentCount(cmd.to_string()));
    }
    let key = extract_bytes(&args[0])?;
    let values = args[1..]
        .iter()
        .map(extract_bytes)
        .collect::<Result<_, _>>()?;
    Ok((key, values))
}

/// Parses arguments for commands following the pattern
/// `COMMAND key field1 value1 [field2 value2 ...]`.
pub fn parse_key_and_field_value_pairs(
    args: &[RespFrame],
    cmd: &str,
) -> Result<(Bytes, Vec<(Bytes, Bytes)>), CitrineError> {
    if args.len() < 3 || args.len() % 2 != 1 {
        return Err(CitrineError::WrongArgumentCount(cmd.to_string()));
    }
    let key = extract_bytes(&args[0])?;
    let fields = args[1..]
        .chunks_exact(2)
        .map(|chunk| -> Result<(Bytes, Bytes), CitrineError> {
            Ok((extract_bytes(&chunk[0])?, extract_bytes(&chunk[1])?))
        })
        .collect::<Result<_, _>>()?;
    Ok((key, fields))
}
