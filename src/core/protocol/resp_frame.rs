// src/core/protocol/resp_frame.rs

//! Implements the RESP (REdis Serialization Protocol) frame structure and the
//! corresponding `Encoder` and `Decoder` for network communication.

use crate::core::CitrineError;
use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// The CRLF (Carriage Return, Line Feed) sequence used to terminate lines in RESP.
const CRLF: &[u8] = b"\r\n";
const CRLF_LEN: usize = 2;

// Protocol-level limits to prevent runaway allocation from malformed frames.
const MAX_FRAME_ELEMENTS: usize = 1_024 * 1_024;
const MAX_BULK_STRING_SIZE: usize = 512 * 1024 * 1024; // 512MB

/// An enum representing a single frame in the RESP protocol.
/// This is the low-level representation of data exchanged between client and server.
#[derive(Debug, Clone, PartialEq)]
pub enum RespFrame {
    SimpleString(String),
    /// An error reply. The variant holds the bare message; the mandatory
    /// `ERR ` kind prefix is added on encode and stripped on decode.
    Error(String),
    Integer(i64),
    Double(f64),
    BulkString(Bytes),
    /// A length-prefixed binary payload with no trailing CRLF, used for
    /// inline snapshot transfer during a full resync.
    RawBytes(Bytes),
    Null,
    NullArray,
    Array(Vec<RespFrame>),
    /// A map reply. Keys are simple strings, values are arbitrary frames.
    Map(Vec<(String, RespFrame)>),
}

impl RespFrame {
    /// A convenience method to encode a frame into a `Vec<u8>`.
    /// Used by replication, where a complete byte vector is needed.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>, CitrineError> {
        let mut buf = BytesMut::new();
        RespFrameCodec.encode(self.clone(), &mut buf)?;
        Ok(buf.to_vec())
    }

    /// Builds the canonical command frame (an array of bulk strings) from an argv.
    pub fn from_argv<I, B>(argv: I) -> RespFrame
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        RespFrame::Array(
            argv.into_iter()
                .map(|arg| RespFrame::BulkString(arg.into()))
                .collect(),
        )
    }
}

/// A `tokio_util::codec` implementation for encoding and decoding `RespFrame`s.
#[derive(Debug, Default)]
pub struct RespFrameCodec;

impl Encoder<RespFrame> for RespFrameCodec {
    type Error = CitrineError;

    /// Encodes a `RespFrame` into a `BytesMut` buffer according to the RESP specification.
    fn encode(&mut self, item: RespFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            RespFrame::SimpleString(s) => {
                dst.extend_from_slice(b"+");
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Error(s) => {
                dst.extend_from_slice(b"-ERR ");
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Integer(i) => {
                let mut itoa_buf = itoa::Buffer::new();
                dst.extend_from_slice(b":");
                dst.extend_from_slice(itoa_buf.format(i).as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Double(d) => {
                dst.extend_from_slice(b",");
                dst.extend_from_slice(d.to_string().as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::BulkString(b) => {
                let mut itoa_buf = itoa::Buffer::new();
                dst.extend_from_slice(b"$");
                dst.extend_from_slice(itoa_buf.format(b.len()).as_bytes());
                dst.extend_from_slice(CRLF);
                dst.extend_from_slice(&b);
                dst.extend_from_slice(CRLF);
            }
            RespFrame::RawBytes(b) => {
                // Snapshot payloads carry no trailing CRLF; the receiver must
                // consume exactly `len` bytes.
                let mut itoa_buf = itoa::Buffer::new();
                dst.extend_from_slice(b"$");
                dst.extend_from_slice(itoa_buf.format(b.len()).as_bytes());
                dst.extend_from_slice(CRLF);
                dst.extend_from_slice(&b);
            }
            RespFrame::Null => {
                dst.extend_from_slice(b"$-1\r\n");
            }
            RespFrame::NullArray => {
                dst.extend_from_slice(b"*-1\r\n");
            }
            RespFrame::Array(arr) => {
                let mut itoa_buf = itoa::Buffer::new();
                dst.extend_from_slice(b"*");
                dst.extend_from_slice(itoa_buf.format(arr.len()).as_bytes());
                dst.extend_from_slice(CRLF);
                for frame in arr {
                    // Recursively encode each frame in the array.
                    self.encode(frame, dst)?;
                }
            }
            RespFrame::Map(map) => {
                let mut itoa_buf = itoa::Buffer::new();
                dst.extend_from_slice(b"%");
                dst.extend_from_slice(itoa_buf.format(map.len()).as_bytes());
                dst.extend_from_slice(CRLF);
                for (k, v) in map {
                    dst.extend_from_slice(b"+");
                    dst.extend_from_slice(k.as_bytes());
                    dst.extend_from_slice(CRLF);
                    self.encode(v, dst)?;
                }
            }
        }
        Ok(())
    }
}

impl Decoder for RespFrameCodec {
    type Item = RespFrame;
    type Error = CitrineError;

    /// Decodes a `RespFrame` from a `BytesMut` buffer.
    ///
    /// Returns `Ok(None)` if the buffer does not yet contain a full frame,
    /// allowing the `Framed` stream to wait for more data from the network.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match parse_frame(src) {
            Ok((frame, len)) => {
                // Advance the buffer past the successfully parsed frame.
                src.advance(len);
                Ok(Some(frame))
            }
            // If the data is incomplete, wait for more data.
            Err(CitrineError::IncompleteData) => Ok(None),
            // For other errors, propagate them up to the connection handler.
            Err(e) => Err(e),
        }
    }
}

/// The main parsing entry point. It inspects the first byte (the type prefix)
/// and dispatches to the appropriate parsing function.
///
/// On success, returns the parsed frame together with the number of bytes it
/// consumed from the front of `src`.
pub fn parse_frame(src: &[u8]) -> Result<(RespFrame, usize), CitrineError> {
    if src.is_empty() {
        return Err(CitrineError::IncompleteData);
    }
    match src[0] {
        b'+' => parse_simple_string(src),
        b'-' => parse_error(src),
        b':' => parse_integer(src),
        b',' => parse_double(src),
        b'$' => parse_bulk_string(src),
        b'*' => parse_array(src),
        b'%' => parse_map(src),
        _ => Err(CitrineError::SyntaxError),
    }
}

/// Decodes every frame in `src`, failing if the buffer ends mid-frame.
pub fn decode_all(src: &[u8]) -> Result<Vec<RespFrame>, CitrineError> {
    let mut frames = Vec::new();
    let mut offset = 0;
    while offset < src.len() {
        let (frame, len) = parse_frame(&src[offset..])?;
        frames.push(frame);
        offset += len;
    }
    Ok(frames)
}

/// Splits a concatenated command batch into individual frames along with the
/// number of bytes each frame consumed. The byte length is the delta a replica
/// uses to advance its replication offset.
///
/// An incomplete trailing frame is not an error: decoding stops cleanly and
/// the second tuple element reports how many bytes were consumed, so callers
/// can retain the partial tail and resume once more data arrives.
pub fn decode_commands(src: &[u8]) -> Result<(Vec<(RespFrame, usize)>, usize), CitrineError> {
    let mut commands = Vec::new();
    let mut offset = 0;
    while offset < src.len() {
        match parse_frame(&src[offset..]) {
            Ok((frame, len)) => {
                commands.push((frame, len));
                offset += len;
            }
            Err(CitrineError::IncompleteData) => break,
            Err(e) => return Err(e),
        }
    }
    Ok((commands, offset))
}

/// Helper function to find the next CRLF sequence in a buffer.
fn find_crlf(src: &[u8]) -> Option<usize> {
    src.windows(CRLF_LEN).position(|window| window == CRLF)
}

/// Parses a single line (up to CRLF) from a buffer.
fn parse_line(src: &[u8]) -> Result<(&[u8], usize), CitrineError> {
    find_crlf(src)
        .map(|pos| (&src[..pos], pos + CRLF_LEN))
        .ok_or(CitrineError::IncompleteData)
}

/// Parses a Simple String (e.g., `+OK\r\n`).
fn parse_simple_string(src: &[u8]) -> Result<(RespFrame, usize), CitrineError> {
    let (line, len) = parse_line(&src[1..])?;
    Ok((
        RespFrame::SimpleString(String::from_utf8_lossy(line).to_string()),
        len + 1,
    ))
}

/// Parses an Error (e.g., `-ERR message\r\n`). The `ERR ` kind prefix is
/// stripped; the remainder becomes the error message.
fn parse_error(src: &[u8]) -> Result<(RespFrame, usize), CitrineError> {
    let (line, len) = parse_line(&src[1..])?;
    let text = String::from_utf8_lossy(line);
    let message = text.strip_prefix("ERR ").unwrap_or(&text);
    Ok((RespFrame::Error(message.to_string()), len + 1))
}

/// Parses an Integer (e.g., `:1000\r\n`).
fn parse_integer(src: &[u8]) -> Result<(RespFrame, usize), CitrineError> {
    let (line, len) = parse_line(&src[1..])?;
    let s = String::from_utf8_lossy(line);
    let i = s.parse::<i64>().map_err(|_| CitrineError::SyntaxError)?;
    Ok((RespFrame::Integer(i), len + 1))
}

/// Parses a Double (e.g., `,1.23\r\n`).
fn parse_double(src: &[u8]) -> Result<(RespFrame, usize), CitrineError> {
    let (line, len) = parse_line(&src[1..])?;
    let s = String::from_utf8_lossy(line);
    let d = s.parse::<f64>().map_err(|_| CitrineError::SyntaxError)?;
    Ok((RespFrame::Double(d), len + 1))
}

/// Parses a Bulk String (e.g., `$5\r\nhello\r\n`).
///
/// A declared payload that is not valid UTF-8 is an inline snapshot transfer:
/// it decodes as `RawBytes` and, because snapshot blobs carry no trailing
/// CRLF, the separator is not skipped. This is the single branch the codec
/// uses to recognize an embedded snapshot.
fn parse_bulk_string(src: &[u8]) -> Result<(RespFrame, usize), CitrineError> {
    let (line, len_of_line) = parse_line(&src[1..])?;
    let s = String::from_utf8_lossy(line);
    let str_len = s.parse::<isize>().map_err(|_| CitrineError::SyntaxError)?;

    // Handle Null Bulk String ($-1\r\n).
    if str_len == -1 {
        return Ok((RespFrame::Null, len_of_line + 1));
    }
    if str_len < 0 {
        return Err(CitrineError::SyntaxError);
    }

    let str_len = str_len as usize;
    if str_len > MAX_BULK_STRING_SIZE {
        return Err(CitrineError::SyntaxError);
    }

    let total_len_prefix = len_of_line + 1;
    if src.len() < total_len_prefix + str_len {
        return Err(CitrineError::IncompleteData);
    }

    let data_start = total_len_prefix;
    let data_end = total_len_prefix + str_len;
    let payload = &src[data_start..data_end];

    if std::str::from_utf8(payload).is_err() {
        // Snapshot payload: consume exactly `len` bytes, no trailing CRLF.
        return Ok((
            RespFrame::RawBytes(Bytes::copy_from_slice(payload)),
            data_end,
        ));
    }

    // Ordinary bulk string: the trailing CRLF must be present.
    if src.len() < data_end + CRLF_LEN {
        return Err(CitrineError::IncompleteData);
    }
    if &src[data_end..data_end + CRLF_LEN] != CRLF {
        return Err(CitrineError::SyntaxError);
    }

    let data = Bytes::copy_from_slice(payload);
    Ok((RespFrame::BulkString(data), data_end + CRLF_LEN))
}

/// Parses an Array (e.g., `*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n`).
fn parse_array(src: &[u8]) -> Result<(RespFrame, usize), CitrineError> {
    let (line, len_of_line) = parse_line(&src[1..])?;
    let s = String::from_utf8_lossy(line);
    let arr_len = s.parse::<isize>().map_err(|_| CitrineError::SyntaxError)?;

    // Handle Null Array (*-1\r\n).
    if arr_len == -1 {
        return Ok((RespFrame::NullArray, len_of_line + 1));
    }
    if arr_len < 0 {
        return Err(CitrineError::SyntaxError);
    }

    let arr_len = arr_len as usize;
    if arr_len > MAX_FRAME_ELEMENTS {
        return Err(CitrineError::SyntaxError);
    }

    let mut frames = Vec::with_capacity(arr_len);
    let mut cursor = len_of_line + 1;

    // Recursively parse each element of the array.
    for _ in 0..arr_len {
        let (frame, frame_len) = parse_frame(&src[cursor..])?;
        frames.push(frame);
        cursor += frame_len;
    }

    Ok((RespFrame::Array(frames), cursor))
}

/// Parses a Map (e.g., `%1\r\n+key\r\n$5\r\nvalue\r\n`). Keys must be simple strings.
fn parse_map(src: &[u8]) -> Result<(RespFrame, usize), CitrineError> {
    let (line, len_of_line) = parse_line(&src[1..])?;
    let s = String::from_utf8_lossy(line);
    let map_len = s.parse::<isize>().map_err(|_| CitrineError::SyntaxError)?;

    if map_len < 0 {
        return Err(CitrineError::SyntaxError);
    }

    let map_len = map_len as usize;
    if map_len > MAX_FRAME_ELEMENTS {
        return Err(CitrineError::SyntaxError);
    }

    let mut entries = Vec::with_capacity(map_len);
    let mut cursor = len_of_line + 1;

    for _ in 0..map_len {
        let (key_frame, key_len) = parse_frame(&src[cursor..])?;
        cursor += key_len;
        let RespFrame::SimpleString(key) = key_frame else {
            return Err(CitrineError::SyntaxError);
        };
        let (value_frame, value_len) = parse_frame(&src[cursor..])?;
        cursor += value_len;
        entries.push((key, value_frame));
    }

    Ok((RespFrame::Map(entries), cursor))
}
