// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! On-disk record format.
//!
//! Each message is stored as one line: the payload encoded as a JSON string,
//! followed by a newline.
//!
//! ```text
//! ┌──────────────────────────────────────┬──────────┐
//! │  JSON string (quoted, escaped)       │  '\n'    │
//! └──────────────────────────────────────┴──────────┘
//! ```
//!
//! JSON escaping turns every newline and control character inside the
//! payload into an escape sequence, so the delimiter byte never appears
//! inside a record. Files stay plain text and can be inspected with any line
//! tool.

/// Byte terminating every record.
pub(crate) const RECORD_DELIMITER: u8 = b'\n';

/// Append the encoded form of `message`, delimiter included, to `buf`.
pub(crate) fn encode_into(message: &str, buf: &mut Vec<u8>) -> serde_json::Result<()> {
    serde_json::to_writer(&mut *buf, message)?;
    buf.push(RECORD_DELIMITER);
    Ok(())
}

/// Decode one line, with or without its trailing delimiter.
pub(crate) fn decode(line: &[u8]) -> serde_json::Result<String> {
    let body = line.strip_suffix(&[RECORD_DELIMITER]).unwrap_or(line);
    serde_json::from_slice(body)
}

/// Whether `line` holds a whole record.
#[inline]
pub(crate) fn is_complete(line: &[u8]) -> bool { line.last() == Some(&RECORD_DELIMITER) }
