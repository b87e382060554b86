//! Line-delimited JSON encoding of protocol messages.
//!
//! An encoded message never contains a raw newline, so each message occupies
//! exactly one line on the wire. The encoder does not append the terminator
//! itself; [`Encoder::encode_line`] is provided for callers that want it.

use crate::error::ProtocolError;
use crate::message::Message;
use crate::MAX_LINE_BYTES;
use std::io::Write;

/// Encodes messages into their single-line text form.
pub struct Encoder;

impl Encoder {
    /// Encodes a message without a line terminator.
    pub fn encode(message: &Message) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(message)?)
    }

    /// Writes the encoded message to `writer` without a line terminator.
    pub fn encode_into<W: Write>(message: &Message, writer: &mut W) -> Result<(), ProtocolError> {
        serde_json::to_writer(writer, message)?;
        Ok(())
    }

    /// Encodes a message followed by exactly one `\n`.
    ///
    /// Fails with `LineTooLong` rather than emit a line that
    /// [`Decoder::decode`] would refuse.
    pub fn encode_line(message: &Message) -> Result<Vec<u8>, ProtocolError> {
        let mut bytes = serde_json::to_vec(message)?;
        if bytes.len() > MAX_LINE_BYTES {
            return Err(ProtocolError::LineTooLong {
                size: bytes.len(),
                max: MAX_LINE_BYTES,
            });
        }
        bytes.push(b'\n');
        Ok(bytes)
    }
}

/// Decodes one line of text into a message.
pub struct Decoder;

impl Decoder {
    /// Decodes exactly one message.
    ///
    /// A trailing `\n` or `\r\n` is ignored. Unknown tags, schema violations
    /// and inconsistent status fields all yield `MalformedMessage`.
    pub fn decode(line: &str) -> Result<Message, ProtocolError> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.len() > MAX_LINE_BYTES {
            return Err(ProtocolError::LineTooLong {
                size: line.len(),
                max: MAX_LINE_BYTES,
            });
        }

        let message: Message = serde_json::from_str(line)
            .map_err(|e| ProtocolError::MalformedMessage(e.to_string()))?;
        message.validate()?;
        Ok(message)
    }

    /// Decodes one message from raw bytes.
    pub fn decode_slice(bytes: &[u8]) -> Result<Message, ProtocolError> {
        let line = std::str::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)?;
        Self::decode(line)
    }
}
