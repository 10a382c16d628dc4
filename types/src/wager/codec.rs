use bytes::{Buf, BufMut};
use commonware_codec::{Error, ReadExt, Write};

use super::MAX_MESSAGE_LENGTH;

/// Writes `s` as a `u16` length followed by its UTF-8 bytes.
pub fn write_message(s: &str, writer: &mut impl BufMut) {
    let bytes = s.as_bytes();
    let len = bytes.len().min(u16::MAX as usize);
    (len as u16).write(writer);
    writer.put_slice(&bytes[..len]);
}

/// Reads a length-prefixed UTF-8 string of at most `max_len` bytes.
pub fn read_message(reader: &mut impl Buf, max_len: usize) -> Result<String, Error> {
    let len = u16::read(reader)? as usize;
    if len > max_len {
        return Err(Error::Invalid("Message", "too long"));
    }
    if reader.remaining() < len {
        return Err(Error::EndOfBuffer);
    }
    let mut bytes = vec![0u8; len];
    reader.copy_to_slice(&mut bytes);
    String::from_utf8(bytes).map_err(|_| Error::Invalid("Message", "invalid UTF-8"))
}

pub fn message_encode_size(s: &str) -> usize {
    2 + s.len().min(u16::MAX as usize)
}

/// Shortens `message` to fit an event, cutting on a char boundary.
pub fn clip_message(mut message: String) -> String {
    if message.len() <= MAX_MESSAGE_LENGTH {
        return message;
    }
    let mut end = MAX_MESSAGE_LENGTH;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    message.truncate(end);
    message
}
