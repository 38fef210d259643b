use crate::error::Error;

/// Frames above this size are rejected outright; the connection is closed
/// without reading the body into memory.
pub const MAX_FRAME_SIZE: usize = 10 * 1024 * 1024;

pub const PROTOCOL_VERSION: u8 = 1;

/// Encodes `[length:u32be][version:u8][command:u8][body]`, where `length`
/// counts everything after itself.
pub fn encode_frame(version: u8, command: u8, body: &[u8]) -> Result<Vec<u8>, Error> {
    let payload_len = 2 + body.len();
    if payload_len > MAX_FRAME_SIZE {
        return Err(Error::FrameTooLarge(payload_len as u32));
    }

    let mut buf = Vec::with_capacity(4 + payload_len);
    buf.extend_from_slice(&(payload_len as u32).to_be_bytes());
    buf.push(version);
    buf.push(command);
    buf.extend_from_slice(body);
    Ok(buf)
}

/// Decodes a complete, length-prefixed frame buffer (as produced by
/// [`encode_frame`]) into `(version, command, body)`. This is the pure,
/// allocation-only counterpart to [`crate::io::read_frame`], used directly
/// by frame round-trip tests that have no socket to read from.
pub fn decode_frame(buf: &[u8]) -> Result<(u8, u8, Vec<u8>), Error> {
    if buf.len() < 4 {
        return Err(unexpected_eof("frame shorter than its length prefix"));
    }
    let mut length_bytes = [0u8; 4];
    length_bytes.copy_from_slice(&buf[..4]);
    let length = u32::from_be_bytes(length_bytes) as usize;

    if length > MAX_FRAME_SIZE {
        return Err(Error::FrameTooLarge(length as u32));
    }

    let frame_body = &buf[4..];
    if frame_body.len() != length {
        return Err(unexpected_eof("frame body does not match its declared length"));
    }
    split_header(frame_body)
}

/// Splits the post-length-prefix bytes of a frame into `(version, command,
/// payload)`.
pub(crate) fn split_header(frame_body: &[u8]) -> Result<(u8, u8, Vec<u8>), Error> {
    if frame_body.len() < 2 {
        return Err(unexpected_eof("frame missing version/command header"));
    }
    Ok((frame_body[0], frame_body[1], frame_body[2..].to_vec()))
}

fn unexpected_eof(message: &str) -> Error {
    Error::Io(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, message.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_version_command_and_body() {
        let body = b"hello".to_vec();
        let framed = encode_frame(PROTOCOL_VERSION, 1, &body).unwrap();
        let (version, command, decoded_body) = decode_frame(&framed).unwrap();
        assert_eq!(version, PROTOCOL_VERSION);
        assert_eq!(command, 1);
        assert_eq!(decoded_body, body);
    }

    #[test]
    fn rejects_oversized_frame() {
        let huge_length = (MAX_FRAME_SIZE + 1) as u32;
        let mut buf = huge_length.to_be_bytes().to_vec();
        buf.extend_from_slice(&[1, 1]);
        assert!(matches!(decode_frame(&buf), Err(Error::FrameTooLarge(_))));
    }

    #[test]
    fn rejects_truncated_frame() {
        let framed = encode_frame(PROTOCOL_VERSION, 1, b"payload").unwrap();
        let truncated = &framed[..framed.len() - 2];
        assert!(decode_frame(truncated).is_err());
    }
}
