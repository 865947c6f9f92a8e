//! TFRecord framing
//!
//! Each frame is `length: u64 LE`, `masked crc32c of the length bytes:
//! u32 LE`, `body`, `masked crc32c of the body: u32 LE`. The masking
//! transform is `((crc >> 15) | (crc << 17)) + 0xa282ead8` with 32-bit
//! wrap.

use crc::{Crc, CRC_32_ISCSI};

const CASTAGNOLI: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

const CRC_MASK_DELTA: u32 = 0xa282_ead8;

/// Frame header size: 8-byte length plus 4-byte length checksum
pub const HEADER_LEN: usize = 12;

/// Trailing body checksum size
pub const FOOTER_LEN: usize = 4;

/// Masked CRC32C as used by the TFRecord format
pub fn masked_crc32c(data: &[u8]) -> u32 {
    let crc = CASTAGNOLI.checksum(data);
    ((crc >> 15) | (crc << 17)).wrapping_add(CRC_MASK_DELTA)
}

/// Outcome of parsing one frame from a byte slice
#[derive(Debug, PartialEq, Eq)]
pub enum FrameRead {
    /// A complete, checksum-valid frame; `consumed` bytes were used
    Frame { body: Vec<u8>, consumed: usize },

    /// The slice ends mid-frame (partial trailing write); retry next poll
    Incomplete,

    /// Checksum mismatch; the stream is unrecoverable from here on
    Corrupt { reason: &'static str },
}

/// Parse the frame starting at the beginning of `buf`
pub fn read_frame(buf: &[u8]) -> FrameRead {
    if buf.len() < HEADER_LEN {
        return FrameRead::Incomplete;
    }

    let length_bytes: [u8; 8] = buf[..8].try_into().unwrap();
    let length_crc = u32::from_le_bytes(buf[8..12].try_into().unwrap());
    if masked_crc32c(&length_bytes) != length_crc {
        return FrameRead::Corrupt {
            reason: "length checksum mismatch",
        };
    }

    let length = u64::from_le_bytes(length_bytes) as usize;
    let total = HEADER_LEN + length + FOOTER_LEN;
    if buf.len() < total {
        return FrameRead::Incomplete;
    }

    let body = &buf[HEADER_LEN..HEADER_LEN + length];
    let body_crc = u32::from_le_bytes(buf[HEADER_LEN + length..total].try_into().unwrap());
    if masked_crc32c(body) != body_crc {
        return FrameRead::Corrupt {
            reason: "body checksum mismatch",
        };
    }

    FrameRead::Frame {
        body: body.to_vec(),
        consumed: total,
    }
}

/// Append one framed record to `buf`
///
/// The write half exists for tests and tooling that need to synthesize
/// event files.
pub fn write_frame(buf: &mut Vec<u8>, body: &[u8]) {
    let length_bytes = (body.len() as u64).to_le_bytes();
    buf.extend_from_slice(&length_bytes);
    buf.extend_from_slice(&masked_crc32c(&length_bytes).to_le_bytes());
    buf.extend_from_slice(body);
    buf.extend_from_slice(&masked_crc32c(body).to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"hello");

        match read_frame(&buf) {
            FrameRead::Frame { body, consumed } => {
                assert_eq!(body, b"hello");
                assert_eq!(consumed, buf.len());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_truncated_header_is_incomplete() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"hello");
        assert_eq!(read_frame(&buf[..7]), FrameRead::Incomplete);
    }

    #[test]
    fn test_truncated_body_is_incomplete() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"hello");
        assert_eq!(read_frame(&buf[..buf.len() - 1]), FrameRead::Incomplete);
    }

    #[test]
    fn test_flipped_length_byte_is_corrupt() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"hello");
        buf[0] ^= 0xff;
        assert!(matches!(read_frame(&buf), FrameRead::Corrupt { .. }));
    }

    #[test]
    fn test_flipped_body_byte_is_corrupt() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"hello");
        buf[HEADER_LEN] ^= 0xff;
        assert!(matches!(
            read_frame(&buf),
            FrameRead::Corrupt {
                reason: "body checksum mismatch"
            }
        ));
    }

    #[test]
    fn test_masked_crc_reference_value() {
        // Mask of crc32c(b"") must equal the additive constant
        assert_eq!(masked_crc32c(b""), CRC_MASK_DELTA);
    }
}
