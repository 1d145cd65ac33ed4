//! Gzip framing of note payloads

use std::io::Read;

use flate2::read::GzDecoder;

use super::FormatError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Fixed part of a gzip member header (magic, method, flags, mtime, xfl, os)
const GZIP_HEADER_LEN: usize = 10;

pub fn is_gzip(payload: &[u8]) -> bool {
    payload.starts_with(&GZIP_MAGIC)
}

/// Inflate a gzip payload
///
/// Optional header fields (name, comment, header CRC) and the 8-byte
/// CRC/size trailer are validated by the decoder.
pub fn gunzip(payload: &[u8]) -> Result<Vec<u8>, FormatError> {
    if payload.len() < GZIP_HEADER_LEN {
        return Err(FormatError::TruncatedHeader(payload.len()));
    }

    let mut decoder = GzDecoder::new(payload);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|error| FormatError::Decompress(error.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::gzip_bytes;

    #[test]
    fn test_gunzip_roundtrip() {
        let payload = gzip_bytes(b"note body");
        assert!(is_gzip(&payload));
        assert_eq!(gunzip(&payload).unwrap(), b"note body");
    }

    #[test]
    fn test_gunzip_with_filename_header() {
        let mut encoder = flate2::GzBuilder::new()
            .filename("note.bin")
            .comment("exported")
            .write(Vec::new(), flate2::Compression::default());
        std::io::Write::write_all(&mut encoder, b"with header fields").unwrap();
        let payload = encoder.finish().unwrap();

        assert_eq!(gunzip(&payload).unwrap(), b"with header fields");
    }

    #[test]
    fn test_short_header_rejected() {
        assert_eq!(
            gunzip(&[0x1f, 0x8b, 0x08, 0x00]),
            Err(FormatError::TruncatedHeader(4))
        );
    }
}
