//! zlib (RFC 1950) compression for loose object files.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use crate::error::{StoreError, StoreResult};

/// zlib's own default level.
pub const DEFAULT_LEVEL: u32 = 6;

/// Compress `bytes` into a zlib stream. Levels above 9 are clamped.
pub fn compress(bytes: &[u8], level: u32) -> StoreResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(
        Vec::with_capacity(bytes.len() / 2 + 16),
        Compression::new(level.min(9)),
    );
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

/// Decompress a complete zlib stream.
///
/// Fails with [`StoreError::CorruptStream`] on a bad header or checksum, a
/// stream that ends early, or bytes left over after the end of the stream.
pub fn decompress(bytes: &[u8]) -> StoreResult<Vec<u8>> {
    if bytes.is_empty() {
        return Err(corrupt("empty input"));
    }

    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(bytes.len().saturating_mul(2).max(64));

    // `FlushDecompress::Finish` fails once the output buffer fills.
    loop {
        if out.len() == out.capacity() {
            let extra = out.capacity().max(64);
            out.reserve(extra);
        }
        let consumed_before = inflater.total_in();
        let produced_before = inflater.total_out();
        let input = &bytes[consumed_before as usize..];

        let status = inflater
            .decompress_vec(input, &mut out, FlushDecompress::None)
            .map_err(|e| corrupt(e.to_string()))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                let stalled = inflater.total_in() == consumed_before
                    && inflater.total_out() == produced_before;
                if stalled && out.len() < out.capacity() {
                    return Err(corrupt("stream ends before the final block"));
                }
            }
        }
    }

    let consumed = inflater.total_in() as usize;
    if consumed != bytes.len() {
        return Err(corrupt(format!(
            "{} trailing bytes after end of stream",
            bytes.len() - consumed
        )));
    }
    Ok(out)
}

fn corrupt(reason: impl Into<String>) -> StoreError {
    StoreError::CorruptStream(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_corrupt(bytes: &[u8]) {
        let err = decompress(bytes).unwrap_err();
        assert!(
            matches!(err, StoreError::CorruptStream(_)),
            "expected CorruptStream, got {err:?}"
        );
    }

    #[test]
    fn roundtrip_text() {
        let data = b"blob 6\0hello\n";
        let compressed = compress(data, DEFAULT_LEVEL).unwrap();
        assert_eq!(decompress(&compressed).unwrap(), data);
    }

    #[test]
    fn roundtrip_empty() {
        let compressed = compress(b"", DEFAULT_LEVEL).unwrap();
        assert!(!compressed.is_empty());
        assert!(decompress(&compressed).unwrap().is_empty());
    }

    #[test]
    fn output_is_a_zlib_stream() {
        let compressed = compress(b"anything", DEFAULT_LEVEL).unwrap();
        // CMF byte: deflate with a 32K window.
        assert_eq!(compressed[0], 0x78);
        assert_eq!(
            (u16::from(compressed[0]) << 8 | u16::from(compressed[1])) % 31,
            0
        );
    }

    #[test]
    fn large_repetitive_input_shrinks_and_roundtrips() {
        let data = vec![0xABu8; 100_000];
        let compressed = compress(&data, DEFAULT_LEVEL).unwrap();
        assert!(compressed.len() < data.len() / 10);
        assert_eq!(decompress(&compressed).unwrap(), data);
    }

    #[test]
    fn every_level_roundtrips() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(20);
        for level in 0..=12 {
            let compressed = compress(&data, level).unwrap();
            assert_eq!(decompress(&compressed).unwrap(), data, "level {level}");
        }
    }

    #[test]
    fn random_bytes_are_rejected() {
        assert_corrupt(b"this is definitely not zlib");
        assert_corrupt(&[0xde, 0xad, 0xbe, 0xef, 0x00, 0x01, 0x02]);
        assert_corrupt(b"");
    }

    #[test]
    fn truncated_stream_is_rejected() {
        let compressed = compress(&b"some payload worth compressing ".repeat(10), 9).unwrap();
        for cut in 1..compressed.len() {
            assert_corrupt(&compressed[..compressed.len() - cut]);
        }
    }

    #[test]
    fn bad_checksum_is_rejected() {
        let mut compressed = compress(b"checksummed", DEFAULT_LEVEL).unwrap();
        let last = compressed.len() - 1;
        compressed[last] ^= 0xff;
        assert_corrupt(&compressed);
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let mut compressed = compress(b"payload", DEFAULT_LEVEL).unwrap();
        compressed.extend_from_slice(b"junk");
        assert_corrupt(&compressed);
    }

    #[test]
    fn highly_compressible_text_roundtrips() {
        // Inflates to far more than twice the compressed size.
        let line = b"100644 blob ce013625030ba8dba906f756967f9e9ca394464a\tfile.txt\n";
        let data = line.repeat(500);
        let compressed = compress(&data, DEFAULT_LEVEL).unwrap();
        assert!(compressed.len() * 4 < data.len());
        assert_eq!(decompress(&compressed).unwrap(), data);
    }

    proptest! {
        #[test]
        fn roundtrip_repeated_patterns(
            pattern in proptest::collection::vec(any::<u8>(), 1..16),
            copies in 1usize..4096,
            level in 0u32..=9,
        ) {
            let data = pattern.repeat(copies);
            let compressed = compress(&data, level).unwrap();
            prop_assert_eq!(decompress(&compressed).unwrap(), data);
        }

        #[test]
        fn roundtrip_any_bytes(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let compressed = compress(&data, DEFAULT_LEVEL).unwrap();
            prop_assert_eq!(decompress(&compressed).unwrap(), data);
        }
    }
}
