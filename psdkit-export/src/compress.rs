//! Per-channel compression strategies.
//!
//! A channel plane is compressed up front, before any layer record is
//! written, so every record can carry the exact byte length of the payload
//! that follows it later in the section.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression as ZlibLevel;

use psdkit_core::{Compression, Error, Result};

/// One channel plane after its compression strategy has been applied.
///
/// For RLE the payload starts with the scanline byte-count table, as the
/// channel image data layout requires.
#[derive(Debug, Clone)]
pub struct CompressedPlane {
    pub compression: Compression,
    pub payload: Vec<u8>,
}

impl CompressedPlane {
    /// Byte length of this channel's image data record: the compression tag
    /// plus the payload.
    pub fn record_len(&self) -> usize {
        2 + self.payload.len()
    }
}

/// Apply `compression` to a big-endian plane of `row_bytes`-wide scanlines.
pub fn compress_plane(
    bytes: &[u8],
    row_bytes: usize,
    compression: Compression,
) -> Result<CompressedPlane> {
    let payload = match compression {
        Compression::Raw => bytes.to_vec(),
        Compression::Rle => rle_plane(bytes, row_bytes)?,
        Compression::Zip => zip_plane(bytes)?,
        Compression::ZipPrediction => {
            return Err(Error::unsupported(
                "ZIP-with-prediction compression is not available for export",
            ))
        }
    };
    Ok(CompressedPlane {
        compression,
        payload,
    })
}

/// PackBits-encode each scanline, prefixing the payload with the per-row
/// byte count table.
fn rle_plane(bytes: &[u8], row_bytes: usize) -> Result<Vec<u8>> {
    let rows: Vec<&[u8]> = if row_bytes == 0 {
        Vec::new()
    } else {
        bytes.chunks(row_bytes).collect()
    };

    let mut packed_rows = Vec::with_capacity(rows.len());
    let mut packed_total = 0usize;
    for row in &rows {
        let packed = pack_bits(row);
        if packed.len() > u16::MAX as usize {
            return Err(Error::ValueTooLarge {
                field: "RLE row byte count",
                value: packed.len() as u64,
                max: u16::MAX as u64,
            });
        }
        packed_total += packed.len();
        packed_rows.push(packed);
    }

    let mut payload = Vec::with_capacity(rows.len() * 2 + packed_total);
    for packed in &packed_rows {
        payload.write_u16::<BigEndian>(packed.len() as u16)?;
    }
    for packed in packed_rows {
        payload.extend_from_slice(&packed);
    }
    Ok(payload)
}

/// ZIP (zlib deflate) the whole plane.
fn zip_plane(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), ZlibLevel::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

/// PackBits run-length encoding of one scanline.
fn pack_bits(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::new();
    let mut i = 0;

    while i < data.len() {
        // Look for runs
        let mut run_length = 1;
        while i + run_length < data.len() && run_length < 128 && data[i + run_length] == data[i] {
            run_length += 1;
        }

        if run_length > 1 {
            // Encode run; header is -(run_length - 1) as a signed byte
            output.push((1 - run_length as i16) as u8);
            output.push(data[i]);
            i += run_length;
        } else {
            // Look for literal sequence
            let start = i;
            let mut literal_len = 1;
            i += 1;

            while i < data.len() && literal_len < 128 {
                // Check if we're starting a run
                if i + 1 < data.len() && data[i] == data[i + 1] {
                    break;
                }
                literal_len += 1;
                i += 1;
            }

            // Encode literal
            output.push((literal_len - 1) as u8);
            output.extend_from_slice(&data[start..start + literal_len]);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ReadBytesExt;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    /// PackBits decoder, for round-trip verification only.
    fn unpack_bits(data: &[u8], expected: usize) -> Vec<u8> {
        let mut output = Vec::with_capacity(expected);
        let mut i = 0;
        while i < data.len() && output.len() < expected {
            let header = data[i] as i8;
            i += 1;
            if header >= 0 {
                let count = header as usize + 1;
                output.extend_from_slice(&data[i..i + count]);
                i += count;
            } else if header != -128 {
                let count = (-header) as usize + 1;
                let value = data[i];
                i += 1;
                output.extend(std::iter::repeat(value).take(count));
            }
        }
        output
    }

    #[test]
    fn test_packbits_roundtrip() {
        let data = vec![1, 1, 1, 1, 2, 3, 4, 5, 5, 5, 5, 5, 5];
        let packed = pack_bits(&data);
        assert_eq!(unpack_bits(&packed, data.len()), data);
    }

    #[test]
    fn test_packbits_literal_only() {
        let data = vec![1, 2, 3, 4, 5];
        let packed = pack_bits(&data);
        assert_eq!(unpack_bits(&packed, data.len()), data);
    }

    #[test]
    fn test_packbits_long_run() {
        let data = vec![42u8; 300];
        let packed = pack_bits(&data);
        assert!(packed.len() < data.len());
        assert_eq!(unpack_bits(&packed, data.len()), data);
    }

    #[test]
    fn test_raw_plane_passthrough() {
        let plane = compress_plane(&[1, 2, 3, 4], 2, Compression::Raw).unwrap();
        assert_eq!(plane.payload, vec![1, 2, 3, 4]);
        assert_eq!(plane.record_len(), 6);
    }

    #[test]
    fn test_rle_plane_layout() {
        // Two rows of four constant bytes each: table of two u16 counts,
        // then two 2-byte packed rows.
        let plane = compress_plane(&[7, 7, 7, 7, 9, 9, 9, 9], 4, Compression::Rle).unwrap();
        let mut cursor = std::io::Cursor::new(&plane.payload);
        let count0 = cursor.read_u16::<BigEndian>().unwrap() as usize;
        let count1 = cursor.read_u16::<BigEndian>().unwrap() as usize;
        assert_eq!(plane.payload.len(), 4 + count0 + count1);

        let rows = &plane.payload[4..];
        assert_eq!(unpack_bits(&rows[..count0], 4), vec![7, 7, 7, 7]);
        assert_eq!(unpack_bits(&rows[count0..], 4), vec![9, 9, 9, 9]);
    }

    #[test]
    fn test_rle_beats_raw_on_constant_fill() {
        let data = vec![0u8; 100 * 100];
        let plane = compress_plane(&data, 100, Compression::Rle).unwrap();
        assert!(plane.payload.len() < data.len());
    }

    #[test]
    fn test_zip_plane_inflates_back() {
        let data: Vec<u8> = (0..=255).cycle().take(4096).collect();
        let plane = compress_plane(&data, 64, Compression::Zip).unwrap();

        let mut decoder = ZlibDecoder::new(&plane.payload[..]);
        let mut inflated = Vec::new();
        decoder.read_to_end(&mut inflated).unwrap();
        assert_eq!(inflated, data);
    }

    #[test]
    fn test_empty_plane() {
        let plane = compress_plane(&[], 4, Compression::Rle).unwrap();
        assert!(plane.payload.is_empty());
        assert_eq!(plane.record_len(), 2);
    }

    #[test]
    fn test_zip_prediction_rejected() {
        assert!(compress_plane(&[0; 4], 2, Compression::ZipPrediction).is_err());
    }
}
