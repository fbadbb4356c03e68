//! Layer and mask information section.
//!
//! The section and the layer info block inside it are both prefixed by
//! lengths that depend on everything that follows: layer count, per-layer
//! extra data, and compressed channel payloads. Channel payloads are
//! compressed before any record is written, so each record can state its
//! channel byte lengths up front; the two enclosing length fields are
//! written as placeholders and backpatched through the storage port once
//! the content exists.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use psdkit_core::{ChannelKind, Depth, Error, Result};
use psdkit_io::Storage;

use crate::compress::{compress_plane, CompressedPlane};
use crate::document::Document;
use crate::layer::Layer;
use crate::resources::section_u32;
use crate::writer::StorageWriter;

const BLEND_SIGNATURE: &[u8; 4] = b"8BIM";

/// Layer record flags: bit 0 transparency protected, bit 1 hidden.
fn record_flags(layer: &Layer) -> u8 {
    let mut flags = 0u8;
    if layer.locks.transparency {
        flags |= 0x01;
    }
    if !layer.visible {
        flags |= 0x02;
    }
    flags
}

pub(crate) fn write_layer_section<S: Storage>(
    writer: &mut StorageWriter<S>,
    document: &Document,
) -> Result<()> {
    let section_len_pos = writer.position();
    writer.write_u32::<BigEndian>(0)?; // section length placeholder
    let section_start = writer.position();

    let info_len_pos = writer.position();
    writer.write_u32::<BigEndian>(0)?; // layer info length placeholder
    let info_start = writer.position();

    let layer_count = i16::try_from(document.layers.len()).map_err(|_| Error::ValueTooLarge {
        field: "layer count",
        value: document.layers.len() as u64,
        max: i16::MAX as u64,
    })?;
    writer.write_i16::<BigEndian>(layer_count)?;

    // Compress every channel payload before any record is emitted; the
    // records carry the payload byte lengths.
    let mut compressed = Vec::with_capacity(document.layers.len());
    for layer in &document.layers {
        compressed.push(compress_layer_channels(layer, document.depth())?);
    }

    for (layer, planes) in document.layers.iter().zip(&compressed) {
        write_layer_record(writer, document, layer, planes)?;
    }

    for planes in &compressed {
        for (_, plane) in planes {
            writer.write_u16::<BigEndian>(plane.compression.to_u16())?;
            writer.write_all(&plane.payload)?;
        }
    }

    if (writer.position() - info_start) % 2 != 0 {
        writer.write_u8(0)?;
    }
    let info_len = (writer.position() - info_start) as usize;
    writer.patch_u32(info_len_pos, section_u32(info_len, "layer info length")?)?;

    // Global layer mask info: present but empty.
    writer.write_u32::<BigEndian>(0)?;

    let section_len = (writer.position() - section_start) as usize;
    writer.patch_u32(
        section_len_pos,
        section_u32(section_len, "layer section length")?,
    )?;

    tracing::debug!(
        layers = document.layers.len(),
        bytes = section_len,
        "layer section written"
    );
    Ok(())
}

fn compress_layer_channels(
    layer: &Layer,
    depth: Depth,
) -> Result<Vec<(ChannelKind, CompressedPlane)>> {
    let mut planes = Vec::with_capacity(layer.channel_count());
    for (kind, channel) in layer.channels() {
        let rect = match (kind, &layer.mask) {
            (ChannelKind::Mask, Some(mask)) => mask.rect,
            _ => layer.rect,
        };
        let row_bytes = rect.width() as usize * depth.bytes_per_sample();
        let plane = compress_plane(&channel.data.to_be_bytes(), row_bytes, channel.compression)?;
        planes.push((kind, plane));
    }
    Ok(planes)
}

fn write_layer_record<S: Storage>(
    writer: &mut StorageWriter<S>,
    document: &Document,
    layer: &Layer,
    planes: &[(ChannelKind, CompressedPlane)],
) -> Result<()> {
    writer.write_i32::<BigEndian>(layer.rect.top)?;
    writer.write_i32::<BigEndian>(layer.rect.left)?;
    writer.write_i32::<BigEndian>(layer.rect.bottom)?;
    writer.write_i32::<BigEndian>(layer.rect.right)?;

    writer.write_u16::<BigEndian>(planes.len() as u16)?;
    for (kind, plane) in planes {
        writer.write_i16::<BigEndian>(kind.id())?;
        writer.write_u32::<BigEndian>(section_u32(plane.record_len(), "channel data length")?)?;
    }

    writer.write_all(BLEND_SIGNATURE)?;
    writer.write_all(&layer.blend_mode.to_key())?;
    writer.write_u8(layer.opacity)?;
    writer.write_u8(layer.clipping as u8)?;
    writer.write_u8(record_flags(layer))?;
    writer.write_u8(0)?; // filler

    let extra = build_extra_data(document, layer)?;
    writer.write_u32::<BigEndian>(section_u32(extra.len(), "layer extra data length")?)?;
    writer.write_all(&extra)?;
    Ok(())
}

/// Assemble the variable-length tail of a layer record: mask record,
/// blending ranges, padded pascal name, and the extension blocks.
fn build_extra_data(document: &Document, layer: &Layer) -> Result<Vec<u8>> {
    let mut out = Vec::new();

    match &layer.mask {
        Some(mask) => {
            out.write_u32::<BigEndian>(20)?;
            out.write_i32::<BigEndian>(mask.rect.top)?;
            out.write_i32::<BigEndian>(mask.rect.left)?;
            out.write_i32::<BigEndian>(mask.rect.bottom)?;
            out.write_i32::<BigEndian>(mask.rect.right)?;
            out.push(mask.default_color);
            // Bit 0: mask position is relative to the layer.
            out.push(if mask.linked { 0 } else { 1 });
            out.extend_from_slice(&[0, 0]); // padding
        }
        None => out.write_u32::<BigEndian>(0)?,
    }

    // Layer blending ranges: none.
    out.write_u32::<BigEndian>(0)?;

    // Pascal name, padded to a 4-byte boundary including the length byte.
    let name = layer.name.as_bytes();
    out.push(name.len() as u8);
    out.extend_from_slice(name);
    let padding = (4 - (1 + name.len()) % 4) % 4;
    out.extend(std::iter::repeat(0u8).take(padding));

    if let Some(utf16) = &layer.utf16_name {
        let mut data = Vec::with_capacity(4 + utf16.len() * 2);
        data.write_u32::<BigEndian>(section_u32(utf16.len(), "UTF-16 name length")?)?;
        for &unit in utf16 {
            data.write_u16::<BigEndian>(unit)?;
        }
        while data.len() % 4 != 0 {
            data.push(0);
        }
        write_extension_block(&mut out, b"luni", &data)?;
    }

    if layer.locks.any() {
        let mut data = Vec::with_capacity(4);
        data.write_u32::<BigEndian>(layer.locks.to_bits())?;
        write_extension_block(&mut out, b"lspf", &data)?;
    }

    let sheet_key = document.sheet_color_table().to_key(layer.sheet_color);
    if sheet_key != 0 {
        let mut data = Vec::with_capacity(8);
        data.write_u16::<BigEndian>(sheet_key)?;
        data.extend_from_slice(&[0; 6]);
        write_extension_block(&mut out, b"lclr", &data)?;
    }

    if layer.layer_type != 0 {
        let mut data = Vec::with_capacity(4);
        data.write_u32::<BigEndian>(layer.layer_type)?;
        write_extension_block(&mut out, b"lsct", &data)?;
    }

    if let Some(adjustment) = &layer.adjustment {
        let mut data = Vec::with_capacity(8);
        data.write_i16::<BigEndian>(adjustment.brightness)?;
        data.write_i16::<BigEndian>(adjustment.contrast)?;
        data.write_i16::<BigEndian>(127)?; // mean
        data.push(0); // lab
        data.push(0); // padding
        write_extension_block(&mut out, b"brit", &data)?;
    }

    Ok(out)
}

/// One additional-information block: signature, key, length, data. Each
/// block is length-prefixed so readers can skip keys they do not know.
fn write_extension_block(out: &mut Vec<u8>, key: &[u8; 4], data: &[u8]) -> Result<()> {
    out.extend_from_slice(BLEND_SIGNATURE);
    out.extend_from_slice(key);
    out.write_u32::<BigEndian>(section_u32(data.len(), "extension block length")?)?;
    out.extend_from_slice(data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use psdkit_core::{ColorMode, Compression, Rect, SheetColor};
    use crate::layer::{Channel, ChannelData, LockFlags};

    fn doc() -> Document {
        Document::new(8, 8, Depth::Eight, ColorMode::Rgb)
    }

    #[test]
    fn test_extra_data_minimal_layer() {
        let layer = Layer::new("ab");
        let extra = build_extra_data(&doc(), &layer).unwrap();
        // 4 empty mask + 4 empty ranges + 4 padded name ("ab" + len byte + 1 pad)
        assert_eq!(extra.len(), 12);
        assert_eq!(extra[8], 2); // pascal length byte
        assert_eq!(&extra[9..11], b"ab");
    }

    #[test]
    fn test_extra_data_name_padding() {
        // 1 length byte + 3 characters is already a 4-byte boundary.
        let layer = Layer::new("abc");
        let extra = build_extra_data(&doc(), &layer).unwrap();
        assert_eq!(extra.len(), 12);
    }

    #[test]
    fn test_mask_record_is_twenty_bytes() {
        let mut layer = Layer::new("m");
        layer.mask = Some(crate::layer::LayerMask {
            rect: Rect::from_size(4, 4),
            default_color: 255,
            linked: true,
        });
        let extra = build_extra_data(&doc(), &layer).unwrap();
        assert_eq!(u32::from_be_bytes(extra[..4].try_into().unwrap()), 20);
        // default color then flags (linked mask: no relative-position bit)
        assert_eq!(extra[20], 255);
        assert_eq!(extra[21], 0);
    }

    #[test]
    fn test_luni_block_padded_to_four() {
        let mut layer = Layer::new("x");
        layer.utf16_name = Some("abc".encode_utf16().collect());
        let extra = build_extra_data(&doc(), &layer).unwrap();

        let block_start = 12; // after mask, ranges, padded name
        assert_eq!(&extra[block_start..block_start + 4], b"8BIM");
        assert_eq!(&extra[block_start + 4..block_start + 8], b"luni");
        let len =
            u32::from_be_bytes(extra[block_start + 8..block_start + 12].try_into().unwrap());
        assert_eq!(len % 4, 0);
        // count(4) + 3 chars * 2 bytes = 10, padded to 12
        assert_eq!(len, 12);
    }

    #[test]
    fn test_lock_and_sheet_blocks_present_when_set() {
        let mut layer = Layer::new("x");
        layer.locks = LockFlags {
            transparency: true,
            composite: true,
            position: true,
        };
        layer.sheet_color = SheetColor::Red;
        let extra = build_extra_data(&doc(), &layer).unwrap();

        let lspf = extra
            .windows(4)
            .position(|window| window == b"lspf")
            .unwrap();
        let bits = u32::from_be_bytes(extra[lspf + 8..lspf + 12].try_into().unwrap());
        assert_eq!(bits, 0x8000_0007);

        let lclr = extra
            .windows(4)
            .position(|window| window == b"lclr")
            .unwrap();
        assert_eq!(
            u16::from_be_bytes(extra[lclr + 8..lclr + 10].try_into().unwrap()),
            1
        );
    }

    #[test]
    fn test_layer_type_block_only_when_nonzero() {
        let mut layer = Layer::new("x");
        assert!(build_extra_data(&doc(), &layer)
            .unwrap()
            .windows(4)
            .all(|window| window != b"lsct"));

        layer.layer_type = 3;
        let extra = build_extra_data(&doc(), &layer).unwrap();
        let lsct = extra
            .windows(4)
            .position(|window| window == b"lsct")
            .unwrap();
        assert_eq!(u32::from_be_bytes(extra[lsct + 8..lsct + 12].try_into().unwrap()), 3);
    }

    #[test]
    fn test_brightness_contrast_block() {
        let mut layer = Layer::new("x");
        layer.adjustment = Some(crate::layer::BrightnessContrast {
            brightness: -20,
            contrast: 35,
        });
        let extra = build_extra_data(&doc(), &layer).unwrap();
        let brit = extra
            .windows(4)
            .position(|window| window == b"brit")
            .unwrap();
        let len = u32::from_be_bytes(extra[brit + 4..brit + 8].try_into().unwrap());
        assert_eq!(len, 8);
        assert_eq!(
            i16::from_be_bytes(extra[brit + 8..brit + 10].try_into().unwrap()),
            -20
        );
    }

    #[test]
    fn test_compressed_channel_lengths() {
        let mut layer = Layer::new("x");
        layer.rect = Rect::from_size(4, 4);
        layer.set_channel(
            ChannelKind::Red,
            Channel {
                data: ChannelData::U8(vec![1; 16]),
                compression: Compression::Raw,
            },
        );
        let planes = compress_layer_channels(&layer, Depth::Eight).unwrap();
        assert_eq!(planes.len(), 1);
        assert_eq!(planes[0].1.record_len(), 18);
    }
}
