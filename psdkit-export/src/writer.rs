//! Binary serializer: emits a document as the section-ordered PSD byte
//! stream through a storage capability.
//!
//! Section order is fixed by the format: file header, color mode data,
//! image resources, layer and mask information, merged image data. Section
//! lengths that are only known after their content has been produced are
//! backpatched through the storage port's positioned-write capability.

use std::io::{self, Write};

use byteorder::{BigEndian, WriteBytesExt};

use psdkit_core::{Error, Result};
use psdkit_io::Storage;

use crate::document::Document;
use crate::layer::ChannelData;
use crate::{layer_info, resources};

/// File signature.
const SIGNATURE: &[u8; 4] = b"8BPS";
/// Format version; 1 is the classic 30000-pixel layout.
const VERSION: u16 = 1;
/// Largest canvas edge the version 1 layout can describe.
const MAX_CANVAS: u32 = 30_000;
/// Largest channel count the header can declare.
const MAX_HEADER_CHANNELS: usize = 56;

/// Sequential writer over a [`Storage`] capability, with positioned
/// re-writes for length backpatching.
///
/// Every write goes through the issue/wait protocol; a failed operation
/// surfaces as an error and aborts the caller's emission.
pub(crate) struct StorageWriter<'a, S: Storage> {
    storage: &'a mut S,
    position: u64,
}

impl<'a, S: Storage> StorageWriter<'a, S> {
    pub(crate) fn new(storage: &'a mut S) -> Self {
        StorageWriter {
            storage,
            position: 0,
        }
    }

    /// Current absolute write position.
    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    /// Overwrite four bytes at an earlier position without moving the
    /// write cursor.
    pub(crate) fn patch_u32(&mut self, position: u64, value: u32) -> Result<()> {
        self.storage
            .issue_write(value.to_be_bytes().to_vec(), position)
            .wait()
    }
}

impl<S: Storage> io::Write for StorageWriter<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.storage
            .issue_write(buf.to_vec(), self.position)
            .wait()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        self.position += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Serialize `document` through `storage`, which must already be open for
/// writing.
///
/// A failed storage operation aborts the whole write and is returned to the
/// caller; the output is then at best a clearly truncated file and should
/// be discarded.
pub fn write_document<S: Storage>(document: &Document, storage: &mut S) -> Result<()> {
    let mut writer = StorageWriter::new(storage);

    write_header(&mut writer, document)?;
    write_color_mode_data(&mut writer)?;
    resources::write_image_resources(&mut writer, document)?;
    layer_info::write_layer_section(&mut writer, document)?;
    write_image_data(&mut writer, document)?;

    tracing::debug!(bytes = writer.position(), "document serialized");
    Ok(())
}

/// Total channel count declared in the header: the color mode's base
/// channels plus one plane per document alpha channel.
pub(crate) fn header_channel_count(document: &Document) -> usize {
    document.color_mode().base_channels() as usize + document.alpha_channels.len()
}

fn write_header<S: Storage>(writer: &mut StorageWriter<S>, document: &Document) -> Result<()> {
    if document.width() == 0 || document.height() == 0 {
        return Err(Error::unsupported("canvas dimensions must be non-zero"));
    }
    for (field, value) in [
        ("canvas width", document.width()),
        ("canvas height", document.height()),
    ] {
        if value > MAX_CANVAS {
            return Err(Error::ValueTooLarge {
                field,
                value: value as u64,
                max: MAX_CANVAS as u64,
            });
        }
    }
    let channels = header_channel_count(document);
    if channels > MAX_HEADER_CHANNELS {
        return Err(Error::ValueTooLarge {
            field: "header channel count",
            value: channels as u64,
            max: MAX_HEADER_CHANNELS as u64,
        });
    }

    writer.write_all(SIGNATURE)?;
    writer.write_u16::<BigEndian>(VERSION)?;
    writer.write_all(&[0u8; 6])?; // reserved
    writer.write_u16::<BigEndian>(channels as u16)?;
    writer.write_u32::<BigEndian>(document.height())?;
    writer.write_u32::<BigEndian>(document.width())?;
    writer.write_u16::<BigEndian>(document.depth().to_u16())?;
    writer.write_u16::<BigEndian>(document.color_mode().to_u16())?;
    Ok(())
}

fn write_color_mode_data<S: Storage>(writer: &mut StorageWriter<S>) -> Result<()> {
    // Empty for all supported color modes.
    writer.write_u32::<BigEndian>(0)?;
    Ok(())
}

/// Merged image data: one compression tag, then every header channel as an
/// uncompressed big-endian plane. Planes the caller never supplied are
/// zero-filled.
fn write_image_data<S: Storage>(writer: &mut StorageWriter<S>, document: &Document) -> Result<()> {
    writer.write_u16::<BigEndian>(0)?; // raw

    let plane_bytes = document.width() as usize
        * document.height() as usize
        * document.depth().bytes_per_sample();

    let merged_planes: Vec<Option<&ChannelData>> = match &document.merged_image {
        Some(merged) => vec![Some(&merged.red), Some(&merged.green), Some(&merged.blue)],
        None => vec![None, None, None],
    };

    let base = document.color_mode().base_channels() as usize;
    for slot in 0..base {
        match merged_planes.get(slot).copied().flatten() {
            Some(plane) => writer.write_all(&plane.to_be_bytes())?,
            None => writer.write_all(&vec![0u8; plane_bytes])?,
        }
    }

    for channel in &document.alpha_channels {
        match &channel.data {
            Some(plane) => writer.write_all(&plane.to_be_bytes())?,
            None => writer.write_all(&vec![0u8; plane_bytes])?,
        }
    }

    Ok(())
}
