//! # psdkit Export
//!
//! In-memory export document model and binary serializer for layered PSD
//! files.
//!
//! A [`Document`] owns the full entity tree for one output file: layers
//! with their channel planes and masks, document alpha channels, metadata
//! attributes, and the optional ICC / EXIF / thumbnail / merged image
//! blobs. [`write_document`] walks that tree and emits the section-ordered
//! byte stream through any [`psdkit_io::Storage`] adapter.
//!
//! # Example
//!
//! ```no_run
//! use psdkit_core::{ChannelKind, ColorMode, Compression, Depth, Rect};
//! use psdkit_export::{write_document, Document};
//! use psdkit_io::{NativeFile, Storage};
//!
//! let mut doc = Document::new(100, 100, Depth::Eight, ColorMode::Rgb);
//! let layer = doc.add_layer("Base").unwrap();
//! let rect = Rect::from_size(100, 100);
//! for (kind, fill) in [
//!     (ChannelKind::Red, 255u8),
//!     (ChannelKind::Green, 128),
//!     (ChannelKind::Blue, 0),
//! ] {
//!     doc.update_layer_channel_8(layer, kind, rect, vec![fill; 10_000], Compression::Raw)
//!         .unwrap();
//! }
//!
//! let mut file = NativeFile::new();
//! file.open_write(std::path::Path::new("out.psd")).unwrap();
//! write_document(&doc, &mut file).unwrap();
//! ```

mod compress;
mod document;
mod layer;
mod layer_info;
mod resources;
mod writer;

pub use compress::CompressedPlane;
pub use document::{
    AlphaChannel, Attribute, Document, DocumentLimits, MergedImage, ResolutionInfo, Thumbnail,
};
pub use layer::{
    BrightnessContrast, Channel, ChannelData, Layer, LayerMask, LockFlags, MAX_NAME_LEN,
};
pub use writer::write_document;
