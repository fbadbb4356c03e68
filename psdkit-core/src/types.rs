//! Shared type definitions for the PSD export pipeline.

use crate::error::{Error, Result};

/// Color mode of a document, as stored in the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// 1-bit bitmap
    Bitmap,
    /// Grayscale
    Grayscale,
    /// Indexed color
    Indexed,
    /// RGB
    Rgb,
    /// CMYK
    Cmyk,
    /// Multichannel
    Multichannel,
    /// Duotone
    Duotone,
    /// Lab color
    Lab,
}

impl ColorMode {
    /// Create from the header color mode value
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(ColorMode::Bitmap),
            1 => Some(ColorMode::Grayscale),
            2 => Some(ColorMode::Indexed),
            3 => Some(ColorMode::Rgb),
            4 => Some(ColorMode::Cmyk),
            7 => Some(ColorMode::Multichannel),
            8 => Some(ColorMode::Duotone),
            9 => Some(ColorMode::Lab),
            _ => None,
        }
    }

    /// Convert to the header color mode value
    pub fn to_u16(self) -> u16 {
        match self {
            ColorMode::Bitmap => 0,
            ColorMode::Grayscale => 1,
            ColorMode::Indexed => 2,
            ColorMode::Rgb => 3,
            ColorMode::Cmyk => 4,
            ColorMode::Multichannel => 7,
            ColorMode::Duotone => 8,
            ColorMode::Lab => 9,
        }
    }

    /// Number of color channels the composite image carries, not counting
    /// document alpha channels.
    pub fn base_channels(self) -> u16 {
        match self {
            ColorMode::Bitmap | ColorMode::Grayscale | ColorMode::Indexed | ColorMode::Duotone => 1,
            ColorMode::Rgb | ColorMode::Lab | ColorMode::Multichannel => 3,
            ColorMode::Cmyk => 4,
        }
    }

    /// Get color mode name
    pub fn name(&self) -> &'static str {
        match self {
            ColorMode::Bitmap => "Bitmap",
            ColorMode::Grayscale => "Grayscale",
            ColorMode::Indexed => "Indexed",
            ColorMode::Rgb => "RGB",
            ColorMode::Cmyk => "CMYK",
            ColorMode::Multichannel => "Multichannel",
            ColorMode::Duotone => "Duotone",
            ColorMode::Lab => "Lab",
        }
    }
}

/// Bits per channel of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// 8 bits per sample
    Eight,
    /// 16 bits per sample
    Sixteen,
    /// 32 bits per sample (float)
    ThirtyTwo,
}

impl Depth {
    /// Create from a bits-per-channel value
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            8 => Some(Depth::Eight),
            16 => Some(Depth::Sixteen),
            32 => Some(Depth::ThirtyTwo),
            _ => None,
        }
    }

    /// Convert to the bits-per-channel header value
    pub fn to_u16(self) -> u16 {
        match self {
            Depth::Eight => 8,
            Depth::Sixteen => 16,
            Depth::ThirtyTwo => 32,
        }
    }

    /// Bytes occupied by a single sample.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Depth::Eight => 1,
            Depth::Sixteen => 2,
            Depth::ThirtyTwo => 4,
        }
    }
}

/// Per-channel compression strategy, as stored in channel image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Uncompressed planar samples
    #[default]
    Raw,
    /// PackBits run-length encoding, one run stream per scanline
    Rle,
    /// ZIP (zlib deflate) over the whole plane
    Zip,
    /// ZIP with per-row delta prediction
    ZipPrediction,
}

impl Compression {
    /// Create from the compression tag value
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Compression::Raw),
            1 => Some(Compression::Rle),
            2 => Some(Compression::Zip),
            3 => Some(Compression::ZipPrediction),
            _ => None,
        }
    }

    /// Convert to the compression tag value
    pub fn to_u16(self) -> u16 {
        match self {
            Compression::Raw => 0,
            Compression::Rle => 1,
            Compression::Zip => 2,
            Compression::ZipPrediction => 3,
        }
    }

    /// Get compression name
    pub fn name(&self) -> &'static str {
        match self {
            Compression::Raw => "Raw",
            Compression::Rle => "RLE",
            Compression::Zip => "ZIP",
            Compression::ZipPrediction => "ZIP with prediction",
        }
    }
}

/// Channel slot of an export layer.
///
/// Slots are fixed: a layer carries at most one plane per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Red,
    Green,
    Blue,
    Alpha,
    Mask,
}

impl ChannelKind {
    /// Number of channel slots per layer.
    pub const SLOT_COUNT: usize = 5;

    /// Slot index inside a layer's channel array.
    pub fn slot(self) -> usize {
        match self {
            ChannelKind::Red => 0,
            ChannelKind::Green => 1,
            ChannelKind::Blue => 2,
            ChannelKind::Alpha => 3,
            ChannelKind::Mask => 4,
        }
    }

    /// Channel identifier written into the layer record.
    pub fn id(self) -> i16 {
        match self {
            ChannelKind::Red => 0,
            ChannelKind::Green => 1,
            ChannelKind::Blue => 2,
            ChannelKind::Alpha => -1,
            ChannelKind::Mask => -2,
        }
    }

    /// Reverse of [`ChannelKind::slot`].
    pub fn from_slot(slot: usize) -> Option<Self> {
        match slot {
            0 => Some(ChannelKind::Red),
            1 => Some(ChannelKind::Green),
            2 => Some(ChannelKind::Blue),
            3 => Some(ChannelKind::Alpha),
            4 => Some(ChannelKind::Mask),
            _ => None,
        }
    }
}

/// Semantics of a document alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaChannelMode {
    /// Plain alpha / saved selection
    #[default]
    Alpha,
    /// Inverted alpha
    InvertedAlpha,
    /// Spot color plane
    Spot,
}

impl AlphaChannelMode {
    /// Convert to the display info mode value
    pub fn to_u8(self) -> u8 {
        match self {
            AlphaChannelMode::Alpha => 0,
            AlphaChannelMode::InvertedAlpha => 1,
            AlphaChannelMode::Spot => 2,
        }
    }
}

/// A pixel-space rectangle: `top`/`left` inclusive, `bottom`/`right` exclusive.
///
/// Layer rectangles may lie partially or fully outside the document canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

impl Rect {
    /// Create a rectangle from edge coordinates.
    pub fn new(top: i32, left: i32, bottom: i32, right: i32) -> Self {
        Rect {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Rectangle spanning `width` x `height` pixels from the origin.
    pub fn from_size(width: u32, height: u32) -> Self {
        Rect {
            top: 0,
            left: 0,
            bottom: height as i32,
            right: width as i32,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }

    /// Number of samples in one plane covering this rectangle.
    pub fn samples(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Reject rectangles with right < left or bottom < top.
    pub fn validate(&self) -> Result<()> {
        if self.right < self.left || self.bottom < self.top {
            return Err(Error::InvalidRect {
                top: self.top,
                left: self.left,
                bottom: self.bottom,
                right: self.right,
            });
        }
        Ok(())
    }
}
