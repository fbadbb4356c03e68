//! Layer, channel, and mask entities of the export model.

use psdkit_core::{BlendMode, ChannelKind, Compression, Rect, SheetColor};

/// Longest ASCII layer name the legacy pascal-string field can carry.
pub const MAX_NAME_LEN: usize = 31;

/// One planar buffer of raw samples, owned by its channel slot.
///
/// The variant must match the document bit depth; 32-bit documents carry
/// float samples.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F32(Vec<f32>),
}

impl ChannelData {
    /// Number of samples in the plane.
    pub fn samples(&self) -> usize {
        match self {
            ChannelData::U8(data) => data.len(),
            ChannelData::U16(data) => data.len(),
            ChannelData::F32(data) => data.len(),
        }
    }

    /// Size of the plane in bytes.
    pub fn byte_len(&self) -> usize {
        match self {
            ChannelData::U8(data) => data.len(),
            ChannelData::U16(data) => data.len() * 2,
            ChannelData::F32(data) => data.len() * 4,
        }
    }

    /// Sample width in bits.
    pub fn depth_bits(&self) -> u16 {
        match self {
            ChannelData::U8(_) => 8,
            ChannelData::U16(_) => 16,
            ChannelData::F32(_) => 32,
        }
    }

    /// Serialize the plane to big-endian bytes.
    pub fn to_be_bytes(&self) -> Vec<u8> {
        match self {
            ChannelData::U8(data) => data.clone(),
            ChannelData::U16(data) => {
                let mut bytes = Vec::with_capacity(data.len() * 2);
                for &sample in data {
                    bytes.extend_from_slice(&sample.to_be_bytes());
                }
                bytes
            }
            ChannelData::F32(data) => {
                let mut bytes = Vec::with_capacity(data.len() * 4);
                for &sample in data {
                    bytes.extend_from_slice(&sample.to_be_bytes());
                }
                bytes
            }
        }
    }
}

/// One populated channel slot: the plane plus its compression strategy.
#[derive(Debug, Clone)]
pub struct Channel {
    pub data: ChannelData,
    pub compression: Compression,
}

/// A layer's user mask.
#[derive(Debug, Clone, Copy)]
pub struct LayerMask {
    /// Mask rectangle, independent of the layer rectangle.
    pub rect: Rect,
    /// Fill value for pixels the mask plane does not cover.
    pub default_color: u8,
    /// Whether the mask moves with the layer.
    pub linked: bool,
}

/// The three independent layer locks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockFlags {
    pub transparency: bool,
    pub composite: bool,
    pub position: bool,
}

impl LockFlags {
    /// All three locks engaged.
    pub fn all_locked(&self) -> bool {
        self.transparency && self.composite && self.position
    }

    /// Whether any lock is engaged.
    pub fn any(&self) -> bool {
        self.transparency || self.composite || self.position
    }

    /// Bit field written into the lock extension block.
    pub fn to_bits(&self) -> u32 {
        let mut bits = 0u32;
        if self.transparency {
            bits |= 0x01;
        }
        if self.composite {
            bits |= 0x02;
        }
        if self.position {
            bits |= 0x04;
        }
        if self.all_locked() {
            bits |= 0x8000_0000;
        }
        bits
    }
}

/// Brightness/contrast adjustment payload.
#[derive(Debug, Clone, Copy)]
pub struct BrightnessContrast {
    pub brightness: i16,
    pub contrast: i16,
}

/// A named, positioned collection of up to five channel planes plus an
/// optional mask, composited in document order.
#[derive(Debug, Clone)]
pub struct Layer {
    /// ASCII display name, truncated to [`MAX_NAME_LEN`] characters.
    pub name: String,
    /// UTF-16 name; authoritative over the ASCII name when present.
    pub utf16_name: Option<Vec<u16>>,
    /// Bounding rectangle. May lie partially or fully outside the canvas.
    pub rect: Rect,
    pub blend_mode: BlendMode,
    pub opacity: u8,
    pub clipping: bool,
    pub visible: bool,
    pub locks: LockFlags,
    /// Layer type tag; 0 is a normal layer.
    pub layer_type: u32,
    pub sheet_color: SheetColor,
    pub adjustment: Option<BrightnessContrast>,
    pub mask: Option<LayerMask>,
    channels: [Option<Channel>; ChannelKind::SLOT_COUNT],
}

impl Layer {
    /// Create a layer with the given display name and defaults: normal
    /// blend mode, fully opaque, visible, unlocked, no channels.
    pub fn new(name: &str) -> Self {
        let ascii_name: String = name
            .chars()
            .filter(|c| c.is_ascii())
            .take(MAX_NAME_LEN)
            .collect();
        if ascii_name.len() < name.len() {
            tracing::warn!(name, "layer name truncated to {} ASCII characters", MAX_NAME_LEN);
        }

        Layer {
            name: ascii_name,
            utf16_name: None,
            rect: Rect::default(),
            blend_mode: BlendMode::Normal,
            opacity: 255,
            clipping: false,
            visible: true,
            locks: LockFlags::default(),
            layer_type: 0,
            sheet_color: SheetColor::None,
            adjustment: None,
            mask: None,
            channels: [None, None, None, None, None],
        }
    }

    /// Borrow the channel in the given slot, if populated.
    pub fn channel(&self, kind: ChannelKind) -> Option<&Channel> {
        self.channels[kind.slot()].as_ref()
    }

    /// Install a channel into its slot, dropping any previous occupant.
    pub fn set_channel(&mut self, kind: ChannelKind, channel: Channel) {
        self.channels[kind.slot()] = Some(channel);
    }

    /// Number of populated channel slots.
    pub fn channel_count(&self) -> usize {
        self.channels.iter().filter(|slot| slot.is_some()).count()
    }

    /// Iterate populated channels in slot order (R, G, B, A, mask).
    pub fn channels(&self) -> impl Iterator<Item = (ChannelKind, &Channel)> {
        const KINDS: [ChannelKind; ChannelKind::SLOT_COUNT] = [
            ChannelKind::Red,
            ChannelKind::Green,
            ChannelKind::Blue,
            ChannelKind::Alpha,
            ChannelKind::Mask,
        ];
        KINDS
            .into_iter()
            .zip(self.channels.iter())
            .filter_map(|(kind, entry)| entry.as_ref().map(|channel| (kind, channel)))
    }
}
