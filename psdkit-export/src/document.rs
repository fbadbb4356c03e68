//! Export document: the entity tree and its mutation API.
//!
//! A document owns everything reachable from it: layers, channel planes,
//! alpha channels, metadata blobs. Buffers passed to the update calls move
//! into the model, so the previous occupant of a slot is released on
//! replacement and the caller keeps no alias into the stored data.
//!
//! Index-returning add operations assign the next free slot and fail with a
//! capacity error once the configured ceiling is reached; updates addressed
//! to an index that was never assigned fail without touching any entity.

use psdkit_core::{
    AlphaChannelMode, BlendMode, ChannelKind, ColorMode, Compression, Depth, Error, Rect, Result,
    SheetColor, SheetColorTable,
};

use crate::layer::{BrightnessContrast, Channel, ChannelData, Layer, LayerMask, LockFlags};

/// Capacity ceilings for the bounded collections of a document, mirroring
/// the practical limits of the target format.
#[derive(Debug, Clone, Copy)]
pub struct DocumentLimits {
    pub max_layers: usize,
    pub max_alpha_channels: usize,
    pub max_attributes: usize,
}

impl Default for DocumentLimits {
    fn default() -> Self {
        DocumentLimits {
            max_layers: 256,
            max_alpha_channels: 128,
            max_attributes: 128,
        }
    }
}

/// Free-form name/value metadata attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Resolution and display unit fields.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionInfo {
    /// Horizontal resolution in pixels per resolution unit.
    pub horizontal_res: f32,
    pub horizontal_unit: u16,
    pub width_unit: u16,
    /// Vertical resolution in pixels per resolution unit.
    pub vertical_res: f32,
    pub vertical_unit: u16,
    pub height_unit: u16,
}

/// JPEG-compressed document thumbnail.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

/// Full-canvas auxiliary channel not tied to a specific layer.
#[derive(Debug, Clone)]
pub struct AlphaChannel {
    pub name: String,
    /// 4-component color; interpretation depends on the channel mode.
    pub color: [u16; 4],
    pub opacity: u16,
    pub mode: AlphaChannelMode,
    pub data: Option<ChannelData>,
}

/// Three-plane composite image at canvas resolution.
#[derive(Debug, Clone)]
pub struct MergedImage {
    pub red: ChannelData,
    pub green: ChannelData,
    pub blue: ChannelData,
}

/// The top-level export entity owning all layers, channels, and metadata
/// for one output file.
#[derive(Debug)]
pub struct Document {
    width: u32,
    height: u32,
    depth: Depth,
    color_mode: ColorMode,
    limits: DocumentLimits,
    sheet_table: SheetColorTable,
    pub(crate) layers: Vec<Layer>,
    pub(crate) alpha_channels: Vec<AlphaChannel>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) resolution: Option<ResolutionInfo>,
    pub(crate) icc_profile: Option<Vec<u8>>,
    pub(crate) exif_data: Option<Vec<u8>>,
    pub(crate) thumbnail: Option<Thumbnail>,
    pub(crate) merged_image: Option<MergedImage>,
}

impl Document {
    /// Create an empty document with default capacity limits.
    pub fn new(width: u32, height: u32, depth: Depth, color_mode: ColorMode) -> Self {
        Self::with_limits(width, height, depth, color_mode, DocumentLimits::default())
    }

    /// Create an empty document with explicit capacity limits.
    pub fn with_limits(
        width: u32,
        height: u32,
        depth: Depth,
        color_mode: ColorMode,
        limits: DocumentLimits,
    ) -> Self {
        Document {
            width,
            height,
            depth,
            color_mode,
            limits,
            sheet_table: SheetColorTable::default(),
            layers: Vec::new(),
            alpha_channels: Vec::new(),
            attributes: Vec::new(),
            resolution: None,
            icc_profile: None,
            exif_data: None,
            thumbnail: None,
            merged_image: None,
        }
    }

    /// Canvas width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bits per channel.
    pub fn depth(&self) -> Depth {
        self.depth
    }

    /// Document color mode.
    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    /// Which sheet color table the serializer honors for this document.
    pub fn sheet_color_table(&self) -> SheetColorTable {
        self.sheet_table
    }

    /// Select which of the two observed sheet color tables to honor.
    pub fn set_sheet_color_table(&mut self, table: SheetColorTable) {
        self.sheet_table = table;
    }

    /// Number of layers added so far.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Number of alpha channels added so far.
    pub fn alpha_channel_count(&self) -> usize {
        self.alpha_channels.len()
    }

    /// Borrow a layer by index.
    pub fn layer(&self, index: usize) -> Result<&Layer> {
        self.layers.get(index).ok_or(Error::IndexOutOfRange {
            kind: "layer",
            index,
            count: self.layers.len(),
        })
    }

    /// Borrow an alpha channel by index.
    pub fn alpha_channel(&self, index: usize) -> Result<&AlphaChannel> {
        self.alpha_channels.get(index).ok_or(Error::IndexOutOfRange {
            kind: "alpha channel",
            index,
            count: self.alpha_channels.len(),
        })
    }

    /// Borrow an attribute by index.
    pub fn attribute(&self, index: usize) -> Result<&Attribute> {
        self.attributes.get(index).ok_or(Error::IndexOutOfRange {
            kind: "attribute",
            index,
            count: self.attributes.len(),
        })
    }

    fn layer_mut(&mut self, index: usize) -> Result<&mut Layer> {
        let count = self.layers.len();
        self.layers.get_mut(index).ok_or(Error::IndexOutOfRange {
            kind: "layer",
            index,
            count,
        })
    }

    // ----- attributes and document-level blobs -----

    /// Add a metadata attribute, returning its stable index. Name and value
    /// are copied.
    pub fn add_attribute(&mut self, name: &str, value: &str) -> Result<usize> {
        if self.attributes.len() >= self.limits.max_attributes {
            return Err(Error::CapacityExceeded {
                kind: "attributes",
                limit: self.limits.max_attributes,
            });
        }
        self.attributes.push(Attribute {
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(self.attributes.len() - 1)
    }

    /// Replace both name and value of the attribute at `index`.
    pub fn update_attribute(&mut self, index: usize, name: &str, value: &str) -> Result<()> {
        let count = self.attributes.len();
        let attribute = self.attributes.get_mut(index).ok_or(Error::IndexOutOfRange {
            kind: "attribute",
            index,
            count,
        })?;
        attribute.name = name.to_string();
        attribute.value = value.to_string();
        Ok(())
    }

    /// Set the resolution info fields.
    pub fn set_resolution_info(&mut self, info: ResolutionInfo) {
        self.resolution = Some(info);
    }

    /// Set the ICC profile. The bytes are copied in; a previously held
    /// profile is released.
    pub fn set_icc_profile(&mut self, profile: &[u8]) {
        self.icc_profile = Some(profile.to_vec());
    }

    /// Set the EXIF blob. The bytes are copied in; a previously held blob
    /// is released.
    pub fn set_exif_data(&mut self, exif: &[u8]) {
        self.exif_data = Some(exif.to_vec());
    }

    /// Set the JPEG thumbnail. The bytes are copied in; a previously held
    /// thumbnail is released.
    pub fn set_jpeg_thumbnail(&mut self, width: u32, height: u32, jpeg: &[u8]) {
        self.thumbnail = Some(Thumbnail {
            width,
            height,
            jpeg: jpeg.to_vec(),
        });
    }

    // ----- layers -----

    /// Append a layer, returning its stable index.
    pub fn add_layer(&mut self, name: &str) -> Result<usize> {
        if self.layers.len() >= self.limits.max_layers {
            return Err(Error::CapacityExceeded {
                kind: "layers",
                limit: self.limits.max_layers,
            });
        }
        self.layers.push(Layer::new(name));
        Ok(self.layers.len() - 1)
    }

    /// Set a layer's UTF-16 name. The UTF-16 name is authoritative over the
    /// ASCII name when present.
    pub fn update_layer_utf16_name(&mut self, index: usize, name: &str) -> Result<()> {
        self.layer_mut(index)?.utf16_name = Some(name.encode_utf16().collect());
        Ok(())
    }

    /// Set a layer's lock flags.
    pub fn update_layer_locks(
        &mut self,
        index: usize,
        transparency: bool,
        composite: bool,
        position: bool,
    ) -> Result<()> {
        self.layer_mut(index)?.locks = LockFlags {
            transparency,
            composite,
            position,
        };
        Ok(())
    }

    /// Set a layer's sheet color.
    pub fn update_layer_sheet_color(&mut self, index: usize, color: SheetColor) -> Result<()> {
        self.layer_mut(index)?.sheet_color = color;
        Ok(())
    }

    /// Set a layer's type tag. 0 is a normal layer.
    pub fn update_layer_type(&mut self, index: usize, layer_type: u32) -> Result<()> {
        self.layer_mut(index)?.layer_type = layer_type;
        Ok(())
    }

    /// Set a layer's mask geometry. Mask pixel data is supplied separately
    /// through the mask channel slot.
    pub fn update_layer_mask(
        &mut self,
        index: usize,
        rect: Rect,
        default_color: u8,
        linked: bool,
    ) -> Result<()> {
        rect.validate()?;
        self.layer_mut(index)?.mask = Some(LayerMask {
            rect,
            default_color,
            linked,
        });
        Ok(())
    }

    /// Set a layer's blend mode.
    pub fn update_layer_blend_mode(&mut self, index: usize, mode: BlendMode) -> Result<()> {
        self.layer_mut(index)?.blend_mode = mode;
        Ok(())
    }

    /// Set a layer's opacity. 0 is transparent, 255 opaque.
    pub fn update_layer_opacity(&mut self, index: usize, opacity: u8) -> Result<()> {
        self.layer_mut(index)?.opacity = opacity;
        Ok(())
    }

    /// Set whether the layer clips to the layer below.
    pub fn update_layer_clipping(&mut self, index: usize, clipped: bool) -> Result<()> {
        self.layer_mut(index)?.clipping = clipped;
        Ok(())
    }

    /// Set a layer's visibility.
    pub fn update_layer_visibility(&mut self, index: usize, visible: bool) -> Result<()> {
        self.layer_mut(index)?.visible = visible;
        Ok(())
    }

    /// Attach a brightness/contrast adjustment payload to the layer.
    pub fn update_layer_brightness_contrast(
        &mut self,
        index: usize,
        brightness: i16,
        contrast: i16,
    ) -> Result<()> {
        self.layer_mut(index)?.adjustment = Some(BrightnessContrast {
            brightness,
            contrast,
        });
        Ok(())
    }

    /// Update a layer channel with 8-bit planar data, taking ownership of
    /// the buffer. The buffer must hold exactly `rect.samples()` bytes.
    pub fn update_layer_channel_8(
        &mut self,
        index: usize,
        kind: ChannelKind,
        rect: Rect,
        data: Vec<u8>,
        compression: Compression,
    ) -> Result<()> {
        self.update_layer_channel(index, kind, rect, ChannelData::U8(data), compression)
    }

    /// Update a layer channel with 16-bit planar data, taking ownership of
    /// the buffer. The buffer must hold exactly `rect.samples()` samples.
    pub fn update_layer_channel_16(
        &mut self,
        index: usize,
        kind: ChannelKind,
        rect: Rect,
        data: Vec<u16>,
        compression: Compression,
    ) -> Result<()> {
        self.update_layer_channel(index, kind, rect, ChannelData::U16(data), compression)
    }

    /// Update a layer channel with 32-bit float planar data, taking
    /// ownership of the buffer. The buffer must hold exactly
    /// `rect.samples()` samples.
    pub fn update_layer_channel_32(
        &mut self,
        index: usize,
        kind: ChannelKind,
        rect: Rect,
        data: Vec<f32>,
        compression: Compression,
    ) -> Result<()> {
        self.update_layer_channel(index, kind, rect, ChannelData::F32(data), compression)
    }

    fn update_layer_channel(
        &mut self,
        index: usize,
        kind: ChannelKind,
        rect: Rect,
        data: ChannelData,
        compression: Compression,
    ) -> Result<()> {
        rect.validate()?;
        self.check_depth(&data)?;
        check_compression(compression)?;
        if data.samples() != rect.samples() {
            return Err(Error::BufferSize {
                expected: rect.samples() * self.depth.bytes_per_sample(),
                actual: data.byte_len(),
            });
        }

        let layer = self.layer_mut(index)?;
        if kind == ChannelKind::Mask {
            // Mask data is bound to the mask geometry, not the layer rect.
            let mask = layer.mask.ok_or_else(|| {
                Error::unsupported("mask geometry must be set before mask channel data")
            })?;
            if rect != mask.rect {
                return Err(Error::InvalidRect {
                    top: rect.top,
                    left: rect.left,
                    bottom: rect.bottom,
                    right: rect.right,
                });
            }
        } else {
            layer.rect = rect;
        }
        layer.set_channel(kind, Channel { data, compression });
        Ok(())
    }

    // ----- alpha channels -----

    /// Add a document alpha channel, returning its stable index.
    pub fn add_alpha_channel(
        &mut self,
        name: &str,
        color: [u16; 4],
        opacity: u16,
        mode: AlphaChannelMode,
    ) -> Result<usize> {
        if self.alpha_channels.len() >= self.limits.max_alpha_channels {
            return Err(Error::CapacityExceeded {
                kind: "alpha channels",
                limit: self.limits.max_alpha_channels,
            });
        }
        self.alpha_channels.push(AlphaChannel {
            name: name.to_string(),
            color,
            opacity,
            mode,
            data: None,
        });
        Ok(self.alpha_channels.len() - 1)
    }

    /// Update an alpha channel with 8-bit full-canvas data, taking
    /// ownership of the buffer.
    pub fn update_alpha_channel_8(&mut self, index: usize, data: Vec<u8>) -> Result<()> {
        self.update_alpha_channel(index, ChannelData::U8(data))
    }

    /// Update an alpha channel with 16-bit full-canvas data, taking
    /// ownership of the buffer.
    pub fn update_alpha_channel_16(&mut self, index: usize, data: Vec<u16>) -> Result<()> {
        self.update_alpha_channel(index, ChannelData::U16(data))
    }

    /// Update an alpha channel with 32-bit float full-canvas data, taking
    /// ownership of the buffer.
    pub fn update_alpha_channel_32(&mut self, index: usize, data: Vec<f32>) -> Result<()> {
        self.update_alpha_channel(index, ChannelData::F32(data))
    }

    fn update_alpha_channel(&mut self, index: usize, data: ChannelData) -> Result<()> {
        self.check_depth(&data)?;
        self.check_canvas_plane(&data)?;
        let count = self.alpha_channels.len();
        let channel = self
            .alpha_channels
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange {
                kind: "alpha channel",
                index,
                count,
            })?;
        channel.data = Some(data);
        Ok(())
    }

    // ----- merged image -----

    /// Replace the three merged image planes atomically: all planes are
    /// validated before any previous plane is released, so a rejected call
    /// leaves the prior merged image intact.
    pub fn update_merged_image_8(
        &mut self,
        red: Vec<u8>,
        green: Vec<u8>,
        blue: Vec<u8>,
    ) -> Result<()> {
        self.update_merged_image(
            ChannelData::U8(red),
            ChannelData::U8(green),
            ChannelData::U8(blue),
        )
    }

    /// 16-bit variant of [`Document::update_merged_image_8`].
    pub fn update_merged_image_16(
        &mut self,
        red: Vec<u16>,
        green: Vec<u16>,
        blue: Vec<u16>,
    ) -> Result<()> {
        self.update_merged_image(
            ChannelData::U16(red),
            ChannelData::U16(green),
            ChannelData::U16(blue),
        )
    }

    /// 32-bit float variant of [`Document::update_merged_image_8`].
    pub fn update_merged_image_32(
        &mut self,
        red: Vec<f32>,
        green: Vec<f32>,
        blue: Vec<f32>,
    ) -> Result<()> {
        self.update_merged_image(
            ChannelData::F32(red),
            ChannelData::F32(green),
            ChannelData::F32(blue),
        )
    }

    fn update_merged_image(
        &mut self,
        red: ChannelData,
        green: ChannelData,
        blue: ChannelData,
    ) -> Result<()> {
        for plane in [&red, &green, &blue] {
            self.check_depth(plane)?;
            self.check_canvas_plane(plane)?;
        }
        self.merged_image = Some(MergedImage { red, green, blue });
        Ok(())
    }

    // ----- validation helpers -----

    fn check_depth(&self, data: &ChannelData) -> Result<()> {
        if data.depth_bits() != self.depth.to_u16() {
            return Err(Error::DepthMismatch {
                document: self.depth.to_u16(),
                supplied: data.depth_bits(),
            });
        }
        Ok(())
    }

    fn check_canvas_plane(&self, data: &ChannelData) -> Result<()> {
        let expected = self.width as usize * self.height as usize;
        if data.samples() != expected {
            return Err(Error::BufferSize {
                expected: expected * self.depth.bytes_per_sample(),
                actual: data.byte_len(),
            });
        }
        Ok(())
    }
}

fn check_compression(compression: Compression) -> Result<()> {
    if compression == Compression::ZipPrediction {
        return Err(Error::unsupported(
            "ZIP-with-prediction compression is not available for export",
        ));
    }
    Ok(())
}
