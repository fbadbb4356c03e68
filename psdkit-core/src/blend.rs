//! Blend mode key lookup.
//!
//! Blend modes are identified in the file by a four-byte key. This module is
//! a stateless bidirectional table between those keys and symbolic values.

/// Layer blend mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    PassThrough,
    #[default]
    Normal,
    Dissolve,
    Darken,
    Multiply,
    ColorBurn,
    LinearBurn,
    DarkerColor,
    Lighten,
    Screen,
    ColorDodge,
    LinearDodge,
    LighterColor,
    Overlay,
    SoftLight,
    HardLight,
    VividLight,
    LinearLight,
    PinLight,
    HardMix,
    Difference,
    Exclusion,
    Subtract,
    Divide,
    Hue,
    Saturation,
    Color,
    Luminosity,
    /// Sentinel for keys not in the table.
    Unknown,
}

impl BlendMode {
    /// Look up the blend mode for a four-byte key. Unknown keys map to
    /// [`BlendMode::Unknown`].
    pub fn from_key(key: [u8; 4]) -> Self {
        match &key {
            b"pass" => BlendMode::PassThrough,
            b"norm" => BlendMode::Normal,
            b"diss" => BlendMode::Dissolve,
            b"dark" => BlendMode::Darken,
            b"mul " => BlendMode::Multiply,
            b"idiv" => BlendMode::ColorBurn,
            b"lbrn" => BlendMode::LinearBurn,
            b"dkCl" => BlendMode::DarkerColor,
            b"lite" => BlendMode::Lighten,
            b"scrn" => BlendMode::Screen,
            b"div " => BlendMode::ColorDodge,
            b"lddg" => BlendMode::LinearDodge,
            b"lgCl" => BlendMode::LighterColor,
            b"over" => BlendMode::Overlay,
            b"sLit" => BlendMode::SoftLight,
            b"hLit" => BlendMode::HardLight,
            b"vLit" => BlendMode::VividLight,
            b"lLit" => BlendMode::LinearLight,
            b"pLit" => BlendMode::PinLight,
            b"hMix" => BlendMode::HardMix,
            b"diff" => BlendMode::Difference,
            b"smud" => BlendMode::Exclusion,
            b"fsub" => BlendMode::Subtract,
            b"fdiv" => BlendMode::Divide,
            b"hue " => BlendMode::Hue,
            b"sat " => BlendMode::Saturation,
            b"colr" => BlendMode::Color,
            b"lum " => BlendMode::Luminosity,
            _ => BlendMode::Unknown,
        }
    }

    /// Four-byte key for this blend mode. [`BlendMode::Unknown`] maps to the
    /// all-zero key.
    pub fn to_key(self) -> [u8; 4] {
        match self {
            BlendMode::PassThrough => *b"pass",
            BlendMode::Normal => *b"norm",
            BlendMode::Dissolve => *b"diss",
            BlendMode::Darken => *b"dark",
            BlendMode::Multiply => *b"mul ",
            BlendMode::ColorBurn => *b"idiv",
            BlendMode::LinearBurn => *b"lbrn",
            BlendMode::DarkerColor => *b"dkCl",
            BlendMode::Lighten => *b"lite",
            BlendMode::Screen => *b"scrn",
            BlendMode::ColorDodge => *b"div ",
            BlendMode::LinearDodge => *b"lddg",
            BlendMode::LighterColor => *b"lgCl",
            BlendMode::Overlay => *b"over",
            BlendMode::SoftLight => *b"sLit",
            BlendMode::HardLight => *b"hLit",
            BlendMode::VividLight => *b"vLit",
            BlendMode::LinearLight => *b"lLit",
            BlendMode::PinLight => *b"pLit",
            BlendMode::HardMix => *b"hMix",
            BlendMode::Difference => *b"diff",
            BlendMode::Exclusion => *b"smud",
            BlendMode::Subtract => *b"fsub",
            BlendMode::Divide => *b"fdiv",
            BlendMode::Hue => *b"hue ",
            BlendMode::Saturation => *b"sat ",
            BlendMode::Color => *b"colr",
            BlendMode::Luminosity => *b"lum ",
            BlendMode::Unknown => [0; 4],
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::PassThrough => "Pass Through",
            BlendMode::Normal => "Normal",
            BlendMode::Dissolve => "Dissolve",
            BlendMode::Darken => "Darken",
            BlendMode::Multiply => "Multiply",
            BlendMode::ColorBurn => "Color Burn",
            BlendMode::LinearBurn => "Linear Burn",
            BlendMode::DarkerColor => "Darker Color",
            BlendMode::Lighten => "Lighten",
            BlendMode::Screen => "Screen",
            BlendMode::ColorDodge => "Color Dodge",
            BlendMode::LinearDodge => "Linear Dodge",
            BlendMode::LighterColor => "Lighter Color",
            BlendMode::Overlay => "Overlay",
            BlendMode::SoftLight => "Soft Light",
            BlendMode::HardLight => "Hard Light",
            BlendMode::VividLight => "Vivid Light",
            BlendMode::LinearLight => "Linear Light",
            BlendMode::PinLight => "Pin Light",
            BlendMode::HardMix => "Hard Mix",
            BlendMode::Difference => "Difference",
            BlendMode::Exclusion => "Exclusion",
            BlendMode::Subtract => "Subtract",
            BlendMode::Divide => "Divide",
            BlendMode::Hue => "Hue",
            BlendMode::Saturation => "Saturation",
            BlendMode::Color => "Color",
            BlendMode::Luminosity => "Luminosity",
            BlendMode::Unknown => "Unknown",
        }
    }

    /// Fixed 4-character short rendering, space-padded, matching the key.
    pub fn short_name(&self) -> &'static str {
        match self {
            BlendMode::PassThrough => "pass",
            BlendMode::Normal => "norm",
            BlendMode::Dissolve => "diss",
            BlendMode::Darken => "dark",
            BlendMode::Multiply => "mul ",
            BlendMode::ColorBurn => "idiv",
            BlendMode::LinearBurn => "lbrn",
            BlendMode::DarkerColor => "dkCl",
            BlendMode::Lighten => "lite",
            BlendMode::Screen => "scrn",
            BlendMode::ColorDodge => "div ",
            BlendMode::LinearDodge => "lddg",
            BlendMode::LighterColor => "lgCl",
            BlendMode::Overlay => "over",
            BlendMode::SoftLight => "sLit",
            BlendMode::HardLight => "hLit",
            BlendMode::VividLight => "vLit",
            BlendMode::LinearLight => "lLit",
            BlendMode::PinLight => "pLit",
            BlendMode::HardMix => "hMix",
            BlendMode::Difference => "diff",
            BlendMode::Exclusion => "smud",
            BlendMode::Subtract => "fsub",
            BlendMode::Divide => "fdiv",
            BlendMode::Hue => "hue ",
            BlendMode::Saturation => "sat ",
            BlendMode::Color => "colr",
            BlendMode::Luminosity => "lum ",
            BlendMode::Unknown => "unkn",
        }
    }

    /// All known blend modes, excluding the sentinel.
    pub fn all() -> &'static [BlendMode] {
        &[
            BlendMode::PassThrough,
            BlendMode::Normal,
            BlendMode::Dissolve,
            BlendMode::Darken,
            BlendMode::Multiply,
            BlendMode::ColorBurn,
            BlendMode::LinearBurn,
            BlendMode::DarkerColor,
            BlendMode::Lighten,
            BlendMode::Screen,
            BlendMode::ColorDodge,
            BlendMode::LinearDodge,
            BlendMode::LighterColor,
            BlendMode::Overlay,
            BlendMode::SoftLight,
            BlendMode::HardLight,
            BlendMode::VividLight,
            BlendMode::LinearLight,
            BlendMode::PinLight,
            BlendMode::HardMix,
            BlendMode::Difference,
            BlendMode::Exclusion,
            BlendMode::Subtract,
            BlendMode::Divide,
            BlendMode::Hue,
            BlendMode::Saturation,
            BlendMode::Color,
            BlendMode::Luminosity,
        ]
    }
}
