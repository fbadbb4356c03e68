//! Sheet color key lookup.
//!
//! The sheet color is the small tag shown next to a layer in the layer
//! browser. Two variants of this table exist in the wild and they disagree
//! both on the set of named colors and on where unrecognized keys land:
//!
//! - [`SheetColorTable::Compact`] knows 8 names (keys 0-7) and maps any
//!   other key to [`SheetColor::Unknown`].
//! - [`SheetColorTable::Extended`] knows 12 names (keys 0-11) and maps any
//!   other key to [`SheetColor::None`].
//!
//! Neither variant is preferred here; the caller picks one at integration
//! time and the choice travels with the document.

/// Symbolic sheet color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetColor {
    #[default]
    None,
    Red,
    Orange,
    Yellow,
    Green,
    Seafoam,
    Blue,
    Indigo,
    Magenta,
    Fuchsia,
    Violet,
    Gray,
    /// Sentinel for keys the compact table does not name.
    Unknown,
}

/// Which of the two observed sheet color tables to honor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetColorTable {
    /// 8 named colors, unknown keys map to [`SheetColor::Unknown`].
    #[default]
    Compact,
    /// 12 named colors, unknown keys map to [`SheetColor::None`].
    Extended,
}

impl SheetColorTable {
    /// Look up the symbolic color for a key under this table.
    pub fn to_symbol(self, key: u16) -> SheetColor {
        match self {
            SheetColorTable::Compact => match key {
                0 => SheetColor::None,
                1 => SheetColor::Red,
                2 => SheetColor::Orange,
                3 => SheetColor::Yellow,
                4 => SheetColor::Green,
                5 => SheetColor::Blue,
                6 => SheetColor::Violet,
                7 => SheetColor::Gray,
                _ => SheetColor::Unknown,
            },
            SheetColorTable::Extended => match key {
                0 => SheetColor::None,
                1 => SheetColor::Red,
                2 => SheetColor::Orange,
                3 => SheetColor::Yellow,
                4 => SheetColor::Green,
                5 => SheetColor::Seafoam,
                6 => SheetColor::Blue,
                7 => SheetColor::Indigo,
                8 => SheetColor::Magenta,
                9 => SheetColor::Fuchsia,
                10 => SheetColor::Violet,
                11 => SheetColor::Gray,
                _ => SheetColor::None,
            },
        }
    }

    /// Key written into the file for a symbolic color under this table.
    ///
    /// Colors the table does not name (including the sentinels) fall back
    /// to the key for no color.
    pub fn to_key(self, color: SheetColor) -> u16 {
        match self {
            SheetColorTable::Compact => match color {
                SheetColor::Red => 1,
                SheetColor::Orange => 2,
                SheetColor::Yellow => 3,
                SheetColor::Green => 4,
                SheetColor::Blue => 5,
                SheetColor::Violet => 6,
                SheetColor::Gray => 7,
                _ => 0,
            },
            SheetColorTable::Extended => match color {
                SheetColor::Red => 1,
                SheetColor::Orange => 2,
                SheetColor::Yellow => 3,
                SheetColor::Green => 4,
                SheetColor::Seafoam => 5,
                SheetColor::Blue => 6,
                SheetColor::Indigo => 7,
                SheetColor::Magenta => 8,
                SheetColor::Fuchsia => 9,
                SheetColor::Violet => 10,
                SheetColor::Gray => 11,
                _ => 0,
            },
        }
    }
}
