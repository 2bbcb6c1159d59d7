//! The boundary between the composition core and the font engine.
//!
//! The core decides which glyphs, codepoints and table values take part in
//! the build; everything that touches outlines or binary tables happens behind
//! [`Font`] and [`FontEngine`].

use std::{
    error,
    fmt::{self, Display, Formatter},
    path::Path,
};

use kurbo::{Affine, Rect};

use crate::glyph_set::GlyphSet;

/// Index of a glyph slot within one font.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphId(pub u32);

impl GlyphId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }

    pub const fn to_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for GlyphId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for GlyphId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "GID{}", self.0)
    }
}

/// A Unicode codepoint
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Codepoint(pub u32);

impl Codepoint {
    pub const fn new(cp: u32) -> Self {
        Self(cp)
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }

    /// Convert to a Rust char if valid
    pub fn to_char(self) -> Option<char> {
        char::from_u32(self.0)
    }
}

impl From<char> for Codepoint {
    fn from(c: char) -> Self {
        Self(c as u32)
    }
}

impl Display for Codepoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "U+{:04X}", self.0)
    }
}

/// Layout table a lookup belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LookupKind {
    Substitution,
    Positioning,
}

/// Identifies one lookup of one font.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LookupId {
    pub kind: LookupKind,
    pub index: u16,
}

impl LookupId {
    pub const fn new(kind: LookupKind, index: u16) -> Self {
        Self { kind, index }
    }
}

impl Display for LookupId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let table = match self.kind {
            LookupKind::Substitution => "GSUB",
            LookupKind::Positioning => "GPOS",
        };
        write!(f, "{table} lookup {}", self.index)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PosSubKind {
    /// One glyph replaced by exactly one other.
    Substitution,
    /// One glyph replaced by a choice of alternates; `target` is the first.
    AlternateSubstitution,
}

/// One substitution rule a glyph takes part in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PosSubEntry {
    pub lookup: LookupId,
    /// Rule name, prefixed by the quoted feature tag, e.g. `'tnum' lookup 12`.
    pub rule: String,
    pub kind: PosSubKind,
    pub target: GlyphId,
}

/// Snapshot of one glyph slot.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphRef {
    pub id: GlyphId,
    pub name: String,
    /// Primary codepoint; `None` for unencoded glyphs.
    pub codepoint: Option<Codepoint>,
    /// The glyph has visible content or a semantic role.
    pub worth_outputting: bool,
    pub pos_sub: Vec<PosSubEntry>,
}

impl GlyphRef {
    /// Returns the codepoint if it is a real (positive) one.
    pub fn valid_codepoint(&self) -> Option<Codepoint> {
        self.codepoint.filter(|cp| cp.to_u32() > 0)
    }
}

/// Ascent and descent of a design grid. Their sum is the em size.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EmMetrics {
    pub ascent: u16,
    pub descent: u16,
}

impl EmMetrics {
    pub const fn new(ascent: u16, descent: u16) -> Self {
        Self { ascent, descent }
    }

    pub const fn em(&self) -> u16 {
        self.ascent + self.descent
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TransformOptions {
    /// Leave advance widths untouched.
    pub preserve_advance: bool,
}

impl TransformOptions {
    pub const NO_WIDTH: Self = Self { preserve_advance: true };
}

/// Language of a naming-table entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Locale {
    EnglishUs,
    Japanese,
}

impl Locale {
    /// Windows platform language ID.
    pub const fn windows_language_id(self) -> u16 {
        match self {
            Locale::EnglishUs => 0x0409,
            Locale::Japanese => 0x0411,
        }
    }

    pub const fn from_windows_language_id(id: u16) -> Option<Self> {
        match id {
            0x0409 => Some(Locale::EnglishUs),
            0x0411 => Some(Locale::Japanese),
            _ => None,
        }
    }
}

/// Naming-table record IDs written by the release build.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NameId {
    Copyright,
    Family,
    SubFamily,
    UniqueId,
    FullName,
    Version,
    PostScriptName,
    Trademark,
    Manufacturer,
    Designer,
    VendorUrl,
    DesignerUrl,
    License,
    LicenseUrl,
}

impl NameId {
    pub const ALL: [NameId; 14] = [
        NameId::Copyright,
        NameId::Family,
        NameId::SubFamily,
        NameId::UniqueId,
        NameId::FullName,
        NameId::Version,
        NameId::PostScriptName,
        NameId::Trademark,
        NameId::Manufacturer,
        NameId::Designer,
        NameId::VendorUrl,
        NameId::DesignerUrl,
        NameId::License,
        NameId::LicenseUrl,
    ];

    pub fn from_u16(id: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|name_id| name_id.to_u16() == id)
    }

    pub const fn to_u16(self) -> u16 {
        match self {
            NameId::Copyright => 0,
            NameId::Family => 1,
            NameId::SubFamily => 2,
            NameId::UniqueId => 3,
            NameId::FullName => 4,
            NameId::Version => 5,
            NameId::PostScriptName => 6,
            NameId::Trademark => 7,
            NameId::Manufacturer => 8,
            NameId::Designer => 9,
            NameId::VendorUrl => 11,
            NameId::DesignerUrl => 12,
            NameId::License => 13,
            NameId::LicenseUrl => 14,
        }
    }
}

/// One naming-table entry. An empty value means "inherit the font-level default".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameEntry {
    pub locale: Locale,
    pub id: NameId,
    pub value: String,
}

impl NameEntry {
    pub fn new(locale: Locale, id: NameId, value: impl Into<String>) -> Self {
        Self { locale, id, value: value.into() }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Os2Info {
    pub weight_class: u16,
    pub vendor: [u8; 4],
    /// fsSelection style bits (italic 0x01, bold 0x20, regular 0x40).
    pub style_map: u16,
    pub win_ascent: u16,
    pub win_descent: u16,
    pub typo_ascent: i16,
    pub typo_descent: i16,
    pub typo_line_gap: i16,
    pub cap_height: i16,
    pub x_height: i16,
    pub panose: [u8; 10],
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HheaInfo {
    pub ascent: i16,
    pub descent: i16,
    pub line_gap: i16,
}

/// Naming, versioning and metric fields of a font.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FontInfo {
    /// PostScript font name.
    pub font_name: String,
    pub family_name: String,
    pub full_name: String,
    pub version: String,
    /// `head.fontRevision`; `None` keeps the value read from the source.
    pub revision: Option<f64>,
    pub copyright: String,
    pub names: Vec<NameEntry>,
    pub italic_angle: f64,
    pub os2: Os2Info,
    pub hhea: HheaInfo,
}

/// A font held open by the engine.
pub trait Font {
    fn em(&self) -> u16;

    /// Change the em size, rescaling outlines and advances.
    fn set_em(&mut self, em: u16);

    fn metrics(&self) -> EmMetrics;

    fn set_metrics(&mut self, metrics: EmMetrics);

    fn glyphs(&self) -> Vec<GlyphRef>;

    /// Number of glyph slots, cleared ones included.
    fn num_glyphs(&self) -> usize;

    fn glyph_by_codepoint(&self, codepoint: Codepoint) -> Option<GlyphId>;

    /// Replace component references in `glyphs` by the outlines they point to.
    fn unlink_references(&mut self, glyphs: &GlyphSet);

    /// Copy the outline and advance of `from` onto `to`.
    ///
    /// Returns `false` if either glyph does not exist.
    fn copy_glyph(&mut self, from: GlyphId, to: GlyphId) -> bool;

    /// Empty a glyph slot: outline, advance and encoding. The slot itself stays.
    fn clear_glyph(&mut self, glyph: GlyphId);

    fn lookups(&self, kind: LookupKind) -> Vec<LookupId>;

    /// Remove a lookup with all of its subtables.
    fn remove_lookup(&mut self, lookup: LookupId);

    fn transform(&mut self, glyphs: &GlyphSet, affine: Affine, options: TransformOptions);

    fn bounding_box(&self, glyph: GlyphId) -> Option<Rect>;

    fn info(&self) -> &FontInfo;

    fn info_mut(&mut self) -> &mut FontInfo;
}

/// Opens, merges and serializes fonts.
pub trait FontEngine {
    type Font: Font;
    type Error: error::Error + Send + Sync + 'static;

    /// Extension of the files written by [`FontEngine::save`].
    const INTERCHANGE_EXTENSION: &'static str;

    fn open(&self, path: &Path) -> Result<Self::Font, Self::Error>;

    /// Write `font` in the interchange format read back by [`FontEngine::merge_from`].
    fn save(&self, font: &Self::Font, path: &Path) -> Result<(), Self::Error>;

    /// Add the glyphs of the font stored at `path` to `primary`.
    fn merge_from(&self, primary: &mut Self::Font, path: &Path) -> Result<(), Self::Error>;

    /// Write the release binary.
    fn generate(&self, font: &Self::Font, path: &Path) -> Result<(), Self::Error>;
}
