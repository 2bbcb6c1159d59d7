//! The four release styles.

use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// A release style, one per `(bold, italic)` combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    Regular,
    Italic,
    Bold,
    BoldItalic,
}

impl Style {
    pub const ALL: [Style; 4] = [Style::Regular, Style::Bold, Style::Italic, Style::BoldItalic];

    pub const fn new(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => Style::Regular,
            (false, true) => Style::Italic,
            (true, false) => Style::Bold,
            (true, true) => Style::BoldItalic,
        }
    }

    pub const fn is_bold(self) -> bool {
        matches!(self, Style::Bold | Style::BoldItalic)
    }

    pub const fn is_italic(self) -> bool {
        matches!(self, Style::Italic | Style::BoldItalic)
    }

    /// Display name, e.g. "Bold Italic".
    pub const fn name(self) -> &'static str {
        match self {
            Style::Regular => "Regular",
            Style::Italic => "Italic",
            Style::Bold => "Bold",
            Style::BoldItalic => "Bold Italic",
        }
    }

    /// Display name with spaces removed, for file and PostScript names.
    pub fn compact_name(self) -> String {
        self.name().replace(' ', "")
    }

    /// The same weight without the slant.
    pub const fn upright(self) -> Self {
        Style::new(self.is_bold(), false)
    }

    /// OS/2 usWeightClass.
    pub const fn weight_class(self) -> u16 {
        if self.is_bold() { 700 } else { 400 }
    }

    /// OS/2 fsSelection style bits.
    pub const fn style_map(self) -> u16 {
        match self {
            Style::Regular => 0x40,
            Style::Bold => 0x20,
            Style::Italic => 0x01,
            Style::BoldItalic => 0x21,
        }
    }

    /// PANOSE weight digit (5 = Book, 8 = Bold).
    pub const fn panose_weight(self) -> u8 {
        if self.is_bold() { 8 } else { 5 }
    }

    /// Spelling used on the command line.
    pub const fn cli_name(self) -> &'static str {
        match self {
            Style::Regular => "regular",
            Style::Italic => "italic",
            Style::Bold => "bold",
            Style::BoldItalic => "bold-italic",
        }
    }
}

impl Display for Style {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStyleError(String);

impl Display for ParseStyleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown style '{}', expected one of regular, bold, italic, bold-italic",
            self.0
        )
    }
}

impl std::error::Error for ParseStyleError {}

impl FromStr for Style {
    type Err = ParseStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Style::ALL
            .into_iter()
            .find(|style| style.cli_name() == s)
            .ok_or_else(|| ParseStyleError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_style_table() {
        assert_eq!(Style::new(false, false).name(), "Regular");
        assert_eq!(Style::new(false, true).name(), "Italic");
        assert_eq!(Style::new(true, false).name(), "Bold");
        assert_eq!(Style::new(true, true).name(), "Bold Italic");
    }

    #[test]
    fn test_names_are_distinct() {
        let names: HashSet<_> = Style::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_style_map_is_injective() {
        let maps: HashSet<_> = Style::ALL.iter().map(|s| s.style_map()).collect();
        assert_eq!(maps.len(), 4);
        assert_eq!(Style::BoldItalic.style_map(), 0x21);
    }

    #[test]
    fn test_flags_round_trip() {
        for style in Style::ALL {
            assert_eq!(Style::new(style.is_bold(), style.is_italic()), style);
        }
    }

    #[test]
    fn test_compact_name() {
        assert_eq!(Style::BoldItalic.compact_name(), "BoldItalic");
        assert_eq!(Style::Regular.compact_name(), "Regular");
    }

    #[test]
    fn test_weight() {
        assert_eq!(Style::Italic.weight_class(), 400);
        assert_eq!(Style::BoldItalic.weight_class(), 700);
        assert_eq!(Style::Bold.panose_weight(), 8);
        assert_eq!(Style::BoldItalic.upright(), Style::Bold);
    }

    #[test]
    fn test_parse() {
        assert_eq!("bold-italic".parse::<Style>(), Ok(Style::BoldItalic));
        assert_eq!("regular".parse::<Style>(), Ok(Style::Regular));
        assert!("Bold Italic".parse::<Style>().is_err());
    }
}
