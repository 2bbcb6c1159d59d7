//! Metadata synthesizer: release names, versions and OS/2 / hhea metrics.

use log::info;

use crate::{
    Error, Result,
    config::{
        COPYRIGHT, DESIGNER, EM_METRICS, FONT_ASCENT, FONT_DESCENT, LICENSE, LICENSE_URL,
        MANUFACTURER, RELEASE_FAMILYNAME, TRADEMARK, VENDOR_ID,
    },
    font::{Codepoint, Font, FontInfo, HheaInfo, Locale, NameEntry, NameId, Os2Info},
    style::Style,
};

/// Glyph whose top defines the cap height.
pub const CAP_HEIGHT_GLYPH: char = 'H';
/// Glyph whose top defines the x-height.
pub const X_HEIGHT_GLYPH: char = 'x';

/// Heights measured on the merged font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceHeights {
    pub cap_height: i16,
    pub x_height: i16,
}

impl ReferenceHeights {
    pub fn measure(font: &impl Font) -> Result<Self> {
        Ok(Self {
            cap_height: glyph_top(font, CAP_HEIGHT_GLYPH)?,
            x_height: glyph_top(font, X_HEIGHT_GLYPH)?,
        })
    }
}

fn glyph_top(font: &impl Font, c: char) -> Result<i16> {
    let codepoint = Codepoint::from(c);
    font.glyph_by_codepoint(codepoint)
        .and_then(|glyph| font.bounding_box(glyph))
        .map(|bbox| bbox.y1.round() as i16)
        .ok_or(Error::MissingReferenceGlyph { codepoint })
}

/// PostScript name, e.g. `HibizukaiSans-BoldItalic`.
pub fn font_name(style: Style) -> String {
    format!("{RELEASE_FAMILYNAME}-{}", style.compact_name())
}

/// Human-readable full name, e.g. `HibizukaiSans BoldItalic`.
pub fn full_name(style: Style) -> String {
    format!("{RELEASE_FAMILYNAME} {}", style.compact_name())
}

/// `head.fontRevision` for a version string, when it is a plain number.
pub fn revision(version: &str) -> Option<f64> {
    version.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn name_entries(style: Style, version: &str) -> Vec<NameEntry> {
    use Locale::{EnglishUs, Japanese};

    let compact = style.compact_name();
    let version_string = format!("Version {version}");
    vec![
        NameEntry::new(EnglishUs, NameId::Copyright, ""),
        NameEntry::new(EnglishUs, NameId::Family, ""),
        NameEntry::new(EnglishUs, NameId::SubFamily, style.name()),
        NameEntry::new(EnglishUs, NameId::UniqueId, format!("{version};HBZS;{compact}")),
        NameEntry::new(EnglishUs, NameId::FullName, ""),
        NameEntry::new(EnglishUs, NameId::Version, version_string.clone()),
        NameEntry::new(EnglishUs, NameId::Trademark, TRADEMARK),
        NameEntry::new(EnglishUs, NameId::Manufacturer, MANUFACTURER),
        NameEntry::new(EnglishUs, NameId::Designer, DESIGNER),
        NameEntry::new(EnglishUs, NameId::VendorUrl, ""),
        NameEntry::new(EnglishUs, NameId::DesignerUrl, ""),
        NameEntry::new(EnglishUs, NameId::License, LICENSE),
        NameEntry::new(EnglishUs, NameId::LicenseUrl, LICENSE_URL),
        NameEntry::new(Japanese, NameId::Copyright, ""),
        NameEntry::new(Japanese, NameId::Family, RELEASE_FAMILYNAME),
        NameEntry::new(Japanese, NameId::SubFamily, style.name()),
        NameEntry::new(Japanese, NameId::FullName, full_name(style)),
        NameEntry::new(Japanese, NameId::Version, version_string),
    ]
}

/// Overwrite every release field of `info`. Fields not named here are kept.
pub fn write_release_info(info: &mut FontInfo, style: Style, version: &str, heights: ReferenceHeights) {
    info.font_name = font_name(style);
    info.family_name = RELEASE_FAMILYNAME.replace('-', " ");
    info.full_name = full_name(style);
    info.version = version.to_string();
    info.revision = revision(version);
    info.copyright = COPYRIGHT.to_string();
    info.names = name_entries(style, version);

    info.os2 = Os2Info {
        weight_class: style.weight_class(),
        vendor: VENDOR_ID,
        style_map: style.style_map(),
        win_ascent: FONT_ASCENT,
        win_descent: FONT_DESCENT,
        typo_ascent: EM_METRICS.ascent as i16,
        typo_descent: -(EM_METRICS.descent as i16),
        typo_line_gap: 0,
        cap_height: heights.cap_height,
        x_height: heights.x_height,
        panose: [2, 11, style.panose_weight(), 3, 0, 0, 0, 0, 0, 0],
    };
    info.hhea = HheaInfo {
        ascent: FONT_ASCENT as i16,
        descent: -(FONT_DESCENT as i16),
        line_gap: 0,
    };
}

/// Measure the reference glyphs of `font` and write the release metadata.
pub fn apply_release_metadata(font: &mut impl Font, style: Style, version: &str) -> Result<()> {
    let heights = ReferenceHeights::measure(font)?;
    write_release_info(font.info_mut(), style, version, heights);
    info!(
        "Metadata: {} (cap height {}, x-height {})",
        font.info().font_name,
        heights.cap_height,
        heights.x_height
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockFont, MockGlyph};

    fn font() -> MockFont {
        MockFont::new(vec![
            MockGlyph::new(".notdef"),
            MockGlyph::new("H").codepoint(0x48).outline(&[(150.0, 0.0), (1250.0, 1490.4)]),
            MockGlyph::new("x").codepoint(0x78).outline(&[(40.0, 0.0), (1000.0, 1117.6)]),
        ])
    }

    fn find(info: &FontInfo, locale: Locale, id: NameId) -> &str {
        &info.names.iter().find(|n| n.locale == locale && n.id == id).unwrap().value
    }

    #[test]
    fn test_regular_metadata() {
        let mut font = font();
        apply_release_metadata(&mut font, Style::Regular, "1.000").unwrap();
        let info = font.info();

        assert_eq!(info.font_name, "HibizukaiSans-Regular");
        assert_eq!(info.family_name, "HibizukaiSans");
        assert_eq!(info.full_name, "HibizukaiSans Regular");
        assert_eq!(info.revision, Some(1.0));
        assert_eq!(info.os2.weight_class, 400);
        assert_eq!(info.os2.style_map, 0x40);
        assert_eq!(&info.os2.vendor, b"HBZS");
        assert_eq!((info.os2.win_ascent, info.os2.win_descent), (1952, 426));
        assert_eq!((info.os2.typo_ascent, info.os2.typo_descent), (1782, -266));
        assert_eq!((info.hhea.ascent, info.hhea.descent), (1952, -426));
        assert_eq!((info.os2.cap_height, info.os2.x_height), (1490, 1118));
        assert_eq!(info.os2.panose, [2, 11, 5, 3, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_bold_italic_names() {
        let mut font = font();
        apply_release_metadata(&mut font, Style::BoldItalic, "2.1").unwrap();
        let info = font.info();

        assert_eq!(info.os2.weight_class, 700);
        assert_eq!(info.os2.style_map, 0x21);
        assert_eq!(info.os2.panose[2], 8);
        assert_eq!(find(info, Locale::EnglishUs, NameId::SubFamily), "Bold Italic");
        assert_eq!(find(info, Locale::EnglishUs, NameId::UniqueId), "2.1;HBZS;BoldItalic");
        assert_eq!(find(info, Locale::EnglishUs, NameId::Version), "Version 2.1");
        assert_eq!(find(info, Locale::EnglishUs, NameId::Family), "");
        assert_eq!(find(info, Locale::Japanese, NameId::FullName), "HibizukaiSans BoldItalic");
    }

    #[test]
    fn test_idempotent() {
        let mut font = font();
        apply_release_metadata(&mut font, Style::Italic, "1.000").unwrap();
        let first = font.info().clone();
        apply_release_metadata(&mut font, Style::Italic, "1.000").unwrap();
        assert_eq!(font.info(), &first);
    }

    #[test]
    fn test_keeps_italic_angle() {
        let mut font = font();
        font.info_mut().italic_angle = -9.4;
        apply_release_metadata(&mut font, Style::Italic, "1.000").unwrap();
        assert_eq!(font.info().italic_angle, -9.4);
    }

    #[test]
    fn test_missing_reference_glyph() {
        let mut font = MockFont::new(vec![MockGlyph::new("H").codepoint(0x48)]);
        let err = apply_release_metadata(&mut font, Style::Regular, "1.000").unwrap_err();
        assert!(matches!(
            err,
            Error::MissingReferenceGlyph { codepoint } if codepoint == Codepoint::new(0x78)
        ));
    }

    #[test]
    fn test_revision() {
        assert_eq!(revision("1.000"), Some(1.0));
        assert_eq!(revision("1.2.3"), None);
        assert_eq!(revision("beta"), None);
    }
}
