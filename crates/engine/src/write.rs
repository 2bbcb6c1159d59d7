//! Serializing a [`TtFont`] back to a TrueType binary.

use std::collections::BTreeMap;

use chrono::Utc;
use font_types::{FWord, Fixed, LongDateTime, NameId as WriteNameId, Tag, UfWord};
use hibizukai_core::{FontInfo, Locale, NameId};
use kurbo::Rect;
use log::debug;
use write_fonts::{
    FontBuilder,
    tables::{
        glyf::{GlyfLocaBuilder, Glyph},
        head::{Head, MacStyle},
        hhea::Hhea,
        hmtx::{Hmtx, LongMetric},
        loca::LocaFormat,
        maxp::Maxp,
        name::{Name, NameRecord},
        os2::{Os2, SelectionFlags},
        post::Post,
    },
};

use crate::{
    EngineError, Result, cmap,
    font::TtFont,
    outline::{Outline, to_fword},
};

/// Seconds between the OpenType epoch (1904-01-01) and the Unix epoch.
const SECONDS_1904_TO_1970: i64 = 2_082_844_800;

/// fsSelection bits owned by the style map.
const STYLE_MAP_MASK: u16 = 0x61;

const WINDOWS_PLATFORM: u16 = 3;
const WINDOWS_UNICODE_BMP: u16 = 1;

/// Per-glyph data computed once for all tables.
struct GlyphMetrics {
    advance: u16,
    bounds: Option<Rect>,
    points: usize,
    contours: usize,
}

impl TtFont {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let num_glyphs = u16::try_from(self.glyphs.len())
            .map_err(|_| EngineError::TooManyGlyphs(self.glyphs.len()))?;

        let mut glyf_builder = GlyfLocaBuilder::new();
        let mut metrics = Vec::with_capacity(self.glyphs.len());
        for (gid, record) in self.glyphs.iter().enumerate() {
            let outline = Outline { contours: self.flattened_contours(gid), components: Vec::new() };
            let glyph = outline.to_glyph();
            glyf_builder.add_glyph(&glyph)?;
            metrics.push(GlyphMetrics {
                advance: record.advance,
                bounds: match glyph {
                    Glyph::Empty => None,
                    _ => outline.control_box(),
                },
                points: outline.contours.iter().map(Vec::len).sum(),
                contours: outline.contours.len(),
            });
        }
        let (glyf, loca, loca_format) = glyf_builder.build();

        let mut builder = FontBuilder::new();
        builder.add_table(&self.build_head(&metrics, loca_format))?;
        builder.add_table(&self.build_hhea(&metrics))?;
        builder.add_table(&build_hmtx(&metrics))?;
        builder.add_table(&build_maxp(&metrics, num_glyphs))?;
        builder.add_table(&cmap::build_cmap(&self.cmap_mappings()))?;
        builder.add_table(&self.build_post())?;
        builder.add_table(&build_name(&self.info))?;
        if let Some(os2) = self.build_os2(&metrics) {
            builder.add_table(&os2)?;
        }
        builder.add_table(&glyf)?;
        builder.add_table(&loca)?;

        let rebuilt;
        let layout = if self.layout.is_current() {
            &self.layout
        } else {
            debug!("Rebuilding layout tables");
            rebuilt = self.layout.rebuilt()?;
            &rebuilt
        };
        for (tag, data) in [(b"GSUB", &layout.gsub), (b"GPOS", &layout.gpos), (b"GDEF", &layout.gdef)] {
            if let Some(data) = data {
                builder.add_raw(Tag::new(tag), data.clone());
            } else {
                debug!("Not writing {}", String::from_utf8_lossy(tag));
            }
        }

        Ok(builder.build())
    }

    /// Sorted `(codepoint, glyph)` pairs; the first glyph claiming a codepoint keeps it.
    fn cmap_mappings(&self) -> Vec<(u32, u32)> {
        let mut mappings = BTreeMap::new();
        for (gid, record) in self.glyphs.iter().enumerate() {
            if record.cleared {
                continue;
            }
            for &cp in &record.codepoints {
                mappings.entry(cp).or_insert(gid as u32);
            }
        }
        mappings.into_iter().collect()
    }

    fn style_map(&self) -> u16 {
        self.info.os2.style_map & STYLE_MAP_MASK
    }

    fn build_head(&self, metrics: &[GlyphMetrics], loca_format: LocaFormat) -> Head {
        let mut head = self.head.clone();
        let bounds = union_bounds(metrics);
        head.units_per_em = self.units_per_em;
        head.x_min = to_fword(bounds.x0);
        head.y_min = to_fword(bounds.y0);
        head.x_max = to_fword(bounds.x1);
        head.y_max = to_fword(bounds.y1);
        if let Some(revision) = self.info.revision {
            head.font_revision = Fixed::from_f64(revision);
        }

        let style_map = self.style_map();
        let mut mac_style = head.mac_style.bits() & !(MacStyle::BOLD.bits() | MacStyle::ITALIC.bits());
        if style_map & 0x20 != 0 {
            mac_style |= MacStyle::BOLD.bits();
        }
        if style_map & 0x01 != 0 {
            mac_style |= MacStyle::ITALIC.bits();
        }
        head.mac_style = MacStyle::from_bits_truncate(mac_style);

        head.modified = LongDateTime::new(Utc::now().timestamp() + SECONDS_1904_TO_1970);
        head.index_to_loc_format = match loca_format {
            LocaFormat::Short => 0,
            LocaFormat::Long => 1,
        };
        head
    }

    fn build_hhea(&self, metrics: &[GlyphMetrics]) -> Hhea {
        let mut hhea = self.hhea.clone();
        let info = &self.info.hhea;
        if (info.ascent, info.descent) != (0, 0) {
            hhea.ascender = FWord::new(info.ascent);
            hhea.descender = FWord::new(info.descent);
            hhea.line_gap = FWord::new(info.line_gap);
        }

        let inked = || metrics.iter().filter_map(|m| m.bounds.map(|b| (m.advance, b)));
        hhea.advance_width_max = UfWord::new(metrics.iter().map(|m| m.advance).max().unwrap_or(0));
        hhea.min_left_side_bearing =
            FWord::new(inked().map(|(_, b)| to_fword(b.x0)).min().unwrap_or(0));
        hhea.min_right_side_bearing = FWord::new(
            inked().map(|(adv, b)| to_fword(f64::from(adv) - b.x1)).min().unwrap_or(0),
        );
        hhea.x_max_extent = FWord::new(inked().map(|(_, b)| to_fword(b.x1)).max().unwrap_or(0));

        if self.info.italic_angle != 0.0 {
            let rise = self.units_per_em;
            let run = f64::from(rise) * (-self.info.italic_angle).to_radians().tan();
            hhea.caret_slope_rise = rise as i16;
            hhea.caret_slope_run = to_fword(run);
        } else {
            hhea.caret_slope_rise = 1;
            hhea.caret_slope_run = 0;
        }
        hhea.caret_offset = 0;
        hhea.number_of_h_metrics = metrics.len() as u16;
        hhea
    }

    fn build_post(&self) -> Post {
        let mut post = Post::new_v2(self.glyphs.iter().map(|g| g.name.as_str()));
        post.italic_angle = Fixed::from_f64(self.info.italic_angle);
        post.underline_position = FWord::new(self.underline.0);
        post.underline_thickness = FWord::new(self.underline.1);
        post
    }

    fn build_os2(&self, metrics: &[GlyphMetrics]) -> Option<Os2> {
        let mut os2 = self.os2.clone()?;
        let info = &self.info.os2;

        os2.us_weight_class = info.weight_class;
        os2.ach_vend_id = Tag::new(&info.vendor);
        os2.fs_selection = SelectionFlags::from_bits_truncate(
            (os2.fs_selection.bits() & !STYLE_MAP_MASK) | self.style_map(),
        );
        os2.us_win_ascent = info.win_ascent;
        os2.us_win_descent = info.win_descent;
        os2.s_typo_ascender = info.typo_ascent;
        os2.s_typo_descender = info.typo_descent;
        os2.s_typo_line_gap = info.typo_line_gap;
        os2.panose_10 = info.panose;

        os2.ul_code_page_range_1.get_or_insert(0);
        os2.ul_code_page_range_2.get_or_insert(0);
        os2.sx_height = Some(info.x_height);
        os2.s_cap_height = Some(info.cap_height);
        os2.us_default_char.get_or_insert(0);
        os2.us_break_char.get_or_insert(0x20);
        os2.us_max_context.get_or_insert(0);

        let advances: Vec<u32> =
            metrics.iter().map(|m| u32::from(m.advance)).filter(|&a| a > 0).collect();
        if !advances.is_empty() {
            os2.x_avg_char_width = (advances.iter().sum::<u32>() / advances.len() as u32) as i16;
        }

        let mappings = self.cmap_mappings();
        if let (Some(first), Some(last)) = (mappings.first(), mappings.last()) {
            os2.us_first_char_index = first.0.min(0xFFFF) as u16;
            os2.us_last_char_index = last.0.min(0xFFFF) as u16;
        }
        Some(os2)
    }
}

fn union_bounds(metrics: &[GlyphMetrics]) -> Rect {
    metrics
        .iter()
        .filter_map(|m| m.bounds)
        .reduce(|a, b| a.union(b))
        .unwrap_or(Rect::ZERO)
}

fn build_hmtx(metrics: &[GlyphMetrics]) -> Hmtx {
    let h_metrics = metrics
        .iter()
        .map(|m| LongMetric {
            advance: m.advance,
            side_bearing: m.bounds.map(|b| to_fword(b.x0)).unwrap_or(0),
        })
        .collect();
    Hmtx::new(h_metrics, vec![])
}

fn build_maxp(metrics: &[GlyphMetrics], num_glyphs: u16) -> Maxp {
    let max_points = metrics.iter().map(|m| m.points).max().unwrap_or(0);
    let max_contours = metrics.iter().map(|m| m.contours).max().unwrap_or(0);
    Maxp {
        num_glyphs,
        max_points: Some(max_points.min(u16::MAX as usize) as u16),
        max_contours: Some(max_contours.min(u16::MAX as usize) as u16),
        max_composite_points: Some(0),
        max_composite_contours: Some(0),
        max_zones: Some(1),
        max_twilight_points: Some(0),
        max_storage: Some(0),
        max_function_defs: Some(0),
        max_instruction_defs: Some(0),
        max_stack_elements: Some(0),
        max_size_of_instructions: Some(0),
        max_component_elements: Some(0),
        max_component_depth: Some(0),
    }
}

/// Font-level value an empty English entry falls back to.
fn inherited(info: &FontInfo, id: NameId) -> Option<String> {
    let value = match id {
        NameId::Copyright => info.copyright.clone(),
        NameId::Family => info.family_name.clone(),
        NameId::FullName => info.full_name.clone(),
        NameId::Version if !info.version.is_empty() => format!("Version {}", info.version),
        NameId::PostScriptName => info.font_name.clone(),
        _ => String::new(),
    };
    (!value.is_empty()).then_some(value)
}

/// Windows Unicode name records. Empty English entries take the font-level
/// value; empty entries in other locales are left out.
pub(crate) fn build_name(info: &FontInfo) -> Name {
    let mut values: BTreeMap<(u16, u16), String> = BTreeMap::new();

    for entry in &info.names {
        let value = match (entry.value.is_empty(), entry.locale) {
            (false, _) => Some(entry.value.clone()),
            (true, Locale::EnglishUs) => inherited(info, entry.id),
            (true, _) => None,
        };
        if let Some(value) = value {
            values.insert((entry.locale.windows_language_id(), entry.id.to_u16()), value);
        }
    }

    for id in [
        NameId::Copyright,
        NameId::Family,
        NameId::FullName,
        NameId::Version,
        NameId::PostScriptName,
    ] {
        let key = (Locale::EnglishUs.windows_language_id(), id.to_u16());
        if values.contains_key(&key) {
            continue;
        }
        if let Some(value) = inherited(info, id) {
            values.insert(key, value);
        }
    }

    let records = values
        .into_iter()
        .map(|((language, id), value)| {
            NameRecord::new(
                WINDOWS_PLATFORM,
                WINDOWS_UNICODE_BMP,
                language,
                WriteNameId::new(id),
                value.into(),
            )
        })
        .collect();
    Name::new(records)
}
