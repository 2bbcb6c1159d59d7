//! Parsing a TrueType binary into a [`TtFont`].

use std::collections::{BTreeMap, HashSet};

use hibizukai_core::{
    EmMetrics, FontInfo, HheaInfo, Locale, LookupId, LookupKind, NameEntry, NameId, Os2Info,
};
use kurbo::Vec2;
use read_fonts::{
    FontRef, TableProvider,
    tables::{
        glyf::{Anchor, Glyph as ReadGlyph},
        name::Name,
    },
    types::{GlyphId, GlyphId16, Tag},
};
use write_fonts::{
    from_obj::ToOwnedTable,
    tables::{head::Head, hhea::Hhea, os2::Os2},
};

use crate::{
    EngineError, Result, cmap,
    font::{GlyphRecord, LayoutTables, TtFont},
    gsub,
    outline::{Component, Outline, component_affine},
};

const WINDOWS_PLATFORM: u16 = 3;

impl TtFont {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let font = FontRef::new(data)?;

        let head: Head = font.head()?.to_owned_table();
        let hhea: Hhea = font.hhea()?.to_owned_table();
        let os2: Option<Os2> = font.os2().ok().map(|t| t.to_owned_table());
        let num_glyphs = font.maxp()?.num_glyphs() as u32;

        let glyf = font.glyf().map_err(|_| EngineError::NotTrueType)?;
        let loca = font.loca(None)?;
        let hmtx = font.hmtx()?;
        let post = font.post().ok();
        let mut codepoints = font.cmap().map(|c| cmap::read_codepoints(&c)).unwrap_or_default();

        let mut glyphs = Vec::with_capacity(num_glyphs as usize);
        let mut seen_names = HashSet::new();
        for gid in 0..num_glyphs {
            let glyph_id = GlyphId::new(gid);
            let name = post
                .as_ref()
                .and_then(|p| p.glyph_name(GlyphId16::new(gid as u16)))
                .map(str::to_string)
                .unwrap_or_else(|| fallback_name(gid));

            let mut record = GlyphRecord::new(unique_name(&mut seen_names, name));
            record.codepoints = codepoints.remove(&gid).unwrap_or_default();
            record.advance = hmtx.advance(glyph_id).unwrap_or(0);
            record.outline = match loca.get_glyf(glyph_id, &glyf) {
                Ok(Some(glyph)) => read_outline(&glyph),
                _ => Outline::default(),
            };
            glyphs.push(record);
        }

        let mut lookups = Vec::new();
        if let Ok(table) = font.gsub() {
            let count = table.lookup_list().map(|l| l.lookups().len()).unwrap_or(0);
            lookups.extend((0..count).map(|i| LookupId::new(LookupKind::Substitution, i as u16)));
            for (gid, entries) in gsub::read_pos_sub(&table)? {
                if let Some(record) = glyphs.get_mut(gid as usize) {
                    record.pos_sub = entries;
                }
            }
        }
        if let Ok(table) = font.gpos() {
            let count = table.lookup_list().map(|l| l.lookups().len()).unwrap_or(0);
            lookups.extend((0..count).map(|i| LookupId::new(LookupKind::Positioning, i as u16)));
        }

        let raw = |tag: &[u8; 4]| font.table_data(Tag::new(tag)).map(|d| d.as_bytes().to_vec());
        let layout = LayoutTables {
            gsub: raw(b"GSUB"),
            gpos: raw(b"GPOS"),
            gdef: raw(b"GDEF"),
            ..LayoutTables::default()
        };

        let units_per_em = head.units_per_em;
        let metrics = EmMetrics::new(
            hhea.ascender.to_i16().max(0) as u16,
            units_per_em.saturating_sub(hhea.ascender.to_i16().max(0) as u16),
        );

        let mut info = FontInfo {
            italic_angle: post.as_ref().map(|p| p.italic_angle().to_f64()).unwrap_or(0.0),
            hhea: HheaInfo {
                ascent: hhea.ascender.to_i16(),
                descent: hhea.descender.to_i16(),
                line_gap: hhea.line_gap.to_i16(),
            },
            os2: os2.as_ref().map(os2_info).unwrap_or_default(),
            ..FontInfo::default()
        };
        if let Ok(name) = font.name() {
            read_names(&name, &mut info);
        }

        let underline = post
            .as_ref()
            .map(|p| (p.underline_position().to_i16(), p.underline_thickness().to_i16()))
            .unwrap_or((-100, 50));

        Ok(Self {
            glyphs,
            units_per_em,
            metrics,
            info,
            lookups,
            layout,
            head,
            hhea,
            os2,
            underline,
        })
    }
}

fn fallback_name(gid: u32) -> String {
    if gid == 0 { ".notdef".to_string() } else { format!("glyph{gid:05}") }
}

/// Returns `name`, or `name.N` with the smallest free `N`.
pub(crate) fn unique_name(seen: &mut HashSet<String>, name: String) -> String {
    if seen.insert(name.clone()) {
        return name;
    }
    let renamed = (1..)
        .map(|n| format!("{name}.{n}"))
        .find(|candidate| !seen.contains(candidate))
        .unwrap_or(name);
    seen.insert(renamed.clone());
    renamed
}

fn read_outline(glyph: &ReadGlyph) -> Outline {
    match glyph {
        ReadGlyph::Simple(simple) => Outline::from_simple(simple),
        ReadGlyph::Composite(composite) => {
            let components = composite
                .components()
                .map(|comp| {
                    let offset = match comp.anchor {
                        Anchor::Offset { x, y } => Vec2::new(x.into(), y.into()),
                        Anchor::Point { .. } => Vec2::ZERO,
                    };
                    let t = comp.transform;
                    Component {
                        glyph: comp.glyph.to_u32(),
                        affine: component_affine(
                            f64::from(t.xx.to_f32()),
                            f64::from(t.yx.to_f32()),
                            f64::from(t.xy.to_f32()),
                            f64::from(t.yy.to_f32()),
                            offset,
                        ),
                    }
                })
                .collect();
            Outline { contours: Vec::new(), components }
        }
    }
}

fn os2_info(os2: &Os2) -> Os2Info {
    Os2Info {
        weight_class: os2.us_weight_class,
        vendor: os2.ach_vend_id.to_be_bytes(),
        style_map: os2.fs_selection.bits() & 0x61,
        win_ascent: os2.us_win_ascent,
        win_descent: os2.us_win_descent,
        typo_ascent: os2.s_typo_ascender,
        typo_descent: os2.s_typo_descender,
        typo_line_gap: os2.s_typo_line_gap,
        cap_height: os2.s_cap_height.unwrap_or(0),
        x_height: os2.sx_height.unwrap_or(0),
        panose: os2.panose_10,
    }
}

/// Windows-platform records in the known locales become [`NameEntry`]s; the
/// English ones also fill the font-level fields.
fn read_names(name: &Name, info: &mut FontInfo) {
    let mut entries: BTreeMap<(Locale, NameId), String> = BTreeMap::new();
    for record in name.name_record() {
        if record.platform_id() != WINDOWS_PLATFORM {
            continue;
        }
        let (Some(locale), Some(id)) = (
            Locale::from_windows_language_id(record.language_id()),
            NameId::from_u16(record.name_id().to_u16()),
        ) else {
            continue;
        };
        if let Ok(value) = record.string(name.string_data()) {
            entries.entry((locale, id)).or_insert_with(|| value.to_string());
        }
    }

    let english = |id| entries.get(&(Locale::EnglishUs, id)).cloned().unwrap_or_default();
    info.copyright = english(NameId::Copyright);
    info.family_name = english(NameId::Family);
    info.full_name = english(NameId::FullName);
    info.font_name = english(NameId::PostScriptName);
    let version = english(NameId::Version);
    info.version = version.strip_prefix("Version ").unwrap_or(&version).to_string();

    info.names = entries
        .into_iter()
        .filter(|((_, id), _)| *id != NameId::PostScriptName)
        .map(|((locale, id), value)| NameEntry::new(locale, id, value))
        .collect();
}
