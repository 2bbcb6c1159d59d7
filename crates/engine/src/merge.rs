//! Appending the glyphs of one font to another.

use std::collections::HashSet;

use hibizukai_core::{Font, LookupKind};
use log::info;
use read_fonts::{FontData, FontRead, tables::gsub::Gsub};

use crate::{
    EngineError, Result, gsub,
    font::TtFont,
    layout::{self, LayoutSource},
    read::unique_name,
};

impl TtFont {
    /// Appends every glyph of `secondary`. Codepoints `self` already maps
    /// stay with `self`. The layout tables of both fonts are merged, with
    /// the secondary's lookups placed after the primary's.
    pub fn merge(&mut self, mut secondary: TtFont) -> Result<()> {
        if secondary.units_per_em != self.units_per_em {
            info!(
                "Scaling merged font from {} to {} units per em",
                secondary.units_per_em, self.units_per_em
            );
            secondary.set_em(self.units_per_em);
        }

        let total = self.glyphs.len() + secondary.glyphs.len();
        if total > usize::from(u16::MAX) {
            return Err(EngineError::TooManyGlyphs(total));
        }
        let offset = self.glyphs.len() as u16;
        self.layout = layout::merge(&[
            LayoutSource::new(&self.layout, 0),
            LayoutSource::new(&secondary.layout, offset),
        ])?;
        self.lookups = [LookupKind::Substitution, LookupKind::Positioning]
            .into_iter()
            .map(|kind| layout::live_lookups(&self.layout, kind))
            .collect::<Result<Vec<_>>>()?
            .concat();
        info!(
            "Merged layout: {} substitution and {} positioning lookups",
            self.lookups(LookupKind::Substitution).len(),
            self.lookups(LookupKind::Positioning).len()
        );

        let mut names: HashSet<String> = self.glyphs.iter().map(|g| g.name.clone()).collect();
        let mapped: HashSet<u32> = self
            .glyphs
            .iter()
            .filter(|g| !g.cleared)
            .flat_map(|g| g.codepoints.iter().copied())
            .collect();

        let mut added = 0usize;
        for mut glyph in secondary.glyphs {
            glyph.name = unique_name(&mut names, glyph.name);
            glyph.codepoints.retain(|cp| !mapped.contains(cp));
            for component in &mut glyph.outline.components {
                component.glyph += u32::from(offset);
            }
            if glyph.worth_outputting() {
                added += 1;
            }
            self.glyphs.push(glyph);
        }
        self.refresh_pos_sub()?;
        info!("Merged {added} glyphs");
        Ok(())
    }

    /// Re-derive every live glyph's substitution entries from GSUB.
    fn refresh_pos_sub(&mut self) -> Result<()> {
        let mut entries = match self.layout.gsub.as_deref() {
            Some(data) => gsub::read_pos_sub(&Gsub::read(FontData::new(data))?)?,
            None => Default::default(),
        };
        for (gid, glyph) in self.glyphs.iter_mut().enumerate() {
            glyph.pos_sub = if glyph.cleared {
                Vec::new()
            } else {
                entries.remove(&(gid as u32)).unwrap_or_default()
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use hibizukai_core::{Codepoint, EmMetrics, GlyphId};
    use kurbo::Affine;

    use super::*;
    use crate::{
        font::GlyphRecord,
        outline::{Component, OutlinePoint},
    };

    fn glyph(name: &str, cp: Option<u32>, width: f64) -> GlyphRecord {
        let mut record = GlyphRecord::new(name);
        record.codepoints = cp.into_iter().collect();
        record.advance = width as u16;
        record.outline.contours = vec![vec![
            OutlinePoint::new(0.0, 0.0, true),
            OutlinePoint::new(width, 0.0, true),
            OutlinePoint::new(width, 100.0, true),
        ]];
        record
    }

    fn font(upem: u16, glyphs: Vec<GlyphRecord>) -> TtFont {
        let mut font = TtFont::new(upem, EmMetrics::new(upem * 4 / 5, upem / 5));
        font.glyphs.extend(glyphs);
        font
    }

    #[test]
    fn test_primary_keeps_codepoints() {
        let mut primary = font(2048, vec![glyph("A", Some(0x41), 1200.0)]);
        let secondary = font(2048, vec![glyph("A", Some(0x41), 1000.0), glyph("B", Some(0x42), 900.0)]);

        primary.merge(secondary).unwrap();

        assert_eq!(primary.glyph_by_codepoint(Codepoint::new(0x41)), Some(GlyphId::new(1)));
        assert_eq!(primary.glyph_by_codepoint(Codepoint::new(0x42)), Some(GlyphId::new(4)));
        assert_eq!(primary.glyphs[3].name, "A.1");
        assert!(primary.glyphs[3].codepoints.is_empty());
        assert_eq!(primary.glyphs[2].name, ".notdef.1");
    }

    #[test]
    fn test_secondary_is_rescaled() {
        let mut primary = font(2048, vec![]);
        let secondary = font(1024, vec![glyph("B", Some(0x42), 500.0)]);

        primary.merge(secondary).unwrap();

        let merged = &primary.glyphs[2];
        assert_eq!(merged.advance, 1000);
        assert_eq!(merged.outline.contours[0][1].point.x, 1000.0);
    }

    #[test]
    fn test_components_are_renumbered() {
        let mut primary = font(2048, vec![glyph("A", Some(0x41), 1200.0)]);
        let mut accent = GlyphRecord::new("Aacute");
        accent.codepoints = vec![0xC1];
        accent.outline.components = vec![Component { glyph: 1, affine: Affine::IDENTITY }];
        let secondary = font(2048, vec![glyph("B", Some(0x42), 900.0), accent]);

        primary.merge(secondary).unwrap();

        assert_eq!(primary.glyphs[4].outline.components[0].glyph, 3);
        assert!(primary.bounding_box(GlyphId::new(4)).is_some());
    }
}
