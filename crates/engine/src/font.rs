//! In-memory TrueType font.

use std::collections::BTreeSet;

use font_types::{FWord, Fixed, LongDateTime, UfWord};
use hibizukai_core::{
    Codepoint, EmMetrics, Font, FontInfo, GlyphId, GlyphRef, GlyphSet, LookupId, LookupKind,
    PosSubEntry, TransformOptions,
};
use kurbo::{Affine, Rect};
use log::{debug, warn};
use write_fonts::tables::{
    head::{Flags, Head, MacStyle},
    hhea::Hhea,
    os2::Os2,
};

use crate::{
    Result,
    layout::{self, LayoutSource},
    outline::{Outline, OutlineContour},
};

/// Deepest component nesting resolved when flattening composites.
const MAX_COMPONENT_DEPTH: usize = 16;

/// One glyph slot.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRecord {
    pub name: String,
    pub codepoints: Vec<u32>,
    pub advance: u16,
    pub outline: Outline,
    pub pos_sub: Vec<PosSubEntry>,
    /// Emptied slot; kept so the glyph ids after it stay stable.
    pub cleared: bool,
}

impl GlyphRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            codepoints: Vec::new(),
            advance: 0,
            outline: Outline::default(),
            pos_sub: Vec::new(),
            cleared: false,
        }
    }

    pub fn worth_outputting(&self) -> bool {
        !self.cleared
            && (!self.outline.is_empty() || !self.codepoints.is_empty() || self.name == ".notdef")
    }

    fn clear(&mut self) {
        self.codepoints.clear();
        self.advance = 0;
        self.outline = Outline::default();
        self.pos_sub.clear();
        self.cleared = true;
    }
}

/// Layout tables as read from the source font, plus what changed since.
#[derive(Debug, Clone)]
pub struct LayoutTables {
    pub gsub: Option<Vec<u8>>,
    pub gpos: Option<Vec<u8>>,
    pub gdef: Option<Vec<u8>>,
    /// Removed lookups; rebuilt tables keep their slots as empty lookups.
    pub removed: BTreeSet<LookupId>,
    /// Factor applied to design coordinates since the tables were read.
    pub scale: f64,
}

impl Default for LayoutTables {
    fn default() -> Self {
        Self { gsub: None, gpos: None, gdef: None, removed: BTreeSet::new(), scale: 1.0 }
    }
}

impl LayoutTables {
    /// The bytes still describe the font as it stands.
    pub fn is_current(&self) -> bool {
        self.removed.is_empty() && self.scale == 1.0
    }

    /// Tables compiled again with removed lookups emptied and coordinates
    /// rescaled.
    pub fn rebuilt(&self) -> Result<LayoutTables> {
        layout::merge(&[LayoutSource::new(self, 0)])
    }
}

/// A TrueType font held open for editing.
#[derive(Debug, Clone)]
pub struct TtFont {
    pub glyphs: Vec<GlyphRecord>,
    pub units_per_em: u16,
    pub metrics: EmMetrics,
    pub info: FontInfo,
    pub lookups: Vec<LookupId>,
    pub layout: LayoutTables,
    pub(crate) head: Head,
    pub(crate) hhea: Hhea,
    pub(crate) os2: Option<Os2>,
    pub(crate) underline: (i16, i16),
}

impl TtFont {
    /// An empty font with a single `.notdef` slot.
    pub fn new(units_per_em: u16, metrics: EmMetrics) -> Self {
        let head = Head {
            font_revision: Fixed::from_f64(1.0),
            checksum_adjustment: 0,
            magic_number: 0x5F0F3CF5,
            flags: Flags::empty(),
            units_per_em,
            created: LongDateTime::new(0),
            modified: LongDateTime::new(0),
            x_min: 0,
            y_min: 0,
            x_max: 0,
            y_max: 0,
            mac_style: MacStyle::empty(),
            lowest_rec_ppem: 8,
            font_direction_hint: 2,
            index_to_loc_format: 0,
        };
        let hhea = Hhea {
            ascender: FWord::new(metrics.ascent as i16),
            descender: FWord::new(-(metrics.descent as i16)),
            line_gap: FWord::new(0),
            advance_width_max: UfWord::new(0),
            min_left_side_bearing: FWord::new(0),
            min_right_side_bearing: FWord::new(0),
            x_max_extent: FWord::new(0),
            caret_slope_rise: 1,
            caret_slope_run: 0,
            caret_offset: 0,
            number_of_h_metrics: 1,
        };
        Self {
            glyphs: vec![GlyphRecord::new(".notdef")],
            units_per_em,
            metrics,
            info: FontInfo::default(),
            lookups: Vec::new(),
            layout: LayoutTables::default(),
            head,
            hhea,
            os2: None,
            underline: (-100, 50),
        }
    }

    pub fn glyph(&self, id: GlyphId) -> Option<&GlyphRecord> {
        self.glyphs.get(id.to_usize())
    }

    /// Contours of `gid` with every component reference resolved.
    pub fn flattened_contours(&self, gid: usize) -> Vec<OutlineContour> {
        self.flatten(gid, 0)
    }

    fn flatten(&self, gid: usize, depth: usize) -> Vec<OutlineContour> {
        let Some(glyph) = self.glyphs.get(gid) else {
            return Vec::new();
        };
        let mut contours = glyph.outline.contours.clone();
        if depth >= MAX_COMPONENT_DEPTH {
            warn!("Component nesting too deep in {}", glyph.name);
            return contours;
        }
        for component in &glyph.outline.components {
            for mut contour in self.flatten(component.glyph as usize, depth + 1) {
                for point in &mut contour {
                    point.point = component.affine * point.point;
                }
                contours.push(contour);
            }
        }
        contours
    }

    fn decompose(&mut self, gid: usize) {
        let has_components = self.glyphs.get(gid).is_some_and(|g| g.outline.has_components());
        if has_components {
            let contours = self.flattened_contours(gid);
            let glyph = &mut self.glyphs[gid];
            glyph.outline = Outline { contours, components: Vec::new() };
            debug!("Decomposed {}", glyph.name);
        }
    }

    /// Bounding box with component references resolved.
    pub fn glyph_bounds(&self, gid: usize) -> Option<Rect> {
        let glyph = self.glyphs.get(gid)?;
        if !glyph.outline.has_components() {
            return glyph.outline.control_box();
        }
        Outline { contours: self.flattened_contours(gid), components: Vec::new() }.control_box()
    }
}

impl Font for TtFont {
    fn em(&self) -> u16 {
        self.units_per_em
    }

    fn set_em(&mut self, em: u16) {
        if em == self.units_per_em || self.units_per_em == 0 {
            self.units_per_em = em;
            return;
        }
        let factor = f64::from(em) / f64::from(self.units_per_em);
        for glyph in &mut self.glyphs {
            glyph.outline.scale(factor);
            glyph.advance = (f64::from(glyph.advance) * factor).round() as u16;
        }
        self.layout.scale *= factor;
        self.units_per_em = em;
    }

    fn metrics(&self) -> EmMetrics {
        self.metrics
    }

    fn set_metrics(&mut self, metrics: EmMetrics) {
        self.metrics = metrics;
    }

    fn num_glyphs(&self) -> usize {
        self.glyphs.len()
    }

    fn glyphs(&self) -> Vec<GlyphRef> {
        self.glyphs
            .iter()
            .enumerate()
            .map(|(i, glyph)| GlyphRef {
                id: GlyphId::new(i as u32),
                name: glyph.name.clone(),
                codepoint: glyph.codepoints.first().copied().map(Codepoint::new),
                worth_outputting: glyph.worth_outputting(),
                pos_sub: glyph.pos_sub.clone(),
            })
            .collect()
    }

    fn glyph_by_codepoint(&self, codepoint: Codepoint) -> Option<GlyphId> {
        self.glyphs
            .iter()
            .position(|g| !g.cleared && g.codepoints.contains(&codepoint.to_u32()))
            .map(|i| GlyphId::new(i as u32))
    }

    fn unlink_references(&mut self, glyphs: &GlyphSet) {
        for id in glyphs.iter() {
            self.decompose(id.to_usize());
        }
    }

    fn copy_glyph(&mut self, from: GlyphId, to: GlyphId) -> bool {
        if to.to_usize() >= self.glyphs.len() {
            return false;
        }
        let Some(source) = self.glyph(from) else {
            return false;
        };
        let advance = source.advance;
        let outline = Outline {
            contours: self.flattened_contours(from.to_usize()),
            components: Vec::new(),
        };
        let target = &mut self.glyphs[to.to_usize()];
        target.outline = outline;
        target.advance = advance;
        true
    }

    fn clear_glyph(&mut self, glyph: GlyphId) {
        if let Some(record) = self.glyphs.get_mut(glyph.to_usize()) {
            record.clear();
        }
    }

    fn lookups(&self, kind: LookupKind) -> Vec<LookupId> {
        self.lookups.iter().copied().filter(|l| l.kind == kind).collect()
    }

    fn remove_lookup(&mut self, lookup: LookupId) {
        let before = self.lookups.len();
        self.lookups.retain(|l| *l != lookup);
        if self.lookups.len() == before {
            return;
        }
        self.layout.removed.insert(lookup);
        for glyph in &mut self.glyphs {
            glyph.pos_sub.retain(|entry| entry.lookup != lookup);
        }
    }

    fn transform(&mut self, glyphs: &GlyphSet, affine: Affine, options: TransformOptions) {
        let x_scale = affine.as_coeffs()[0];
        for id in glyphs.iter() {
            let gid = id.to_usize();
            self.decompose(gid);
            let Some(glyph) = self.glyphs.get_mut(gid) else {
                continue;
            };
            glyph.outline.transform_contours(affine);
            if !options.preserve_advance {
                glyph.advance = (f64::from(glyph.advance) * x_scale).round().max(0.0) as u16;
            }
        }
    }

    fn bounding_box(&self, glyph: GlyphId) -> Option<Rect> {
        self.glyph_bounds(glyph.to_usize())
    }

    fn info(&self) -> &FontInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut FontInfo {
        &mut self.info
    }
}
