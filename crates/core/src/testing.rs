//! In-memory font engine for unit tests.

use std::{
    cell::RefCell,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use kurbo::{Affine, Point, Rect};

use crate::{
    font::{
        Codepoint, EmMetrics, Font, FontEngine, FontInfo, GlyphId, GlyphRef, LookupId, LookupKind,
        PosSubEntry, PosSubKind, TransformOptions,
    },
    glyph_set::GlyphSet,
};

#[derive(Debug, Clone, PartialEq)]
pub struct MockGlyph {
    pub name: String,
    pub codepoint: Option<u32>,
    pub advance: u16,
    pub outline: Vec<Point>,
    pub composite: bool,
    pub cleared: bool,
    pub source: &'static str,
    pub pos_sub: Vec<(String, PosSubKind, u32)>,
}

impl MockGlyph {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            codepoint: None,
            advance: 500,
            outline: vec![Point::new(0.0, 0.0), Point::new(100.0, 10.0 * name.len() as f64)],
            composite: false,
            cleared: false,
            source: "",
            pos_sub: Vec::new(),
        }
    }

    pub fn codepoint(mut self, cp: u32) -> Self {
        self.codepoint = Some(cp);
        self
    }

    pub fn advance(mut self, advance: u16) -> Self {
        self.advance = advance;
        self
    }

    pub fn outline(mut self, points: &[(f64, f64)]) -> Self {
        self.outline = points.iter().map(|&p| Point::from(p)).collect();
        self
    }

    pub fn empty(mut self) -> Self {
        self.outline.clear();
        self
    }

    pub fn composite(mut self) -> Self {
        self.composite = true;
        self
    }

    /// Single substitution to the glyph at `target`; the lookup index is
    /// taken from the trailing number of `rule`.
    pub fn subst(mut self, rule: &str, target: u32) -> Self {
        self.pos_sub.push((rule.to_string(), PosSubKind::Substitution, target));
        self
    }

    pub fn alternate(mut self, rule: &str, target: u32) -> Self {
        self.pos_sub.push((rule.to_string(), PosSubKind::AlternateSubstitution, target));
        self
    }

    pub fn worth(&self) -> bool {
        !self.cleared && !self.outline.is_empty()
    }

    pub fn pos_sub(&self) -> Vec<PosSubEntry> {
        self.pos_sub
            .iter()
            .map(|(rule, kind, target)| PosSubEntry {
                lookup: LookupId::new(LookupKind::Substitution, rule_lookup_index(rule)),
                rule: rule.clone(),
                kind: *kind,
                target: GlyphId::new(*target),
            })
            .collect()
    }
}

fn rule_lookup_index(rule: &str) -> u16 {
    rule.rsplit(' ').next().and_then(|n| n.parse().ok()).unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockFont {
    pub glyphs: Vec<MockGlyph>,
    pub em: u16,
    pub metrics: EmMetrics,
    pub lookups: Vec<LookupId>,
    pub info: FontInfo,
    pub unlinked: Vec<GlyphId>,
    pub copies: Vec<(GlyphId, GlyphId)>,
    pub rescales: usize,
    pub transforms: Vec<(Vec<GlyphId>, Affine, TransformOptions)>,
}

impl MockFont {
    pub fn new(glyphs: Vec<MockGlyph>) -> Self {
        Self {
            glyphs,
            em: 2048,
            metrics: EmMetrics::new(1802, 246),
            lookups: Vec::new(),
            info: FontInfo::default(),
            unlinked: Vec::new(),
            copies: Vec::new(),
            rescales: 0,
            transforms: Vec::new(),
        }
    }

    pub fn with_metrics(mut self, ascent: u16, descent: u16) -> Self {
        self.metrics = EmMetrics::new(ascent, descent);
        self.em = ascent + descent;
        self
    }

    pub fn with_lookups(mut self, gsub: u16, gpos: u16) -> Self {
        self.lookups = (0..gsub)
            .map(|i| LookupId::new(LookupKind::Substitution, i))
            .chain((0..gpos).map(|i| LookupId::new(LookupKind::Positioning, i)))
            .collect();
        self
    }

    fn tagged(mut self, source: &'static str) -> Self {
        for glyph in &mut self.glyphs {
            glyph.source = source;
        }
        self
    }
}

impl Font for MockFont {
    fn em(&self) -> u16 {
        self.em
    }

    fn set_em(&mut self, em: u16) {
        let scale = f64::from(em) / f64::from(self.em);
        for glyph in &mut self.glyphs {
            glyph.outline.iter_mut().for_each(|p| *p = (p.to_vec2() * scale).to_point());
            glyph.advance = (f64::from(glyph.advance) * scale).round() as u16;
        }
        self.em = em;
        self.rescales += 1;
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
            .map(|(i, g)| GlyphRef {
                id: GlyphId::new(i as u32),
                name: g.name.clone(),
                codepoint: g.codepoint.map(Codepoint::new),
                worth_outputting: g.worth(),
                pos_sub: g.pos_sub(),
            })
            .collect()
    }

    fn glyph_by_codepoint(&self, codepoint: Codepoint) -> Option<GlyphId> {
        self.glyphs
            .iter()
            .position(|g| g.codepoint == Some(codepoint.to_u32()))
            .map(|i| GlyphId::new(i as u32))
    }

    fn unlink_references(&mut self, glyphs: &GlyphSet) {
        for id in glyphs.iter() {
            let glyph = &mut self.glyphs[id.to_usize()];
            if glyph.composite {
                glyph.composite = false;
                self.unlinked.push(id);
            }
        }
    }

    fn copy_glyph(&mut self, from: GlyphId, to: GlyphId) -> bool {
        let Some(source) = self.glyphs.get(from.to_usize()).cloned() else {
            return false;
        };
        let Some(dest) = self.glyphs.get_mut(to.to_usize()) else {
            return false;
        };
        dest.outline = source.outline;
        dest.advance = source.advance;
        self.copies.push((from, to));
        true
    }

    fn clear_glyph(&mut self, glyph: GlyphId) {
        if let Some(g) = self.glyphs.get_mut(glyph.to_usize()) {
            g.outline.clear();
            g.advance = 0;
            g.codepoint = None;
            g.cleared = true;
            g.pos_sub.clear();
        }
    }

    fn lookups(&self, kind: LookupKind) -> Vec<LookupId> {
        self.lookups.iter().copied().filter(|l| l.kind == kind).collect()
    }

    fn remove_lookup(&mut self, lookup: LookupId) {
        self.lookups.retain(|l| *l != lookup);
        if lookup.kind == LookupKind::Substitution {
            for glyph in &mut self.glyphs {
                glyph.pos_sub.retain(|(rule, _, _)| rule_lookup_index(rule) != lookup.index);
            }
        }
    }

    fn transform(&mut self, glyphs: &GlyphSet, affine: Affine, options: TransformOptions) {
        for id in glyphs.iter() {
            let glyph = &mut self.glyphs[id.to_usize()];
            glyph.outline.iter_mut().for_each(|p| *p = affine * *p);
            if !options.preserve_advance {
                glyph.advance = (f64::from(glyph.advance) * affine.as_coeffs()[0]).round() as u16;
            }
        }
        self.transforms.push((glyphs.iter().collect(), affine, options));
    }

    fn bounding_box(&self, glyph: GlyphId) -> Option<Rect> {
        let points = &self.glyphs.get(glyph.to_usize())?.outline;
        let first = points.first()?;
        Some(points.iter().fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)))
    }

    fn info(&self) -> &FontInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut FontInfo {
        &mut self.info
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct MockError(String);

/// Engine whose "files" are placeholders on disk backed by an in-memory map.
#[derive(Debug, Default)]
pub struct MockEngine {
    pub fail_merge: bool,
    pub fail_generate: bool,
    fonts: RefCell<HashMap<PathBuf, MockFont>>,
    generated: RefCell<HashMap<PathBuf, MockFont>>,
}

impl MockEngine {
    /// An engine whose `merge_from` always fails.
    pub fn failing_merge() -> Self {
        Self { fail_merge: true, ..Self::default() }
    }

    /// An engine whose `generate` always fails.
    pub fn failing_generate() -> Self {
        Self { fail_generate: true, ..Self::default() }
    }

    pub fn register(&self, path: &Path, font: MockFont) {
        fs::write(path, b"mock").unwrap();
        self.fonts.borrow_mut().insert(path.to_path_buf(), font);
    }

    pub fn generated(&self, path: &Path) -> Option<MockFont> {
        self.generated.borrow().get(path).cloned()
    }
}

impl FontEngine for MockEngine {
    type Font = MockFont;
    type Error = MockError;

    const INTERCHANGE_EXTENSION: &'static str = "sfd";

    fn open(&self, path: &Path) -> Result<MockFont, MockError> {
        self.fonts
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| MockError(format!("no font at {}", path.display())))
    }

    fn save(&self, font: &MockFont, path: &Path) -> Result<(), MockError> {
        self.register(path, font.clone());
        Ok(())
    }

    fn merge_from(&self, primary: &mut MockFont, path: &Path) -> Result<(), MockError> {
        if self.fail_merge {
            return Err(MockError("merge failed".into()));
        }
        let secondary = self.open(path)?;
        for mut glyph in secondary.glyphs {
            if let Some(cp) = glyph.codepoint
                && primary.glyph_by_codepoint(Codepoint::new(cp)).is_some()
            {
                glyph.codepoint = None;
            }
            primary.glyphs.push(glyph);
        }
        Ok(())
    }

    fn generate(&self, font: &MockFont, path: &Path) -> Result<(), MockError> {
        if self.fail_generate {
            return Err(MockError("generate failed".into()));
        }
        fs::write(path, b"mock").map_err(|e| MockError(e.to_string()))?;
        self.generated.borrow_mut().insert(path.to_path_buf(), font.clone());
        Ok(())
    }
}

/// A small Latin source: composites, tabular figures and the reference glyphs.
pub fn latin_font() -> MockFont {
    MockFont::new(vec![
        MockGlyph::new(".notdef"),
        MockGlyph::new("space").codepoint(0x20).empty(),
        MockGlyph::new("A").codepoint(0x41).outline(&[(10.0, 0.0), (1300.0, 1490.0)]),
        MockGlyph::new("H").codepoint(0x48).outline(&[(150.0, 0.0), (1250.0, 1490.0)]),
        MockGlyph::new("x").codepoint(0x78).outline(&[(40.0, 0.0), (1000.0, 1118.0)]),
        MockGlyph::new("one").codepoint(0x31).advance(900).subst("'tnum' lookup 3", 6),
        MockGlyph::new("one.tf").advance(1200),
        MockGlyph::new("Aacute").codepoint(0xC1).composite(),
        MockGlyph::new("f_i"),
    ])
    .with_metrics(1638, 410)
    .with_lookups(4, 2)
    .tagged("latin")
}

/// A small script source sharing some codepoints with [`latin_font`].
pub fn script_font() -> MockFont {
    MockFont::new(vec![
        MockGlyph::new(".notdef"),
        MockGlyph::new("A").codepoint(0x41),
        MockGlyph::new("one").codepoint(0x31),
        MockGlyph::new("uni3042").codepoint(0x3042),
        MockGlyph::new("uni4E00").codepoint(0x4E00),
        MockGlyph::new("f_i"),
    ])
    .with_metrics(1802, 246)
    .with_lookups(2, 1)
    .tagged("script")
}
