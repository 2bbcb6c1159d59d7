//! Explicit glyph selections passed between stages.

use std::collections::{BTreeSet, btree_set};

use crate::font::{Font, GlyphId};

/// An ordered set of glyphs of one font.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphSet(BTreeSet<GlyphId>);

impl GlyphSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every glyph of `font` that is worth outputting.
    pub fn worth_outputting(font: &impl Font) -> Self {
        font.glyphs()
            .into_iter()
            .filter(|glyph| glyph.worth_outputting)
            .map(|glyph| glyph.id)
            .collect()
    }

    pub fn insert(&mut self, glyph: GlyphId) -> bool {
        self.0.insert(glyph)
    }

    pub fn contains(&self, glyph: GlyphId) -> bool {
        self.0.contains(&glyph)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = GlyphId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<GlyphId> for GlyphSet {
    fn from_iter<I: IntoIterator<Item = GlyphId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for GlyphSet {
    type Item = GlyphId;
    type IntoIter = btree_set::IntoIter<GlyphId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
