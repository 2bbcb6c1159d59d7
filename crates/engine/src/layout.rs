//! Rebuilding GSUB, GPOS and GDEF.
//!
//! The raw tables read from a font stay valid only while its glyph ids,
//! design coordinates and lookups are untouched. Once a lookup is removed,
//! the em changes, or another font's glyphs are appended, the tables are
//! decoded with `read-fonts`, re-addressed, and compiled again with
//! `write-fonts`. Removed lookups are kept as empty placeholders so every
//! surviving lookup keeps its index.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use font_types::{BigEndian, GlyphId16, Tag};
use hibizukai_core::{LookupId, LookupKind};
use log::{debug, warn};
use read_fonts::{
    FontData, FontRead, ReadError,
    tables::{gdef as read_gdef, gpos as read_gpos, gsub as read_gsub, layout as read_layout},
};
use write_fonts::{
    dump_table,
    tables::{
        gdef::{
            AttachList, AttachPoint, CaretValue, CaretValueFormat1, CaretValueFormat2, Gdef,
            LigCaretList, LigGlyph, MarkGlyphSets,
        },
        gpos::{
            AnchorFormat1, AnchorFormat2, AnchorTable, BaseArray, BaseRecord, Class1Record,
            Class2Record, ComponentRecord, CursivePosFormat1, EntryExitRecord, Gpos,
            LigatureArray, LigatureAttach, Mark2Array, Mark2Record, MarkArray, MarkBasePosFormat1,
            MarkLigPosFormat1, MarkMarkPosFormat1, MarkRecord, PairPos, PairPosFormat1,
            PairPosFormat2, PairSet, PairValueRecord, PositionChainContext, PositionLookup,
            PositionLookupList, PositionSequenceContext, SinglePos, SinglePosFormat1,
            SinglePosFormat2, ValueRecord,
        },
        gsub::{
            AlternateSet, AlternateSubstFormat1, Gsub, Ligature, LigatureSet,
            LigatureSubstFormat1, MultipleSubstFormat1, ReverseChainSingleSubstFormat1, Sequence,
            SingleSubst, SubstitutionChainContext, SubstitutionLookup,
            SubstitutionLookupList, SubstitutionSequenceContext,
        },
        layout::{
            ChainedClassSequenceRule, ChainedClassSequenceRuleSet, ChainedSequenceContext,
            ChainedSequenceContextFormat1, ChainedSequenceContextFormat2,
            ChainedSequenceContextFormat3, ChainedSequenceRule, ChainedSequenceRuleSet, ClassDef,
            ClassSequenceRule, ClassSequenceRuleSet, CoverageTable, Feature, FeatureList,
            FeatureRecord, LangSys, LangSysRecord, Lookup, LookupFlag, Script, ScriptList,
            ScriptRecord, SequenceContext, SequenceContextFormat1, SequenceContextFormat2,
            SequenceContextFormat3, SequenceLookupRecord, SequenceRule, SequenceRuleSet,
        },
    },
};

use crate::{Result, font::LayoutTables};

type ReadResult<T> = std::result::Result<T, ReadError>;

const DEFAULT_SCRIPT: Tag = Tag::new(b"DFLT");
const NO_REQUIRED_FEATURE: u16 = 0xFFFF;
/// Mark attachment classes live in the high byte of the lookup flag.
const MAX_MARK_CLASS: u16 = 0xFF;

/// One font's layout tables and the glyph id its first glyph lands on.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LayoutSource<'a> {
    pub tables: &'a LayoutTables,
    pub glyph_offset: u16,
}

impl<'a> LayoutSource<'a> {
    pub fn new(tables: &'a LayoutTables, glyph_offset: u16) -> Self {
        Self { tables, glyph_offset }
    }

    fn removed(&self, kind: LookupKind) -> BTreeSet<u16> {
        self.tables.removed.iter().filter(|l| l.kind == kind).map(|l| l.index).collect()
    }
}

/// Compile the layout of every source into one set of tables, in order.
///
/// Lookups removed from a source stay removed, at their new index.
pub(crate) fn merge(sources: &[LayoutSource<'_>]) -> Result<LayoutTables> {
    let remaps = remaps(sources)?;
    let mut removed = BTreeSet::new();
    for kind in [LookupKind::Substitution, LookupKind::Positioning] {
        let mut offset = 0u16;
        for source in sources {
            removed.extend(
                source.removed(kind).into_iter().map(|i| LookupId::new(kind, i.saturating_add(offset))),
            );
            offset = offset.saturating_add(lookup_count(source.tables, kind)?);
        }
    }
    Ok(LayoutTables {
        gsub: merge_gsub(sources, &remaps)?,
        gpos: merge_gpos(sources, &remaps)?,
        gdef: merge_gdef(sources, &remaps)?,
        removed,
        scale: 1.0,
    })
}

/// Number of lookups in the GSUB or GPOS table, placeholders included.
pub(crate) fn lookup_count(tables: &LayoutTables, kind: LookupKind) -> Result<u16> {
    let count = match kind {
        LookupKind::Substitution => match tables.gsub.as_deref() {
            Some(data) => read_gsub::Gsub::read(FontData::new(data))?.lookup_list()?.lookup_count(),
            None => 0,
        },
        LookupKind::Positioning => match tables.gpos.as_deref() {
            Some(data) => read_gpos::Gpos::read(FontData::new(data))?.lookup_list()?.lookup_count(),
            None => 0,
        },
    };
    Ok(count)
}

/// Where one source's glyphs, coordinates and GDEF indices land.
#[derive(Debug, Clone, Copy)]
struct Remap {
    glyph_offset: u16,
    lookup_offset: u16,
    mark_set_offset: u16,
    mark_class_offset: u16,
    scale: f64,
}

fn remaps(sources: &[LayoutSource<'_>]) -> Result<Vec<Remap>> {
    let mut mark_set_offset = 0u16;
    let mut mark_class_offset = 0u16;
    let mut remaps = Vec::with_capacity(sources.len());
    for source in sources {
        remaps.push(Remap {
            glyph_offset: source.glyph_offset,
            lookup_offset: 0,
            mark_set_offset,
            mark_class_offset,
            scale: source.tables.scale,
        });
        let Some(data) = source.tables.gdef.as_deref() else {
            continue;
        };
        let gdef = read_gdef::Gdef::read(FontData::new(data))?;
        if let Some(sets) = gdef.mark_glyph_sets_def().transpose()? {
            mark_set_offset = mark_set_offset.saturating_add(sets.mark_glyph_set_count());
        }
        if let Some(classes) = gdef.mark_attach_class_def().transpose()? {
            let max = classes.iter().map(|(_, class)| class).max().unwrap_or(0);
            mark_class_offset = mark_class_offset.saturating_add(max);
        }
    }
    Ok(remaps)
}

impl Remap {
    fn glyph(&self, gid: GlyphId16) -> GlyphId16 {
        GlyphId16::new(gid.to_u16().saturating_add(self.glyph_offset))
    }

    fn glyphs(&self, gids: &[BigEndian<GlyphId16>]) -> Vec<GlyphId16> {
        gids.iter().map(|gid| self.glyph(gid.get())).collect()
    }

    fn coord(&self, value: i16) -> i16 {
        (f64::from(value) * self.scale).round() as i16
    }

    fn coverage(&self, coverage: &read_layout::CoverageTable<'_>) -> CoverageTable {
        CoverageTable::format_1(coverage.iter().map(|gid| self.glyph(gid)).collect())
    }

    fn coverages<'a>(
        &self,
        coverages: impl Iterator<Item = ReadResult<read_layout::CoverageTable<'a>>>,
    ) -> ReadResult<Vec<CoverageTable>> {
        coverages.map(|c| c.map(|c| self.coverage(&c))).collect()
    }

    fn class_def(&self, class_def: &read_layout::ClassDef<'_>) -> ClassDef {
        class_def.iter().map(|(gid, class)| (self.glyph(gid), class)).collect()
    }

    fn mark_class(&self, class: u16) -> u16 {
        if class == 0 { 0 } else { class.saturating_add(self.mark_class_offset) }
    }

    fn flag(&self, flag: LookupFlag, mark_set: Option<u16>) -> (LookupFlag, Option<u16>) {
        let mut flag = flag;
        if let Some(class) = flag.mark_attachment_class() {
            let class = self.mark_class(class);
            if class <= MAX_MARK_CLASS {
                flag.set_mark_attachment_class(class);
            } else {
                warn!("Mark attachment class {class} does not fit a lookup flag");
            }
        }
        (flag, mark_set.map(|set| set.saturating_add(self.mark_set_offset)))
    }

    fn lookup_records(
        &self,
        records: &[read_layout::SequenceLookupRecord],
    ) -> Vec<SequenceLookupRecord> {
        records
            .iter()
            .map(|r| {
                SequenceLookupRecord::new(r.sequence_index(), r.lookup_list_index().saturating_add(self.lookup_offset))
            })
            .collect()
    }

    fn value(&self, record: &read_gpos::ValueRecord) -> ValueRecord {
        let mut value = ValueRecord::new();
        if let Some(v) = record.x_placement() {
            value = value.with_x_placement(self.coord(v));
        }
        if let Some(v) = record.y_placement() {
            value = value.with_y_placement(self.coord(v));
        }
        if let Some(v) = record.x_advance() {
            value = value.with_x_advance(self.coord(v));
        }
        if let Some(v) = record.y_advance() {
            value = value.with_y_advance(self.coord(v));
        }
        value
    }

    /// Device tables are not carried; format 3 anchors become format 1.
    fn anchor(&self, anchor: &read_gpos::AnchorTable<'_>) -> AnchorTable {
        match anchor {
            read_gpos::AnchorTable::Format1(a) => AnchorTable::Format1(AnchorFormat1::new(
                self.coord(a.x_coordinate()),
                self.coord(a.y_coordinate()),
            )),
            read_gpos::AnchorTable::Format2(a) => AnchorTable::Format2(AnchorFormat2::new(
                self.coord(a.x_coordinate()),
                self.coord(a.y_coordinate()),
                a.anchor_point(),
            )),
            read_gpos::AnchorTable::Format3(a) => AnchorTable::Format1(AnchorFormat1::new(
                self.coord(a.x_coordinate()),
                self.coord(a.y_coordinate()),
            )),
        }
    }

    fn anchors<'a>(
        &self,
        anchors: impl Iterator<Item = Option<ReadResult<read_gpos::AnchorTable<'a>>>>,
    ) -> ReadResult<Vec<Option<AnchorTable>>> {
        anchors.map(|a| a.transpose().map(|a| a.map(|a| self.anchor(&a)))).collect()
    }

    fn mark_array(&self, array: &read_gpos::MarkArray<'_>) -> ReadResult<MarkArray> {
        let records = array
            .mark_records()
            .iter()
            .map(|r| {
                let anchor = r.mark_anchor(array.offset_data())?;
                Ok(MarkRecord::new(r.mark_class(), self.anchor(&anchor)))
            })
            .collect::<ReadResult<_>>()?;
        Ok(MarkArray::new(records))
    }

    fn caret(&self, caret: &read_gdef::CaretValue<'_>) -> CaretValue {
        match caret {
            read_gdef::CaretValue::Format1(c) => {
                CaretValueFormat1::new(self.coord(c.coordinate())).into()
            }
            read_gdef::CaretValue::Format2(c) => {
                CaretValueFormat2::new(c.caret_value_point_index()).into()
            }
            read_gdef::CaretValue::Format3(c) => {
                CaretValueFormat1::new(self.coord(c.coordinate())).into()
            }
        }
    }
}

/// Flag, mark filtering set and whether subtables survive, for one lookup.
struct LookupHeader {
    flag: LookupFlag,
    mark_set: Option<u16>,
    keep: bool,
}

impl LookupHeader {
    fn new(remap: &Remap, flag: LookupFlag, mark_set: Option<u16>, keep: bool) -> Self {
        let (flag, mark_set) = remap.flag(flag, mark_set);
        Self { flag, mark_set, keep }
    }

    fn build<R, T: Default>(
        &self,
        subtables: impl Iterator<Item = ReadResult<R>>,
        convert: impl Fn(R) -> ReadResult<T>,
    ) -> ReadResult<Lookup<T>> {
        let subtables = if self.keep {
            subtables.map(|s| s.and_then(&convert)).collect::<ReadResult<Vec<_>>>()?
        } else {
            Vec::new()
        };
        let mut lookup = Lookup::new(self.flag, subtables);
        lookup.mark_filtering_set = self.mark_set;
        Ok(lookup)
    }
}

fn merge_gsub(sources: &[LayoutSource<'_>], remaps: &[Remap]) -> Result<Option<Vec<u8>>> {
    let mut lookups = Vec::new();
    let mut features = Vec::new();
    let mut kept = 0usize;
    for (source, remap) in sources.iter().zip(remaps) {
        let Some(data) = source.tables.gsub.as_deref() else {
            continue;
        };
        let gsub = read_gsub::Gsub::read(FontData::new(data))?;
        let remap = Remap { lookup_offset: lookups.len() as u16, ..*remap };
        let removed = source.removed(LookupKind::Substitution);
        for (index, lookup) in gsub.lookup_list()?.lookups().iter().enumerate() {
            let keep = !removed.contains(&(index as u16));
            kept += usize::from(keep);
            lookups.push(gsub_lookup(&lookup?, &remap, keep)?);
        }
        features.push(FeatureSource {
            scripts: gsub.script_list()?,
            features: gsub.feature_list()?,
            lookup_offset: remap.lookup_offset,
            removed,
        });
    }
    if kept == 0 {
        debug!("No GSUB lookups left");
        return Ok(None);
    }
    let (scripts, features) = merge_features(&features)?;
    let gsub = Gsub::new(scripts, features, SubstitutionLookupList::new(lookups));
    Ok(Some(dump_table(&gsub)?))
}

fn merge_gpos(sources: &[LayoutSource<'_>], remaps: &[Remap]) -> Result<Option<Vec<u8>>> {
    let mut lookups = Vec::new();
    let mut features = Vec::new();
    let mut kept = 0usize;
    for (source, remap) in sources.iter().zip(remaps) {
        let Some(data) = source.tables.gpos.as_deref() else {
            continue;
        };
        let gpos = read_gpos::Gpos::read(FontData::new(data))?;
        let remap = Remap { lookup_offset: lookups.len() as u16, ..*remap };
        let removed = source.removed(LookupKind::Positioning);
        for (index, lookup) in gpos.lookup_list()?.lookups().iter().enumerate() {
            let keep = !removed.contains(&(index as u16));
            kept += usize::from(keep);
            lookups.push(gpos_lookup(&lookup?, &remap, keep)?);
        }
        features.push(FeatureSource {
            scripts: gpos.script_list()?,
            features: gpos.feature_list()?,
            lookup_offset: remap.lookup_offset,
            removed,
        });
    }
    if kept == 0 {
        debug!("No GPOS lookups left");
        return Ok(None);
    }
    let (scripts, features) = merge_features(&features)?;
    let gpos = Gpos::new(scripts, features, PositionLookupList::new(lookups));
    Ok(Some(dump_table(&gpos)?))
}

fn gsub_lookup(
    lookup: &read_gsub::SubstitutionLookup<'_>,
    remap: &Remap,
    keep: bool,
) -> ReadResult<SubstitutionLookup> {
    use read_gsub::SubstitutionSubtables as Subtables;

    let header = LookupHeader::new(remap, lookup.lookup_flag(), lookup.mark_filtering_set(), keep);
    Ok(match lookup.subtables()? {
        Subtables::Single(s) => {
            SubstitutionLookup::Single(header.build(s.iter(), |t| single_subst(t, remap))?)
        }
        Subtables::Multiple(s) => {
            SubstitutionLookup::Multiple(header.build(s.iter(), |t| multiple_subst(t, remap))?)
        }
        Subtables::Alternate(s) => {
            SubstitutionLookup::Alternate(header.build(s.iter(), |t| alternate_subst(t, remap))?)
        }
        Subtables::Ligature(s) => {
            SubstitutionLookup::Ligature(header.build(s.iter(), |t| ligature_subst(t, remap))?)
        }
        Subtables::Contextual(s) => SubstitutionLookup::Contextual(header.build(s.iter(), |t| {
            sequence_context(t, remap).map(SubstitutionSequenceContext::from)
        })?),
        Subtables::ChainContextual(s) => {
            SubstitutionLookup::ChainContextual(header.build(s.iter(), |t| {
                chained_context(t, remap).map(SubstitutionChainContext::from)
            })?)
        }
        Subtables::Reverse(s) => {
            SubstitutionLookup::Reverse(header.build(s.iter(), |t| reverse_subst(t, remap))?)
        }
    })
}

fn single_subst(table: read_gsub::SingleSubst<'_>, remap: &Remap) -> ReadResult<SingleSubst> {
    Ok(match table {
        read_gsub::SingleSubst::Format1(t) => {
            SingleSubst::format_1(remap.coverage(&t.coverage()?), t.delta_glyph_id())
        }
        read_gsub::SingleSubst::Format2(t) => {
            SingleSubst::format_2(remap.coverage(&t.coverage()?), remap.glyphs(t.substitute_glyph_ids()))
        }
    })
}

fn multiple_subst(
    table: read_gsub::MultipleSubstFormat1<'_>,
    remap: &Remap,
) -> ReadResult<MultipleSubstFormat1> {
    let sequences = table
        .sequences()
        .iter()
        .map(|s| s.map(|s| Sequence::new(remap.glyphs(s.substitute_glyph_ids()))))
        .collect::<ReadResult<_>>()?;
    Ok(MultipleSubstFormat1::new(remap.coverage(&table.coverage()?), sequences))
}

fn alternate_subst(
    table: read_gsub::AlternateSubstFormat1<'_>,
    remap: &Remap,
) -> ReadResult<AlternateSubstFormat1> {
    let sets = table
        .alternate_sets()
        .iter()
        .map(|s| s.map(|s| AlternateSet::new(remap.glyphs(s.alternate_glyph_ids()))))
        .collect::<ReadResult<_>>()?;
    Ok(AlternateSubstFormat1::new(remap.coverage(&table.coverage()?), sets))
}

fn ligature_subst(
    table: read_gsub::LigatureSubstFormat1<'_>,
    remap: &Remap,
) -> ReadResult<LigatureSubstFormat1> {
    let sets = table
        .ligature_sets()
        .iter()
        .map(|set| -> ReadResult<LigatureSet> {
            let ligatures = set?
                .ligatures()
                .iter()
                .map(|l| {
                    l.map(|l| {
                        Ligature::new(
                            remap.glyph(l.ligature_glyph()),
                            remap.glyphs(l.component_glyph_ids()),
                        )
                    })
                })
                .collect::<ReadResult<_>>()?;
            Ok(LigatureSet::new(ligatures))
        })
        .collect::<ReadResult<_>>()?;
    Ok(LigatureSubstFormat1::new(remap.coverage(&table.coverage()?), sets))
}

fn reverse_subst(
    table: read_gsub::ReverseChainSingleSubstFormat1<'_>,
    remap: &Remap,
) -> ReadResult<ReverseChainSingleSubstFormat1> {
    Ok(ReverseChainSingleSubstFormat1::new(
        remap.coverage(&table.coverage()?),
        remap.coverages(table.backtrack_coverages().iter())?,
        remap.coverages(table.lookahead_coverages().iter())?,
        remap.glyphs(table.substitute_glyph_ids()),
    ))
}

fn gpos_lookup(
    lookup: &read_gpos::PositionLookup<'_>,
    remap: &Remap,
    keep: bool,
) -> ReadResult<PositionLookup> {
    use read_gpos::PositionSubtables as Subtables;

    let header = LookupHeader::new(remap, lookup.lookup_flag(), lookup.mark_filtering_set(), keep);
    Ok(match lookup.subtables()? {
        Subtables::Single(s) => PositionLookup::Single(header.build(s.iter(), |t| single_pos(t, remap))?),
        Subtables::Pair(s) => PositionLookup::Pair(header.build(s.iter(), |t| pair_pos(t, remap))?),
        Subtables::Cursive(s) => {
            PositionLookup::Cursive(header.build(s.iter(), |t| cursive_pos(t, remap))?)
        }
        Subtables::MarkToBase(s) => {
            PositionLookup::MarkToBase(header.build(s.iter(), |t| mark_base_pos(t, remap))?)
        }
        Subtables::MarkToLig(s) => {
            PositionLookup::MarkToLig(header.build(s.iter(), |t| mark_lig_pos(t, remap))?)
        }
        Subtables::MarkToMark(s) => {
            PositionLookup::MarkToMark(header.build(s.iter(), |t| mark_mark_pos(t, remap))?)
        }
        Subtables::Contextual(s) => PositionLookup::Contextual(header.build(s.iter(), |t| {
            sequence_context(t, remap).map(PositionSequenceContext::from)
        })?),
        Subtables::ChainContextual(s) => PositionLookup::ChainContextual(header.build(s.iter(), |t| {
            chained_context(t, remap).map(PositionChainContext::from)
        })?),
    })
}

fn single_pos(table: read_gpos::SinglePos<'_>, remap: &Remap) -> ReadResult<SinglePos> {
    Ok(match table {
        read_gpos::SinglePos::Format1(t) => SinglePos::Format1(SinglePosFormat1::new(
            remap.coverage(&t.coverage()?),
            remap.value(&t.value_record()),
        )),
        read_gpos::SinglePos::Format2(t) => {
            let values = t
                .value_records()
                .iter()
                .map(|v| v.map(|v| remap.value(&v)))
                .collect::<ReadResult<_>>()?;
            SinglePos::Format2(SinglePosFormat2::new(remap.coverage(&t.coverage()?), values))
        }
    })
}

fn pair_pos(table: read_gpos::PairPos<'_>, remap: &Remap) -> ReadResult<PairPos> {
    Ok(match table {
        read_gpos::PairPos::Format1(t) => {
            let pair_sets = t
                .pair_sets()
                .iter()
                .map(|set| -> ReadResult<PairSet> {
                    let records = set?
                        .pair_value_records()
                        .iter()
                        .map(|r| {
                            r.map(|r| {
                                PairValueRecord::new(
                                    remap.glyph(r.second_glyph()),
                                    remap.value(r.value_record1()),
                                    remap.value(r.value_record2()),
                                )
                            })
                        })
                        .collect::<ReadResult<_>>()?;
                    Ok(PairSet::new(records))
                })
                .collect::<ReadResult<_>>()?;
            PairPos::Format1(PairPosFormat1::new(remap.coverage(&t.coverage()?), pair_sets))
        }
        read_gpos::PairPos::Format2(t) => {
            let class1_records = t
                .class1_records()
                .iter()
                .map(|c1| -> ReadResult<Class1Record> {
                    let class2_records = c1?
                        .class2_records()
                        .iter()
                        .map(|c2| {
                            c2.map(|c2| {
                                Class2Record::new(
                                    remap.value(c2.value_record1()),
                                    remap.value(c2.value_record2()),
                                )
                            })
                        })
                        .collect::<ReadResult<_>>()?;
                    Ok(Class1Record::new(class2_records))
                })
                .collect::<ReadResult<_>>()?;
            PairPos::Format2(PairPosFormat2::new(
                remap.coverage(&t.coverage()?),
                remap.class_def(&t.class_def1()?),
                remap.class_def(&t.class_def2()?),
                class1_records,
            ))
        }
    })
}

fn cursive_pos(
    table: read_gpos::CursivePosFormat1<'_>,
    remap: &Remap,
) -> ReadResult<CursivePosFormat1> {
    let data = table.offset_data();
    let records = table
        .entry_exit_record()
        .iter()
        .map(|r| -> ReadResult<EntryExitRecord> {
            let entry = r.entry_anchor(data).transpose()?.map(|a| remap.anchor(&a));
            let exit = r.exit_anchor(data).transpose()?.map(|a| remap.anchor(&a));
            Ok(EntryExitRecord::new(entry, exit))
        })
        .collect::<ReadResult<_>>()?;
    Ok(CursivePosFormat1::new(remap.coverage(&table.coverage()?), records))
}

fn mark_base_pos(
    table: read_gpos::MarkBasePosFormat1<'_>,
    remap: &Remap,
) -> ReadResult<MarkBasePosFormat1> {
    let base_array = table.base_array()?;
    let records = base_array
        .base_records()
        .iter()
        .map(|r| -> ReadResult<BaseRecord> {
            let record = r?;
            Ok(BaseRecord::new(remap.anchors(record.base_anchors(base_array.offset_data()).iter())?))
        })
        .collect::<ReadResult<_>>()?;
    Ok(MarkBasePosFormat1::new(
        remap.coverage(&table.mark_coverage()?),
        remap.coverage(&table.base_coverage()?),
        remap.mark_array(&table.mark_array()?)?,
        BaseArray::new(records),
    ))
}

fn mark_lig_pos(
    table: read_gpos::MarkLigPosFormat1<'_>,
    remap: &Remap,
) -> ReadResult<MarkLigPosFormat1> {
    let ligature_array = table.ligature_array()?;
    let attaches = ligature_array
        .ligature_attaches()
        .iter()
        .map(|attach| -> ReadResult<LigatureAttach> {
            let attach = attach?;
            let components = attach
                .component_records()
                .iter()
                .map(|c| -> ReadResult<ComponentRecord> {
                    let component = c?;
                    let anchors = component.ligature_anchors(attach.offset_data());
                    Ok(ComponentRecord::new(remap.anchors(anchors.iter())?))
                })
                .collect::<ReadResult<_>>()?;
            Ok(LigatureAttach::new(components))
        })
        .collect::<ReadResult<_>>()?;
    Ok(MarkLigPosFormat1::new(
        remap.coverage(&table.mark_coverage()?),
        remap.coverage(&table.ligature_coverage()?),
        remap.mark_array(&table.mark_array()?)?,
        LigatureArray::new(attaches),
    ))
}

fn mark_mark_pos(
    table: read_gpos::MarkMarkPosFormat1<'_>,
    remap: &Remap,
) -> ReadResult<MarkMarkPosFormat1> {
    let mark2_array = table.mark2_array()?;
    let records = mark2_array
        .mark2_records()
        .iter()
        .map(|r| -> ReadResult<Mark2Record> {
            let record = r?;
            let anchors = record.mark2_anchors(mark2_array.offset_data());
            Ok(Mark2Record::new(remap.anchors(anchors.iter())?))
        })
        .collect::<ReadResult<_>>()?;
    Ok(MarkMarkPosFormat1::new(
        remap.coverage(&table.mark1_coverage()?),
        remap.coverage(&table.mark2_coverage()?),
        remap.mark_array(&table.mark1_array()?)?,
        Mark2Array::new(records),
    ))
}

fn sequence_context(
    table: read_layout::SequenceContext<'_>,
    remap: &Remap,
) -> ReadResult<SequenceContext> {
    Ok(match table {
        read_layout::SequenceContext::Format1(t) => {
            let rule_sets = t
                .seq_rule_sets()
                .iter()
                .map(|set| -> ReadResult<Option<SequenceRuleSet>> {
                    let Some(set) = set.transpose()? else {
                        return Ok(None);
                    };
                    let rules = set
                        .seq_rules()
                        .iter()
                        .map(|rule| {
                            rule.map(|rule| {
                                SequenceRule::new(
                                    remap.glyphs(rule.input_sequence()),
                                    remap.lookup_records(rule.seq_lookup_records()),
                                )
                            })
                        })
                        .collect::<ReadResult<_>>()?;
                    Ok(Some(SequenceRuleSet::new(rules)))
                })
                .collect::<ReadResult<_>>()?;
            SequenceContext::Format1(SequenceContextFormat1::new(
                remap.coverage(&t.coverage()?),
                rule_sets,
            ))
        }
        read_layout::SequenceContext::Format2(t) => {
            let rule_sets = t
                .class_seq_rule_sets()
                .iter()
                .map(|set| -> ReadResult<Option<ClassSequenceRuleSet>> {
                    let Some(set) = set.transpose()? else {
                        return Ok(None);
                    };
                    let rules = set
                        .class_seq_rules()
                        .iter()
                        .map(|rule| {
                            rule.map(|rule| {
                                ClassSequenceRule::new(
                                    classes(rule.input_sequence()),
                                    remap.lookup_records(rule.seq_lookup_records()),
                                )
                            })
                        })
                        .collect::<ReadResult<_>>()?;
                    Ok(Some(ClassSequenceRuleSet::new(rules)))
                })
                .collect::<ReadResult<_>>()?;
            SequenceContext::Format2(SequenceContextFormat2::new(
                remap.coverage(&t.coverage()?),
                remap.class_def(&t.class_def()?),
                rule_sets,
            ))
        }
        read_layout::SequenceContext::Format3(t) => {
            SequenceContext::Format3(SequenceContextFormat3::new(
                remap.coverages(t.coverages().iter())?,
                remap.lookup_records(t.seq_lookup_records()),
            ))
        }
    })
}

fn chained_context(
    table: read_layout::ChainedSequenceContext<'_>,
    remap: &Remap,
) -> ReadResult<ChainedSequenceContext> {
    Ok(match table {
        read_layout::ChainedSequenceContext::Format1(t) => {
            let rule_sets = t
                .chained_seq_rule_sets()
                .iter()
                .map(|set| -> ReadResult<Option<ChainedSequenceRuleSet>> {
                    let Some(set) = set.transpose()? else {
                        return Ok(None);
                    };
                    let rules = set
                        .chained_seq_rules()
                        .iter()
                        .map(|rule| {
                            rule.map(|rule| {
                                ChainedSequenceRule::new(
                                    remap.glyphs(rule.backtrack_sequence()),
                                    remap.glyphs(rule.input_sequence()),
                                    remap.glyphs(rule.lookahead_sequence()),
                                    remap.lookup_records(rule.seq_lookup_records()),
                                )
                            })
                        })
                        .collect::<ReadResult<_>>()?;
                    Ok(Some(ChainedSequenceRuleSet::new(rules)))
                })
                .collect::<ReadResult<_>>()?;
            ChainedSequenceContext::Format1(ChainedSequenceContextFormat1::new(
                remap.coverage(&t.coverage()?),
                rule_sets,
            ))
        }
        read_layout::ChainedSequenceContext::Format2(t) => {
            let rule_sets = t
                .chained_class_seq_rule_sets()
                .iter()
                .map(|set| -> ReadResult<Option<ChainedClassSequenceRuleSet>> {
                    let Some(set) = set.transpose()? else {
                        return Ok(None);
                    };
                    let rules = set
                        .chained_class_seq_rules()
                        .iter()
                        .map(|rule| {
                            rule.map(|rule| {
                                ChainedClassSequenceRule::new(
                                    classes(rule.backtrack_sequence()),
                                    classes(rule.input_sequence()),
                                    classes(rule.lookahead_sequence()),
                                    remap.lookup_records(rule.seq_lookup_records()),
                                )
                            })
                        })
                        .collect::<ReadResult<_>>()?;
                    Ok(Some(ChainedClassSequenceRuleSet::new(rules)))
                })
                .collect::<ReadResult<_>>()?;
            ChainedSequenceContext::Format2(ChainedSequenceContextFormat2::new(
                remap.coverage(&t.coverage()?),
                remap.class_def(&t.backtrack_class_def()?),
                remap.class_def(&t.input_class_def()?),
                remap.class_def(&t.lookahead_class_def()?),
                rule_sets,
            ))
        }
        read_layout::ChainedSequenceContext::Format3(t) => {
            ChainedSequenceContext::Format3(ChainedSequenceContextFormat3::new(
                remap.coverages(t.backtrack_coverages().iter())?,
                remap.coverages(t.input_coverages().iter())?,
                remap.coverages(t.lookahead_coverages().iter())?,
                remap.lookup_records(t.seq_lookup_records()),
            ))
        }
    })
}

fn classes(values: &[BigEndian<u16>]) -> Vec<u16> {
    values.iter().map(|v| v.get()).collect()
}

/// Script and feature lists of one GSUB or GPOS source.
struct FeatureSource<'a> {
    scripts: read_layout::ScriptList<'a>,
    features: read_layout::FeatureList<'a>,
    lookup_offset: u16,
    removed: BTreeSet<u16>,
}

/// Language systems of one script, keyed by language tag.
#[derive(Default)]
struct ScriptSystems {
    default: Option<LangSys>,
    languages: BTreeMap<Tag, LangSys>,
}

/// Concatenate the feature lists of every source, sorted by tag, and point
/// each language system at its features in the merged list.
///
/// A language system one source lacks falls back to that source's default
/// system for the script, then to its `DFLT` script.
fn merge_features(sources: &[FeatureSource<'_>]) -> ReadResult<(ScriptList, FeatureList)> {
    let mut collected: Vec<(Tag, Vec<u16>, (usize, u16))> = Vec::new();
    for (source_index, source) in sources.iter().enumerate() {
        let data = source.features.offset_data();
        for (feature_index, record) in source.features.feature_records().iter().enumerate() {
            let lookups: Vec<u16> = record
                .feature(data)?
                .lookup_list_indices()
                .iter()
                .map(|i| i.get())
                .filter(|i| !source.removed.contains(i))
                .map(|i| i.saturating_add(source.lookup_offset))
                .collect();
            if !lookups.is_empty() {
                collected.push((record.feature_tag(), lookups, (source_index, feature_index as u16)));
            }
        }
    }
    collected.sort_by_key(|(tag, ..)| *tag);
    let feature_index: HashMap<(usize, u16), u16> = collected
        .iter()
        .enumerate()
        .map(|(new, (_, _, old))| (*old, new as u16))
        .collect();

    let per_source = sources
        .iter()
        .enumerate()
        .map(|(source_index, source)| {
            source_systems(source, |old| feature_index.get(&(source_index, old)).copied())
        })
        .collect::<ReadResult<Vec<_>>>()?;

    let mut merged: BTreeMap<Tag, BTreeMap<Option<Tag>, LangSys>> = BTreeMap::new();
    for systems in &per_source {
        for (script, script_systems) in systems {
            let targets = merged.entry(*script).or_default();
            targets.entry(None).or_insert_with(LangSys::default);
            for language in script_systems.languages.keys() {
                targets.entry(Some(*language)).or_insert_with(LangSys::default);
            }
        }
    }
    for (script, targets) in &mut merged {
        for (language, target) in targets.iter_mut() {
            for systems in &per_source {
                let Some(source) = lookup_system(systems, *script, *language) else {
                    continue;
                };
                target.feature_indices.extend(&source.feature_indices);
                if target.required_feature_index == NO_REQUIRED_FEATURE {
                    target.required_feature_index = source.required_feature_index;
                }
            }
        }
    }

    let script_records = merged
        .into_iter()
        .map(|(script, mut targets)| {
            let default = targets.remove(&None).filter(|l| !is_empty(l));
            let languages = targets
                .into_iter()
                .filter_map(|(tag, lang_sys)| Some(LangSysRecord::new(tag?, lang_sys)))
                .collect();
            ScriptRecord::new(script, Script::new(default, languages))
        })
        .collect();
    let feature_records = collected
        .into_iter()
        .map(|(tag, lookups, _)| FeatureRecord::new(tag, Feature::new(None, lookups)))
        .collect();
    Ok((ScriptList::new(script_records), FeatureList::new(feature_records)))
}

fn is_empty(lang_sys: &LangSys) -> bool {
    lang_sys.feature_indices.is_empty() && lang_sys.required_feature_index == NO_REQUIRED_FEATURE
}

fn lookup_system(
    systems: &BTreeMap<Tag, ScriptSystems>,
    script: Tag,
    language: Option<Tag>,
) -> Option<&LangSys> {
    let Some(own) = systems.get(&script) else {
        return systems.get(&DEFAULT_SCRIPT).and_then(|s| s.default.as_ref());
    };
    language
        .and_then(|tag| own.languages.get(&tag))
        .or(own.default.as_ref())
}

fn source_systems(
    source: &FeatureSource<'_>,
    feature_index: impl Fn(u16) -> Option<u16>,
) -> ReadResult<BTreeMap<Tag, ScriptSystems>> {
    let lang_sys = |read: &read_layout::LangSys<'_>| {
        let mut lang_sys = LangSys::new(
            read.feature_indices().iter().filter_map(|i| feature_index(i.get())).collect(),
        );
        lang_sys.required_feature_index = Some(read.required_feature_index())
            .filter(|i| *i != NO_REQUIRED_FEATURE)
            .and_then(&feature_index)
            .unwrap_or(NO_REQUIRED_FEATURE);
        lang_sys
    };

    let mut systems = BTreeMap::new();
    let data = source.scripts.offset_data();
    for record in source.scripts.script_records() {
        let script = record.script(data)?;
        let mut entry = ScriptSystems {
            default: script.default_lang_sys().transpose()?.map(|l| lang_sys(&l)),
            ..ScriptSystems::default()
        };
        for language in script.lang_sys_records() {
            let read = language.lang_sys(script.offset_data())?;
            entry.languages.insert(language.lang_sys_tag(), lang_sys(&read));
        }
        systems.insert(record.script_tag(), entry);
    }
    Ok(systems)
}

fn merge_gdef(sources: &[LayoutSource<'_>], remaps: &[Remap]) -> Result<Option<Vec<u8>>> {
    let mut found = false;
    let mut glyph_classes = Vec::new();
    let mut mark_classes = Vec::new();
    let mut mark_sets = Vec::new();
    let mut attach_glyphs = Vec::new();
    let mut attach_points = Vec::new();
    let mut caret_glyphs = Vec::new();
    let mut lig_glyphs = Vec::new();

    for (source, remap) in sources.iter().zip(remaps) {
        let Some(data) = source.tables.gdef.as_deref() else {
            continue;
        };
        found = true;
        let gdef = read_gdef::Gdef::read(FontData::new(data))?;
        if let Some(classes) = gdef.glyph_class_def().transpose()? {
            glyph_classes.extend(classes.iter().map(|(gid, class)| (remap.glyph(gid), class)));
        }
        if let Some(classes) = gdef.mark_attach_class_def().transpose()? {
            mark_classes.extend(
                classes
                    .iter()
                    .map(|(gid, class)| (remap.glyph(gid), remap.mark_class(class).min(MAX_MARK_CLASS))),
            );
        }
        if let Some(sets) = gdef.mark_glyph_sets_def().transpose()? {
            mark_sets.extend(remap.coverages(sets.coverages().iter())?);
        }
        if let Some(list) = gdef.attach_list().transpose()? {
            for (gid, point) in list.coverage()?.iter().zip(list.attach_points().iter()) {
                let indices = point?.point_indices().iter().map(|p| p.get()).collect();
                attach_glyphs.push(remap.glyph(gid));
                attach_points.push(AttachPoint::new(indices));
            }
        }
        if let Some(list) = gdef.lig_caret_list().transpose()? {
            for (gid, lig) in list.coverage()?.iter().zip(list.lig_glyphs().iter()) {
                let carets = lig?
                    .caret_values()
                    .iter()
                    .map(|c| c.map(|c| remap.caret(&c)))
                    .collect::<ReadResult<_>>()?;
                caret_glyphs.push(remap.glyph(gid));
                lig_glyphs.push(LigGlyph::new(carets));
            }
        }
    }
    if !found {
        return Ok(None);
    }

    let mut gdef = Gdef::new(
        (!glyph_classes.is_empty()).then(|| glyph_classes.into_iter().collect()),
        (!attach_glyphs.is_empty())
            .then(|| AttachList::new(CoverageTable::format_1(attach_glyphs), attach_points)),
        (!caret_glyphs.is_empty())
            .then(|| LigCaretList::new(CoverageTable::format_1(caret_glyphs), lig_glyphs)),
        (!mark_classes.is_empty()).then(|| mark_classes.into_iter().collect()),
    );
    if !mark_sets.is_empty() {
        gdef.mark_glyph_sets_def = Some(MarkGlyphSets::new(mark_sets)).into();
    }
    Ok(Some(dump_table(&gdef)?))
}

/// Lookups `tables` still holds of `kind`, as ids.
pub(crate) fn live_lookups(tables: &LayoutTables, kind: LookupKind) -> Result<Vec<LookupId>> {
    Ok((0..lookup_count(tables, kind)?)
        .map(|index| LookupId::new(kind, index))
        .filter(|id| !tables.removed.contains(id))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remap(glyph_offset: u16, scale: f64) -> Remap {
        Remap { glyph_offset, lookup_offset: 0, mark_set_offset: 0, mark_class_offset: 0, scale }
    }

    #[test]
    fn test_coordinates_scale_and_round() {
        let remap = remap(0, 2048.0 / 1000.0);
        assert_eq!(remap.coord(100), 205);
        assert_eq!(remap.coord(-50), -102);
    }

    #[test]
    fn test_glyph_offset_saturates() {
        let remap = remap(10, 1.0);
        assert_eq!(remap.glyph(GlyphId16::new(5)), GlyphId16::new(15));
        assert_eq!(remap.glyph(GlyphId16::new(u16::MAX - 3)), GlyphId16::new(u16::MAX));
    }

    #[test]
    fn test_mark_attachment_class_is_shifted() {
        let remap = Remap { mark_class_offset: 2, ..remap(0, 1.0) };
        let mut flag = LookupFlag::IGNORE_MARKS;
        flag.set_mark_attachment_class(1);

        let (flag, mark_set) = remap.flag(flag, None);

        assert_eq!(flag.mark_attachment_class(), Some(3));
        assert!(flag.contains(LookupFlag::IGNORE_MARKS));
        assert_eq!(mark_set, None);
        assert_eq!(remap.mark_class(0), 0);
    }

    #[test]
    fn test_empty_tables_merge_to_nothing() {
        let tables = LayoutTables::default();
        let merged = merge(&[LayoutSource::new(&tables, 0), LayoutSource::new(&tables, 3)]).unwrap();
        assert!(merged.gsub.is_none());
        assert!(merged.gpos.is_none());
        assert!(merged.gdef.is_none());
    }
}
