//! Substitution rules exposed as per-glyph entries.

use std::collections::BTreeMap;

use hibizukai_core::{GlyphId, LookupId, LookupKind, PosSubEntry, PosSubKind};
use read_fonts::{
    ReadError,
    tables::{
        gsub::{Gsub, SingleSubst, SubstitutionLookup, SubstitutionSubtables},
        layout::CoverageTable,
    },
};

/// Collect single and alternate substitutions, keyed by source glyph.
///
/// A lookup is named after the first feature that uses it; lookups no feature
/// references are skipped.
pub fn read_pos_sub(gsub: &Gsub) -> Result<BTreeMap<u32, Vec<PosSubEntry>>, ReadError> {
    let mut entries: BTreeMap<u32, Vec<PosSubEntry>> = BTreeMap::new();
    let lookup_list = gsub.lookup_list()?;

    for (index, tag) in lookup_features(gsub)? {
        let Ok(lookup) = lookup_list.lookups().get(index as usize) else {
            continue;
        };
        let lookup_id = LookupId::new(LookupKind::Substitution, index);
        let rule = format!("'{tag}' lookup {index}");

        for (from, to, kind) in substitutions(&lookup)? {
            entries.entry(from).or_default().push(PosSubEntry {
                lookup: lookup_id,
                rule: rule.clone(),
                kind,
                target: GlyphId::new(to),
            });
        }
    }
    Ok(entries)
}

/// First feature tag of every referenced lookup.
fn lookup_features(gsub: &Gsub) -> Result<BTreeMap<u16, String>, ReadError> {
    let feature_list = gsub.feature_list()?;
    let mut tags = BTreeMap::new();
    for record in feature_list.feature_records() {
        let Ok(feature) = record.feature(feature_list.offset_data()) else {
            continue;
        };
        for index in feature.lookup_list_indices() {
            tags.entry(index.get()).or_insert_with(|| record.feature_tag().to_string());
        }
    }
    Ok(tags)
}

fn substitutions(
    lookup: &SubstitutionLookup<'_>,
) -> Result<Vec<(u32, u32, PosSubKind)>, ReadError> {
    let mut out = Vec::new();
    match lookup.subtables()? {
        SubstitutionSubtables::Single(tables) => {
            for table in tables.iter().flatten() {
                match table {
                    SingleSubst::Format1(fmt) => {
                        let delta = i32::from(fmt.delta_glyph_id());
                        for gid in Coverage(fmt.coverage()?).iter() {
                            let to = (gid as i32 + delta).rem_euclid(0x10000) as u32;
                            out.push((gid, to, PosSubKind::Substitution));
                        }
                    }
                    SingleSubst::Format2(fmt) => {
                        let subs = fmt.substitute_glyph_ids();
                        for (i, gid) in Coverage(fmt.coverage()?).iter().enumerate() {
                            if let Some(new) = subs.get(i) {
                                out.push((gid, new.get().to_u32(), PosSubKind::Substitution));
                            }
                        }
                    }
                }
            }
        }
        SubstitutionSubtables::Alternate(tables) => {
            for table in tables.iter().flatten() {
                let coverage = Coverage(table.coverage()?);
                for (i, alt) in table.alternate_sets().iter().enumerate() {
                    let (Some(from), Ok(alt)) = (coverage.get(i as u16), alt) else {
                        continue;
                    };
                    if let Some(gid) = alt.alternate_glyph_ids().first() {
                        out.push((from, gid.get().to_u32(), PosSubKind::AlternateSubstitution));
                    }
                }
            }
        }
        _ => {}
    }
    Ok(out)
}

struct Coverage<'a>(CoverageTable<'a>);

impl Coverage<'_> {
    fn get(&self, index: u16) -> Option<u32> {
        match &self.0 {
            CoverageTable::Format1(f) => {
                f.glyph_array().get(index as usize).map(|g| g.get().to_u32())
            }
            CoverageTable::Format2(f) => f.range_records().iter().find_map(|r| {
                let (start, end, base) = (
                    r.start_glyph_id().to_u32(),
                    r.end_glyph_id().to_u32(),
                    u32::from(r.start_coverage_index()),
                );
                let len = end.checked_sub(start)? + 1;
                let offset = u32::from(index).checked_sub(base)?;
                (offset < len).then(|| start + offset)
            }),
        }
    }

    fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match &self.0 {
            CoverageTable::Format1(f) => Box::new(f.glyph_array().iter().map(|g| g.get().to_u32())),
            CoverageTable::Format2(f) => Box::new(f.range_records().iter().flat_map(|r| {
                r.start_glyph_id().to_u32()..=r.end_glyph_id().to_u32()
            })),
        }
    }
}
