//! Character map reading and format 12 writing.

use std::collections::BTreeMap;

use read_fonts::tables::cmap::{Cmap as ReadCmap, CmapSubtable, PlatformId};
use write_fonts::tables::cmap::{
    Cmap, Cmap12, CmapSubtable as WriteCmapSubtable, EncodingRecord,
    PlatformId as WritePlatformId, SequentialMapGroup,
};

/// Codepoints of each glyph, keyed by glyph index.
pub fn read_codepoints(cmap: &ReadCmap) -> BTreeMap<u32, Vec<u32>> {
    let mut by_glyph: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    if let Some(subtable) = find_best_subtable(cmap) {
        for (codepoint, gid) in subtable.iter() {
            if gid.to_u32() != 0 {
                by_glyph.entry(gid.to_u32()).or_default().push(codepoint);
            }
        }
    }
    for codepoints in by_glyph.values_mut() {
        codepoints.sort_unstable();
        codepoints.dedup();
    }
    by_glyph
}

/// Prefer a full-repertoire subtable, then BMP, then anything readable.
fn find_best_subtable<'a>(cmap: &'a ReadCmap<'a>) -> Option<CmapSubtable<'a>> {
    let records = cmap.encoding_records();

    for record in records {
        if (record.platform_id() == PlatformId::Unicode
            || (record.platform_id() == PlatformId::Windows && record.encoding_id() == 10))
            && let Ok(subtable) = record.subtable(cmap.offset_data())
            && matches!(subtable, CmapSubtable::Format12(_))
        {
            return Some(subtable);
        }
    }

    for record in records {
        if (record.platform_id() == PlatformId::Unicode
            || (record.platform_id() == PlatformId::Windows && record.encoding_id() == 1))
            && let Ok(subtable) = record.subtable(cmap.offset_data())
            && matches!(subtable, CmapSubtable::Format4(_))
        {
            return Some(subtable);
        }
    }

    records.iter().find_map(|r| r.subtable(cmap.offset_data()).ok())
}

/// Build a cmap with format 12 subtables for the Unicode and Windows platforms.
///
/// `mappings` must be sorted by codepoint.
pub fn build_cmap(mappings: &[(u32, u32)]) -> Cmap {
    let cmap12 = Cmap12 { language: 0, groups: build_sequential_groups(mappings) };

    Cmap::new(vec![
        EncodingRecord::new(WritePlatformId::Unicode, 4, WriteCmapSubtable::Format12(cmap12.clone())),
        EncodingRecord::new(WritePlatformId::Windows, 10, WriteCmapSubtable::Format12(cmap12)),
    ])
}

/// Group runs of consecutive codepoints that map to consecutive glyphs.
fn build_sequential_groups(mappings: &[(u32, u32)]) -> Vec<SequentialMapGroup> {
    let mut groups: Vec<SequentialMapGroup> = Vec::new();
    for &(cp, gid) in mappings {
        if let Some(last) = groups.last_mut() {
            let next_gid = last.start_glyph_id + (last.end_char_code + 1 - last.start_char_code);
            if cp == last.end_char_code + 1 && gid == next_gid {
                last.end_char_code = cp;
                continue;
            }
        }
        groups.push(SequentialMapGroup::new(cp, cp, gid));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_groups() {
        let groups = build_sequential_groups(&[(0x41, 1), (0x42, 2), (0x43, 3), (0x45, 4), (0x3042, 9)]);
        let ranges: Vec<_> = groups
            .iter()
            .map(|g| (g.start_char_code, g.end_char_code, g.start_glyph_id))
            .collect();
        assert_eq!(ranges, vec![(0x41, 0x43, 1), (0x45, 0x45, 4), (0x3042, 0x3042, 9)]);
    }

    #[test]
    fn test_non_consecutive_glyphs_split() {
        let groups = build_sequential_groups(&[(0x30, 5), (0x31, 7)]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_empty() {
        assert!(build_sequential_groups(&[]).is_empty());
    }
}
