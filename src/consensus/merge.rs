use log::debug;
use statrs::statistics::Statistics;

use crate::chrom_set::ChromSet;
use crate::int_range::IntRange;
use crate::sv_record::SVRecord;

pub struct MergeSettings {
    /// Max breakpoint position difference (in either direction) for two records to be merged
    pub window: i64,

    /// Deletions and duplications larger than this are merged with the length variation test
    pub large_indel_min_size: i64,

    /// Max ratio of the length standard deviation to the seed length for large indel merges
    pub sd_ratio_threshold: f64,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            window: 20,
            large_indel_min_size: 1000,
            sd_ratio_threshold: 0.2,
        }
    }
}

/// Consensus groups over all input records
///
/// Groups are listed in the order they were formed, and group members are listed in chromosome
/// processing order, with the seed record first for general pass groups.
///
#[derive(Debug, Default)]
pub struct ConsensusGroups {
    pub groups: Vec<Vec<usize>>,

    /// Group index of each input record, or None for records outside of the chromosome set
    pub record_group: Vec<Option<usize>>,

    pub large_indel_group_count: usize,
    pub excluded_record_count: usize,
}

/// A record as seen from one chromosome of the processing loop
///
/// If the record was found on this chromosome through its second breakend, the primary and
/// secondary coordinates are swapped.
///
struct ChromRecord<'a> {
    index: usize,
    pos: i64,
    chrom2: &'a str,
    end: i64,
}

fn is_large_indel(record: &SVRecord, settings: &MergeSettings) -> bool {
    record.sv_type.is_deletion_or_duplication() && record.abs_sv_len() > settings.large_indel_min_size
}

/// Get the ratio of the sample length standard deviation to the seed length
///
/// Returns None when the ratio is undefined, which makes the seed ineligible for the large indel
/// merge.
///
fn get_length_sd_ratio(seed_len: i64, member_lens: &[i64]) -> Option<f64> {
    if seed_len == 0 || member_lens.len() < 2 {
        return None;
    }
    let sd = member_lens.iter().map(|&x| x as f64).std_dev();
    Some(sd / seed_len.abs() as f64)
}

/// Index range of `chrom_records` with primary position inside `window`
fn get_window_bounds(chrom_records: &[ChromRecord], window: &IntRange) -> (usize, usize) {
    let begin = chrom_records.partition_point(|x| x.pos < window.start);
    let end = chrom_records.partition_point(|x| x.pos < window.end);
    (begin, end)
}

/// Merge large deletions and duplications
///
/// Each unprocessed large indel seeds a window holding all unprocessed records of the same type.
/// The window is merged only if the length variation across it is low relative to the seed
/// length.
///
fn merge_large_indels(
    records: &[SVRecord],
    chrom_records: &[ChromRecord],
    settings: &MergeSettings,
    processed: &mut [bool],
    groups: &mut ConsensusGroups,
) {
    for seed_offset in 0..chrom_records.len() {
        if processed[seed_offset] {
            continue;
        }
        let seed = &chrom_records[seed_offset];
        let seed_record = &records[seed.index];
        if !is_large_indel(seed_record, settings) {
            continue;
        }

        let window = IntRange::from_window(seed.pos, settings.window);
        let (begin, end) = get_window_bounds(chrom_records, &window);
        let members = (begin..end)
            .filter(|&offset| {
                !processed[offset] && records[chrom_records[offset].index].sv_type == seed_record.sv_type
            })
            .collect::<Vec<_>>();

        let member_lens = members
            .iter()
            .map(|&offset| records[chrom_records[offset].index].abs_sv_len())
            .collect::<Vec<_>>();
        let Some(sd_ratio) = get_length_sd_ratio(seed_record.sv_len, &member_lens) else {
            continue;
        };
        if sd_ratio >= settings.sd_ratio_threshold {
            continue;
        }

        let group_index = groups.groups.len();
        let mut group = Vec::new();
        for offset in members {
            processed[offset] = true;
            let index = chrom_records[offset].index;
            groups.record_group[index] = Some(group_index);
            group.push(index);
        }
        debug!(
            "Large indel consensus group {group_index} seeded by {seed_record} has {} members",
            group.len()
        );
        groups.groups.push(group);
        groups.large_indel_group_count += 1;
    }
}

/// Merge all remaining records
///
/// Each unprocessed record seeds a new group, which takes every unprocessed record with both
/// breakends inside the seed's breakend windows. Membership is decided against the seed only.
///
fn merge_remaining(
    chrom_records: &[ChromRecord],
    settings: &MergeSettings,
    processed: &mut [bool],
    groups: &mut ConsensusGroups,
) {
    for seed_offset in 0..chrom_records.len() {
        if processed[seed_offset] {
            continue;
        }
        let seed = &chrom_records[seed_offset];
        let group_index = groups.groups.len();
        let mut group = vec![seed.index];
        processed[seed_offset] = true;
        groups.record_group[seed.index] = Some(group_index);

        let pos_window = IntRange::from_window(seed.pos, settings.window);
        let end_window = IntRange::from_window(seed.end, settings.window);
        let (begin, end) = get_window_bounds(chrom_records, &pos_window);
        for offset in begin..end {
            if processed[offset] {
                continue;
            }
            let candidate = &chrom_records[offset];
            if candidate.chrom2 == seed.chrom2 && end_window.intersect_pos(candidate.end) {
                processed[offset] = true;
                groups.record_group[candidate.index] = Some(group_index);
                group.push(candidate.index);
            }
        }
        groups.groups.push(group);
    }
}

/// Merge SV records from all callers into consensus groups
///
/// Records are only eligible when both breakends are on chromosomes in `chrom_set`. Each chromosome
/// is processed in chromosome set order, and takes all records not yet visited with either breakend
/// on that chromosome, sorted by position on the chromosome. Ties are resolved by input order.
///
pub fn merge_consensus_groups(
    records: &[SVRecord],
    chrom_set: &ChromSet,
    settings: &MergeSettings,
) -> ConsensusGroups {
    let mut groups = ConsensusGroups {
        record_group: vec![None; records.len()],
        ..Default::default()
    };

    let mut visited = records
        .iter()
        .map(|x| !(chrom_set.contains(&x.chrom) && chrom_set.contains(&x.chrom2)))
        .collect::<Vec<_>>();
    groups.excluded_record_count = visited.iter().filter(|&&x| x).count();

    for chrom in chrom_set.iter() {
        let mut chrom_records = Vec::new();
        for (index, record) in records.iter().enumerate() {
            if visited[index] {
                continue;
            }
            let chrom_record = if record.chrom == chrom {
                ChromRecord {
                    index,
                    pos: record.pos,
                    chrom2: record.chrom2.as_str(),
                    end: record.end,
                }
            } else if record.chrom2 == chrom {
                ChromRecord {
                    index,
                    pos: record.end,
                    chrom2: record.chrom.as_str(),
                    end: record.pos,
                }
            } else {
                continue;
            };
            visited[index] = true;
            chrom_records.push(chrom_record);
        }
        if chrom_records.is_empty() {
            continue;
        }

        // Stable sort retains input order for records at the same position
        chrom_records.sort_by_key(|x| x.pos);

        let mut processed = vec![false; chrom_records.len()];
        merge_large_indels(records, &chrom_records, settings, &mut processed, &mut groups);
        merge_remaining(&chrom_records, settings, &mut processed, &mut groups);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sv_record::test_utils::get_test_record;
    use crate::sv_record::{SVCaller, SVType};

    fn chrom_set() -> ChromSet {
        ChromSet::from_arg("chr1,chr2").unwrap()
    }

    #[test]
    fn test_get_length_sd_ratio() {
        assert_eq!(get_length_sd_ratio(0, &[0, 10]), None);
        assert_eq!(get_length_sd_ratio(2000, &[2000]), None);
        let x = get_length_sd_ratio(2000, &[2000, 2100]).unwrap();
        approx::assert_ulps_eq!(x, 50.0 * 2f64.sqrt() / 2000.0, max_ulps = 4);
    }

    #[test]
    fn test_three_caller_deletion_merge() {
        let records = vec![
            get_test_record("s1", SVCaller::Sniffles, "chr1", 1000, SVType::Deletion, 500),
            get_test_record("c1", SVCaller::CuteSV, "chr1", 1005, SVType::Deletion, 520),
            get_test_record("v1", SVCaller::Svim, "chr1", 995, SVType::Deletion, 510),
        ];
        let groups = merge_consensus_groups(&records, &chrom_set(), &MergeSettings::default());
        assert_eq!(groups.groups, vec![vec![2, 0, 1]]);
        assert_eq!(groups.record_group, vec![Some(0), Some(0), Some(0)]);
        assert_eq!(groups.large_indel_group_count, 0);
    }

    #[test]
    fn test_general_merge_is_seed_relative() {
        // a-b and b-c are within the window but a-c are not, so c forms its own group
        let records = vec![
            get_test_record("a", SVCaller::Sniffles, "chr1", 100, SVType::Insertion, 60),
            get_test_record("b", SVCaller::CuteSV, "chr1", 115, SVType::Insertion, 60),
            get_test_record("c", SVCaller::Svim, "chr1", 130, SVType::Insertion, 60),
        ];
        let groups = merge_consensus_groups(&records, &chrom_set(), &MergeSettings::default());
        assert_eq!(groups.groups, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_general_merge_window_is_inclusive() {
        let records = vec![
            get_test_record("a", SVCaller::Sniffles, "chr1", 100, SVType::Insertion, 60),
            get_test_record("b", SVCaller::CuteSV, "chr1", 120, SVType::Insertion, 60),
            get_test_record("c", SVCaller::Svim, "chr1", 121, SVType::Insertion, 60),
        ];
        let groups = merge_consensus_groups(&records, &chrom_set(), &MergeSettings::default());
        assert_eq!(groups.groups, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_general_merge_requires_end_match() {
        let records = vec![
            get_test_record("a", SVCaller::Sniffles, "chr1", 100, SVType::Deletion, 100),
            get_test_record("b", SVCaller::CuteSV, "chr1", 105, SVType::Deletion, 300),
        ];
        let groups = merge_consensus_groups(&records, &chrom_set(), &MergeSettings::default());
        assert_eq!(groups.groups, vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_large_indel_merge() {
        let records = vec![
            get_test_record("s1", SVCaller::Sniffles, "chr1", 10_000, SVType::Duplication, 5000),
            get_test_record("c1", SVCaller::CuteSV, "chr1", 10_010, SVType::Duplication, 5100),
            // Same type in the window, but with an end far from the seed's end
            get_test_record("v1", SVCaller::Svim, "chr1", 10_015, SVType::Duplication, 5300),
            get_test_record("d1", SVCaller::Svim, "chr1", 10_005, SVType::Deletion, 5000),
        ];
        let groups = merge_consensus_groups(&records, &chrom_set(), &MergeSettings::default());
        // The deletion is the only member of its own window, so it falls through to the general pass
        assert_eq!(groups.large_indel_group_count, 1);
        assert_eq!(groups.groups, vec![vec![0, 1, 2], vec![3]]);
    }

    #[test]
    fn test_large_indel_high_length_variation() {
        let records = vec![
            get_test_record("s1", SVCaller::Sniffles, "chr1", 10_000, SVType::Deletion, 2000),
            get_test_record("c1", SVCaller::CuteSV, "chr1", 10_010, SVType::Deletion, 4000),
        ];
        let groups = merge_consensus_groups(&records, &chrom_set(), &MergeSettings::default());
        // Both seeds fail the length test and fall through to the general pass, where their end
        // positions differ too much to merge
        assert_eq!(groups.large_indel_group_count, 0);
        assert_eq!(groups.groups, vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_zero_length_record_in_large_indel_window() {
        let mut r = get_test_record("s1", SVCaller::Sniffles, "chr1", 10_000, SVType::Deletion, 0);
        r.end = 15_000;
        let records = vec![
            r,
            get_test_record("c1", SVCaller::CuteSV, "chr1", 10_010, SVType::Deletion, 4990),
        ];
        let groups = merge_consensus_groups(&records, &chrom_set(), &MergeSettings::default());
        assert_eq!(groups.groups, vec![vec![0, 1]]);
        assert_eq!(groups.large_indel_group_count, 0);
    }

    #[test]
    fn test_chromosome_visit_order() {
        // The breakend is found on chr1 through its mate, and merges with the chr1-anchored record
        let mut bnd1 = get_test_record("s1", SVCaller::Sniffles, "chr2", 7000, SVType::Breakend, 0);
        bnd1.chrom2 = "chr1".to_string();
        bnd1.end = 5000;
        let mut bnd2 = get_test_record("c1", SVCaller::CuteSV, "chr1", 5010, SVType::Breakend, 0);
        bnd2.chrom2 = "chr2".to_string();
        bnd2.end = 7005;
        let mut outside = get_test_record("v1", SVCaller::Svim, "chr1", 5000, SVType::Breakend, 0);
        outside.chrom2 = "chrM".to_string();
        let records = vec![
            get_test_record("x", SVCaller::Svim, "chr2", 100, SVType::Insertion, 60),
            bnd1,
            bnd2,
            outside,
        ];
        let groups = merge_consensus_groups(&records, &chrom_set(), &MergeSettings::default());
        assert_eq!(groups.groups, vec![vec![1, 2], vec![0]]);
        assert_eq!(groups.record_group[3], None);
        assert_eq!(groups.excluded_record_count, 1);
    }
}
