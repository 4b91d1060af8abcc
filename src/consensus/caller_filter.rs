use std::collections::HashSet;

use crate::chrom_set::ChromSet;
use crate::sv_record::{SVCaller, SVRecord};

use super::merge::ConsensusGroups;

/// Representative record selected for a consensus group supported by multiple callers
#[derive(Debug)]
pub struct ConsensusCall {
    pub record_index: usize,
    pub consensus_id: String,
    pub caller_count: usize,
}

/// Caller priority rank, where callers missing from the priority list rank after all listed callers
fn caller_rank(caller: SVCaller, caller_priority: &[SVCaller]) -> usize {
    caller_priority
        .iter()
        .position(|&x| x == caller)
        .unwrap_or(caller_priority.len())
}

/// Select the representative member of a group, by caller priority and then by group order
fn select_representative(
    records: &[SVRecord],
    group: &[usize],
    caller_priority: &[SVCaller],
) -> Option<usize> {
    group
        .iter()
        .enumerate()
        .min_by_key(|&(group_offset, &index)| {
            (caller_rank(records[index].caller, caller_priority), group_offset)
        })
        .map(|(_, &index)| index)
}

/// Keep consensus groups supported by at least two distinct callers, and reduce each to one
/// representative record
///
/// Each group is labeled `consensusSV.<SVTYPE>.<n>`, where `n` is the 1-based group index and the
/// type is taken from the representative. Calls are sorted by chromosome set order and then by
/// position.
///
pub fn filter_consensus_groups(
    records: &[SVRecord],
    consensus_groups: &ConsensusGroups,
    chrom_set: &ChromSet,
    caller_priority: &[SVCaller],
) -> Vec<ConsensusCall> {
    let mut calls = Vec::new();
    for (group_index, group) in consensus_groups.groups.iter().enumerate() {
        let caller_count = group
            .iter()
            .map(|&x| records[x].caller)
            .collect::<HashSet<_>>()
            .len();
        if caller_count < 2 {
            continue;
        }
        let Some(record_index) = select_representative(records, group, caller_priority) else {
            continue;
        };
        let sv_type = records[record_index].sv_type;
        calls.push(ConsensusCall {
            record_index,
            consensus_id: format!("consensusSV.{sv_type}.{}", group_index + 1),
            caller_count,
        });
    }

    calls.sort_by_key(|x| {
        let record = &records[x.record_index];
        (chrom_set.index_of(&record.chrom), record.pos)
    });
    calls
}
