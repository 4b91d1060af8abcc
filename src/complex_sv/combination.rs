use std::collections::{BTreeMap, HashMap};
use std::fmt;

use itertools::Itertools;

use crate::sv_record::{SVRecord, SVType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum BreakpointKind {
    #[strum(serialize = "pos")]
    Pos,
    #[strum(serialize = "end")]
    End,
}

/// One SV breakpoint in a combination, labeled by SV type and a per-combination type counter
///
/// For example the second deletion in a combination is labeled `DEL2`.
///
#[derive(Clone, Debug)]
pub struct BreakpointEvent {
    pub label: String,
    pub kind: BreakpointKind,
    pub chrom: String,
    pub coordinate: i64,
}

impl BreakpointEvent {
    /// Breakpoint string without the pos/end designation, as used in the POS_BKPT and END_BKPT
    /// columns
    pub fn short_label(&self) -> String {
        format!("{}-{}:{}", self.label, self.chrom, self.coordinate)
    }
}

impl fmt::Display for BreakpointEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}:{}",
            self.label, self.kind, self.chrom, self.coordinate
        )
    }
}

/// A set of 2 or more SVs supported by the same reads
///
/// All details other than the read count are taken from the first read supporting exactly this
/// SV set, in input record order.
///
#[derive(Clone, Debug)]
pub struct SVCombination {
    /// Sorted unique SV ids
    pub sv_ids: Vec<String>,

    /// Number of reads supporting exactly this SV set
    pub read_count: usize,

    /// Position breakpoint events followed by end breakpoint events, each in read aggregation order
    pub pos_events: Vec<BreakpointEvent>,
    pub end_events: Vec<BreakpointEvent>,

    /// Sorted unique chromosomes of SV positions
    pub chroms: Vec<String>,

    /// Sorted unique chromosomes of SV ends
    pub chrom2s: Vec<String>,

    /// Min and max SV position per chromosome, in order of first chromosome observation
    pub pos_ranges: Vec<(String, i64, i64)>,

    /// Min and max SV end per end chromosome, in order of first chromosome observation
    pub end_ranges: Vec<(String, i64, i64)>,

    pub allele_frequencies: Vec<Option<f64>>,
    pub samples: Vec<String>,

    /// SV type summary, such as `(2)DEL+INS`
    pub type_summary: String,

    /// Breakpoint events of each chromosome sorted by coordinate
    pub final_combination: String,

    /// Overlapping SV labels for each chromosome, or `no`
    pub overlapping_sv: String,
}

impl SVCombination {
    pub fn sv_count(&self) -> usize {
        self.sv_ids.len()
    }

    pub fn id_label(&self) -> String {
        self.sv_ids.join(",")
    }

    pub fn is_overlapping(&self) -> bool {
        self.overlapping_sv.split(';').any(|x| x != "no")
    }
}

/// Result of aggregating SV records by supporting read
pub struct SharedReadCombinations {
    /// Reads supporting 2 or more distinct SVs
    pub shared_read_count: usize,

    /// Combinations sorted by id label
    pub combinations: Vec<SVCombination>,
}

fn get_ranges<'a>(chrom_coords: impl Iterator<Item = (&'a str, i64)>) -> Vec<(String, i64, i64)> {
    let mut ranges: Vec<(String, i64, i64)> = Vec::new();
    for (chrom, coord) in chrom_coords {
        match ranges.iter_mut().find(|x| x.0 == chrom) {
            Some(range) => {
                range.1 = range.1.min(coord);
                range.2 = range.2.max(coord);
            }
            None => ranges.push((chrom.to_string(), coord, coord)),
        }
    }
    ranges
}

/// Label the position and end breakpoints of the records supported by one read
///
/// Records are visited by chromosome, in order of first chromosome observation, and then in input
/// order. Type counters increment in this visit order.
///
fn get_breakpoint_events(
    records: &[&SVRecord],
) -> (Vec<BreakpointEvent>, Vec<BreakpointEvent>) {
    let chrom_order = records.iter().map(|x| x.chrom.as_str()).unique();

    let mut type_counts: HashMap<SVType, usize> = HashMap::new();
    let mut pos_events = Vec::new();
    let mut end_events = Vec::new();
    for chrom in chrom_order {
        for sv in records.iter().filter(|x| x.chrom == chrom) {
            let count = type_counts.entry(sv.sv_type).or_default();
            *count += 1;
            let label = format!("{}{count}", sv.sv_type);
            pos_events.push(BreakpointEvent {
                label: label.clone(),
                kind: BreakpointKind::Pos,
                chrom: sv.chrom.clone(),
                coordinate: sv.pos,
            });
            end_events.push(BreakpointEvent {
                label,
                kind: BreakpointKind::End,
                chrom: sv.chrom2.clone(),
                coordinate: sv.end,
            });
        }
    }
    (pos_events, end_events)
}

/// Order all breakpoint events of each chromosome by coordinate
///
/// Chromosomes are ordered lexicographically. Position events precede end events at the same
/// coordinate.
///
fn get_final_combination(
    pos_events: &[BreakpointEvent],
    end_events: &[BreakpointEvent],
) -> Vec<Vec<BreakpointEvent>> {
    let mut chrom_events: BTreeMap<&str, Vec<BreakpointEvent>> = BTreeMap::new();
    for event in pos_events.iter().chain(end_events.iter()) {
        chrom_events
            .entry(event.chrom.as_str())
            .or_default()
            .push(event.clone());
    }
    chrom_events
        .into_values()
        .map(|mut events| {
            events.sort_by_key(|x| x.coordinate);
            events
        })
        .collect()
}

/// Find SVs which are simultaneously open on one chromosome
///
/// Each SV is opened at its position event and closed at its end event. Every SV which is open
/// while at least one other SV is open is reported, in order of detection.
///
fn get_overlapping_labels(events: &[BreakpointEvent]) -> Vec<String> {
    let mut open: Vec<&str> = Vec::new();
    let mut overlaps: Vec<String> = Vec::new();
    for event in events.iter() {
        match event.kind {
            BreakpointKind::Pos => open.push(&event.label),
            BreakpointKind::End => {
                if let Some(index) = open.iter().position(|&x| x == event.label) {
                    open.remove(index);
                }
            }
        }
        if open.len() > 1 {
            for &label in open.iter() {
                if !overlaps.iter().any(|x| x == label) {
                    overlaps.push(label.to_string());
                }
            }
        }
    }
    overlaps
}

/// Summarize SV types in id order, such as `(2)DEL+INS`
fn get_type_summary(sv_types: impl Iterator<Item = SVType>) -> String {
    let mut type_counts: Vec<(SVType, usize)> = Vec::new();
    for sv_type in sv_types {
        match type_counts.iter_mut().find(|x| x.0 == sv_type) {
            Some(x) => x.1 += 1,
            None => type_counts.push((sv_type, 1)),
        }
    }
    type_counts
        .into_iter()
        .map(|(sv_type, count)| {
            if count > 1 {
                format!("({count}){sv_type}")
            } else {
                sv_type.to_string()
            }
        })
        .join("+")
}

fn build_combination(sv_ids: Vec<String>, read_count: usize, records: &[&SVRecord]) -> SVCombination {
    let (pos_events, end_events) = get_breakpoint_events(records);

    let final_combination_events = get_final_combination(&pos_events, &end_events);
    let final_combination = final_combination_events
        .iter()
        .map(|events| events.iter().join("_"))
        .join(";");
    let overlapping_sv = final_combination_events
        .iter()
        .map(|events| {
            let labels = get_overlapping_labels(events);
            if labels.is_empty() {
                "no".to_string()
            } else {
                labels.join("-")
            }
        })
        .join(";");

    let id_types = records
        .iter()
        .map(|x| (x.id.as_str(), x.sv_type))
        .collect::<HashMap<_, _>>();
    let type_summary = get_type_summary(sv_ids.iter().filter_map(|x| id_types.get(x.as_str()).copied()));

    SVCombination {
        read_count,
        chroms: records.iter().map(|x| x.chrom.clone()).sorted().dedup().collect(),
        chrom2s: records.iter().map(|x| x.chrom2.clone()).sorted().dedup().collect(),
        pos_ranges: get_ranges(records.iter().map(|x| (x.chrom.as_str(), x.pos))),
        end_ranges: get_ranges(records.iter().map(|x| (x.chrom2.as_str(), x.end))),
        allele_frequencies: records.iter().map(|x| x.allele_frequency).collect(),
        samples: records.iter().map(|x| x.sample_id.clone()).sorted().dedup().collect(),
        type_summary,
        final_combination,
        overlapping_sv,
        pos_events,
        end_events,
        sv_ids,
    }
}

/// Find all combinations of SVs supported by the same reads
///
/// Each read supporting 2 or more distinct SVs contributes to the combination of exactly the SV set
/// it supports. Reads are visited in order of first observation in the input records.
///
pub fn get_shared_read_combinations(records: &[SVRecord]) -> SharedReadCombinations {
    let mut read_index: HashMap<&str, usize> = HashMap::new();
    let mut read_records: Vec<Vec<&SVRecord>> = Vec::new();
    for sv in records.iter() {
        for read_name in sv.read_names.iter() {
            let index = *read_index.entry(read_name.as_str()).or_insert_with(|| {
                read_records.push(Vec::new());
                read_records.len() - 1
            });
            read_records[index].push(sv);
        }
    }

    let mut shared_read_count = 0;
    let mut combination_reads: BTreeMap<String, (Vec<String>, usize, &[&SVRecord])> = BTreeMap::new();
    for records in read_records.iter() {
        let sv_ids = records
            .iter()
            .map(|x| x.id.clone())
            .sorted()
            .dedup()
            .collect::<Vec<_>>();
        if sv_ids.len() < 2 {
            continue;
        }
        shared_read_count += 1;
        combination_reads
            .entry(sv_ids.join(","))
            .or_insert((sv_ids, 0, records.as_slice()))
            .1 += 1;
    }

    let combinations = combination_reads
        .into_values()
        .map(|(sv_ids, read_count, records)| build_combination(sv_ids, read_count, records))
        .collect();

    SharedReadCombinations {
        shared_read_count,
        combinations,
    }
}
