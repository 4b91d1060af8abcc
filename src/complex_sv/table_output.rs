//! Row layouts for the complex SV output tables
//!

use itertools::Itertools;
use serde::Serialize;

use super::clusters::ClusteredCombination;
use super::combination::SVCombination;
use super::groups::ComplexSVGroup;

fn format_ranges(ranges: &[(String, i64, i64)]) -> String {
    ranges
        .iter()
        .map(|(chrom, min, max)| format!("{chrom}:{min}-{max}"))
        .join(";")
}

fn format_allele_frequencies(allele_frequencies: &[Option<f64>]) -> String {
    allele_frequencies
        .iter()
        .map(|x| match x {
            Some(af) => format!("{af:.4}"),
            None => ".".to_string(),
        })
        .join(";")
}

/// Formatted values common to all complex SV tables
struct CombinationColumns {
    id: String,
    chrom: String,
    chrom2: String,
    pos: String,
    end: String,
    pos_breakpoints: String,
    end_breakpoints: String,
    allele_frequencies: String,
}

impl CombinationColumns {
    fn new(combination: &SVCombination) -> Self {
        Self {
            id: combination.id_label(),
            chrom: combination.chroms.join(";"),
            chrom2: combination.chrom2s.join(";"),
            pos: format_ranges(&combination.pos_ranges),
            end: format_ranges(&combination.end_ranges),
            pos_breakpoints: combination.pos_events.iter().map(|x| x.short_label()).join(";"),
            end_breakpoints: combination.end_events.iter().map(|x| x.short_label()).join(";"),
            allele_frequencies: format_allele_frequencies(&combination.allele_frequencies),
        }
    }
}

/// Row of the shared SV combination table
#[derive(Serialize)]
pub struct SharedCombinationRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "CHROM")]
    chrom: String,
    #[serde(rename = "CHROM2")]
    chrom2: String,
    #[serde(rename = "POS")]
    pos: String,
    #[serde(rename = "END")]
    end: String,
    #[serde(rename = "POS_BKPT")]
    pos_breakpoints: String,
    #[serde(rename = "END_BKPT")]
    end_breakpoints: String,
    #[serde(rename = "Read_Count")]
    read_count: usize,
    #[serde(rename = "SV_Count")]
    sv_count: usize,
    #[serde(rename = "AF")]
    allele_frequencies: String,
    #[serde(rename = "Sample")]
    sample: String,
    #[serde(rename = "CSV_Type")]
    type_summary: String,
    final_combination: String,
    any_overlapping_sv: String,
}

impl SharedCombinationRow {
    pub fn new(combination: &SVCombination) -> Self {
        let columns = CombinationColumns::new(combination);
        Self {
            id: columns.id,
            chrom: columns.chrom,
            chrom2: columns.chrom2,
            pos: columns.pos,
            end: columns.end,
            pos_breakpoints: columns.pos_breakpoints,
            end_breakpoints: columns.end_breakpoints,
            read_count: combination.read_count,
            sv_count: combination.sv_count(),
            allele_frequencies: columns.allele_frequencies,
            sample: combination.samples.join(","),
            type_summary: combination.type_summary.clone(),
            final_combination: combination.final_combination.clone(),
            any_overlapping_sv: combination.overlapping_sv.clone(),
        }
    }
}

/// Row of the complex SV group and network table
#[derive(Serialize)]
pub struct ComplexSVNetworkRow {
    #[serde(rename = "ID")]
    id: String,
    group: String,
    #[serde(rename = "CHROM")]
    chrom: String,
    #[serde(rename = "CHROM2")]
    chrom2: String,
    #[serde(rename = "POS")]
    pos: String,
    #[serde(rename = "END")]
    end: String,
    #[serde(rename = "Read_Count")]
    read_count: usize,
    #[serde(rename = "SV_Count")]
    sv_count: usize,
    #[serde(rename = "AF")]
    allele_frequencies: String,
    #[serde(rename = "CSV_Type")]
    type_summary: String,
    #[serde(rename = "POS_BKPT")]
    pos_breakpoints: String,
    #[serde(rename = "END_BKPT")]
    end_breakpoints: String,
    final_combination: String,
    any_overlapping_sv: String,
    #[serde(rename = "Network")]
    network: usize,
}

impl ComplexSVNetworkRow {
    pub fn new(combination: &SVCombination, group: &ComplexSVGroup, network: usize) -> Self {
        let columns = CombinationColumns::new(combination);
        Self {
            id: columns.id,
            group: group.group_label(),
            chrom: columns.chrom,
            chrom2: columns.chrom2,
            pos: columns.pos,
            end: columns.end,
            read_count: combination.read_count,
            sv_count: combination.sv_count(),
            allele_frequencies: columns.allele_frequencies,
            type_summary: combination.type_summary.clone(),
            pos_breakpoints: columns.pos_breakpoints,
            end_breakpoints: columns.end_breakpoints,
            final_combination: combination.final_combination.clone(),
            any_overlapping_sv: combination.overlapping_sv.clone(),
            network,
        }
    }
}

/// Row of the SV cluster and clone table
#[derive(Serialize)]
pub struct SVClusterRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "CHROM")]
    chrom: String,
    #[serde(rename = "CHROM2")]
    chrom2: String,
    #[serde(rename = "POS")]
    pos: String,
    #[serde(rename = "END")]
    end: String,
    #[serde(rename = "POS_BKPT")]
    pos_breakpoints: String,
    #[serde(rename = "END_BKPT")]
    end_breakpoints: String,
    #[serde(rename = "Read_Count")]
    read_count: usize,
    #[serde(rename = "SV_Count")]
    sv_count: usize,
    #[serde(rename = "AF")]
    allele_frequencies: String,
    #[serde(rename = "mean_AF")]
    mean_allele_frequency: f64,
    #[serde(rename = "sd_AF")]
    sd_allele_frequency: f64,
    #[serde(rename = "Sample")]
    sample: String,
    #[serde(rename = "CSV_Type")]
    type_summary: String,
    final_combination: String,
    any_overlapping_sv: String,
    #[serde(rename = "Cluster_number")]
    cluster: usize,
    #[serde(rename = "Clone_ID")]
    clone_label: String,
}

impl SVClusterRow {
    pub fn new(combination: &SVCombination, clustered: &ClusteredCombination) -> Self {
        let columns = CombinationColumns::new(combination);
        Self {
            id: columns.id,
            chrom: columns.chrom,
            chrom2: columns.chrom2,
            pos: columns.pos,
            end: columns.end,
            pos_breakpoints: columns.pos_breakpoints,
            end_breakpoints: columns.end_breakpoints,
            read_count: combination.read_count,
            sv_count: combination.sv_count(),
            allele_frequencies: columns.allele_frequencies,
            mean_allele_frequency: clustered.mean_allele_frequency,
            sd_allele_frequency: clustered.sd_allele_frequency,
            sample: combination.samples.join(","),
            type_summary: combination.type_summary.clone(),
            final_combination: combination.final_combination.clone(),
            any_overlapping_sv: combination.overlapping_sv.clone(),
            cluster: clustered.cluster,
            clone_label: clustered.clone_label.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_allele_frequencies() {
        assert_eq!(
            format_allele_frequencies(&[Some(0.25), None, Some(1.0 / 3.0)]),
            "0.2500;.;0.3333"
        );
    }

    #[test]
    fn test_format_ranges() {
        let ranges = vec![
            ("chr2".to_string(), 100, 200),
            ("chr1".to_string(), 50, 50),
        ];
        assert_eq!(format_ranges(&ranges), "chr2:100-200;chr1:50-50");
    }

    #[test]
    fn test_network_row_columns() {
        use crate::complex_sv::combination::test_utils::get_test_combination;

        let combination = get_test_combination(&["sv1", "sv2"], 3);
        let group = ComplexSVGroup {
            combination_index: 0,
            group_labels: vec![2, 5],
        };
        let row = ComplexSVNetworkRow::new(&combination, &group, 1);
        assert_eq!(row.id, "sv1,sv2");
        assert_eq!(row.group, "2;5");
        assert_eq!(row.read_count, 3);
        assert_eq!(row.sv_count, 2);
        assert_eq!(row.any_overlapping_sv, "no");
    }
}
