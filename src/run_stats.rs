//! Track stats for each oncosv pipeline run
//!

use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::Serialize;
use unwrap::unwrap;

use crate::filenames::RUN_STATS_FILENAME;
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::sv_record::SVCaller;
use crate::vcf_input::VcfReadStats;

#[derive(Serialize)]
pub struct RunStep {
    pub name: String,
    pub version: String,
}

impl RunStep {
    pub fn new(name: &str) -> Self {
        Self {
            name: format!("{PROGRAM_NAME} {name}"),
            version: PROGRAM_VERSION.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct InputVcfStats {
    pub filename: String,
    pub caller: SVCaller,
    pub sample_id: String,

    #[serde(flatten)]
    pub read_stats: VcfReadStats,
}

#[derive(Serialize)]
pub struct OutputFileStats {
    pub filename: String,
    pub record_count: usize,
}

#[derive(Default, Serialize)]
pub struct ConsensusMergeStats {
    pub input_record_count: usize,

    /// Records with a breakend outside of the chromosome set
    pub excluded_record_count: usize,

    pub large_indel_group_count: usize,
    pub total_group_count: usize,

    /// Groups supported by at least two distinct callers
    pub multi_caller_group_count: usize,
}

#[derive(Serialize)]
pub struct ConsensusRunStats {
    pub run_step: RunStep,
    pub input: Vec<InputVcfStats>,
    pub merge_stats: ConsensusMergeStats,
    pub output: Vec<OutputFileStats>,
}

#[derive(Default, Serialize)]
pub struct ClassifyStats {
    pub tumour_record_count: usize,
    pub normal_record_count: usize,
    pub somatic_count: usize,
    pub imprecise_somatic_insertion_count: usize,

    /// Somatic records with a positional normal match but a divergent SV length
    pub divergent_length_somatic_count: usize,

    pub germline_tumour_count: usize,
    pub germline_normal_count: usize,
    pub other_normal_count: usize,
}

#[derive(Serialize)]
pub struct PairRunStats {
    pub run_step: RunStep,
    pub input: Vec<InputVcfStats>,
    pub classify_stats: ClassifyStats,
    pub output: Vec<OutputFileStats>,
}

#[derive(Default, Serialize)]
pub struct ComplexSVStats {
    pub input_record_count: usize,

    /// Reads supporting two or more distinct SVs
    pub shared_read_count: usize,

    pub combination_count: usize,
    pub overlapping_combination_count: usize,
    pub complex_sv_group_count: usize,
    pub complex_sv_representative_count: usize,
    pub network_count: usize,
    pub cluster_input_combination_count: usize,
    pub cluster_count: usize,
    pub clone_count: usize,
}

#[derive(Serialize)]
pub struct ComplexSVRunStats {
    pub run_step: RunStep,
    pub input: Vec<InputVcfStats>,
    pub complex_sv_stats: ComplexSVStats,
    pub output: Vec<OutputFileStats>,
}

/// Write run_stats structure out in json format
pub fn write_run_stats<T: Serialize>(output_dir: &Utf8Path, run_stats: &T) {
    let filename = output_dir.join(RUN_STATS_FILENAME);

    info!("Writing run statistics to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create run statistics json file: '{filename}'"
    );

    unwrap!(
        serde_json::to_writer_pretty(&f, &run_stats),
        "Unable to write run statistics json file: '{filename}'"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_stats_json() {
        let stats = InputVcfStats {
            filename: "tumour.vcf".to_string(),
            caller: SVCaller::CuteSV,
            sample_id: "T1".to_string(),
            read_stats: VcfReadStats {
                input_record_count: 5,
                output_record_count: 3,
                ..Default::default()
            },
        };
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["caller"], "CuteSV");
        assert_eq!(value["input_record_count"], 5);
        assert_eq!(value["output_record_count"], 3);
    }
}
