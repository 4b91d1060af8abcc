mod caller_filter;
mod merge;

use log::info;
use simple_error::SimpleResult;

use self::caller_filter::filter_consensus_groups;
use self::merge::{MergeSettings, merge_consensus_groups};
use crate::cli::ConsensusSettings;
use crate::filenames::CONSENSUS_VCF_STEM;
use crate::run_stats::{
    ConsensusMergeStats, ConsensusRunStats, InputVcfStats, OutputFileStats, RunStep,
    write_run_stats,
};
use crate::sv_record::SVCaller;
use crate::vcf_header::combine_header_lines;
use crate::vcf_input::{VcfReadSettings, read_sv_vcf};
use crate::vcf_output::{VcfRow, get_vcf_output_filename, write_sv_vcf_file};

/// Merge calls from the three supported SV callers into a single consensus VCF
pub fn run_consensus(settings: &ConsensusSettings) -> SimpleResult<()> {
    let chrom_set = &settings.filter.chrom_set;

    let inputs = [
        (SVCaller::Sniffles, &settings.sniffles),
        (SVCaller::CuteSV, &settings.cutesv),
        (SVCaller::Svim, &settings.svim),
    ];

    let mut records = Vec::new();
    let mut all_header_lines = Vec::new();
    let mut input_stats = Vec::new();
    for (caller, filename) in inputs {
        let read_settings = VcfReadSettings {
            caller,
            sample_id: settings.sample_id.as_deref(),
            chrom_set,
            min_qual: settings.filter.min_qual,
            min_sv_size: settings.filter.min_sv_size,
            max_sv_size: settings.filter.max_sv_size,
            require_read_names: false,
            af_filter: !settings.no_af_filter,
        };
        let result = read_sv_vcf(filename, &read_settings)?;
        input_stats.push(InputVcfStats {
            filename: filename.to_string(),
            caller,
            sample_id: result.sample_id,
            read_stats: result.stats,
        });
        all_header_lines.push(result.header_lines);
        records.extend(result.records);
    }

    let merge_settings = MergeSettings {
        window: settings.merge_window,
        sd_ratio_threshold: settings.merge_sd_threshold,
        ..Default::default()
    };
    let consensus_groups = merge_consensus_groups(&records, chrom_set, &merge_settings);
    info!(
        "Merged {} SV records into {} consensus groups",
        records.len(),
        consensus_groups.groups.len()
    );

    let calls = filter_consensus_groups(
        &records,
        &consensus_groups,
        chrom_set,
        &settings.caller_priority,
    );
    info!(
        "Found {} consensus groups supported by multiple callers",
        calls.len()
    );

    let header_lines = combine_header_lines(&all_header_lines.iter().collect::<Vec<_>>(), chrom_set);
    let rows = calls
        .iter()
        .map(|x| VcfRow {
            record: &records[x.record_index],
            consensus_id: Some(x.consensus_id.as_str()),
            variant_id: None,
            caller_count: Some(x.caller_count),
        })
        .collect::<Vec<_>>();

    // Sample name for output is taken from the first input file unless specified
    let sample_id = match &settings.sample_id {
        Some(x) => x.clone(),
        None => input_stats[0].sample_id.clone(),
    };

    let filename = get_vcf_output_filename(&settings.output_dir, CONSENSUS_VCF_STEM, settings.compress);
    let record_count = write_sv_vcf_file(&filename, &header_lines, &sample_id, &rows, settings.compress)?;

    let merge_stats = ConsensusMergeStats {
        input_record_count: records.len(),
        excluded_record_count: consensus_groups.excluded_record_count,
        large_indel_group_count: consensus_groups.large_indel_group_count,
        total_group_count: consensus_groups.groups.len(),
        multi_caller_group_count: calls.len(),
    };
    write_run_stats(
        &settings.output_dir,
        &ConsensusRunStats {
            run_step: RunStep::new("consensus"),
            input: input_stats,
            merge_stats,
            output: vec![OutputFileStats {
                filename: filename.to_string(),
                record_count,
            }],
        },
    );

    Ok(())
}
