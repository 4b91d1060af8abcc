mod clusters;
mod combination;
mod groups;
mod louvain;
mod network;
mod table_output;

use camino::Utf8PathBuf;
use log::info;
use simple_error::SimpleResult;

use self::clusters::cluster_combinations;
use self::combination::get_shared_read_combinations;
use self::groups::find_complex_sv_groups;
use self::network::assign_networks;
use self::table_output::{ComplexSVNetworkRow, SVClusterRow, SharedCombinationRow};
use crate::cli::ComplexSVSettings;
use crate::csv_output::write_csv_table;
use crate::filenames::{
    COMPLEX_SV_NETWORKS_CSV_FILENAME, SHARED_COMBINATIONS_CSV_FILENAME, SV_CLUSTERS_CSV_FILENAME,
};
use crate::run_stats::{
    ComplexSVRunStats, ComplexSVStats, InputVcfStats, OutputFileStats, RunStep, write_run_stats,
};
use crate::vcf_input::{VcfReadSettings, read_sv_vcf};

fn get_table_filename(settings: &ComplexSVSettings, filename: &str) -> Utf8PathBuf {
    match &settings.label_prefix {
        Some(prefix) => settings.output_dir.join(format!("{prefix}_{filename}")),
        None => settings.output_dir.join(filename),
    }
}

/// Find SV combinations sharing supporting reads, then group them into complex SV networks and
/// cluster them into clones
pub fn run_complex_sv(settings: &ComplexSVSettings) -> SimpleResult<()> {
    let caller = settings.vcf_format.resolve_caller(&settings.vcf)?;
    let read_settings = VcfReadSettings {
        caller,
        sample_id: settings.sample_id.as_deref(),
        chrom_set: &settings.filter.chrom_set,
        min_qual: settings.filter.min_qual,
        min_sv_size: settings.filter.min_sv_size,
        max_sv_size: settings.filter.max_sv_size,
        require_read_names: true,
        af_filter: false,
    };
    let input = read_sv_vcf(&settings.vcf, &read_settings)?;
    let records = input.records;
    info!("Read {} SV records from '{}'", records.len(), settings.vcf);

    let shared = get_shared_read_combinations(&records);
    let combinations = shared.combinations;
    info!(
        "Found {} reads supporting multiple SVs, in {} distinct SV combinations",
        shared.shared_read_count,
        combinations.len()
    );

    let mut stats = ComplexSVStats {
        input_record_count: records.len(),
        shared_read_count: shared.shared_read_count,
        combination_count: combinations.len(),
        overlapping_combination_count: combinations.iter().filter(|x| x.is_overlapping()).count(),
        ..Default::default()
    };
    let mut output = Vec::new();

    let filename = get_table_filename(settings, SHARED_COMBINATIONS_CSV_FILENAME);
    let rows = combinations
        .iter()
        .map(SharedCombinationRow::new)
        .collect::<Vec<_>>();
    let record_count = write_csv_table(&filename, &rows)?;
    output.push(OutputFileStats {
        filename: filename.to_string(),
        record_count,
    });

    let groups = find_complex_sv_groups(&combinations);
    let networks = assign_networks(&groups);
    stats.complex_sv_representative_count = groups.len();
    stats.complex_sv_group_count = groups
        .iter()
        .flat_map(|x| x.group_labels.iter().copied())
        .max()
        .unwrap_or(0);
    stats.network_count = networks.iter().copied().max().unwrap_or(0);
    info!(
        "Found {} complex SV groups in {} networks",
        stats.complex_sv_group_count, stats.network_count
    );

    let filename = get_table_filename(settings, COMPLEX_SV_NETWORKS_CSV_FILENAME);
    let rows = groups
        .iter()
        .zip(networks.iter())
        .map(|(group, &network)| {
            ComplexSVNetworkRow::new(&combinations[group.combination_index], group, network)
        })
        .collect::<Vec<_>>();
    let record_count = write_csv_table(&filename, &rows)?;
    output.push(OutputFileStats {
        filename: filename.to_string(),
        record_count,
    });

    let clustered = cluster_combinations(&combinations, settings.min_cluster_read_count);
    stats.cluster_input_combination_count = clustered.len();
    stats.cluster_count = clustered.iter().map(|x| x.cluster).max().unwrap_or(0);
    stats.clone_count = clustered
        .iter()
        .filter(|x| !x.clone_label.starts_with("nested"))
        .map(|x| x.clone_label.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len();
    info!(
        "Clustered {} SV combinations into {} clusters with {} clones",
        stats.cluster_input_combination_count, stats.cluster_count, stats.clone_count
    );

    let filename = get_table_filename(settings, SV_CLUSTERS_CSV_FILENAME);
    let rows = clustered
        .iter()
        .map(|x| SVClusterRow::new(&combinations[x.combination_index], x))
        .collect::<Vec<_>>();
    let record_count = write_csv_table(&filename, &rows)?;
    output.push(OutputFileStats {
        filename: filename.to_string(),
        record_count,
    });

    write_run_stats(
        &settings.output_dir,
        &ComplexSVRunStats {
            run_step: RunStep::new("complex-sv"),
            input: vec![InputVcfStats {
                filename: settings.vcf.to_string(),
                caller,
                sample_id: input.sample_id,
                read_stats: input.stats,
            }],
            complex_sv_stats: stats,
            output,
        },
    );

    Ok(())
}
