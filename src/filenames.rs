pub const RUN_STATS_FILENAME: &str = "run.stats.json";

pub const CONSENSUS_VCF_STEM: &str = "consensus_sv";

pub const SOMATIC_VCF_SUFFIX: &str = "somatic_variants";
pub const SOMATIC_IMPRECISE_INSERTIONS_VCF_SUFFIX: &str = "somatic_imprecise_insertions";
pub const GERMLINE_VCF_SUFFIX: &str = "germline_variants";
pub const GERMLINE_NORMAL_EVIDENCE_VCF_SUFFIX: &str = "germline_normal_evidence";
pub const MOSAIC_NORMAL_VCF_SUFFIX: &str = "mosaic_normal";
pub const MERGED_NORMAL_CSV_FILENAME: &str = "merged_normal_samples.csv";

pub const SHARED_COMBINATIONS_CSV_FILENAME: &str = "shared_sv_combinations.csv";
pub const COMPLEX_SV_NETWORKS_CSV_FILENAME: &str = "complex_sv_groups_networks.csv";
pub const SV_CLUSTERS_CSV_FILENAME: &str = "sv_clusters_clones.csv";
