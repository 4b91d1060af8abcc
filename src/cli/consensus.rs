use camino::Utf8PathBuf;
use clap::Args;
use const_format::concatcp;
use simple_error::{SimpleResult, bail};

use super::sv_filter::{SVFilterSettings, validate_and_fix_sv_filter_settings};
use super::utils::check_required_filename;
use crate::sv_record::SVCaller;

#[derive(Args)]
pub struct ConsensusSettings {
    /// Directory for all consensus command output (must not already exist)
    #[arg(long, value_name = "DIR", default_value = concatcp!(env!("CARGO_PKG_NAME"), "_consensus_output"))]
    pub output_dir: Utf8PathBuf,

    /// SV calls from Sniffles2 in VCF or BCF format
    #[arg(long, value_name = "FILE")]
    pub sniffles: Utf8PathBuf,

    /// SV calls from cuteSV in VCF or BCF format
    #[arg(long, value_name = "FILE")]
    pub cutesv: Utf8PathBuf,

    /// SV calls from SVIM in VCF or BCF format
    #[arg(long, value_name = "FILE")]
    pub svim: Utf8PathBuf,

    /// Sample to read from each input VCF. Defaults to the first sample of each file
    #[arg(long)]
    pub sample_id: Option<String>,

    #[command(flatten)]
    pub filter: SVFilterSettings,

    /// Write bgzip-compressed VCF output with a tabix index
    #[arg(long)]
    pub compress: bool,

    /// Keep all records regardless of allele frequency
    ///
    /// By default, records without an allele frequency are dropped, and only the highest allele
    /// frequency record is kept among records sharing the same chromosome, position and end.
    ///
    #[arg(long)]
    pub no_af_filter: bool,

    /// Max breakpoint distance for SV records to be merged into the same consensus group
    #[arg(long, default_value_t = 20)]
    pub merge_window: i64,

    /// Max ratio of SV length standard deviation to seed SV length for large deletion and
    /// duplication groups
    #[arg(hide = true, long, default_value_t = 0.2)]
    pub merge_sd_threshold: f64,

    /// Caller order used to select the representative record of each consensus group
    #[arg(long, value_delimiter = ',', default_value = "sniffles,cutesv,svim")]
    pub caller_priority: Vec<SVCaller>,
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_consensus_settings(
    mut settings: ConsensusSettings,
) -> SimpleResult<ConsensusSettings> {
    check_required_filename(&settings.sniffles, "Sniffles2 VCF")?;
    check_required_filename(&settings.cutesv, "cuteSV VCF")?;
    check_required_filename(&settings.svim, "SVIM VCF")?;

    settings.filter = validate_and_fix_sv_filter_settings(settings.filter)?;

    if settings.merge_window < 0 {
        bail!("--merge-window argument must not be negative");
    }

    if settings.merge_sd_threshold <= 0.0 {
        bail!("--merge-sd-threshold argument must be greater than 0");
    }

    if settings.caller_priority.contains(&SVCaller::Consensus) {
        bail!("--caller-priority argument can only include sniffles, cutesv and svim");
    }

    Ok(settings)
}
