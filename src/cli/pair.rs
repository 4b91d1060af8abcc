use camino::Utf8PathBuf;
use clap::Args;
use const_format::concatcp;
use simple_error::{SimpleResult, bail};

use super::sv_filter::{SVFilterSettings, validate_and_fix_sv_filter_settings};
use super::utils::{check_filename_label, check_required_filename};
use crate::vcf_input::InputFormat;

#[derive(Args)]
pub struct PairSettings {
    /// Directory for all pair command output (must not already exist)
    #[arg(long, value_name = "DIR", default_value = concatcp!(env!("CARGO_PKG_NAME"), "_pair_output"))]
    pub output_dir: Utf8PathBuf,

    /// Tumour sample SV calls in VCF or BCF format
    #[arg(long, value_name = "FILE")]
    pub tumour: Utf8PathBuf,

    /// Normal sample SV calls in VCF or BCF format (required). Can be specified multiple times,
    /// in which case the records of all normal files are merged before classification.
    ///
    #[arg(long, value_name = "FILE", required = true)]
    pub normal: Vec<Utf8PathBuf>,

    /// Format of the input VCF files. With 'auto', the format of each file is detected from its
    /// name, and a tumour file without a detectable caller name is read as consensus output
    #[arg(long, value_enum, default_value_t = InputFormat::Consensus)]
    pub vcf_format: InputFormat,

    /// Sample to read from the tumour VCF. Defaults to the first sample
    #[arg(long)]
    pub tumour_id: Option<String>,

    /// Sample to read from each normal VCF. Defaults to the first sample of each file
    #[arg(long)]
    pub normal_id: Option<String>,

    #[command(flatten)]
    pub filter: SVFilterSettings,

    /// Max breakpoint distance for a tumour record to match a normal record
    #[arg(long, default_value_t = 200)]
    pub window_size: i64,

    /// Only write the somatic variant VCF
    #[arg(long)]
    pub only_somatic: bool,

    /// Write bgzip-compressed VCF output with a tabix index
    #[arg(long)]
    pub compress: bool,

    /// Label used as the prefix of all output VCF filenames
    #[arg(long, default_value = "consensus")]
    pub output_label: String,

    /// Write the merged normal records to a CSV file
    #[arg(long)]
    pub save_merged_normal: bool,
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_pair_settings(mut settings: PairSettings) -> SimpleResult<PairSettings> {
    check_required_filename(&settings.tumour, "tumour VCF")?;
    for normal in settings.normal.iter() {
        check_required_filename(normal, "normal VCF")?;
    }

    // Auto-detection must succeed for every normal file before any work starts
    for normal in settings.normal.iter() {
        settings.vcf_format.resolve_caller(normal)?;
    }

    settings.filter = validate_and_fix_sv_filter_settings(settings.filter)?;

    if settings.window_size < 0 {
        bail!("--window-size argument must not be negative");
    }

    check_filename_label(&settings.output_label, "--output-label argument")?;

    Ok(settings)
}
