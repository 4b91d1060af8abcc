use camino::Utf8PathBuf;
use clap::Args;
use const_format::concatcp;
use simple_error::{SimpleResult, bail};

use super::sv_filter::{SVFilterSettings, validate_and_fix_sv_filter_settings};
use super::utils::{check_filename_label, check_required_filename};
use crate::vcf_input::InputFormat;

#[derive(Args)]
pub struct ComplexSVSettings {
    /// Directory for all complex-sv command output (must not already exist)
    #[arg(long, value_name = "DIR", default_value = concatcp!(env!("CARGO_PKG_NAME"), "_complex-sv_output"))]
    pub output_dir: Utf8PathBuf,

    /// SV calls with supporting read names (RNAMES), in VCF or BCF format
    #[arg(long, value_name = "FILE")]
    pub vcf: Utf8PathBuf,

    /// Sample to read from the input VCF. Defaults to the first sample
    #[arg(long)]
    pub sample_id: Option<String>,

    #[command(flatten)]
    pub filter: SVFilterSettings,

    /// Format of the input VCF file. With 'auto', the format is detected from the filename
    #[arg(long, value_enum, default_value_t = InputFormat::Consensus)]
    pub vcf_format: InputFormat,

    /// Optional prefix added to all output table filenames
    #[arg(long)]
    pub label_prefix: Option<String>,

    /// Minimum number of shared reads for an SV combination to be used in SV clustering
    #[arg(long, default_value_t = 2)]
    pub min_cluster_read_count: usize,
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_complex_sv_settings(
    mut settings: ComplexSVSettings,
) -> SimpleResult<ComplexSVSettings> {
    check_required_filename(&settings.vcf, "input VCF")?;
    settings.vcf_format.resolve_caller(&settings.vcf)?;

    settings.filter = validate_and_fix_sv_filter_settings(settings.filter)?;

    if let Some(label_prefix) = &settings.label_prefix {
        check_filename_label(label_prefix, "--label-prefix argument")?;
    }

    if settings.min_cluster_read_count == 0 {
        bail!("--min-cluster-read-count argument must be greater than 0");
    }

    Ok(settings)
}
