use clap::Args;
use simple_error::{SimpleResult, bail};

use crate::chrom_set::{ALL_CHROMS_KEYWORD, ChromSet};

/// Record filtration options shared by all commands
#[derive(Args)]
pub struct SVFilterSettings {
    /// Chromosomes to analyze, either 'all' for chr1-chr22, chrX and chrY, or a comma-separated
    /// list of chromosome names
    ///
    /// The list order sets the chromosome order of all output.
    ///
    #[arg(long, value_name = "CHROMS", default_value = ALL_CHROMS_KEYWORD)]
    pub chrom: String,

    /// This value will be filled in from the chrom argument
    #[arg(skip)]
    pub chrom_set: ChromSet,

    /// Minimum QUAL score for input records. Records with no QUAL value are treated as QUAL 0.
    /// Normal records in the pair command are not filtered on QUAL
    #[arg(long, default_value_t = 10.0)]
    pub min_qual: f32,

    /// Minimum absolute SV length for input records. Breakends and inversions are not filtered
    /// on size
    #[arg(long, default_value_t = 50)]
    pub min_sv_size: i64,

    /// Maximum absolute SV length for input records
    #[arg(long, default_value_t = 1_000_000)]
    pub max_sv_size: i64,
}

pub fn validate_and_fix_sv_filter_settings(
    mut settings: SVFilterSettings,
) -> SimpleResult<SVFilterSettings> {
    settings.chrom_set = ChromSet::from_arg(&settings.chrom)?;
    if settings.chrom_set.is_empty() {
        bail!("--chrom argument must include at least one chromosome");
    }

    if settings.min_qual < 0.0 {
        bail!("--min-qual argument must not be negative");
    }

    if settings.min_sv_size < 0 {
        bail!("--min-sv-size argument must not be negative");
    }

    if settings.min_sv_size > settings.max_sv_size {
        bail!(
            "--min-sv-size ({}) must not exceed --max-sv-size ({})",
            settings.min_sv_size,
            settings.max_sv_size
        );
    }

    Ok(settings)
}
