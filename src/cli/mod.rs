mod complex_sv;
mod consensus;
mod pair;
mod shared;
mod sv_filter;
mod utils;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use simple_error::{SimpleResult, bail};

pub use self::complex_sv::ComplexSVSettings;
use self::complex_sv::validate_and_fix_complex_sv_settings;
pub use self::consensus::ConsensusSettings;
use self::consensus::validate_and_fix_consensus_settings;
pub use self::pair::PairSettings;
use self::pair::validate_and_fix_pair_settings;
pub use self::shared::SharedSettings;
pub use self::sv_filter::SVFilterSettings;

#[derive(Subcommand)]
pub enum Commands {
    /// Merge Sniffles2, cuteSV and SVIM calls from one sample into consensus SV calls
    Consensus(ConsensusSettings),

    /// Classify tumour SV calls as somatic or germline by comparison to one or more normal samples
    Pair(PairSettings),

    /// Find complex SVs, networks and clusters from SV calls sharing supporting reads
    ComplexSv(ComplexSVSettings),
}

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
#[clap(propagate_version = true, rename_all = "kebab_case")]
pub struct Settings {
    #[command(flatten)]
    pub shared: SharedSettings,

    #[command(subcommand)]
    pub command: Commands,
}

impl Settings {
    pub fn get_output_dir(&self) -> &Utf8Path {
        match &self.command {
            Commands::Consensus(x) => &x.output_dir,
            Commands::Pair(x) => &x.output_dir,
            Commands::ComplexSv(x) => &x.output_dir,
        }
    }
}

/// Checks if a directory does not exist
///
pub fn check_novel_dirname(dirname: &Utf8Path, label: &str) -> SimpleResult<()> {
    if dirname.exists() {
        bail!("{label} already exists: \"{dirname}\"");
    }
    Ok(())
}

/// Validate settings and update parameters that can't be processed by clap
///
/// Assumes the logger is not setup yet
///
pub fn validate_and_fix_settings_impl(mut settings: Settings) -> SimpleResult<Settings> {
    settings.command = match settings.command {
        Commands::Consensus(x) => Commands::Consensus(validate_and_fix_consensus_settings(x)?),
        Commands::Pair(x) => Commands::Pair(validate_and_fix_pair_settings(x)?),
        Commands::ComplexSv(x) => Commands::ComplexSv(validate_and_fix_complex_sv_settings(x)?),
    };

    Ok(settings)
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
pub fn validate_and_fix_settings(settings: Settings) -> Settings {
    match validate_and_fix_settings_impl(settings) {
        Ok(x) => x,
        Err(msg) => {
            eprintln!("Invalid command-line setting: {msg}");
            std::process::exit(exitcode::USAGE);
        }
    }
}

pub fn parse_settings() -> Settings {
    Settings::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_consensus_defaults() {
        let settings = Settings::try_parse_from([
            "oncosv",
            "consensus",
            "--sniffles",
            "s.vcf",
            "--cutesv",
            "c.vcf",
            "--svim",
            "v.vcf",
        ])
        .unwrap();
        match settings.command {
            Commands::Consensus(x) => {
                assert_eq!(x.output_dir, "oncosv_consensus_output");
                assert_eq!(x.filter.chrom, "all");
                assert_eq!(x.filter.min_sv_size, 50);
                assert_eq!(x.filter.max_sv_size, 1_000_000);
                assert_eq!(x.merge_window, 20);
                assert_eq!(
                    x.caller_priority,
                    vec![
                        crate::sv_record::SVCaller::Sniffles,
                        crate::sv_record::SVCaller::CuteSV,
                        crate::sv_record::SVCaller::Svim
                    ]
                );
                assert!(!x.compress);
            }
            _ => panic!("Unexpected command"),
        }
    }

    #[test]
    fn test_parse_pair_multiple_normals() {
        let settings = Settings::try_parse_from([
            "oncosv",
            "pair",
            "--tumour",
            "t.vcf",
            "--normal",
            "n1.vcf",
            "--normal",
            "n2.vcf",
            "--only-somatic",
        ])
        .unwrap();
        match settings.command {
            Commands::Pair(x) => {
                assert_eq!(x.normal.len(), 2);
                assert_eq!(x.window_size, 200);
                assert_eq!(x.output_label, "consensus");
                assert!(x.only_somatic);
            }
            _ => panic!("Unexpected command"),
        }
    }

    #[test]
    fn test_pair_requires_normal() {
        assert!(Settings::try_parse_from(["oncosv", "pair", "--tumour", "t.vcf"]).is_err());
    }
}
