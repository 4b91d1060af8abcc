mod chrom_set;
mod cli;
mod complex_sv;
mod consensus;
mod csv_output;
mod filenames;
mod globals;
mod int_range;
mod logger;
mod os_utils;
mod run_stats;
mod somatic;
mod sv_record;
mod vcf_header;
mod vcf_input;
mod vcf_output;
mod vcf_utils;

use std::{error, process};

use hhmmss::Hhmmss;
use log::info;

use crate::cli::Commands;
use crate::complex_sv::run_complex_sv;
use crate::consensus::run_consensus;
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::logger::setup_output_dir_and_logger;
use crate::somatic::run_pair;

fn run(settings: &cli::Settings) -> Result<(), Box<dyn error::Error>> {
    info!("Starting {PROGRAM_NAME} {PROGRAM_VERSION}");
    info!(
        "cmdline: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );

    let start = std::time::Instant::now();

    match &settings.command {
        Commands::Consensus(x) => {
            run_consensus(x)?;
        }
        Commands::Pair(x) => {
            run_pair(x)?;
        }
        Commands::ComplexSv(x) => {
            run_complex_sv(x)?;
        }
    }

    info!(
        "{PROGRAM_NAME} completed. Total Runtime: {}",
        start.elapsed().hhmmssxxx()
    );
    Ok(())
}

fn main() {
    let settings = cli::validate_and_fix_settings(cli::parse_settings());

    // Setup logger, including creation of the output directory for the log file:
    setup_output_dir_and_logger(
        settings.get_output_dir(),
        settings.shared.clobber,
        settings.shared.debug,
    );

    if let Err(err) = run(&settings) {
        eprintln!("{err}");
        process::exit(2);
    }
}
