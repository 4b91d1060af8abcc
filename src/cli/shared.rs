use clap::Args;

#[derive(Args)]
pub struct SharedSettings {
    /// Overwrite an existing output directory
    #[arg(long, global = true)]
    pub clobber: bool,

    /// Turn on extra debug logging
    ///
    /// This option enables extra logging intended for debugging only, including a log entry for
    /// each tumour record matched to a normal record with divergent SV length.
    ///
    #[arg(long, global = true)]
    pub debug: bool,
}
