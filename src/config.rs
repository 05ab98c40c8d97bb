use clap::Parser;
use std::path::{Path, PathBuf};

/// Trait for reading configuration parameters
pub trait Config {
    fn input_path(&self) -> &Path;
    fn report_rejections(&self) -> bool;
}

/// CLI configuration
#[derive(Parser, Debug)]
#[command(
    name = "utxo-ledger",
    about = "Validates one epoch of transactions against a UTXO pool and prints the updated pool",
    version
)]
pub struct CliConfig {
    /// Path to the JSON epoch file holding the UTXO pool and candidate transactions
    #[arg(value_name = "EPOCH_FILE")]
    epoch_file: PathBuf,

    /// Include rejected transactions and the reason for each in the output
    #[arg(long)]
    report: bool,
}

impl Config for CliConfig {
    fn input_path(&self) -> &Path {
        &self.epoch_file
    }

    fn report_rejections(&self) -> bool {
        self.report
    }
}
