mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::{CliConfig, Config};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, Write};
use tracing::{info, warn};
use tx_handler::{Amount, EpochReport, Transaction, TxHandler, TxHash, UtxoPool};

/// Input document: the pool as of the start of the epoch and the candidates
#[derive(Debug, Deserialize)]
struct EpochInput {
    utxo_pool: UtxoPool,
    #[serde(default)]
    transactions: Vec<Transaction>,
}

#[derive(Debug, Serialize)]
struct RejectedOutput {
    position: usize,
    tx_hash: TxHash,
    reason: String,
}

#[derive(Debug, Serialize)]
struct EpochOutput {
    accepted: Vec<TxHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejected: Option<Vec<RejectedOutput>>,
    /// `null` when the total could not be represented exactly
    fees: Option<Amount>,
    utxo_pool: UtxoPool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = CliConfig::parse();

    process_epoch_file(&config)?;

    info!("Processing completed successfully");

    Ok(())
}

fn process_epoch_file<C: Config>(config: &C) -> Result<()> {
    let file = File::open(config.input_path()).context("Failed to open epoch file")?;
    let input: EpochInput =
        serde_json::from_reader(BufReader::new(file)).context("Failed to parse epoch file")?;

    info!(
        "Loaded {} pool entries and {} candidate transactions",
        input.utxo_pool.len(),
        input.transactions.len()
    );

    let mut handler = TxHandler::new(input.utxo_pool);
    let report = handler.process_epoch_with_report(input.transactions);

    for rejection in &report.rejected {
        warn!(
            "Transaction {} at position {} rejected: {}",
            rejection.tx_hash, rejection.position, rejection.reason
        );
    }

    let output = epoch_output(
        report,
        handler.into_utxo_pool(),
        config.report_rejections(),
    );

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    serde_json::to_writer_pretty(&mut handle, &output).context("Failed to serialize epoch result")?;
    writeln!(handle).context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}

fn epoch_output(report: EpochReport, utxo_pool: UtxoPool, report_rejections: bool) -> EpochOutput {
    let rejected = report_rejections.then(|| {
        report
            .rejected
            .iter()
            .map(|rejection| RejectedOutput {
                position: rejection.position,
                tx_hash: rejection.tx_hash,
                reason: rejection.reason.to_string(),
            })
            .collect()
    });

    EpochOutput {
        accepted: report.accepted.iter().map(Transaction::hash).collect(),
        rejected,
        fees: report.fees,
        utxo_pool,
    }
}
