//! `paylane` command line: create/process payments and report on the ledger.

use std::io::Write;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;

use paylane_infra::clock::{Clock, SystemClock};
use paylane_infra::config::GatewayConfig;
use paylane_infra::ledger_store::JsonFileLedgerStore;
use paylane_infra::processor::PaymentProcessor;
use paylane_infra::tx_ref::Sha256TransactionRefs;
use paylane_observability::LogFormat;
use paylane_payments::{Currency, PaymentDraft};

#[derive(Debug, Parser)]
#[command(name = "paylane", version, about = "Segment-discounted payment ledger")]
pub struct Cli {
    /// Config file (overrides PAYLANE_CONFIG).
    #[arg(long, global = true, env = "PAYLANE_CONFIG")]
    pub config: Option<std::path::PathBuf>,

    /// Log output format, `json` or `pretty` (overrides the config file).
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create and process a payment, printing the response.
    Pay {
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        currency: Currency,
        #[arg(long)]
        recipient: String,
        #[arg(long)]
        segment: Option<String>,
        #[arg(long)]
        memo: Option<String>,
    },
    /// Quote the fee for an amount without recording anything.
    Fees {
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        currency: Currency,
        #[arg(long)]
        segment: Option<String>,
    },
    /// Ledger statistics, overall or for one segment.
    Stats {
        #[arg(long)]
        segment: Option<String>,
    },
    /// Statistics for every configured segment.
    Segments,
}

type FileProcessor = PaymentProcessor<JsonFileLedgerStore, Sha256TransactionRefs, SystemClock>;

/// Build the processor described by `config`, creating the log file if needed.
pub fn build_processor(config: &GatewayConfig) -> anyhow::Result<FileProcessor> {
    let store = JsonFileLedgerStore::new(&config.ledger_path);
    let clock = SystemClock;
    store
        .init(clock.now())
        .with_context(|| format!("failed to initialize ledger at {:?}", config.ledger_path))?;

    let processor = PaymentProcessor::new(config.fees.clone(), store, Sha256TransactionRefs::new(), clock)
        .context("invalid fee schedule")?
        .with_processing_delay(config.processing_delay());
    Ok(processor)
}

/// Execute one command, writing its JSON result to `out`.
pub fn run(command: Command, config: &GatewayConfig, out: &mut impl Write) -> anyhow::Result<()> {
    let processor = build_processor(config)?;

    match command {
        Command::Pay {
            amount,
            currency,
            recipient,
            segment,
            memo,
        } => {
            let mut draft = PaymentDraft::new(amount, currency, recipient);
            if let Some(segment) = segment {
                draft = draft.segment(segment);
            }
            if let Some(memo) = memo {
                draft = draft.memo(memo);
            }
            let request = processor.create_request_from(draft)?;
            let response = processor.process(request)?;
            print_json(out, &response)
        }
        Command::Fees {
            amount,
            currency,
            segment,
        } => {
            let quote = processor.quote(amount, currency, segment.as_deref())?;
            print_json(out, &quote)
        }
        Command::Stats { segment } => {
            let stats = processor.get_segment_stats(segment.as_deref())?;
            print_json(out, &stats)
        }
        Command::Segments => {
            let breakdown = processor.segment_breakdown()?;
            print_json(out, &breakdown)
        }
    }
}

fn print_json<T: Serialize>(out: &mut impl Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
