// Allow our euro.cents digit grouping convention (e.g., 100_00 = €100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! CLI entry point for the certbook trading desk.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use certbook::{CertificateType, Price};
use certbook_desk::config::Config;
use certbook_desk::desk;
use certbook_desk::error::Error;

#[derive(Parser)]
#[command(name = "certdesk")]
#[command(about = "Carbon-certificate trading desk: market data, estimates, execution")]
#[command(version)]
struct Cli {
    /// Path to desk.toml
    #[arg(long, default_value = "desk.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stream market data, balances, and prices until interrupted
    Watch {
        /// Certificate class (eua or cer)
        #[arg(value_parser = parse_certificate)]
        certificate: CertificateType,
    },

    /// Show ask depth and the local fill estimate for a budget
    Estimate {
        #[arg(value_parser = parse_certificate)]
        certificate: CertificateType,

        /// EUR budget, e.g. 1500 or 1500.50
        #[arg(value_parser = parse_eur)]
        amount: Price,
    },

    /// Preview, confirm, and execute a market buy
    Buy {
        #[arg(value_parser = parse_certificate)]
        certificate: CertificateType,

        /// EUR budget, e.g. 1500 or 1500.50
        #[arg(value_parser = parse_eur)]
        amount: Price,

        /// Skip confirmation prompt (for automation)
        #[arg(long)]
        force: bool,
    },

    /// Show account balances
    Balances,

    /// Check backend connectivity
    Status,
}

fn parse_certificate(raw: &str) -> Result<CertificateType, String> {
    raw.parse().map_err(|e| format!("{e}"))
}

fn parse_eur(raw: &str) -> Result<Price, String> {
    let euros: f64 = raw
        .parse()
        .map_err(|_| format!("not a euro amount: {raw}"))?;
    if !euros.is_finite() || euros <= 0.0 {
        return Err("amount must be a positive number of euros".into());
    }
    Ok(Price((euros * 100.0).round() as i64))
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Watch { certificate } => desk::watch(&config, certificate).await,
        Command::Estimate {
            certificate,
            amount,
        } => desk::show_estimate(&config, certificate, amount).await,
        Command::Buy {
            certificate,
            amount,
            force,
        } => desk::run_buy(&config, certificate, amount, force).await,
        Command::Balances => desk::show_balances(&config).await,
        Command::Status => desk::check_status(&config).await,
    };

    if let Err(e) = result {
        match &e {
            Error::NotExecutable(msg) => {
                eprintln!("\nNot executed: {msg}");
                process::exit(2);
            }
            Error::Aborted(msg) => {
                eprintln!("{msg}");
                process::exit(0);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}
