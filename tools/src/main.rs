//! settle-runner: command-line driver for the settlement pipeline.
//!
//! Usage:
//!   settle-runner --db settle.db --generate --date 2025-03-14 --seed 42
//!   settle-runner --db settle.db --date 2025-03-14
//!   settle-runner --db settle.db --from 2025-03-01 --to 2025-03-07
//!   settle-runner --db settle.db --yesterday
//!
//! Outcomes are printed to stdout as JSON; logs go to stderr. Exit
//! code 0 means every requested day settled, 2 means the date was
//! already being settled, and 1 means anything else went wrong.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use settlement_core::config::SettlementConfig;
use settlement_core::datagen::{self, GeneratorConfig};
use settlement_core::registry::RunRegistry;
use settlement_core::store::SettlementStore;
use settlement_core::trigger::{self, RunStatus};
use std::env;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(ExitCode::SUCCESS);
    }

    let db = str_arg(&args, "--db").unwrap_or("settlement.db");
    let config = match str_arg(&args, "--config") {
        Some(path) => SettlementConfig::load(path)?,
        None => SettlementConfig::default(),
    };

    let mut store = SettlementStore::open(db)?;
    store.migrate()?;
    log::info!("settle-runner using database {db}");

    if args.iter().any(|a| a == "--generate") {
        let target_date = date_arg(&args, "--date")?.unwrap_or_else(yesterday);
        let mut gen_config = GeneratorConfig::for_date(target_date);
        gen_config.seed = parse_arg(&args, "--seed", gen_config.seed);
        gen_config.seller_count = parse_arg(&args, "--sellers", gen_config.seller_count);
        gen_config.products_per_seller = parse_arg(
            &args,
            "--products-per-seller",
            gen_config.products_per_seller,
        );
        gen_config.order_count = parse_arg(&args, "--orders", gen_config.order_count);
        gen_config.items_per_order =
            parse_arg(&args, "--items-per-order", gen_config.items_per_order);
        let counts = datagen::generate_ledger(&mut store, &gen_config)?;
        println!("{}", serde_json::to_string_pretty(&counts)?);
        return Ok(ExitCode::SUCCESS);
    }

    let registry = RunRegistry::new();
    let from = date_arg(&args, "--from")?;
    let to = date_arg(&args, "--to")?;
    match (from, to) {
        (Some(start), Some(end)) => {
            let outcome = trigger::run_for_range(&mut store, &registry, start, end, &config)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if outcome.fail_count > 0 {
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
        (None, None) => {
            let outcome = if args.iter().any(|a| a == "--yesterday") {
                trigger::run_for_yesterday(&mut store, &registry, &config)
            } else {
                let date = date_arg(&args, "--date")?.context(
                    "one of --date, --from/--to, --yesterday, or --generate is required",
                )?;
                trigger::run_for_date(&mut store, &registry, date, &config)
            };
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            match outcome.status {
                RunStatus::Success => Ok(ExitCode::SUCCESS),
                RunStatus::Error if outcome.conflict => Ok(ExitCode::from(2)),
                RunStatus::Error => Ok(ExitCode::FAILURE),
            }
        }
        _ => bail!("--from and --to must be given together"),
    }
}

fn print_usage() {
    println!("settle-runner: daily seller settlement");
    println!();
    println!("Modes (pick one):");
    println!("  --date YYYY-MM-DD        settle a single day");
    println!("  --from A --to B          settle every day in the inclusive range");
    println!("  --yesterday              settle yesterday");
    println!("  --generate               generate a synthetic ledger instead of settling");
    println!();
    println!("Options:");
    println!("  --db PATH                SQLite database file (default settlement.db)");
    println!("  --config PATH            settlement config JSON (default built-in)");
    println!();
    println!("Generator options:");
    println!("  --date YYYY-MM-DD        day the orders land on (default yesterday)");
    println!("  --seed N                 RNG seed (default 42)");
    println!("  --sellers N              seller count (default 100)");
    println!("  --products-per-seller N  products per seller (default 10)");
    println!("  --orders N               order count (default 10000)");
    println!("  --items-per-order N      items per order (default 4)");
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn date_arg(args: &[String], flag: &str) -> Result<Option<NaiveDate>> {
    match str_arg(args, flag) {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("{flag} expects YYYY-MM-DD, got '{raw}'"))?;
            Ok(Some(date))
        }
        None => Ok(None),
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn yesterday() -> NaiveDate {
    chrono::Utc::now()
        .date_naive()
        .pred_opt()
        .unwrap_or(NaiveDate::MIN)
}
