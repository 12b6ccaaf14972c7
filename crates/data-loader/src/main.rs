//! data-loader: extract yearly fundamentals from scraped pages and report them.
//!
//! Each `--tables` file is a JSON document with the page's tables and,
//! optionally, the currencies detected for it.
//!
//! Usage:
//!   cargo run -p data-loader -- match --tables page.json
//!   cargo run -p data-loader -- import --isin DE0007164600 --tables guv.json estimates.json
//!   cargo run -p data-loader -- import --tables page.json --dry-run   # oldest imported stock
//!   cargo run -p data-loader -- report --isin DE0007164600

mod config;
mod import;
mod providers;

use anyhow::{anyhow, Result};
use fundamentals_core::{Currency, RecordSet};
use stock_store::{render_report, StockDb};

use config::LoaderConfig;
use import::Importer;
use providers::{CurrencyOverride, JsonTableProvider};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "data_loader=info,table_extractor=info,stock_store=info".into()
            }),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or_default();
    let dry_run = args.iter().any(|a| a == "--dry-run");

    let mut config = LoaderConfig::from_env()?;
    if let Some(db) = flag_value(&args, "--db") {
        config.database_url = db.to_string();
    }

    let isin = flag_value(&args, "--isin").map(|s| s.to_string());
    let tables = flag_values(&args, "--tables");
    let overrides = CurrencyOverride {
        data_currency: currency_flag(&args, "--data-currency")?,
        sales_currency: currency_flag(&args, "--sales-currency")?,
    };

    match command {
        "match" if !tables.is_empty() => run_match(&config, &tables).await,
        "import" if !tables.is_empty() => {
            run_import(&config, &args, isin, &tables, overrides, dry_run).await
        }
        "report" if isin.is_some() => {
            run_report(&config, isin.as_deref().unwrap_or_default()).await
        }
        _ => {
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  data-loader match --tables FILE...             Print the match table of each file");
    eprintln!("  data-loader import [--isin ISIN] --tables FILE...");
    eprintln!("                                                 Extract and store fundamentals");
    eprintln!("  data-loader report --isin ISIN                 Print the completed report");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --data-currency CODE         Currency of per-share and absolute values");
    eprintln!("  --sales-currency CODE        Currency of sales figures");
    eprintln!("  --estimation-url URL         Record the estimates page of the stock");
    eprintln!("  --income-statement-url URL   Record the income statement page of the stock");
    eprintln!("  --dry-run                    Extract without writing to the DB");
    eprintln!("  --db URL                     SQLite URL (default: $DATABASE_URL or sqlite:stocks.db)");
}

async fn run_match(config: &LoaderConfig, sources: &[String]) -> Result<()> {
    let synonyms = config.synonyms()?;
    let provider = JsonTableProvider::new();
    let importer = Importer::new(&provider, &synonyms);

    for source in sources {
        let matches = importer.match_document(source).await?;
        tracing::info!("{}: {} metrics matched", source, matches.len());
        println!("# {}", source);
        print!("{}", matches.to_csv()?);
    }
    Ok(())
}

async fn run_import(
    config: &LoaderConfig,
    args: &[String],
    isin: Option<String>,
    sources: &[String],
    overrides: CurrencyOverride,
    dry_run: bool,
) -> Result<()> {
    let db = StockDb::new(&config.database_url).await?;

    let isin = match isin {
        Some(isin) => isin,
        None => db
            .fetch_oldest_stock_meta()
            .await?
            .ok_or_else(|| anyhow!("No --isin given and no stock registered"))?,
    };

    tracing::info!(
        "data-loader: importing {} from {} documents, db={}, dry_run={}",
        isin,
        sources.len(),
        config.database_url,
        dry_run
    );

    if !dry_run {
        db.add_stock_meta(&isin).await?;
        let estimation_url = flag_value(args, "--estimation-url");
        let income_statement_url = flag_value(args, "--income-statement-url");
        if estimation_url.is_some() || income_statement_url.is_some() {
            db.update_source_urls(&isin, estimation_url, income_statement_url).await?;
        }
    }

    let synonyms = config.synonyms()?;
    let provider = JsonTableProvider::new();
    let summary = Importer::new(&provider, &synonyms)
        .with_overrides(overrides)
        .dry_run(dry_run)
        .import(&db, &isin, sources)
        .await?;

    tracing::info!(
        "Done! {} years written from {} documents ({} failed, {} without data)",
        summary.years_written,
        summary.documents,
        summary.failed,
        summary.empty
    );
    Ok(())
}

async fn run_report(config: &LoaderConfig, isin: &str) -> Result<()> {
    let db = StockDb::new(&config.database_url).await?;

    match db.fetch_stock_meta(isin).await? {
        Some(meta) => tracing::info!("Stock entry found: {:?}", meta),
        None => {
            tracing::info!("Adding new stock entry: {}", isin);
            db.add_stock_meta(isin).await?;
        }
    }

    let records = match db.fetch_record_set(isin).await? {
        Some(records) => data_completer::complete(records),
        None => {
            tracing::warn!("Could not find data for {}", isin);
            RecordSet::new()
        }
    };

    print!("{}", render_report(&records, &config.report_window())?);
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

/// Values following `flag` up to the next `--` option.
fn flag_values(args: &[String], flag: &str) -> Vec<String> {
    match args.iter().position(|a| a == flag) {
        Some(idx) => args[idx + 1..]
            .iter()
            .take_while(|a| !a.starts_with("--"))
            .cloned()
            .collect(),
        None => Vec::new(),
    }
}

fn currency_flag(args: &[String], flag: &str) -> Result<Option<Currency>> {
    flag_value(args, flag)
        .map(|code| {
            Currency::new(code)
                .ok_or_else(|| anyhow!("{} expects a currency code, got {}", flag, code))
        })
        .transpose()
}
