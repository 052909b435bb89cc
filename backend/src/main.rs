//! Promoload CLI - promotion exports to offer workbooks
//!
//! # Main Commands
//!
//! ```bash
//! promoload run                         # Batch run (5.xlsx -> daily/<date>/)
//! promoload serve                       # Start HTTP uploader (port 3000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! promoload inspect promo.xlsx          # Show headers and resolved fields
//! promoload link --locale en --amount 100 --percent 0.5
//! promoload decode 00b5-00b1-2140       # Reverse an offer parameter
//! ```

use chrono::Local;
use clap::{Parser, Subcommand};
use promoload::config::{key_from_env, RunConfig, DEFAULT_PORT};
use promoload::transform::normalize::LARI;
use promoload::{
    export::offer_link, normalize_amount_to_lari, normalize_percent, parse_file, resolve_fields,
    run_batch, simple_decrypt, CellValue, RunContext, SourceFormat, TransformOptions,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "promoload")]
#[command(about = "Turn promotion exports into SMS offer and roster workbooks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build all three workbooks into today's run directory
    Run {
        /// Input workbook (default: $PROMOLOAD_INPUT or 5.xlsx)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Base directory for runs and logs (default: $PROMOLOAD_BASE_DIR or daily)
        #[arg(short, long)]
        base_dir: Option<PathBuf>,

        /// Offer link key (default: $PROMOLOAD_KEY or 128)
        #[arg(short, long)]
        key: Option<u32>,
    },

    /// Start HTTP uploader
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Offer link key (default: $PROMOLOAD_KEY or 128)
        #[arg(short, long)]
        key: Option<u32>,
    },

    /// Show headers, row count and the resolved field mapping
    Inspect {
        /// Input file
        input: PathBuf,
    },

    /// Build one offer link
    Link {
        #[arg(short, long, default_value = "")]
        locale: String,

        /// Requested deposit, e.g. "100" or "100GEL"
        #[arg(short, long)]
        amount: String,

        /// Percent, e.g. "20", "20%" or "0.2"
        #[arg(short, long)]
        percent: String,

        #[arg(short, long)]
        key: Option<u32>,
    },

    /// Decode an obfuscated offer parameter
    Decode {
        /// Hyphen-separated hex, e.g. 00b5-00b1-2140
        encoded: String,

        #[arg(short, long)]
        key: Option<u32>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { input, base_dir, key } => cmd_run(input, base_dir, key),

        Commands::Serve { port, key } => cmd_serve(port, key).await,

        Commands::Inspect { input } => cmd_inspect(&input),

        Commands::Link {
            locale,
            amount,
            percent,
            key,
        } => cmd_link(&locale, &amount, &percent, key),

        Commands::Decode { encoded, key } => cmd_decode(&encoded, key),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_run(
    input: Option<PathBuf>,
    base_dir: Option<PathBuf>,
    key: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = RunConfig::from_env()?.with_overrides(input, base_dir, key);
    eprintln!("📄 Processing: {}", config.input.display());

    let ctx = RunContext::new(&config.base_dir, Local::now());
    let report = run_batch(&ctx, &config.input, &TransformOptions { key: config.key })?;

    eprintln!("\n📦 Rows read: {}", report.row_count);
    for workbook in &report.workbooks {
        eprintln!(
            "   💾 {} ({} sheets, {} rows)",
            workbook.path.display(),
            workbook.sheets,
            workbook.rows
        );
    }
    eprintln!("   📝 Log: {}", report.log_path.display());

    eprintln!("\n✨ Done!");
    Ok(())
}

async fn cmd_serve(port: u16, key: Option<u32>) -> Result<(), Box<dyn std::error::Error>> {
    let key = match key {
        Some(k) => k,
        None => key_from_env()?,
    };
    promoload::server::start_server(port, TransformOptions { key }).await
}

fn cmd_inspect(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🔎 Inspecting: {}", input.display());

    let result = parse_file(input)?;
    match &result.format {
        SourceFormat::Delimited { encoding, delimiter } => {
            eprintln!("   Encoding: {}", encoding);
            eprintln!("   Delimiter: '{}'", format_delimiter(*delimiter));
        }
        SourceFormat::Workbook { sheet } => {
            eprintln!("   Worksheet: {}", sheet);
        }
    }
    eprintln!("   Rows: {}", result.dataset.len());
    eprintln!("   Columns: {}", result.dataset.headers.join(", "));

    let mapping = resolve_fields(&result.dataset.headers)?;
    println!();
    for (field, header) in mapping.iter() {
        println!("  {:<18} {}", field, header);
    }
    Ok(())
}

fn cmd_link(locale: &str, amount: &str, percent: &str, key: Option<u32>) -> Result<(), Box<dyn std::error::Error>> {
    let key = match key {
        Some(k) => k,
        None => key_from_env()?,
    };
    let locale = CellValue::text(locale);
    let amount = CellValue::text(amount);
    let percent = CellValue::text(percent);

    match offer_link(&locale, &amount, &percent, key) {
        Some(url) => {
            println!("{}", url);
            Ok(())
        }
        None => {
            let amount_label = normalize_amount_to_lari(&amount);
            let percent_label = normalize_percent(&percent);
            let mut reasons = Vec::new();
            if amount_label.chars().count() < 2 || !amount_label.ends_with(LARI) {
                reasons.push(format!("amount '{}' has no digits", amount));
            }
            if percent_label.chars().count() < 2 || !percent_label.ends_with('%') {
                reasons.push(format!("percent '{}' is not a number", percent));
            }
            Err(format!("no link: {}", reasons.join("; ")).into())
        }
    }
}

fn cmd_decode(encoded: &str, key: Option<u32>) -> Result<(), Box<dyn std::error::Error>> {
    let key = match key {
        Some(k) => k,
        None => key_from_env()?,
    };
    println!("{}", simple_decrypt(encoded.trim(), key)?);
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
