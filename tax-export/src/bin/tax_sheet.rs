use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tax_export::{Spreadsheet, TaxSheetExporter};
use tracing_subscriber::EnvFilter;

/// Inspect tax records exported by the tax calculator.
#[derive(Parser, Debug)]
#[command(name = "tax-sheet")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding the exported sheets
    #[arg(short, long, env = "TAX_EXPORT_DIR", default_value = "exports")]
    dir: PathBuf,

    /// Sheet to read
    #[arg(short, long, default_value = "tax-records")]
    sheet: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the tax amount recorded for an id
    Lookup {
        #[arg(long)]
        id: String,
    },
    /// Print every exported row
    List,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .without_time()
        .with_target(false)
        .init();

    let args = Args::parse();
    let exporter = TaxSheetExporter::new(Spreadsheet::new(&args.dir), &args.sheet);

    match args.command {
        Command::Lookup { id } => {
            let amount = exporter
                .lookup_tax_amount(&id)
                .with_context(|| format!("Failed to read sheet: {}", args.sheet))?;
            match amount {
                Some(amount) => println!("{amount}"),
                None => anyhow::bail!("no tax record with id {id} in sheet {}", args.sheet),
            }
        }
        Command::List => {
            let rows = exporter
                .rows()
                .with_context(|| format!("Failed to read sheet: {}", args.sheet))?;
            for row in &rows {
                println!(
                    "{}\tincome={}\trent={}\tinvestments={}\ttax={}",
                    row.id, row.annual_income, row.rent, row.investments, row.tax_amount
                );
            }
            println!("{} rows in {}", rows.len(), args.dir.display());
        }
    }

    Ok(())
}
