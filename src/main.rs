use anyhow::{Context, Result};
use chemnames::{
    cli::{run_tool, CommonArgs},
    fetch::{CompoundByName, PubChem},
    logging, KeyColumn,
};
use clap::Parser;
use std::{process::ExitCode, sync::Arc};
use tracing::info;

/// Reads a CSV with a 'Compound' column, looks up SMILES, InChI and a full
/// name for each compound on PubChem, and writes the result to a new CSV.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    args: CommonArgs,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.args.debug);
    info!("startup");

    let pubchem = PubChem::new(&cli.args.settings()).context("setting up PubChem client")?;
    let lookup = Arc::new(CompoundByName::new(pubchem));

    Ok(run_tool(&cli.args, KeyColumn::named("Compound"), lookup).await)
}
