use anyhow::{Context, Result};
use chemnames::{
    cli::{run_tool, CommonArgs},
    fetch::{KeggByCid, PubChem},
    logging, KeyColumn,
};
use clap::Parser;
use std::{process::ExitCode, sync::Arc};

/// Adds a 'kegg' column to a CSV with a 'CID' column, using the KEGG
/// cross-references PubChem lists for each compound.
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

    let pubchem = PubChem::new(&cli.args.settings()).context("setting up PubChem client")?;
    let lookup = Arc::new(KeggByCid::new(pubchem));

    Ok(run_tool(&cli.args, KeyColumn::named("CID"), lookup).await)
}
