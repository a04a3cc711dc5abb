use anyhow::{Context, Result};
use chemnames::{
    cli::{run_tool, CommonArgs},
    fetch::{IdentifiersByName, PubChem},
    logging,
    process::table::HEADERLESS_COLUMN,
    KeyColumn,
};
use clap::Parser;
use std::{process::ExitCode, sync::Arc};

/// Reads a headerless one-column CSV of compound names and writes
/// Name, CID, SMILES and InChIKey for each of them.
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
    let lookup = Arc::new(IdentifiersByName::new(pubchem, HEADERLESS_COLUMN));

    Ok(run_tool(&cli.args, KeyColumn::Headerless, lookup).await)
}
