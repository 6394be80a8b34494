//! Print the OpenAPI document as JSON or YAML.

use std::fs;
use std::path::PathBuf;

use chatroom_backend::doc::ApiDoc;
use clap::Parser;
use color_eyre::eyre::{Context, Result};
use utoipa::OpenApi;

/// Command-line arguments for the dump tool.
#[derive(Debug, Parser)]
#[command(name = "openapi-dump", about = "Export the chatroom OpenAPI document")]
struct Args {
    /// Write to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Emit YAML instead of pretty-printed JSON.
    #[arg(long)]
    yaml: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let doc = ApiDoc::openapi();
    let rendered = if args.yaml {
        doc.to_yaml().wrap_err("failed to render OpenAPI as YAML")?
    } else {
        doc.to_pretty_json()
            .wrap_err("failed to render OpenAPI as JSON")?
    };

    match args.output {
        Some(path) => fs::write(&path, rendered)
            .wrap_err_with(|| format!("failed to write {}", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}
