use clap::Parser;
use hsri_processor::cli::{run, Cli};
use hsri_processor::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
