use anyhow::Result;
use clap::Parser;
use recurra::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    recurra::logging::init_tracing(cli.verbose);
    cli.run().await
}
