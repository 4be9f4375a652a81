use anyhow::Result;
use clap::Parser;

use dupix::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
