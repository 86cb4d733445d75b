mod cli;
mod initializers;
mod subcommands;

use clap::Parser;

use crate::cli::CLI;

fn main() -> eyre::Result<()> {
    let cli = CLI::parse();
    initializers::init_tracing(&cli.opts);
    subcommands::run(cli.command)
}
