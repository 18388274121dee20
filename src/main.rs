use clap::Parser;
use hr_approvals::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Sweep(args) => cli::sweep::run(args).await,
        Command::EntityTypes => cli::entity_types::run(),
    }
}
