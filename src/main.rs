//
//  bb-cloud
//  main.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use anyhow::Result;
use clap::Parser;
use console::style;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bb_cloud::cli::{error_hint, exit_code, Cli, Commands};
use bb_cloud::exit_codes;

#[tokio::main]
async fn main() {
    // Initialize logging
    init_logging();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Execute command
    let result = run(cli).await;

    // Handle result and exit
    match result {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("{} {e:#}", style("error:").red().bold());
            if let Some(hint) = error_hint(&e) {
                eprintln!("{}", style(hint).dim());
            }
            std::process::exit(exit_code(&e));
        }
    }
}

/// Initialize logging based on environment
fn init_logging() {
    let filter = EnvFilter::try_from_env("BB_DEBUG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Main command dispatcher
async fn run(cli: Cli) -> Result<()> {
    tracing::debug!("Dispatching {:?}", cli.command);
    match cli.command {
        Commands::Auth(cmd) => cmd.run(&cli.global).await,
        Commands::Repo(cmd) => cmd.run(&cli.global).await,
        Commands::Pr(cmd) => cmd.run(&cli.global).await,
        Commands::Issue(cmd) => cmd.run(&cli.global).await,
        Commands::Pipeline(cmd) => cmd.run(&cli.global).await,
        Commands::Workspace(cmd) => cmd.run(&cli.global).await,
        Commands::Snippet(cmd) => cmd.run(&cli.global).await,
        Commands::Api(cmd) => cmd.run(&cli.global).await,
        Commands::Config(cmd) => cmd.run(&cli.global).await,
        Commands::Version => {
            println!("bb version {}", bb_cloud::VERSION);
            Ok(())
        }
    }
}
