//! # TillQuest Register Entry Point
//!
//! ```text
//! tillquest [--config FILE] [--db FILE] [--channel FILE]
//! ```
//!
//! Two registers started with the same `--channel` file can pay each other:
//! one as seller, one as buyer.

use std::process::ExitCode;

use clap::Parser;
use tillquest_register::cli::Args;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // The actual setup is in lib.rs for better testability
    match tillquest_register::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tillquest: {}", e);
            ExitCode::FAILURE
        }
    }
}
