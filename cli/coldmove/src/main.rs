//! coldmove CLI
//!
//! Deadline-bounded object migration between buckets.

use clap::Parser;

mod args;
mod run;

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Initialize logging (to stderr, so stdout is clean for the response)
    run::init_logging(args.log_level)?;

    let (response, summary) = run::execute(args).await?;

    if let Some(summary) = &summary {
        eprintln!();
        eprintln!("Migration run completed:");
        eprintln!("  Copied:   {}", summary.copied);
        eprintln!("  Verified: {}", summary.verified);
        eprintln!("  Deleted:  {}", summary.deleted);
        eprintln!("  Failed:   {}", summary.failed);
        eprintln!("  Skipped:  {}", summary.skipped);

        if summary.failed > 0 {
            eprintln!(
                "  Warning: {} objects failed. See logs for details.",
                summary.failed
            );
        }
    }

    // The response body is the program's output proper.
    println!("{}", response.body);

    match response.status {
        200 => Ok(()),
        400 => std::process::exit(2),
        _ => std::process::exit(3),
    }
}
