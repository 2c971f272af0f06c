//! Rewind - terminal front-end for record-and-replay debug targets
//!
//! This is the binary entry point. All logic lives in the library.

use clap::Parser;
use rewind::config::Settings;

/// Rewind - follow a record-and-replay debug target from the terminal
#[derive(Parser, Debug)]
#[command(name = "rewind")]
#[command(about = "Follow console output and pauses of a record-and-replay debug target", long_about = None)]
struct Args {
    /// WebSocket URI of the debug target (e.g. ws://localhost:8000/session)
    #[arg(value_name = "URI")]
    uri: Option<String>,

    /// Print packets as JSON lines instead of human-readable text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    rewind_core::logging::init()?;

    let args = Args::parse();
    let mut settings = Settings::load();
    if args.json {
        settings.json_output = true;
    }

    let Some(uri) = args.uri.or_else(|| settings.target.clone()) else {
        eprintln!("❌ No target URI given.");
        eprintln!();
        eprintln!("Pass one as an argument:");
        eprintln!("  rewind ws://localhost:8000/session");
        eprintln!();
        eprintln!("or set a default in ~/.config/rewind/config.toml:");
        eprintln!("  target = \"ws://localhost:8000/session\"");
        std::process::exit(2);
    };

    rewind::run_follow(&uri, &settings).await?;
    Ok(())
}
