// One-shot relay run from the command line: prints the model's JSON for a topic.
use clap::Parser;
use common::RelayMode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "try_relay", about = "Run a single relay pass and print the result")]
struct Args {
    /// Topic to search for
    topic: String,

    /// predict, neutral-pick or neutral-top3
    #[arg(long, default_value = "neutral-top3")]
    mode: String,

    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    dotenv::dotenv().ok();
    let args = Args::parse();

    let mode: RelayMode = serde_json::from_value(serde_json::Value::String(args.mode.clone()))
        .map_err(|_| anyhow::anyhow!("unknown mode: {}", args.mode))?;
    let config = neutralscope::load_config(args.config, None).await?;
    let relay = neutralscope::relay_from_config(&config)?;

    println!("\n{}", "=".repeat(60));
    println!("Topic: {}", args.topic);
    println!("Mode: {}", mode);
    println!("Model: {}", relay.model());
    println!("{}", "=".repeat(60));

    match relay.run(Some(&args.topic), mode).await {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Err(e) => {
            eprintln!("✗ Failed: {}", e);
            let body = e.body();
            if let Some(raw) = body.raw {
                eprintln!("Raw model output:\n{}", raw);
            }
            std::process::exit(1);
        }
    }

    Ok(())
}
