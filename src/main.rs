use anyhow::Result;
use clap::Parser;
use krakend_gen::config::DEFAULT_ENV;
use krakend_gen::generator::{self, GenerateArgs, LogFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "krakend-gen",
    about = "Generate a KrakenD gateway config from endpoint and host mappings"
)]
struct Cli {
    /// Installation root containing config/, mapping/ and result/
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Environment whose overrides under config/<ENV>/ are applied
    #[arg(short, long, env = "ENV", default_value = DEFAULT_ENV)]
    env: String,

    /// Generator settings file (.toml or .json); defaults to krakend-gen.toml under the root
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (report, guard) = generator::run(GenerateArgs {
        root: cli.root,
        env: cli.env,
        settings_path: cli.settings,
        log_format: cli.log_format,
    })?;

    // Flush buffered log lines so the completion line is printed last.
    drop(guard);
    println!(
        "KrakenD configuration for {} environment generated successfully.",
        report.env
    );
    Ok(())
}
