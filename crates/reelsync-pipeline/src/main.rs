//! ReelSync command line.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reelsync_models::ShortsJob;
use reelsync_pipeline::{load_job, RunConfig, ShortsPipeline};

#[derive(Debug, Parser)]
#[command(name = "reelsync", version, about = "Assemble narrated, captioned shorts from source footage")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a job manifest to `<out-dir>/<name>.mp4`
    Render {
        /// Job manifest (JSON)
        job: PathBuf,
        /// Build and print every FFmpeg command without running it
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Voice used for every narration cue
        #[arg(long)]
        voice: Option<String>,
        /// Keep the intermediate directory
        #[arg(long)]
        keep_intermediates: bool,
    },
    /// Resolve the render plan (runs TTS, renders nothing) and print it
    Plan {
        job: PathBuf,
        #[arg(long)]
        voice: Option<String>,
        /// Write the plan here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the job manifest JSON schema
    Schema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    match cli.command {
        Command::Render {
            job,
            dry_run,
            out_dir,
            voice,
            keep_intermediates,
        } => {
            let job = load_job(&job).with_context(|| format!("loading {}", job.display()))?;
            let mut config = RunConfig::from_env().with_dry_run(dry_run);
            if let Some(out_dir) = out_dir {
                config = config.with_out_dir(out_dir);
            }
            if let Some(voice) = voice {
                config = config.with_voice(voice);
            }
            config.keep_intermediates |= keep_intermediates;

            let pipeline = ShortsPipeline::from_config(config).context("configuring pipeline")?;
            match pipeline.run(&job).await {
                Ok(report) => {
                    info!(
                        output = %report.output.display(),
                        rendered_secs = report.rendered_secs,
                        size_bytes = report.size_bytes,
                        "Run report"
                    );
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                Err(e) => {
                    error!(
                        stage = e.stage().map(|s| s.as_str()).unwrap_or("setup"),
                        kind = e.kind().as_str(),
                        "{}",
                        e
                    );
                    if let Some(diagnostic) = e.diagnostic() {
                        eprintln!("{}", diagnostic);
                    }
                    std::process::exit(1);
                }
            }
        }
        Command::Plan { job, voice, output } => {
            let job = load_job(&job).with_context(|| format!("loading {}", job.display()))?;
            let mut config = RunConfig::from_env().with_dry_run(true);
            if let Some(voice) = voice {
                config = config.with_voice(voice);
            }

            let pipeline = ShortsPipeline::from_config(config).context("configuring pipeline")?;
            let (plan, work_dir) = pipeline.plan_only(&job).await?;
            info!(work_dir = %work_dir.display(), "Narration kept for the plan");

            let json = serde_json::to_string_pretty(&plan)?;
            match output {
                Some(path) => std::fs::write(&path, json)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => println!("{}", json),
            }
        }
        Command::Schema => {
            let schema = schemars::schema_for!(ShortsJob);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }
    Ok(())
}

/// Colored output for development, JSON when `LOG_FORMAT=json`.
fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("reelsync=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}
