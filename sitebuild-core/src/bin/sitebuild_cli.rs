//! SiteBuild CLI
//!
//! Commands: build (default), config
//! Exits non-zero only when the build aborts

use clap::{Parser, Subcommand};
use is_terminal::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use sitebuild_core::{BuildConfig, BuildPipeline, ConsoleReporter, NullReporter, Reporter};

#[derive(Parser)]
#[command(name = "sitebuild-cli")]
#[command(about = "SiteBuild CLI - minify, copy and stamp the website for deployment")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (defaults to sitebuild.json in the source directory, if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Website source directory
    #[arg(short, long, global = true)]
    source_dir: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, global = true)]
    out_dir: Option<PathBuf>,

    /// Print the build report as JSON instead of progress lines
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Show skipped items and debug logs
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site (default)
    Build,

    /// Print the effective configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match BuildConfig::discover(cli.config.as_deref(), cli.source_dir.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Build failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(out_dir) = cli.out_dir.clone() {
        config.out_dir = out_dir;
    }

    match cli.command.unwrap_or(Commands::Build) {
        Commands::Config => match serde_json::to_string_pretty(&config) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to serialize config: {}", e);
                ExitCode::FAILURE
            }
        },

        Commands::Build => {
            let reporter: Box<dyn Reporter> = if cli.json {
                Box::new(NullReporter)
            } else {
                let colors = !cli.no_color && std::io::stdout().is_terminal();
                Box::new(ConsoleReporter::new().with_colors(colors).with_verbose(cli.verbose))
            };

            let result = BuildPipeline::new(config).and_then(|pipeline| pipeline.run(reporter.as_ref()));

            match result {
                Ok(report) => {
                    if cli.json {
                        match serde_json::to_string_pretty(&report) {
                            Ok(json) => println!("{}", json),
                            Err(e) => {
                                eprintln!("Failed to serialize report: {}", e);
                                return ExitCode::FAILURE;
                            }
                        }
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::debug!(error = ?e, "build aborted");
                    if cli.json {
                        let output = serde_json::json!({
                            "success": false,
                            "error": e.to_string(),
                        });
                        println!("{}", output);
                    } else {
                        reporter.build_failed(&e);
                    }
                    ExitCode::FAILURE
                }
            }
        }
    }
}

/// Filter used when RUST_LOG is unset
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "sitebuild_core=debug,sitebuild_cli=debug"
    } else {
        "sitebuild_core=warn,sitebuild_cli=warn"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
