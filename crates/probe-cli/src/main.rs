//! Probe harness CLI
//!
//! The `probe` command runs scripted probe sessions against LLM providers.
//!
//! ## Commands
//!
//! - `run`: Run a probe session and write the session artifact
//! - `keys`: Show which providers have an API key configured
//! - `probes`: List the probe ids in a probe set

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use probe_core::{
    parse_probe_ids, render_summary_text, validate_all, ProbeSet, ProviderKind, RunConfig,
    DEFAULT_OUTPUT,
};

#[derive(Parser)]
#[command(name = "probe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run scripted conversational probes against LLM providers", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a probe session against one provider
    Run {
        /// Provider to probe (anthropic, google, groq, openai)
        #[arg(short, long)]
        provider: String,

        /// Where to write the session artifact
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Comma-separated probe ids to run (default: all, in file order)
        #[arg(long)]
        probe_ids: Option<String>,

        /// Probe set YAML file (default: built-in probe set)
        #[arg(long)]
        probes: Option<PathBuf>,

        /// Model name (default: the provider's default model)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show which providers have an API key configured
    Keys,

    /// List probe ids in execution order
    Probes {
        /// Probe set YAML file (default: built-in probe set)
        #[arg(long)]
        probes: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    probe_core::init_tracing(cli.json, level);

    match dispatch(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            provider,
            output,
            probe_ids,
            probes,
            model,
        } => {
            let mut config = RunConfig::new(provider).with_output(output);
            if let Some(raw) = probe_ids {
                config = config.with_probe_ids(parse_probe_ids(&raw));
            }
            if let Some(path) = probes {
                config = config.with_probes_path(path);
            }
            config.model = model;
            cmd_run(&config).await
        }
        Commands::Keys => cmd_keys(),
        Commands::Probes { probes } => cmd_probes(probes.as_deref()),
    }
}

/// Run one session and print its summary
async fn cmd_run(config: &RunConfig) -> Result<()> {
    let artifact = probe_core::run(config).await?;

    print!("{}", render_summary_text(&artifact));
    println!("Results written to {}", config.output.display());
    info!(output = %config.output.display(), "probe run complete");
    Ok(())
}

/// Print available and missing providers
fn cmd_keys() -> Result<()> {
    let availability = validate_all();
    println!("Available: {}", join_kinds(&availability.available));
    println!("Missing: {}", join_kinds(&availability.missing));
    Ok(())
}

/// Print probe ids in file order
fn cmd_probes(path: Option<&Path>) -> Result<()> {
    let set = load_probe_set(path)?;
    for probe in set.probes() {
        println!("{}", probe.id);
    }
    Ok(())
}

fn load_probe_set(path: Option<&Path>) -> Result<ProbeSet> {
    match path {
        Some(path) => ProbeSet::load(path)
            .with_context(|| format!("Failed to load probe set from {}", path.display())),
        None => Ok(ProbeSet::builtin()?),
    }
}

fn join_kinds(kinds: &[ProviderKind]) -> String {
    if kinds.is_empty() {
        return "(none)".to_string();
    }
    kinds
        .iter()
        .map(|k| k.name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from([
            "probe",
            "run",
            "--provider",
            "openai",
            "--probe-ids",
            "self-model,continuity",
            "--model",
            "gpt-4o",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                provider,
                output,
                probe_ids,
                probes,
                model,
            } => {
                assert_eq!(provider, "openai");
                assert_eq!(output, PathBuf::from("out/results.json"));
                assert_eq!(probe_ids.as_deref(), Some("self-model,continuity"));
                assert!(probes.is_none());
                assert_eq!(model.as_deref(), Some("gpt-4o"));
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_run_requires_provider() {
        assert!(Cli::try_parse_from(["probe", "run"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["probe", "keys", "--verbose", "--json"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Keys));
    }

    #[test]
    fn test_join_kinds() {
        assert_eq!(join_kinds(&[]), "(none)");
        assert_eq!(
            join_kinds(&[ProviderKind::Anthropic, ProviderKind::Groq]),
            "anthropic, groq"
        );
    }

    #[test]
    fn test_cmd_probes_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probes.yaml");
        std::fs::write(
            &path,
            "probes:\n  - id: a\n    prompt: first\n  - id: b\n    prompt: second\n",
        )
        .unwrap();

        assert!(cmd_probes(Some(&path)).is_ok());
        assert!(cmd_probes(None).is_ok());
        assert!(cmd_probes(Some(&dir.path().join("missing.yaml"))).is_err());
    }

    #[tokio::test]
    async fn test_cmd_run_rejects_unknown_provider() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::new("mistral").with_output(dir.path().join("results.json"));

        let err = cmd_run(&config).await.unwrap_err();
        assert!(err.to_string().contains("Unsupported provider 'mistral'"));
        assert!(!dir.path().join("results.json").exists());
    }
}
