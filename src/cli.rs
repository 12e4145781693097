use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use datapress::config::{self, PressConfig};
use datapress::datasets::{AbuseReport, Dataset, Download};
use datapress::integrity::verify_receipt;
use datapress::pii::has_pii;
use datapress::pipeline;
use datapress::secret::{SECRET_ENV_VAR, TokenCipher};
use secrecy::SecretString;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "datapress",
    version,
    about = "Pack raw exports into compact, redactable artifacts"
)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Secret for token encryption
    #[arg(long, global = true, env = "DATAPRESS_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Also write rotating log files to the platform data directory
    #[arg(long, global = true)]
    pub log_to_file: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DatasetKind {
    Abuse,
    Downloads,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize, redact and compress CSV exports
    Pack {
        #[arg(short, long, value_enum)]
        dataset: DatasetKind,

        /// Output directory (defaults to `output_dir` from the config)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Keep object keys in insertion order
        #[arg(long)]
        no_canonical: bool,

        /// CSV files forming one batch
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Print a JSON report for a packed artifact
    Report {
        #[arg(short, long, value_enum)]
        dataset: DatasetKind,

        artifact: PathBuf,

        /// Directory holding `dictionaries/` (defaults to the artifact's directory)
        #[arg(long)]
        dictionaries: Option<PathBuf>,

        /// Leaderboard size (defaults to `leaderboard_size` from the config)
        #[arg(long)]
        top: Option<usize>,
    },
    /// Encrypt text into a token
    Encrypt { plaintext: String },
    /// Decrypt a token
    Decrypt { token: String },
    /// Report whether text looks like it contains PII
    Pii { text: String },
    /// Check an artifact against its integrity receipt
    Verify { receipt: PathBuf },
}

struct Context {
    config: PressConfig,
    secret: Option<String>,
}

impl Context {
    fn new(cli: &Cli) -> Self {
        let config = match &cli.config {
            Some(path) => config::load_config_from(path),
            None => config::load_config(),
        };
        Self {
            config,
            secret: cli.secret.clone(),
        }
    }

    /// Cipher from `--secret`, the config file or the environment.
    fn cipher(&self) -> Result<Option<TokenCipher>> {
        let source = self
            .secret
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.config.secret_source());
        match source {
            Some(raw) => Ok(Some(TokenCipher::from_secret(&SecretString::new(
                raw.into(),
            ))?)),
            None => Ok(None),
        }
    }

    fn require_cipher(&self) -> Result<TokenCipher> {
        self.cipher()?.with_context(|| {
            format!("No secret configured (use --secret, the config file or {SECRET_ENV_VAR})")
        })
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context::new(&cli);
    match cli.command {
        Commands::Pack {
            dataset,
            out,
            no_canonical,
            inputs,
        } => {
            let out = out
                .or_else(|| ctx.config.output_dir.clone())
                .context("No output directory (use --out or set output_dir in the config)")?;
            let canonical = ctx.config.canonical && !no_canonical;
            match dataset {
                DatasetKind::Abuse => handle_pack::<AbuseReport>(&ctx, &inputs, &out, canonical),
                DatasetKind::Downloads => handle_pack::<Download>(&ctx, &inputs, &out, canonical),
            }
        }
        Commands::Report {
            dataset,
            artifact,
            dictionaries,
            top,
        } => {
            let top = top.unwrap_or(ctx.config.leaderboard_size);
            let dictionaries = dictionaries.as_deref();
            match dataset {
                DatasetKind::Abuse => {
                    handle_report::<AbuseReport>(&ctx, &artifact, dictionaries, top)
                }
                DatasetKind::Downloads => {
                    handle_report::<Download>(&ctx, &artifact, dictionaries, top)
                }
            }
        }
        Commands::Encrypt { plaintext } => {
            println!("{}", ctx.require_cipher()?.encrypt(&plaintext)?);
            Ok(())
        }
        Commands::Decrypt { token } => {
            println!("{}", ctx.require_cipher()?.decrypt(&token)?);
            Ok(())
        }
        Commands::Pii { text } => {
            println!("{}", has_pii(&text));
            Ok(())
        }
        Commands::Verify { receipt } => {
            let result = verify_receipt(&receipt)?;
            println!("{}", result.format_cli());
            if !result.passed {
                bail!("Verification failed for {}", receipt.display());
            }
            Ok(())
        }
    }
}

fn handle_pack<D: Dataset>(
    ctx: &Context,
    inputs: &[PathBuf],
    out: &Path,
    canonical: bool,
) -> Result<()> {
    let cipher = ctx.cipher()?;
    let packed = pipeline::pack::<D>(inputs, out, cipher.as_ref(), canonical)
        .with_context(|| format!("Failed to pack {} inputs", D::NAME))?;

    println!("{}", packed.summary());
    println!("  Artifact: {}", packed.artifact.display());
    println!("  Receipt: {}", packed.receipt.display());
    println!("  Dictionaries: {}", packed.dictionaries.display());
    Ok(())
}

fn handle_report<D: Dataset>(
    ctx: &Context,
    artifact: &Path,
    dictionaries: Option<&Path>,
    top: usize,
) -> Result<()> {
    let cipher = ctx.cipher()?;
    let report = pipeline::report::<D>(artifact, dictionaries, cipher.as_ref(), top)
        .with_context(|| format!("Failed to report on {}", artifact.display()))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_pack() {
        let cli = Cli::try_parse_from([
            "datapress",
            "pack",
            "--dataset",
            "downloads",
            "--out",
            "out",
            "a.csv",
            "b.csv",
        ])
        .unwrap();
        match cli.command {
            Commands::Pack {
                dataset, inputs, ..
            } => {
                assert!(matches!(dataset, DatasetKind::Downloads));
                assert_eq!(inputs.len(), 2);
            }
            _ => panic!("expected pack"),
        }
    }
}
