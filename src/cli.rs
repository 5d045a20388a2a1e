use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate, generate_to};

use crate::indexer::{DEFAULT_API_URL, IndexerConfig};
use crate::trending::{Period, SortMetric};

pub const DEFAULT_CSV_PATH: &str = "data/output/trending.csv";
pub const DEFAULT_HTML_PATH: &str = "data/output/report.html";

pub const ENV_API_URL: &str = "INDEXER_API_URL";
pub const ENV_API_KEY: &str = "INDEXER_API_KEY";
pub const ENV_API_USER: &str = "INDEXER_API_USER";

pub const SAVE_CSV_HELP: &str = "Save the trending rows to the given CSV file (defaults to data/output/trending.csv when no path is provided). Use --archive-csv to store a .gz instead.";
pub const SAVE_HTML_HELP: &str =
    "Save the HTML report to the given file (defaults to data/output/report.html when no path is provided).";
pub const ARCHIVE_CSV_HELP: &str = "Archive the saved CSV output into a .gz file.";

#[derive(Debug, Parser)]
#[command(
    name = "suirank",
    about = "Fetch Sui NFT collection trading stats from a GraphQL indexer and print a trending leaderboard.",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    #[arg(
        long,
        value_enum,
        default_value = "1d",
        help = "Trending window the current/previous metric pairs are compared over."
    )]
    pub period: Period,
    #[arg(
        long,
        value_enum,
        default_value = "usd-volume",
        help = "Metric the indexer orders collections by, descending."
    )]
    pub sort_by: SortMetric,
    #[arg(long, default_value_t = 25, help = "Number of collections to fetch.")]
    pub limit: u32,
    #[arg(long, default_value_t = 0, help = "Pagination offset.")]
    pub offset: u32,
    #[arg(
        long,
        value_name = "URL",
        help = "GraphQL indexer endpoint (falls back to INDEXER_API_URL, then the public endpoint)."
    )]
    pub api_url: Option<String>,
    #[arg(
        long,
        value_name = "KEY",
        help = "Indexer API key sent as x-api-key (falls back to INDEXER_API_KEY)."
    )]
    pub api_key: Option<String>,
    #[arg(
        long,
        value_name = "USER",
        help = "Indexer API user sent as x-api-user (falls back to INDEXER_API_USER)."
    )]
    pub api_user: Option<String>,
    #[arg(
        long,
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = DEFAULT_CSV_PATH,
        help = SAVE_CSV_HELP
    )]
    pub save_csv: Option<PathBuf>,
    #[arg(
        long,
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = DEFAULT_HTML_PATH,
        help = SAVE_HTML_HELP
    )]
    pub save_html: Option<PathBuf>,
    #[arg(long, help = ARCHIVE_CSV_HELP)]
    pub archive_csv: bool,
    #[arg(
        long,
        help = "Print every fetched collection and every column instead of the abbreviated summary."
    )]
    pub full_output: bool,
    #[arg(long, help = "Disable progress spinner output.")]
    pub no_progress: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Resolves endpoint and credentials: flags win over environment; the
    /// endpoint falls back to the public indexer URL.
    pub fn indexer_config(&self) -> IndexerConfig {
        IndexerConfig {
            url: self
                .api_url
                .clone()
                .or_else(|| env_non_empty(ENV_API_URL))
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: self.api_key.clone().or_else(|| env_non_empty(ENV_API_KEY)),
            api_user: self
                .api_user
                .clone()
                .or_else(|| env_non_empty(ENV_API_USER)),
        }
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate shell completion scripts, optionally installing them for the current user.
    Completions {
        #[arg(value_enum, help = "Shell to generate completions for.")]
        shell: Shell,
        #[arg(
            long,
            value_name = "DIR",
            help = "Directory to write the completion script to."
        )]
        output_dir: Option<PathBuf>,
        #[arg(
            long,
            help = "Install the completion script into the default location for the selected shell."
        )]
        install: bool,
    },
}

pub fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Completions {
            shell,
            output_dir,
            install,
        } => generate_completions(shell, output_dir, install),
    }
}

fn generate_completions(shell: Shell, output_dir: Option<PathBuf>, install: bool) -> Result<()> {
    let mut command = Cli::command();
    let bin_name = command.get_name().to_string();

    let target_dir = if let Some(dir) = output_dir {
        Some(dir)
    } else if install {
        Some(default_install_dir(shell)?)
    } else {
        None
    };

    if let Some(dir) = target_dir {
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create completion directory {}", dir.display()))?;
        let path = generate_to(shell, &mut command, bin_name, &dir)
            .context("failed to write completion file")?;
        println!("Installed {shell:?} completions to {}", path.display());
    } else {
        let mut stdout = io::stdout().lock();
        generate(shell, &mut command, bin_name, &mut stdout);
        stdout
            .flush()
            .context("failed to flush completion output")?;
    }

    Ok(())
}

fn default_install_dir(shell: Shell) -> Result<PathBuf> {
    let home = std::env::var_os("HOME").ok_or_else(|| {
        anyhow!("HOME environment variable is not set; use --output-dir to specify a path")
    })?;
    let mut path = PathBuf::from(home);

    match shell {
        Shell::Bash => {
            path.push(".local/share/bash-completion/completions");
            Ok(path)
        }
        Shell::Elvish => {
            path.push(".elvish/lib/completions");
            Ok(path)
        }
        Shell::Fish => {
            path.push(".config/fish/completions");
            Ok(path)
        }
        Shell::PowerShell => {
            path.push(".local/share/powershell/Scripts");
            Ok(path)
        }
        Shell::Zsh => {
            path.push(".local/share/zsh/site-functions");
            Ok(path)
        }
        other => Err(anyhow!(
            "no default install location for {other:?}; specify --output-dir"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn defaults_select_one_day_usd_volume() {
        let cli = Cli::parse_from(["suirank"]);
        assert_eq!(cli.period, Period::Days1);
        assert_eq!(cli.sort_by, SortMetric::UsdVolume);
        assert_eq!(cli.limit, 25);
        assert_eq!(cli.save_csv, None);
    }

    #[test]
    fn save_flags_accept_missing_value() {
        let cli = Cli::parse_from(["suirank", "--save-csv", "--save-html"]);
        assert_eq!(cli.save_csv.as_deref(), Some(Path::new(DEFAULT_CSV_PATH)));
        assert_eq!(cli.save_html.as_deref(), Some(Path::new(DEFAULT_HTML_PATH)));
    }

    #[test]
    fn period_and_sort_parse_from_flags() {
        let cli = Cli::parse_from(["suirank", "--period", "30d", "--sort-by", "trades"]);
        assert_eq!(cli.period, Period::Days30);
        assert_eq!(cli.sort_by, SortMetric::Trades);
    }

    #[test]
    fn flags_take_precedence_for_config() {
        let cli = Cli::parse_from(["suirank", "--api-url", "https://indexer.test/graphql"]);
        let config = cli.indexer_config();
        assert_eq!(config.url, "https://indexer.test/graphql");
    }
}
