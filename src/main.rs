use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scholar_lens::config::file_config::write_config_file;
use scholar_lens::config::{find_config_file, get_config, load_config, Config, CONFIG_FILE_NAME};
use scholar_lens::models::{Paper, SearchRequest};
use scholar_lens::research::{JoinPolicy, ResearchAssistant, ResearchError};
use scholar_lens::ui::{self, Spinner, Status};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Scholar Lens - find, compare and map research papers with an LLM
#[derive(Parser, Debug)]
#[command(name = "scholar-lens")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "hongkongkiwi")]
#[command(about = "Find, compare and map research papers with an LLM", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if ui::is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for papers on a topic
    #[command(alias = "s")]
    Search {
        /// Topic to search for
        query: String,

        /// Ask for a systematic-review style search
        #[arg(long)]
        systematic: bool,

        /// Maximum number of papers to return
        #[arg(long, short)]
        max_results: Option<usize>,

        /// Write the found papers as JSON for the other commands
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Compare papers from a saved search
    #[command(alias = "c")]
    Compare {
        /// JSON file written by `search --save`
        papers: PathBuf,
    },

    /// Build a knowledge graph from papers in a saved search
    #[command(alias = "g")]
    Graph {
        /// JSON file written by `search --save`
        papers: PathBuf,
    },

    /// Run the full analysis: comparison, graph, report, insights and gaps
    #[command(alias = "a")]
    Analyze {
        /// JSON file written by `search --save`
        papers: PathBuf,

        /// Fail the whole analysis when any section fails
        #[arg(long)]
        all_or_nothing: bool,
    },

    /// Suggest related topics to explore next
    #[command(alias = "t")]
    Topics {
        /// The original search query
        query: String,

        /// JSON file written by `search --save`
        papers: PathBuf,
    },

    /// Write a starter configuration file
    Init {
        /// Where to write the file
        #[arg(default_value = CONFIG_FILE_NAME)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // `init` must work even when an existing config file is broken
    if let Commands::Init { path, force } = &cli.command {
        init_tracing(&cli, &get_config());
        return init_config_file(path, *force, cli.quiet);
    }

    // Load configuration from file if specified or found in default locations
    let config_path = cli.config.clone().or_else(find_config_file);
    let config = load_config(config_path.as_deref())?;

    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::debug!("Using config file: {}", path.display());
    }

    match run(cli, config).await {
        Err(err) => {
            if let Some(research) = err.downcast_ref::<ResearchError>() {
                ui::print_status(Status::Error, &research.to_string());
                ui::print_status(Status::Info, research.remediation());
                if let Some(raw) = research.raw_response() {
                    tracing::debug!("Raw provider response: {}", raw);
                }
                std::process::exit(1);
            }
            Err(err)
        }
        ok => ok,
    }
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => config.logging.level.as_str(),
        (false, 1) => "debug",
        (false, _) => "trace",
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("scholar_lens={}", level)),
    );

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let format = cli.output.resolve();
    let quiet = cli.quiet;

    if let Commands::Init { path, force } = &cli.command {
        return init_config_file(path, *force, quiet);
    }

    let provider = scholar_lens::provider::from_config(&config.provider)?;
    let join_policy = config.analysis.join_policy;
    let assistant = ResearchAssistant::new(provider)
        .with_retry(config.retry.to_retry_config())
        .with_join_policy(join_policy)
        .with_temperature(config.provider.temperature);

    match cli.command {
        Commands::Search {
            query,
            systematic,
            max_results,
            save,
        } => {
            let mut request = SearchRequest::new(&query).systematic(systematic);
            if let Some(max) = max_results {
                request = request.max_results(max);
            }

            let started = Instant::now();
            let papers = with_spinner(quiet, "Searching for papers...", assistant.search(&request))
                .await?;

            if let Some(path) = &save {
                write_json(path, &papers)?;
                if !quiet {
                    ui::print_status(
                        Status::Success,
                        &format!("Saved {} papers to {}", papers.len(), path.display()),
                    );
                }
            }

            match format {
                OutputFormat::Json => print_json(&papers)?,
                _ if papers.is_empty() => {
                    ui::print_status(Status::Warning, &format!("No papers found for \"{}\"", query))
                }
                _ => {
                    ui::print_status(
                        Status::Search,
                        &format!(
                            "Found {} papers in {:.2}s",
                            papers.len(),
                            started.elapsed().as_secs_f64()
                        ),
                    );
                    println!("{}", ui::papers_table(&papers));
                }
            }
        }

        Commands::Compare { papers } => {
            let papers = read_papers(&papers)?;
            let result =
                with_spinner(quiet, "Comparing papers...", assistant.compare(&papers)).await?;

            match format {
                OutputFormat::Json => print_json(&result)?,
                _ => ui::print_comparison(&result, &papers),
            }
        }

        Commands::Graph { papers } => {
            let papers = read_papers(&papers)?;
            let graph = with_spinner(
                quiet,
                "Building knowledge graph...",
                assistant.build_knowledge_graph(&papers),
            )
            .await?;

            match format {
                OutputFormat::Json => print_json(&graph)?,
                _ => ui::print_graph(&graph),
            }
        }

        Commands::Analyze {
            papers,
            all_or_nothing,
        } => {
            let papers = read_papers(&papers)?;
            let assistant = if all_or_nothing {
                assistant.with_join_policy(JoinPolicy::AllOrNothing)
            } else {
                assistant
            };

            let analysis =
                with_spinner(quiet, "Analyzing papers...", assistant.analyze(&papers)).await?;

            match format {
                OutputFormat::Json => print_json(&analysis)?,
                _ => {
                    ui::print_analysis(&analysis, &papers);
                    for (section, err) in analysis.failures() {
                        tracing::warn!(section, kind = %err.kind, "Section unavailable");
                    }
                }
            }
        }

        Commands::Topics { query, papers } => {
            let papers = read_papers(&papers)?;
            let topics = with_spinner(
                quiet,
                "Finding related topics...",
                assistant.suggest_topics(&query, &papers),
            )
            .await?;

            match format {
                OutputFormat::Json => print_json(&topics)?,
                _ if topics.is_empty() => {
                    ui::print_status(Status::Info, "No topics to suggest")
                }
                _ => ui::print_topics(&topics),
            }
        }

        Commands::Init { .. } => {}
    }

    Ok(())
}

/// Write the default configuration to `path`
fn init_config_file(path: &Path, force: bool, quiet: bool) -> Result<()> {
    write_config_file(&get_config(), path, force)?;
    if !quiet {
        ui::print_status(
            Status::Success,
            &format!("Wrote configuration to {}", path.display()),
        );
    }
    Ok(())
}

async fn with_spinner<T>(
    quiet: bool,
    message: &str,
    task: impl std::future::Future<Output = Result<T, ResearchError>>,
) -> Result<T, ResearchError> {
    if quiet {
        return task.await;
    }

    let spinner = Spinner::new(message);
    let result = task.await;
    match &result {
        Ok(_) => spinner.clear(),
        Err(err) => spinner.finish_with_error(&err.kind().to_string()),
    }
    result
}

fn read_papers(path: &Path) -> Result<Vec<Paper>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let papers: Vec<Paper> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a saved paper list", path.display()))?;

    if papers.is_empty() {
        bail!("{} contains no papers", path.display());
    }
    Ok(papers)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_version() {
        let version = env!("CARGO_PKG_VERSION");
        let parts: Vec<&str> = version.split('.').collect();
        assert!(parts.len() >= 2);
        assert!(parts[0].parse::<u32>().is_ok());
    }

    #[test]
    fn test_cli_verbose_and_quiet_flags() {
        let cli = Cli::parse_from(["scholar-lens", "-vv", "search", "q"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);

        let cli = Cli::parse_from(["scholar-lens", "search", "q", "--quiet"]);
        assert!(cli.quiet);
    }

    #[test]
    fn test_cli_output_format() {
        let cli = Cli::parse_from(["scholar-lens", "-o", "json", "search", "q"]);
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.output.resolve(), OutputFormat::Json);

        let cli = Cli::parse_from(["scholar-lens", "search", "q"]);
        assert_eq!(cli.output, OutputFormat::Auto);
        assert_ne!(cli.output.resolve(), OutputFormat::Auto);
    }

    #[test]
    fn test_cli_search_command() {
        let cli = Cli::parse_from([
            "scholar-lens",
            "search",
            "graph neural networks",
            "--systematic",
            "--max-results",
            "8",
            "--save",
            "papers.json",
        ]);
        match cli.command {
            Commands::Search {
                query,
                systematic,
                max_results,
                save,
            } => {
                assert_eq!(query, "graph neural networks");
                assert!(systematic);
                assert_eq!(max_results, Some(8));
                assert_eq!(save, Some(PathBuf::from("papers.json")));
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_analyze_command() {
        let cli = Cli::parse_from(["scholar-lens", "analyze", "p.json", "--all-or-nothing"]);
        match cli.command {
            Commands::Analyze {
                papers,
                all_or_nothing,
            } => {
                assert_eq!(papers, PathBuf::from("p.json"));
                assert!(all_or_nothing);
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_cli_init_default_path() {
        let cli = Cli::parse_from(["scholar-lens", "init"]);
        match cli.command {
            Commands::Init { path, force } => {
                assert_eq!(path, PathBuf::from(CONFIG_FILE_NAME));
                assert!(!force);
            }
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_init_replaces_broken_config_with_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "provider = = broken").unwrap();

        assert!(load_config(Some(&path)).is_err());
        assert!(init_config_file(&path, false, true).is_err());

        init_config_file(&path, true, true).unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_cli_config_flag() {
        let cli = Cli::parse_from(["scholar-lens", "--config", "/tmp/s.toml", "topics", "q", "p.json"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/s.toml")));
    }

    #[test]
    fn test_read_papers_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("papers.json");
        let papers = vec![Paper::new("a", "A"), Paper::new("b", "B")];

        write_json(&path, &papers).unwrap();
        assert_eq!(read_papers(&path).unwrap(), papers);
    }

    #[test]
    fn test_read_papers_rejects_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "[]").unwrap();

        assert!(read_papers(&path).is_err());
    }
}
