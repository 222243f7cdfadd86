use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use learnhub_search::api::{self, AppState};
use learnhub_search::config::{find_config_file, get_config, load_config, Config};
use learnhub_search::models::{Pagination, ResultMetadata, SearchQuery, SearchResult, SourceType};
use std::io::IsTerminal;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// LearnHub Search - federated search over the resource catalog, GitHub and arXiv
#[derive(Parser, Debug)]
#[command(name = "learnhub-search")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Federated search over the resource catalog, GitHub and arXiv", long_about = None)]
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

/// Sources that can be searched
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Source {
    #[value(name = "local")]
    Local,
    #[value(name = "github")]
    Github,
    #[value(name = "arxiv")]
    Arxiv,
    #[value(name = "all")]
    All,
}

/// Sources with a trending feed
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum TrendingSource {
    #[value(name = "github")]
    Github,
    #[value(name = "arxiv")]
    Arxiv,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to bind (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Search by keyword
    #[command(alias = "s")]
    Search {
        /// Search keyword
        query: String,

        /// Source to search
        #[arg(long, short, value_enum, default_value_t = Source::All)]
        source: Source,

        /// Page number (local catalog only)
        #[arg(long)]
        page: Option<u32>,

        /// Results per page (local catalog only)
        #[arg(long)]
        per_page: Option<u32>,
    },

    /// Show recent, popular results
    #[command(alias = "t")]
    Trending {
        /// Source to query
        #[arg(long, short, value_enum, default_value_t = TrendingSource::Github)]
        source: TrendingSource,
    },
}

fn resolve_config(path: Option<&PathBuf>) -> Result<(Config, Option<PathBuf>)> {
    if let Some(path) = path {
        let config = load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        return Ok((config, Some(path.clone())));
    }

    match find_config_file() {
        Some(found) => {
            let config = load_config(&found)
                .with_context(|| format!("Failed to load config from {}", found.display()))?;
            Ok((config, Some(found)))
        }
        None => Ok((get_config().context("Failed to read configuration")?, None)),
    }
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("learnhub_search={}", level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_path) = resolve_config(cli.config.as_ref())?;
    init_tracing(&cli, &config);
    if let Some(path) = config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let state = AppState::from_config(&config).context("Failed to initialize search sources")?;

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let addr: SocketAddr = bind
                .parse()
                .with_context(|| format!("Invalid bind address: {}", bind))?;
            api::serve(state, addr).await?;
        }
        Commands::Search {
            query,
            source,
            page,
            per_page,
        } => {
            let pagination = Pagination::clamped(
                page,
                per_page,
                state.default_per_page,
                state.max_per_page,
            );
            let query = SearchQuery::new(query).pagination(pagination);

            let results: Vec<SearchResult> = match source {
                Source::All => {
                    let result = state.engine.search_all(&query).await?;
                    if resolve_format(cli.output) == OutputFormat::Json {
                        println!("{}", serde_json::to_string_pretty(&result)?);
                        return Ok(());
                    }
                    for (name, section) in [
                        ("GitHub", &result.github),
                        ("arXiv", &result.arxiv),
                    ] {
                        if let Some(ref message) = section.error_message {
                            eprintln!("warning: {} failed: {}", name, message);
                        }
                    }
                    result
                        .local
                        .items
                        .into_iter()
                        .chain(result.github.items)
                        .chain(result.arxiv.items)
                        .collect()
                }
                single => {
                    let source_type = match single {
                        Source::Local => SourceType::Local,
                        Source::Github => SourceType::CodeRepo,
                        _ => SourceType::Preprint,
                    };
                    let result = state.engine.search_single(source_type, &query).await?;
                    if !cli.quiet {
                        eprintln!(
                            "{}: {} total, page {} of {}",
                            source_type,
                            result.total,
                            result.current_page,
                            result.pages.max(1)
                        );
                    }
                    result.items
                }
            };

            output_results(&results, cli.output)?;
        }
        Commands::Trending { source } => {
            let source_type = match source {
                TrendingSource::Github => SourceType::CodeRepo,
                TrendingSource::Arxiv => SourceType::Preprint,
            };
            let results = state.trending.trending(source_type).await;
            output_results(&results, cli.output)?;
        }
    }

    Ok(())
}

fn resolve_format(format: OutputFormat) -> OutputFormat {
    if format == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    }
}

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Short source-specific detail shown in the table's last column
fn detail(result: &SearchResult) -> String {
    match &result.metadata {
        ResultMetadata::Local { category, .. } => category.clone().unwrap_or_default(),
        ResultMetadata::CodeRepo {
            stars, language, ..
        } => match language {
            Some(language) => format!("★ {} · {}", stars, language),
            None => format!("★ {}", stars),
        },
        ResultMetadata::Preprint { authors, .. } => match authors.as_slice() {
            [] => String::new(),
            [only] => only.clone(),
            [first, ..] => format!("{} et al.", first),
        },
    }
}

fn output_results(results: &[SearchResult], format: OutputFormat) -> Result<()> {
    match resolve_format(format) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(results)?);
        }
        OutputFormat::Table => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Title", "Source", "Details", "URL"]);

            for result in results {
                table.add_row(vec![
                    Cell::new(shorten(&result.title, 50)).add_attribute(Attribute::Bold),
                    Cell::new(result.source_type.to_string()),
                    Cell::new(shorten(&detail(result), 30)),
                    Cell::new(&result.url),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Auto => unreachable!(),
    }
    Ok(())
}
