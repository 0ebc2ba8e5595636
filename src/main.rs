//! Movie Catalog
//!
//! Search and CRUD access to a movie index held in a managed document store
//! that only accepts SigV4-signed requests. Runs either as an HTTP service or
//! as a one-shot command line client.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use movie_catalog_core::{CatalogConfig, GenreSet, SearchCriteria};
use movie_catalog_infra::{init_logger, CatalogService, LoggerConfig};
use movie_catalog_serve::ServerBuilder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "movie-catalog")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Movie Catalog - search and CRUD facade over a signed document store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format (pretty, json)
    #[arg(short, long, default_value = "pretty", global = true)]
    output: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the catalog HTTP interface
    Serve {
        /// Server host address
        #[arg(long)]
        host: Option<String>,

        /// Server port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Search movies with exact-match criteria
    Search(SearchArgs),

    /// Approximate search over storyline and synopsis
    FuzzySearch(SearchArgs),

    /// Print statistics of an index
    Stats {
        /// Index name; the configured index when omitted
        #[arg(short, long)]
        index: Option<String>,
    },

    /// Write a default configuration file
    Init {
        /// Configuration file path
        #[arg(default_value = "catalog.yaml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file to validate
        path: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
struct SearchArgs {
    #[arg(long)]
    id: Option<i64>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    year: Option<i64>,

    /// Genre to match; repeat for any-of matching
    #[arg(long = "genre")]
    genres: Vec<String>,

    #[arg(long)]
    mpaa_rating: Option<String>,

    #[arg(long)]
    imdb_url: Option<String>,

    #[arg(long)]
    language: Option<String>,

    #[arg(long)]
    country: Option<String>,

    #[arg(long)]
    storyline: Option<String>,

    #[arg(long)]
    synopsis: Option<String>,

    /// Index to search; the configured index when omitted
    #[arg(long)]
    index: Option<String>,

    /// Offset of the first hit
    #[arg(long)]
    from: Option<u32>,

    /// Number of hits
    #[arg(long)]
    size: Option<u32>,

    /// Source fields to return, comma separated
    #[arg(long, value_delimiter = ',')]
    fields: Vec<String>,
}

impl SearchArgs {
    fn criteria(&self) -> SearchCriteria {
        SearchCriteria {
            id: self.id,
            title: self.title.clone(),
            year: self.year,
            genre: (!self.genres.is_empty())
                .then(|| self.genres.iter().cloned().collect::<GenreSet>()),
            mpaa_rating: self.mpaa_rating.clone(),
            imdb_url: self.imdb_url.clone(),
            language: self.language.clone(),
            country: self.country.clone(),
            storyline: self.storyline.clone(),
            synopsis: self.synopsis.clone(),
        }
    }

    fn field_filter(&self) -> Option<&[String]> {
        (!self.fields.is_empty()).then_some(self.fields.as_slice())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Init and validate work on files, not on the layered configuration
    match &cli.command {
        Commands::Init { path, force } => return handle_init(path, *force),
        Commands::Validate { path } => return handle_validate(path, &cli),
        _ => {}
    }

    let config = CatalogConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let mut logger = LoggerConfig::from(&config.logging);
    if cli.verbose {
        logger.level = "debug".to_string();
    }
    init_logger(logger)?;

    info!("Starting {}", movie_catalog_core::version_info());
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Commands::Serve { host, port } => handle_serve(config, host, port).await,
        Commands::Search(args) => handle_search(&config, &args, false, &cli.output).await,
        Commands::FuzzySearch(args) => handle_search(&config, &args, true, &cli.output).await,
        Commands::Stats { index } => handle_stats(&config, index, &cli.output).await,
        Commands::Init { .. } | Commands::Validate { .. } => Ok(()),
    }
}

async fn handle_serve(
    config: CatalogConfig,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let service = CatalogService::from_config(&config)?;

    let mut builder = ServerBuilder::from_config(config.server.clone());
    if let Some(host) = host {
        builder = builder.host(host);
    }
    if let Some(port) = port {
        builder = builder.port(port);
    }

    builder.build(Arc::new(service)).start().await?;
    Ok(())
}

async fn handle_search(
    config: &CatalogConfig,
    args: &SearchArgs,
    fuzzy: bool,
    output: &str,
) -> anyhow::Result<()> {
    let service = CatalogService::from_config(config)?;
    let index = args.index.as_deref().unwrap_or(&config.index.name);
    let from = args.from.unwrap_or(config.search.from);
    let size = args.size.unwrap_or(config.search.size);
    let criteria = args.criteria();

    let body = if fuzzy {
        service
            .fuzzy_search_index(index, from, size, args.field_filter(), &criteria)
            .await?
    } else {
        service
            .search_index(index, from, size, args.field_filter(), &criteria)
            .await?
    };

    if movie_catalog_core::store::is_empty_result(&body) {
        info!("No movies matched");
    }
    print_body(&body, output);
    Ok(())
}

async fn handle_stats(
    config: &CatalogConfig,
    index: Option<String>,
    output: &str,
) -> anyhow::Result<()> {
    let service = CatalogService::from_config(config)?;
    let index = index.unwrap_or_else(|| config.index.name.clone());

    let body = service
        .index_statistics(&index)
        .await
        .with_context(|| format!("Error fetching statistics for index {}", index))?;
    print_body(&body, output);
    Ok(())
}

fn handle_init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!(
            "Configuration file already exists: {}. Use --force to overwrite it.",
            path.display()
        );
    }

    CatalogConfig::default().to_file(path)?;

    println!("Configuration initialized at {}", path.display());
    println!();
    println!("Next steps:");
    println!("1. Set aws.endpoint and aws.region for your document store");
    println!("2. Provide credentials through AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY or a profile");
    println!(
        "3. Run 'movie-catalog validate {}' to check the file",
        path.display()
    );
    Ok(())
}

fn handle_validate(path: &Path, cli: &Cli) -> anyhow::Result<()> {
    let config = CatalogConfig::from_file(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let result = config.validate();
    if cli.output == "json" {
        let report = match &result {
            Ok(()) => serde_json::json!({
                "valid": true,
                "endpoint": config.aws.endpoint,
                "region": config.aws.region,
                "index": config.index.name,
            }),
            Err(e) => serde_json::json!({ "valid": false, "error": e.to_string() }),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match &result {
            Ok(()) => {
                println!("Configuration is valid");
                println!("Store endpoint: {}", config.aws.endpoint);
                println!("Region/service: {}/{}", config.aws.region, config.aws.service_name);
                println!("Index: {}/{}", config.index.name, config.index.document_type);
            }
            Err(e) => println!("Configuration is invalid: {}", e),
        }
    }

    result.map_err(Into::into)
}

/// Store responses are JSON text; pretty-print them unless raw JSON was asked for
fn print_body(body: &str, output: &str) {
    if output != "json" {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            if let Ok(pretty) = serde_json::to_string_pretty(&value) {
                println!("{}", pretty);
                return;
            }
        }
    }
    println!("{}", body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_args_to_criteria() {
        let cli = Cli::parse_from([
            "movie-catalog",
            "search",
            "--title",
            "Heat",
            "--genre",
            "Crime",
            "--genre",
            "Drama",
            "--fields",
            "id,title",
        ]);

        let Commands::Search(args) = cli.command else {
            panic!("expected search command");
        };
        let criteria = args.criteria();
        assert_eq!(criteria.title.as_deref(), Some("Heat"));
        assert_eq!(criteria.genre.as_ref().map(|g| g.len()), Some(2));
        assert!(criteria.id.is_none());
        assert_eq!(
            args.field_filter(),
            Some(["id".to_string(), "title".to_string()].as_slice())
        );
    }

    #[test]
    fn test_no_genres_means_no_genre_criterion() {
        let cli = Cli::parse_from(["movie-catalog", "fuzzy-search", "--storyline", "heist"]);
        let Commands::FuzzySearch(args) = cli.command else {
            panic!("expected fuzzy-search command");
        };
        assert!(args.criteria().genre.is_none());
        assert!(args.field_filter().is_none());
    }

    #[test]
    fn test_init_then_validate() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.yaml");

        handle_init(&path, false).unwrap();
        assert!(handle_init(&path, false).is_err());
        handle_init(&path, true).unwrap();

        let cli = Cli::parse_from(["movie-catalog", "validate", path.to_str().unwrap()]);
        assert!(handle_validate(&path, &cli).is_ok());
    }
}
