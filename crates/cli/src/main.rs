use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use data_loader::read_rows;
use graph_store::{GraphStore, MemoryStore, Neo4jStore, Recommendation, ScriptStore, StoreConfig};
use server::{GraphLoader, LoadResult, LoaderConfig, RecommendationEngine, DEFAULT_THRESHOLD};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// movie-graph - Movie property graph loader and recommender
#[derive(Parser)]
#[command(name = "movie-graph")]
#[command(about = "Load a movie dataset into a property graph and query it for recommendations", long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Neo4j connection settings
#[derive(Args)]
struct StoreArgs {
    /// Bolt URI of the graph store
    #[arg(long, env = "NEO4J_URI", default_value = "bolt://localhost:7687", global = true)]
    uri: String,

    #[arg(long, env = "NEO4J_USER", default_value = "neo4j", global = true)]
    user: String,

    #[arg(long, env = "NEO4J_PASSWORD", default_value = "neo4j", hide_env_values = true, global = true)]
    password: String,

    /// Concurrent store sessions used while loading
    #[arg(long, env = "MOVIE_GRAPH_WORKERS", default_value = "8", global = true)]
    workers: usize,
}

impl StoreArgs {
    fn store_config(&self) -> StoreConfig {
        // One pooled connection per worker plus room for the stats queries
        StoreConfig::new(&self.uri, &self.user, &self.password)
            .with_max_connections(self.workers + 2)
    }

    fn loader_config(&self) -> LoaderConfig {
        LoaderConfig::default().with_workers(self.workers)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load the CSV dataset into the graph
    Load {
        /// Path to the crawled movie CSV
        #[arg(long, env = "MOVIES_CSV")]
        csv: PathBuf,

        /// Load into an in-process graph instead of Neo4j (dry run)
        #[arg(long)]
        in_memory: bool,

        /// Do not create natural-key indexes
        #[arg(long)]
        no_indexes: bool,
    },

    /// Recommend movies related to a title
    Recommend {
        /// Title of the movie to start from
        #[arg(long)]
        title: String,

        /// Score a movie must exceed (shared people + shared genres)
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: u32,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Load this CSV into an in-process graph and query that instead of Neo4j
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Write the load as a Cypher script instead of executing it
    Export {
        /// Path to the crawled movie CSV
        #[arg(long, env = "MOVIES_CSV")]
        csv: PathBuf,

        /// Output file for the script
        #[arg(long)]
        out: PathBuf,
    },

    /// Show node and relationship counts
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Load {
            csv,
            in_memory,
            no_indexes,
        } => handle_load(&cli.store, &csv, in_memory, no_indexes).await?,
        Commands::Recommend {
            title,
            threshold,
            json,
            csv,
        } => handle_recommend(&cli.store, &title, threshold, json, csv.as_deref()).await?,
        Commands::Export { csv, out } => handle_export(&cli.store, &csv, &out).await?,
        Commands::Stats => handle_stats(&cli.store).await?,
    }

    Ok(())
}

async fn connect(args: &StoreArgs) -> Result<Arc<Neo4jStore>> {
    let store = Neo4jStore::connect(&args.store_config())
        .await
        .with_context(|| format!("Failed to connect to graph store at {}", args.uri))?;
    Ok(Arc::new(store))
}

/// Read the dataset and run the loader against `store`
async fn load_into<S: GraphStore + ?Sized + 'static>(
    store: Arc<S>,
    csv: &Path,
    config: LoaderConfig,
) -> Result<LoadResult> {
    println!("Reading dataset from {}...", csv.display());
    let start = Instant::now();
    let rows = read_rows(csv).with_context(|| format!("Failed to read {}", csv.display()))?;
    println!("{} Read {} rows in {:?}", "✓".green(), rows.len(), start.elapsed());

    let start = Instant::now();
    let result = GraphLoader::new(store, config)
        .load(rows)
        .await
        .context("Graph load failed")?;
    println!("{} Loaded graph in {:?}", "✓".green(), start.elapsed());
    Ok(result)
}

/// Handle the 'load' command
async fn handle_load(args: &StoreArgs, csv: &Path, in_memory: bool, no_indexes: bool) -> Result<()> {
    let config = args.loader_config().with_indexes(!no_indexes);

    let result = if in_memory {
        load_into(Arc::new(MemoryStore::new()), csv, config).await?
    } else {
        load_into(connect(args).await?, csv, config).await?
    };

    print_load_result(&result);
    Ok(())
}

/// Handle the 'recommend' command
async fn handle_recommend(
    args: &StoreArgs,
    title: &str,
    threshold: u32,
    json: bool,
    csv: Option<&Path>,
) -> Result<()> {
    let recommendations = match csv {
        Some(csv) => {
            let store = Arc::new(MemoryStore::new());
            let result = load_into(Arc::clone(&store), csv, args.loader_config()).await?;
            if !json {
                print_load_result(&result);
            }
            RecommendationEngine::new(store)
                .with_threshold(threshold)
                .recommend(title)
                .await?
        }
        None => {
            RecommendationEngine::new(connect(args).await?)
                .with_threshold(threshold)
                .recommend(title)
                .await
                .context("Recommendation query failed")?
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
    } else {
        print_recommendations(title, &recommendations);
    }
    Ok(())
}

/// Handle the 'export' command
async fn handle_export(args: &StoreArgs, csv: &Path, out: &Path) -> Result<()> {
    let store = Arc::new(ScriptStore::new());
    let result = load_into(Arc::clone(&store), csv, args.loader_config()).await?;
    print_load_result(&result);

    let Ok(store) = Arc::try_unwrap(store) else {
        bail!("Script store still in use after the load");
    };
    let script = store.into_script();
    std::fs::write(out, &script).with_context(|| format!("Failed to write {}", out.display()))?;
    println!(
        "{} Wrote {} statements to {}",
        "✓".green(),
        script.lines().count(),
        out.display()
    );
    Ok(())
}

/// Handle the 'stats' command
async fn handle_stats(args: &StoreArgs) -> Result<()> {
    let store = connect(args).await?;
    let stats = store.stats().await.context("Failed to read graph counts")?;

    println!("{}", format!("Graph at {}:", store.uri()).bold().blue());
    println!("{}Nodes: {}", "• ".green(), stats.nodes);
    println!("{}Relationships: {}", "• ".green(), stats.relationships);
    Ok(())
}

/// Print the load summary and the first errors
fn print_load_result(result: &LoadResult) {
    println!("{}", "Load summary:".bold().blue());
    println!("{}Rows: {}", "• ".green(), result.rows);
    println!("{}Nodes created: {}", "• ".green(), result.nodes_created);
    println!("{}Relationships created: {}", "• ".green(), result.edges_created);
    println!("{}Relations attempted: {}", "• ".green(), result.relations_attempted);
    println!(
        "{}Key constraints: {}",
        "• ".green(),
        if result.constraints_created { "in place" } else { "failed" }
    );
    println!(
        "{}Indexes: {}",
        "• ".green(),
        if result.indexes_created { "created" } else { "skipped" }
    );

    if !result.duplicate_titles.is_empty() {
        println!(
            "{}Duplicate titles: {}",
            "• ".yellow(),
            result.duplicate_titles.join(", ")
        );
    }

    if result.is_clean() {
        return;
    }
    println!("{}", format!("{} errors:", result.errors.len()).bold().red());
    for error in result.errors.iter().take(10) {
        println!("  - {}", error);
    }
    if result.errors.len() > 10 {
        println!("  ... and {} more", result.errors.len() - 10);
    }
}

/// Print recommendations as a ranked list
fn print_recommendations(title: &str, recommendations: &[Recommendation]) {
    println!("{}", format!("Movies related to '{}':", title).bold().blue());
    if recommendations.is_empty() {
        println!("  (none)");
        return;
    }

    for (i, rec) in recommendations.iter().enumerate() {
        let rank = i + 1;
        let genres = rec.movie.genres.join(", ");
        let score = rec
            .movie
            .user_score
            .map(|s| format!("{:.1}", s))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}. {} [{}] user score {} - shared people: {}, shared genres: {}",
            rank.to_string().green(),
            rec.movie.title,
            genres,
            score,
            rec.shared_people,
            rec.shared_genres
        );
    }
}
