use clap::{Parser, Subcommand};
use memex_context::ChunkingConfig;
use memex_embed::{EmbedConfig, EmbeddingProvider, FastEmbedProvider};
use memex_retriever::config::MemexConfig;
use memex_retriever::retrieval::{Indexer, Searcher};
use memex_retriever::storage::{ChunkIndex, Database, MemoryStore};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// memex - capture memories and search them, exactly or semantically.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base directory containing the .memex.db database file
    #[arg(short, long, default_value = ".")]
    base_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Capture a memory
    Add {
        /// Memory content
        content: String,
        /// Platform/source name
        #[arg(long, default_value = "cli")]
        platform: String,
        /// Project name
        #[arg(long, default_value = "default")]
        project: String,
        /// Tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Substring search over captured memories
    Recall {
        /// Search query
        query: String,
        /// Maximum number of results
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Show the latest memories
    Recent {
        /// Number of memories
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Leave a question/answer pair for a future session
    Ask {
        /// The question
        question: String,
        /// The answer
        #[arg(long)]
        answer: String,
        /// Id of a related memory
        #[arg(long)]
        memory_id: Option<String>,
    },
    /// List stored question/answer pairs
    Asks {
        /// Substring filter on questions
        query: Option<String>,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Index a file or directory tree for semantic search
    Index {
        /// File or directory to index
        path: PathBuf,
        /// Glob pattern for directory indexing
        #[arg(short, long, default_value = "*.md")]
        pattern: String,
        /// Re-write chunks whose fingerprints already exist
        #[arg(long)]
        force: bool,
        /// Skip embedding generation (text and fingerprints only)
        #[arg(long)]
        no_embeddings: bool,
    },
    /// Semantic search over indexed documents
    Search {
        /// Search query
        query: String,
        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
        /// Minimum similarity score (-1.0 to 1.0)
        #[arg(short, long)]
        min_score: Option<f32>,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Show database statistics
    Stats {
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum OutputFormat {
    Summary,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

#[derive(Serialize)]
struct CombinedStats {
    memories: memex_retriever::storage::MemoryStats,
    index: memex_retriever::storage::IndexStats,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Build the embedding provider, or None when running degraded.
///
/// For indexing a failed model load degrades gracefully (chunks are stored
/// without vectors and can be back-filled with --force later); the warning
/// tells the user what happened.
async fn load_provider(
    config: &EmbedConfig,
    skip: bool,
    required: bool,
) -> anyhow::Result<Option<Arc<dyn EmbeddingProvider>>> {
    if skip {
        return Ok(None);
    }
    match FastEmbedProvider::create(config.clone()).await {
        Ok(provider) => Ok(Some(Arc::new(provider))),
        Err(e) if required => Err(e.into()),
        Err(e) => {
            tracing::warn!(%e, "embedding model unavailable, indexing without vectors");
            Ok(None)
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = MemexConfig::load(&args.base_dir)?;
    let db = Database::open(&args.base_dir).await?;

    match args.command {
        Commands::Add {
            content,
            platform,
            project,
            tags,
        } => {
            let store = MemoryStore::new(db.pool().clone()).await?;
            let memory = store
                .add(&content, &platform, &project, tags, serde_json::json!({}))
                .await?;
            println!("Memory added: {}", memory.id);
            Ok(())
        }
        Commands::Recall {
            query,
            limit,
            format,
        } => {
            let store = MemoryStore::new(db.pool().clone()).await?;
            let memories = store.search(&query, limit).await?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&memories)?);
                }
                OutputFormat::Summary => {
                    if memories.is_empty() {
                        println!("No memories found.");
                    } else {
                        println!("Found {} memories:\n", memories.len());
                        for memory in memories {
                            println!(
                                "[{}] ({}/{})",
                                memory.timestamp.format("%Y-%m-%d %H:%M"),
                                memory.platform,
                                memory.project
                            );
                            println!("  {}", memory.content);
                            if !memory.tags.is_empty() {
                                println!("  Tags: {}", memory.tags.join(", "));
                            }
                            println!();
                        }
                    }
                }
            }
            Ok(())
        }
        Commands::Recent { limit } => {
            let store = MemoryStore::new(db.pool().clone()).await?;
            let memories = store.recent(limit).await?;
            println!("Recent context ({} memories):\n", memories.len());
            for memory in memories {
                let preview: String = memory.content.chars().take(100).collect();
                println!("[{}] {preview}", memory.timestamp.format("%Y-%m-%d %H:%M"));
            }
            Ok(())
        }
        Commands::Ask {
            question,
            answer,
            memory_id,
        } => {
            let store = MemoryStore::new(db.pool().clone()).await?;
            store.ask(&question, &answer, memory_id.as_deref()).await?;
            println!("Q&A saved");
            Ok(())
        }
        Commands::Asks { query, format } => {
            let store = MemoryStore::new(db.pool().clone()).await?;
            let asks = store.asks(query.as_deref()).await?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&asks)?);
                }
                OutputFormat::Summary => {
                    if asks.is_empty() {
                        println!("No Q&A pairs found.");
                    } else {
                        for ask in asks {
                            println!("[{}] Q: {}", ask.timestamp.format("%Y-%m-%d %H:%M"), ask.question);
                            println!("    A: {}", ask.answer);
                            println!();
                        }
                    }
                }
            }
            Ok(())
        }
        Commands::Index {
            path,
            pattern,
            force,
            no_embeddings,
        } => {
            let index = ChunkIndex::new(db.pool().clone()).await?;
            let provider = load_provider(&config.embedding, no_embeddings, false).await?;
            let chunking: ChunkingConfig = config.chunking;
            chunking.validate()?;
            let indexer = Indexer::new(index, provider, chunking);

            let written = if path.is_dir() {
                indexer.index_directory(&path, &pattern, force).await?
            } else {
                indexer.index_file(&path, force).await?
            };
            println!("Indexed {written} new chunks");
            Ok(())
        }
        Commands::Search {
            query,
            limit,
            min_score,
            format,
        } => {
            let index = ChunkIndex::new(db.pool().clone()).await?;
            let provider = load_provider(&config.embedding, false, true).await?;
            let searcher = Searcher::new(index, provider);

            let limit = limit.unwrap_or(config.search.limit);
            let min_score = min_score.unwrap_or(config.search.min_score);
            let hits = searcher.search(&query, limit, min_score).await?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&hits)?);
                }
                OutputFormat::Summary => {
                    if hits.is_empty() {
                        println!("No matches at or above score {min_score:.2}.");
                    } else {
                        for (rank, hit) in hits.iter().enumerate() {
                            let preview: String = hit.content.chars().take(200).collect();
                            println!("[{}] Score: {:.3}", rank + 1, hit.score);
                            println!("    File: {}", hit.source_path);
                            println!("    {preview}");
                            println!();
                        }
                    }
                }
            }
            Ok(())
        }
        Commands::Stats { format } => {
            let store = MemoryStore::new(db.pool().clone()).await?;
            let index = ChunkIndex::new(db.pool().clone()).await?;
            let stats = CombinedStats {
                memories: store.stats().await?,
                index: index.stats().await?,
            };

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                }
                OutputFormat::Summary => {
                    println!("Memories: {}", stats.memories.total_memories);
                    println!("Q&A pairs: {}", stats.memories.total_asks);
                    if !stats.memories.platforms.is_empty() {
                        println!("  By platform:");
                        for (platform, count) in &stats.memories.platforms {
                            println!("    {platform}: {count}");
                        }
                    }
                    if !stats.memories.projects.is_empty() {
                        println!("  By project:");
                        for (project, count) in &stats.memories.projects {
                            println!("    {project}: {count}");
                        }
                    }
                    println!("Indexed chunks: {}", stats.index.total_chunks);
                    println!("Indexed files: {}", stats.index.total_files);
                }
            }
            Ok(())
        }
    }
}
