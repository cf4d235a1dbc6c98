mod analysis;
mod db;
mod discover;
mod export;
mod fetch;
mod parser;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "blog_miner", about = "Blog article scraper and word-frequency analyzer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover article URLs from the blog index and populate the queue
    Init {
        /// Blog index page to discover articles from
        #[arg(long, default_value = discover::DEFAULT_INDEX_URL)]
        url: String,
        /// CSS selector matching article links on the index
        #[arg(long, default_value = discover::DEFAULT_LINK_SELECTOR)]
        selector: String,
    },
    /// Fetch unvisited pages
    Scrape {
        /// Max pages to fetch (default: all unvisited)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Parse fetched pages into articles with word statistics
    Process {
        /// Max pages to process (default: all unprocessed)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Scrape + process in one pipeline
    Run {
        /// Max pages to scrape+process
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Print the corpus-wide analysis
    Report {
        /// Emit the analysis as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Write articles and analysis CSV files
    Export {
        /// Directory for the CSV files
        #[arg(long, default_value = "data")]
        out_dir: PathBuf,
    },
    /// Show pipeline statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { url, selector } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = discover::fetch_article_urls(&url, &selector).await?;
            let inserted = db::insert_pages(&conn, &pages)?;
            println!("Queued {} new article URLs ({} total found)", inserted, pages.len());
            Ok(())
        }
        Commands::Scrape { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited pages. Run 'init' first or all pages are fetched.");
                return Ok(());
            }
            println!("Fetching {} pages (streaming to DB)...", pages.len());
            let stats = fetch::fetch_pages_streaming(&conn, pages).await?;
            println!(
                "Done: {} fetched ({} ok, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            Ok(())
        }
        Commands::Process { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unprocessed(&conn, limit)?;
            if pages.is_empty() {
                println!("No unprocessed pages. Run 'scrape' first.");
                return Ok(());
            }
            println!("Processing {} pages...", pages.len());
            let counts = process_pages(&conn, &pages)?;
            counts.print();
            Ok(())
        }
        Commands::Run { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited pages. Run 'init' first.");
                return Ok(());
            }

            // Phase 1: Fetch (streaming to DB)
            let t_fetch = Instant::now();
            println!("Pipeline: fetching {} pages (streaming to DB)...", pages.len());
            let stats = fetch::fetch_pages_streaming(&conn, pages).await?;
            println!(
                "Fetched {} pages ({} ok, {} errors) in {:.1}s",
                stats.total, stats.ok, stats.errors, t_fetch.elapsed().as_secs_f64()
            );

            // Phase 2: Process
            let t_process = Instant::now();
            let unprocessed = db::fetch_unprocessed(&conn, None)?;
            if unprocessed.is_empty() {
                println!("Nothing to process (all fetched pages had errors).");
                return Ok(());
            }
            println!("Processing {} pages...", unprocessed.len());
            let counts = process_pages(&conn, &unprocessed)?;
            println!("Processed in {:.1}s", t_process.elapsed().as_secs_f64());
            counts.print();
            Ok(())
        }
        Commands::Report { json } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let articles = db::load_articles(&conn)?;
            if articles.is_empty() {
                println!("No processed articles. Run 'process' first.");
                return Ok(());
            }
            let analysis = analysis::aggregate(&articles);
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                print_report(&analysis);
            }
            Ok(())
        }
        Commands::Export { out_dir } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let articles = db::load_articles(&conn)?;
            if articles.is_empty() {
                println!("No processed articles. Run 'process' first.");
                return Ok(());
            }
            std::fs::create_dir_all(&out_dir)?;
            let analysis = analysis::aggregate(&articles);
            let articles_path = export::export_articles(&articles, &out_dir)?;
            let analysis_path = export::export_analysis(&analysis, &out_dir)?;
            println!("Wrote {} articles to {}", articles.len(), articles_path.display());
            println!("Wrote analysis to {}", analysis_path.display());
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Total:     {}", s.total);
            println!("Visited:   {}", s.visited);
            println!("Unvisited: {}", s.unvisited);
            println!("Fetched:   {}", s.fetched);
            println!("Errors:    {}", s.errors);
            println!("Processed: {}", s.processed);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

struct ProcessCounts {
    articles: usize,
    sections: usize,
    words: usize,
}

impl ProcessCounts {
    fn print(&self) {
        println!(
            "Saved {} articles ({} sections, {} words counted).",
            self.articles, self.sections, self.words,
        );
    }
}

fn process_pages(
    conn: &rusqlite::Connection,
    pages: &[db::StoredPage],
) -> anyhow::Result<ProcessCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut counts = ProcessCounts {
        articles: 0,
        sections: 0,
        words: 0,
    };

    for chunk in pages.chunks(500) {
        let articles: Vec<_> = chunk.par_iter().map(parser::process_page).collect();

        counts.articles += articles.len();
        counts.sections += articles.iter().map(|a| a.sections.len()).sum::<usize>();
        counts.words += articles.iter().map(|a| a.word_count).sum::<usize>();

        db::save_articles(conn, &articles)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn print_report(analysis: &analysis::Analysis) {
    println!("=== Analysis Summary ===");
    println!("Total articles: {}", analysis.total_articles);
    println!("Total words: {}", analysis.total_words);
    println!("Total characters: {}", analysis.total_chars);
    println!("Average words per article: {:.2}", analysis.average_words);
    println!("Longest article:  {}", analysis.longest_article);
    println!("Shortest article: {}", analysis.shortest_article);
    println!("\nTop 10 most common words:");
    for (i, (word, count)) in analysis::top_k(&analysis.common_words, 10).iter().enumerate() {
        println!("{}. {} ({} times)", i + 1, word, count);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
