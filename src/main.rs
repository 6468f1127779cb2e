use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use tweet_triage::classifier::{MistralClient, RetryPolicy, TweetClassifier};
use tweet_triage::config::AppConfig;
use tweet_triage::heuristics::KeywordClassifier;
use tweet_triage::logging::init_logging;
use tweet_triage::models::TweetOutcome;
use tweet_triage::pipeline::TriagePipeline;
use tweet_triage::report::TableSummary;
use tweet_triage::result_table::ResultTable;
use tweet_triage::tweet_store::TweetStore;
use tweet_triage::validation::InputValidator;
use tweet_triage::TriageError;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Tweet export to read
    #[arg(long, global = true)]
    tweets: Option<PathBuf>,

    /// Result table to append to
    #[arg(long, global = true)]
    results: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single tweet with the language model
    Classify {
        /// 1-based tweet number; prompted for when omitted
        #[arg(short, long)]
        index: Option<usize>,
    },
    /// Classify a range of tweets sequentially
    Batch {
        /// First tweet number (inclusive)
        #[arg(long, default_value = "1")]
        from: usize,

        /// Last tweet number (inclusive), defaults to the last tweet
        #[arg(long)]
        to: Option<usize>,

        /// Seconds to wait between service calls
        #[arg(long)]
        delay_secs: Option<u64>,
    },
    /// Categorize negative and neutral tweets with keyword heuristics
    Analyze,
    /// Summarize the result table
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load_from(cli.config.as_deref())?;
    if let Some(tweets) = &cli.tweets {
        config.input.tweets_path = tweets.to_string_lossy().into_owned();
    }
    if let Some(results) = &cli.results {
        config.output.results_path = results.to_string_lossy().into_owned();
    }

    // Initialize logging
    let log_level = config.resolve_log_level(cli.log_level.as_deref());
    let log_file = config.logging.file_path.as_ref().map(PathBuf::from);
    let _log_guard = init_logging(&log_level, log_file.as_deref(), config.logging.format == "json")?;

    info!("Starting tweet-triage");

    match cli.command {
        Commands::Classify { index } => classify_tweet(&config, index).await,
        Commands::Batch { from, to, delay_secs } => run_batch(&config, from, to, delay_secs).await,
        Commands::Analyze => analyze_tweets(&config),
        Commands::Stats => show_stats(&config),
    }
}

fn load_store(config: &AppConfig) -> Result<TweetStore> {
    let path = config.tweets_path();
    InputValidator::validate_file_path(&path)?;
    Ok(TweetStore::load_with_layout(&path, config.tweet_layout())?)
}

fn build_pipeline(config: &AppConfig, store: TweetStore) -> Result<TriagePipeline<MistralClient>> {
    InputValidator::validate_model_name(&config.service.model)?;
    InputValidator::validate_endpoint(&config.service.endpoint)?;
    let results_path = config.results_path();
    InputValidator::validate_file_path(&results_path)?;

    let client = MistralClient::new(&config.service)?;
    info!(model = client.model(), endpoint = %config.service.endpoint, "Using classification service");
    let classifier = TweetClassifier::new(client).with_retry(RetryPolicy::from(&config.service));

    Ok(TriagePipeline::new(store, classifier, ResultTable::new(results_path)))
}

/// Ask for a tweet number on stdin
fn prompt_index(count: usize) -> Result<usize> {
    print!("Enter the tweet number to process (1 to {count}): ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    line.trim()
        .parse()
        .with_context(|| format!("Not a tweet number: {:?}", line.trim()))
}

/// Classify one tweet and print the parsed fields
async fn classify_tweet(config: &AppConfig, index: Option<usize>) -> Result<()> {
    let store = load_store(config)?;
    let index = match index {
        Some(index) => index,
        None => prompt_index(store.len())?,
    };

    // Reject a bad index before requiring credentials
    let content = match store.get(index) {
        Ok(tweet) => tweet.content.clone(),
        Err(e @ TriageError::IndexOutOfRange { .. }) => {
            println!("{e}");
            return Ok(());
        },
        Err(e) => return Err(e.into()),
    };

    let mut pipeline = build_pipeline(config, store)?;
    let record = pipeline.process_one(index).await?;

    println!("\nProcessed Tweet:");
    println!("ID: {}", record.id);
    println!("Date: {}", record.date);
    println!("Content: {content}");
    println!("Score: {}", record.score.map_or_else(|| "None".to_string(), |s| s.to_string()));
    println!("Sentiment: {}", record.sentiment);
    println!("Category: {}", record.category);
    println!("\nModel responses appended to '{}'.", pipeline.table().path().display());

    Ok(())
}

/// Classify a range of tweets, one summary line per tweet
async fn run_batch(config: &AppConfig, from: usize, to: Option<usize>, delay_secs: Option<u64>) -> Result<()> {
    let store = load_store(config)?;
    if store.is_empty() {
        warn!("No tweets to process");
        return Ok(());
    }

    let to = to.unwrap_or(store.len());
    InputValidator::validate_batch_range(from, to, store.len())?;
    let delay = Duration::from_secs(delay_secs.unwrap_or(config.batch.delay_secs));
    InputValidator::validate_delay(delay)?;

    let mut pipeline = build_pipeline(config, store)?;
    let report = pipeline
        .run_batch(from..=to, delay, |index, outcome| match outcome {
            TweetOutcome::Recorded(record) => println!(
                "[{index}/{to}] ID {} | {} | score {} | {} | {}",
                record.id,
                record.date,
                record.score.map_or_else(|| "-".to_string(), |s| s.to_string()),
                record.sentiment,
                record.category
            ),
            TweetOutcome::Failed { reason } => println!("[{index}/{to}] skipped: {reason}"),
        })
        .await?;

    println!(
        "\n{} of {} tweets recorded in '{}'.",
        report.recorded,
        report.attempted(),
        pipeline.table().path().display()
    );
    if let Some((last_failed, _)) = report.failed.last() {
        println!("{} failed; last failure at tweet {last_failed}.", report.failed.len());
    }

    Ok(())
}

/// Keyword heuristics over the whole export
fn analyze_tweets(config: &AppConfig) -> Result<()> {
    let store = load_store(config)?;
    let classifier = KeywordClassifier::new()?;
    let breakdown = classifier.problem_breakdown(store.iter());
    let total: usize = breakdown.values().sum();

    println!("Problem categories over {total} negative or neutral tweets ({} loaded):", store.len());
    let mut rows: Vec<_> = breakdown.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    for (category, count) in rows {
        println!("  {category}: {count}");
    }

    Ok(())
}

/// Print aggregates of the result table
fn show_stats(config: &AppConfig) -> Result<()> {
    let table = ResultTable::new(config.results_path());
    let records = table.read_all()?;
    if records.is_empty() {
        println!("No results in '{}'.", table.path().display());
        return Ok(());
    }

    print!("{}", TableSummary::from_records(&records));
    Ok(())
}
