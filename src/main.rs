//! Chabunhae - Main CLI Entry Point

use anyhow::{Context, Result};
use chabunhae::{
    cases::{write_cases, CaseStore},
    cli::{Args, Commands, Config, Verbosity},
    crawl::CaseCrawler,
    errors::RagError,
    logging,
    rag::{RagPipeline, SearchParams},
    repl::{input::InputHandler, DisplayManager, ReplSession},
};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(exit_code(&e));
    }
}

/// 2 for startup failures (configuration, index build), 1 otherwise
fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<RagError>() {
        Some(e) if e.is_fatal() => 2,
        _ => 1,
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load(args.config.clone())?;
    if let Some(store) = &args.store {
        config.store.path = store.clone();
    }

    let verbosity = args.verbosity();
    logging::init(verbosity.log_level(&config.logging.level));

    match args.command_or_default() {
        Commands::Ask {
            query,
            top_k,
            show_context,
        } => run_ask(&config, &query, top_k, show_context, verbosity).await,
        Commands::Start => run_repl(&config, verbosity).await,
        Commands::Crawl {
            output,
            first_page,
            last_page,
        } => run_crawl(&config, output, first_page, last_page, verbosity).await,
        Commands::Cases { code } => show_cases(&config, code.as_deref()),
        Commands::Config => show_config(&config),
    }
}

/// Load the store and wire the Azure-backed pipeline
fn build_pipeline(config: &Config) -> Result<RagPipeline> {
    let store = CaseStore::load(&config.store.path)?;
    Ok(RagPipeline::from_config(config, store)?)
}

async fn run_ask(
    config: &Config,
    query: &str,
    top_k: Option<usize>,
    show_context: bool,
    verbosity: Verbosity,
) -> Result<()> {
    if query.trim().is_empty() {
        return Err(RagError::EmptyQuery.into());
    }

    let pipeline = build_pipeline(config)?;
    let params = SearchParams {
        top_k: top_k.unwrap_or(config.retrieval.top_k),
    };
    if params.top_k == 0 {
        return Err(RagError::Config("--top-k must be greater than 0".to_string()).into());
    }

    let mut display = if verbosity.show_progress() {
        DisplayManager::new()
    } else {
        DisplayManager::without_progress()
    };

    let _spinner = display.start_search();
    let result = pipeline.ask_with_params(query, &params).await;
    display.finish_current();
    let answer = result?;

    if show_context {
        display.show_matches(&answer.matches);
    }
    if verbosity.show_progress() {
        display.show_answer(&answer.text);
    } else {
        println!("{}", answer.text);
    }
    Ok(())
}

async fn run_repl(config: &Config, verbosity: Verbosity) -> Result<()> {
    let pipeline = Arc::new(build_pipeline(config)?);

    // Build the index up front; failing here is fatal
    let mut display = if verbosity.show_progress() {
        DisplayManager::new()
    } else {
        DisplayManager::without_progress()
    };
    let started = Instant::now();
    let _spinner = display.start_spinner("Building search index");
    match pipeline.warm_up().await {
        Ok(()) => display.finish_with_success(
            "Search index ready",
            started.elapsed().as_millis() as u64,
        ),
        Err(e) => {
            display.finish_with_error("Search index build failed");
            return Err(e.into());
        }
    }

    let store_path = config.store.path.clone();
    let mut repl_session = match InputHandler::default_history_path() {
        Some(history_path) => ReplSession::with_history(history_path, pipeline, store_path)?,
        None => ReplSession::new(pipeline, store_path)?,
    };
    if !verbosity.show_progress() {
        repl_session.disable_progress();
    }

    repl_session.show_welcome(env!("CARGO_PKG_VERSION"))?;
    repl_session.run().await
}

async fn run_crawl(
    config: &Config,
    output: Option<PathBuf>,
    first_page: Option<u32>,
    last_page: Option<u32>,
    verbosity: Verbosity,
) -> Result<()> {
    let mut crawl_config = config.crawl.clone();
    if let Some(first) = first_page {
        crawl_config.first_page = first;
    }
    if let Some(last) = last_page {
        crawl_config.last_page = last;
    }
    if crawl_config.first_page == 0 || crawl_config.first_page > crawl_config.last_page {
        return Err(RagError::Config(format!(
            "Invalid crawl page range: {}..={}",
            crawl_config.first_page, crawl_config.last_page
        ))
        .into());
    }

    let output = output.unwrap_or_else(|| config.store.path.clone());
    let pages = u64::from(crawl_config.last_page - crawl_config.first_page + 1);

    let pb = if verbosity.show_progress() {
        let pb = ProgressBar::new(pages);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} Crawling [{bar:40.cyan/blue}] {pos}/{len} pages | {msg}")
            .context("Invalid progress template")?
            .progress_chars("=>-");
        pb.set_style(style);
        pb
    } else {
        ProgressBar::hidden()
    };

    let crawler = CaseCrawler::new(crawl_config)?;
    let started = Instant::now();
    let report = crawler
        .crawl_all(|page, total| {
            pb.inc(1);
            pb.set_message(format!("page {} | {} cases", page, total));
        })
        .await;
    pb.finish_and_clear();
    let report = report?;

    write_cases(&output, &report.cases)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} {} cases written to {} {}",
        "✓".green(),
        report.cases.len(),
        output.display(),
        format!(
            "({} pages fetched, {} skipped, {}s)",
            report.pages_fetched,
            report.skipped,
            started.elapsed().as_secs()
        )
        .dimmed()
    );
    Ok(())
}

fn show_cases(config: &Config, code: Option<&str>) -> Result<()> {
    let store = CaseStore::load(&config.store.path)?;
    let display = DisplayManager::new();

    match code {
        Some(code) => {
            let case = store
                .get(code)
                .ok_or_else(|| RagError::Store(format!("No case with code {}", code)))?;
            display.show_case(case);
        }
        None => {
            display.show_section("Case store:");
            println!("  {:<10} {}", "Path:", config.store.path.display());
            println!("  {:<10} {}", "Cases:", store.len());
            if let (Some(first), Some(last)) = (store.cases().first(), store.cases().last()) {
                println!("  {:<10} {} .. {}", "Codes:", first.case_code, last.case_code);
            }
            println!();
        }
    }
    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    println!("{}", "Chabunhae Configuration".bold().cyan());
    println!("{}", "=".repeat(60).cyan());
    if let Some(path) = Config::default_path() {
        println!("{}", format!("# default file: {}", path.display()).dimmed());
    }
    println!("{}", config.to_display_string()?);
    Ok(())
}
