use anyhow::{Context, Result};
use clap::Parser;
use skipdex_core::corpus::build_index;
use skipdex_core::tokenizer::tokenize;
use skipdex_core::{run_query, QueryReport};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "skipdex-cli")]
#[command(about = "Build a skip-pointer inverted index and evaluate AND queries", long_about = None)]
struct Cli {
    /// Corpus file, one `doc_id<TAB>body` per line
    #[arg(long)]
    corpus: String,
    /// Query file, one query per line
    #[arg(long)]
    queries: String,
    /// Output JSON report path
    #[arg(long, default_value = "query_report.json")]
    output: String,
    /// Results to keep per query
    #[arg(long, default_value_t = 10)]
    top_n: usize,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let start = Instant::now();
    let index = build_index(&cli.corpus)?;
    tracing::info!(
        elapsed = ?start.elapsed(),
        num_docs = index.num_docs(),
        num_terms = index.num_terms(),
        "index built"
    );

    let file = File::open(&cli.queries).with_context(|| format!("opening {}", cli.queries))?;
    let mut reports: BTreeMap<String, QueryReport> = BTreeMap::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        let report = run_query(&index, &tokenize(query), cli.top_n)?;
        reports.insert(query.to_string(), report);
    }

    fs::write(&cli.output, serde_json::to_string_pretty(&reports)?)
        .with_context(|| format!("writing {}", cli.output))?;
    tracing::info!(output = %cli.output, num_queries = reports.len(), "report written");
    Ok(())
}
