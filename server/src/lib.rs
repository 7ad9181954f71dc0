use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use skipdex_core::corpus::build_index;
use skipdex_core::query::AndEvaluation;
use skipdex_core::tokenizer::tokenize;
use skipdex_core::{run_query, DocId, Index};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, AllowOrigin, CorsLayer};

/// Shared server state: the finalized index. Read-only after
/// startup, so concurrent requests share it without locking.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<Index>,
}

#[derive(Deserialize)]
pub struct ExecuteQueryRequest {
    pub queries: Vec<String>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_top_n() -> usize {
    10
}

/// Aggregate response over all submitted queries. Term-keyed maps
/// carry per-term postings diagnostics; query-keyed maps carry the
/// four AND evaluations.
#[derive(Serialize, Default)]
pub struct ExecuteQueryResponse {
    #[serde(rename = "postingsList")]
    pub postings_list: BTreeMap<String, Vec<DocId>>,
    #[serde(rename = "postingsListSkip")]
    pub postings_list_skip: BTreeMap<String, Vec<DocId>>,
    #[serde(rename = "daatAnd")]
    pub daat_and: BTreeMap<String, AndEvaluation>,
    #[serde(rename = "daatAndSkip")]
    pub daat_and_skip: BTreeMap<String, AndEvaluation>,
    #[serde(rename = "daatAndTfIdf")]
    pub daat_and_tfidf: BTreeMap<String, AndEvaluation>,
    #[serde(rename = "daatAndSkipTfIdf")]
    pub daat_and_skip_tfidf: BTreeMap<String, AndEvaluation>,
    pub time_taken: f64,
}

/// Build the index from a corpus file and wire up the router.
pub fn build_app<P: AsRef<Path>>(corpus: P) -> Result<Router> {
    let index = build_index(corpus)?;
    let state = AppState {
        index: Arc::new(index),
    };

    // CORS: CORS_ALLOW_ORIGIN (comma-separated) or Any by default.
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/execute_query", post(execute_query))
        .with_state(state)
        .layer(cors);
    Ok(app)
}

/// Run each submitted query against the pre-built index. A query
/// whose terms miss the index still yields a well-formed, empty
/// section; only internal invariant violations abort with a 500.
pub async fn execute_query(
    State(state): State<AppState>,
    Json(req): Json<ExecuteQueryRequest>,
) -> Result<Json<ExecuteQueryResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let mut resp = ExecuteQueryResponse::default();

    for query in &req.queries {
        let terms = tokenize(query);
        let report = run_query(&state.index, &terms, req.top_n)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

        for term in report.terms {
            resp.postings_list.insert(term.term.clone(), term.postings);
            resp.postings_list_skip.insert(term.term, term.skip_postings);
        }
        let key = query.trim().to_string();
        resp.daat_and.insert(key.clone(), report.and_plain);
        resp.daat_and_skip.insert(key.clone(), report.and_skip);
        resp.daat_and_tfidf.insert(key.clone(), report.and_plain_tfidf);
        resp.daat_and_skip_tfidf.insert(key, report.and_skip_tfidf);
    }

    resp.time_taken = start.elapsed().as_secs_f64();
    Ok(Json(resp))
}
