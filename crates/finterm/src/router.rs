use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::compare::ComparisonWeights;
use crate::error::AppError;
use crate::pipeline::{BatchComparison, DocumentAnalysis, TermEngine};
use crate::query::TermQuery;
use crate::terms::{DocumentId, FinancialTerm, RawDocument};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub document_id: DocumentId,
    pub document: RawDocument,
    #[serde(default)]
    pub horizon_months: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareRequest {
    pub documents: BTreeMap<DocumentId, RawDocument>,
    #[serde(default)]
    pub horizon_months: Option<u32>,
    #[serde(default)]
    pub weights: Option<ComparisonWeights>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub document_id: DocumentId,
    pub document: RawDocument,
    #[serde(default)]
    pub query: TermQuery,
    #[serde(default)]
    pub exactly_one: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub document_id: DocumentId,
    pub terms: Vec<FinancialTerm>,
}

/// Router exposing the engine over JSON.
pub fn engine_router(engine: Arc<TermEngine>) -> Router {
    Router::new()
        .route("/api/v1/documents/analyze", post(analyze_handler))
        .route("/api/v1/documents/compare", post(compare_handler))
        .route("/api/v1/documents/query", post(query_handler))
        .with_state(engine)
}

/// Engine work is CPU-bound; keep it off the async workers.
async fn run_blocking<T, F>(engine: Arc<TermEngine>, work: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&TermEngine) -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || work(&engine)).await?
}

pub(crate) async fn analyze_handler(
    State(engine): State<Arc<TermEngine>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<DocumentAnalysis>, AppError> {
    let analysis = run_blocking(engine, move |engine| {
        Ok(engine.analyze(
            &request.document_id,
            &request.document,
            request.horizon_months,
        )?)
    })
    .await?;
    Ok(Json(analysis))
}

pub(crate) async fn compare_handler(
    State(engine): State<Arc<TermEngine>>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<BatchComparison>, AppError> {
    if request.documents.is_empty() {
        return Err(AppError::Input("documents must not be empty".to_string()));
    }

    let batch = run_blocking(engine, move |engine| {
        Ok(engine.compare_documents(
            &request.documents,
            request.horizon_months,
            request.weights,
        )?)
    })
    .await?;
    Ok(Json(batch))
}

pub(crate) async fn query_handler(
    State(engine): State<Arc<TermEngine>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let terms = run_blocking(engine, move |engine| {
        let QueryRequest {
            document_id,
            document,
            query,
            exactly_one,
        } = request;
        let terms = if exactly_one {
            vec![engine.query_one(&document_id, &document, &query)?]
        } else {
            engine.query(&document_id, &document, &query)?
        };
        Ok(QueryResponse { document_id, terms })
    })
    .await?;
    Ok(Json(terms))
}
