//! REST API Server for the Financial Document Analyzer
//!
//! Exposes the pipeline and the document index via HTTP endpoints
//! Integrates with frontend UI

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::models::Passage;
use crate::pipeline::Orchestrator;
use crate::retrieval::index::{DocumentIndex, IndexHandle};

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QueryRequest {
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct IndexRequest {
    pub documents: Vec<Passage>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    pub index: IndexHandle,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    let index = state.index.snapshot().await;

    Json(serde_json::json!({
        "status": "healthy",
        "documents_indexed": index.len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Query Endpoint
/// =============================

async fn ask_question(
    State(state): State<ApiState>,
    Json(req): Json<QueryRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.question.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Question must not be empty".into())),
        );
    }

    info!("Received query: {}", req.question);

    // The pipeline degrades internally, so this endpoint always answers.
    let report = state.orchestrator.run(&req.question).await;

    (StatusCode::OK, Json(ApiResponse::success(report)))
}

/// =============================
/// Document Indexing Endpoint
/// =============================

async fn index_documents(
    State(state): State<ApiState>,
    Json(req): Json<IndexRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.documents.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("No documents provided".into())),
        );
    }

    info!("Indexing {} passage(s)", req.documents.len());

    let index = DocumentIndex::build(req.documents);
    let passages = index.len();

    // Queries in flight keep their snapshot; new ones see this index.
    let fingerprint = state.index.replace(index).await;

    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "message": "Documents indexed",
            "passages": passages,
            "fingerprint": fingerprint,
        }))),
    )
}

/// =============================
/// Router
/// =============================

pub fn create_router(orchestrator: Arc<Orchestrator>, index: IndexHandle) -> Router {
    let state = ApiState {
        orchestrator,
        index,
    };

    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/api/query", post(ask_question))
        .route("/api/documents", post(index_documents))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    orchestrator: Arc<Orchestrator>,
    index: IndexHandle,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(orchestrator, index);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

//
// ================= Tests =================
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::MetricExtractor;
    use crate::decomposer::MockDecomposer;
    use crate::narrative::MockNarrator;
    use crate::retrieval::index::IndexRetriever;
    use crate::retrieval::RetrievalAggregator;
    use crate::validation::create_default_rule_engine;

    fn test_state() -> ApiState {
        let index = IndexHandle::empty();
        let orchestrator = Arc::new(Orchestrator::new(
            Box::new(MockDecomposer),
            Box::new(IndexRetriever::new(index.clone())),
            RetrievalAggregator::default(),
            MetricExtractor::default(),
            create_default_rule_engine(),
            Box::new(MockNarrator),
        ));

        ApiState {
            orchestrator,
            index,
        }
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let state = test_state();

        let (status, Json(response)) = ask_question(
            State(state),
            Json(QueryRequest {
                question: "   ".to_string(),
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Question must not be empty"));
    }

    #[tokio::test]
    async fn test_empty_document_list_rejected() {
        let state = test_state();

        let (status, Json(response)) = index_documents(
            State(state),
            Json(IndexRequest {
                documents: Vec::new(),
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!response.success);
    }

    #[tokio::test]
    async fn test_index_then_query_flow() {
        let state = test_state();

        let (status, Json(response)) = index_documents(
            State(state.clone()),
            Json(IndexRequest {
                documents: vec![
                    Passage::new("Total Debt as at 31 March 626,130", 12, true),
                    Passage::new("Total Equity attributable to owners 400,000", 13, true),
                ],
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let data = response.data.unwrap();
        assert_eq!(data["passages"], 2);
        assert!(data["fingerprint"].as_str().is_some());

        // The orchestrator's retriever shares the handle, so the fresh
        // index is visible to the next query.
        let (status, Json(response)) = ask_question(
            State(state),
            Json(QueryRequest {
                question: "What is the debt to equity ratio?".to_string(),
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(response.success);
        let data = response.data.unwrap();
        assert_eq!(data["ratios"]["debt_to_equity"], 1.57);
    }

    #[tokio::test]
    async fn test_health_reports_index_size() {
        let state = test_state();

        let Json(body) = health(State(state.clone())).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["documents_indexed"], 0);

        state
            .index
            .replace(DocumentIndex::build(vec![Passage::new(
                "Total Debt as at 31 March 626,130",
                12,
                true,
            )]))
            .await;

        let Json(body) = health(State(state)).await;
        assert_eq!(body["documents_indexed"], 1);
    }
}
