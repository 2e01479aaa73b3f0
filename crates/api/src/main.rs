mod cache;
mod config;
mod error;
mod metrics;
mod retry;

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::Instrument;
use tracing_subscriber::EnvFilter;

use annotation::{AnnotationResult, FeatureSet, NluClient};
use cache::{AnnotationCache, CacheStats};
use config::AppConfig;
use error::ApiError;
use hazard::{HazardClassifier, HazardLexicon, HazardVerdict, UnrecognizedPolicy};
use metrics::{Metrics, MetricsSnapshot, TimedOperation};
use retry::RetryPolicy;

struct AppState {
    nlu: NluClient,
    classifier: HazardClassifier,
    cache: Option<AnnotationCache>,
    retry: RetryPolicy,
    metrics: Arc<Metrics>,
}

impl AppState {
    fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let features = FeatureSet {
            emotion_targets: config.nlu.emotion_targets.clone(),
            entity_limit: config.nlu.entity_limit,
            keyword_limit: config.nlu.keyword_limit,
            model: config.nlu.model.clone(),
        };
        let nlu = NluClient::new(config.nlu.url.clone(), config.nlu.api_key.clone())
            .with_version(config.nlu.version.clone())
            .with_features(features)
            .with_timeout(Duration::from_secs(config.nlu.request_timeout_secs))?;

        let mut lexicon = match &config.classifier.lexicon_path {
            Some(path) => HazardLexicon::from_file(path)?,
            None => HazardLexicon::default(),
        };
        if config.classifier.strict_labels {
            lexicon = lexicon.with_policy(UnrecognizedPolicy::Reject);
        }
        lexicon.validate()?;

        let cache = config
            .cache
            .enabled
            .then(|| AnnotationCache::new(config.cache.max_entries));

        Ok(Self {
            nlu,
            classifier: HazardClassifier::new(lexicon),
            cache,
            retry: RetryPolicy::from_config(&config.retry),
            metrics: Metrics::new(),
        })
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    nlu_url: String,
}

#[derive(Deserialize)]
struct ClassifyRequest {
    text: String,
}

#[derive(Deserialize)]
struct TranslateQuery {
    text: Option<String>,
}

/// Shape the browser client has always consumed.
#[derive(Serialize)]
struct TranslateResponse {
    translated: String,
}

#[derive(Serialize)]
struct StatsResponse {
    metrics: MetricsSnapshot,
    cache: Option<CacheStats>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load()?;
    config.validate()?;

    let state = Arc::new(AppState::from_config(&config)?);
    tracing::info!(
        nlu_url = %state.nlu.base_url(),
        hazards = state.classifier.lexicon().profiles.len(),
        strict_labels = config.classifier.strict_labels,
        "Hazard classifier ready"
    );

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    tracing::info!("Server listening on http://{}", config.server.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/classify", post(classify_text))
        .route("/api/v1/translate", get(translate))
        .route("/api/v1/verdict", post(classify_annotation))
        .route("/stats", get(get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        nlu_url: state.nlu.base_url().to_string(),
    })
}

async fn classify_text(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Json<HazardVerdict>, ApiError> {
    let Json(req) = payload.inspect_err(|_| state.metrics.record_request(false))?;
    let verdict = annotate_and_classify(&state, &req.text).await?;
    Ok(Json(verdict))
}

async fn translate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TranslateQuery>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let text = query.text.unwrap_or_default();
    let verdict = annotate_and_classify(&state, &text).await?;
    Ok(Json(TranslateResponse {
        translated: verdict.message(),
    }))
}

/// Classify an annotation the caller already obtained.
async fn classify_annotation(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnnotationResult>, JsonRejection>,
) -> Result<Json<HazardVerdict>, ApiError> {
    let Json(result) = payload.inspect_err(|_| state.metrics.record_request(false))?;
    let verdict = state.classifier.classify(&result);
    state.metrics.record_verdict(&verdict);
    state.metrics.record_request(true);
    Ok(Json(verdict))
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        metrics: state.metrics.snapshot(),
        cache: state.cache.as_ref().map(AnnotationCache::stats),
    })
}

async fn annotate_and_classify(state: &AppState, text: &str) -> Result<HazardVerdict, ApiError> {
    if text.trim().is_empty() {
        state.metrics.record_request(false);
        return Err(ApiError::BadRequest("text must not be empty".to_string()));
    }

    let span = tracing::info_span!("classify", request_id = %uuid::Uuid::new_v4());
    async {
        let result = match annotate(state, text).await {
            Ok(result) => result,
            Err(e) => {
                state.metrics.record_request(false);
                return Err(e);
            }
        };

        let verdict = state.classifier.classify(&result);
        tracing::info!(
            category = %verdict.category,
            score = verdict.score_percent,
            evidence = ?verdict.evidence,
            "Hazard verdict"
        );

        state.metrics.record_verdict(&verdict);
        state.metrics.record_request(true);
        Ok(verdict)
    }
    .instrument(span)
    .await
}

async fn annotate(state: &AppState, text: &str) -> Result<AnnotationResult, ApiError> {
    if let Some(cached) = state.cache.as_ref().and_then(|c| c.get(text)) {
        tracing::debug!("Annotation cache hit");
        state.metrics.record_cache_hit();
        return Ok(cached);
    }

    let nlu = &state.nlu;
    let timer = TimedOperation::start();
    let result = state
        .retry
        .run("nlu_analyze", move || nlu.analyze(text))
        .await?;
    state.metrics.record_nlu_call(timer.elapsed());

    if let Some(cache) = &state.cache {
        cache.set(text, result.clone());
    }
    Ok(result)
}
