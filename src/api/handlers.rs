use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::*;
use crate::namespace::{Namespace, NamespaceState, NamespaceUpdate, RequestContext};
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

const FILTER_PREFIX: &str = "filter.";
const QUERY_PREFIX: &str = "query.";

/// Health check endpoint
pub async fn health_check() -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Turn search query parameters into a request for `namespace`.
///
/// `filter.<field>` may repeat and accumulates values; `query.<field>` keeps
/// the last value. Unknown parameters are ignored.
pub fn parse_search_params(params: Vec<(String, String)>, namespace: Namespace) -> Result<SearchRequest> {
    let mut request = SearchRequest::new("").with_namespace(namespace);

    for (key, value) in params {
        if let Some(field) = key.strip_prefix(FILTER_PREFIX) {
            if !field.is_empty() {
                request = request.with_filter(field, [value]);
            }
            continue;
        }
        if let Some(field) = key.strip_prefix(QUERY_PREFIX) {
            if !field.is_empty() {
                request = request.with_query(field, value);
            }
            continue;
        }
        match key.as_str() {
            "text" => request.text = value,
            "rankby" => request = request.with_rank_by(value),
            "size" => request = request.with_max_results(parse_number(&key, &value)?),
            "offset" => request = request.with_offset(parse_number(&key, &value)?),
            "include_fields" => {
                request = request.with_include_fields(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|f| !f.is_empty())
                        .map(str::to_string)
                        .collect(),
                )
            }
            "disable_fuzzy" => request = request.with_fuzzy(value != "true"),
            _ => {}
        }
    }

    Ok(request)
}

/// Integer parameter with negatives clamped to zero.
///
/// A zero `size` selects the default result cap.
fn parse_number(key: &str, value: &str) -> Result<usize> {
    let number: i64 = value
        .trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("{} must be an integer", key)))?;
    Ok(usize::try_from(number).unwrap_or(0))
}

/// Full-text asset search
pub async fn search_assets(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<SearchResponse>> {
    let request = parse_search_params(params, ctx.namespace)?;
    let data = state.discovery.search(&request).await?;
    Ok(Json(SearchResponse { data }))
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub data: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestParams {
    #[serde(default)]
    pub text: String,
}

/// Name completions
pub async fn suggest_assets(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<SuggestParams>,
) -> Result<Json<SuggestResponse>> {
    let data = state
        .discovery
        .suggest(&params.text, &ctx.namespace)
        .await?;
    Ok(Json(SuggestResponse { data }))
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub data: Vec<String>,
}

/// Document counts per supported asset type
pub async fn asset_type_counts(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<TypeCountsResponse>> {
    let counts = state.discovery.counts_by_type(&ctx.namespace).await?;
    let data = AssetType::SUPPORTED
        .iter()
        .map(|asset_type| TypeCount {
            name: *asset_type,
            count: counts.get(asset_type).copied().unwrap_or(0),
        })
        .collect();
    Ok(Json(TypeCountsResponse { data }))
}

#[derive(Debug, Serialize)]
pub struct TypeCountsResponse {
    pub data: Vec<TypeCount>,
}

#[derive(Debug, Serialize)]
pub struct TypeCount {
    pub name: AssetType,
    pub count: u64,
}

/// Index or replace an asset document for the request's namespace
pub async fn upsert_asset(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(asset): Json<Asset>,
) -> Result<Json<UpsertAssetResponse>> {
    state.repository.upsert(&ctx.namespace, &asset).await?;
    Ok(Json(UpsertAssetResponse { id: asset.id }))
}

#[derive(Debug, Serialize)]
pub struct UpsertAssetResponse {
    pub id: String,
}

/// Remove an asset document by ID
pub async fn delete_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.repository.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct DeleteByUrnParams {
    #[serde(default)]
    pub urn: String,
}

/// Remove asset documents by URN
pub async fn delete_asset_by_urn(
    State(state): State<AppState>,
    Query(params): Query<DeleteByUrnParams>,
) -> Result<StatusCode> {
    state.repository.delete_by_urn(&params.urn).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Register a namespace
pub async fn create_namespace(
    State(state): State<AppState>,
    Json(request): Json<CreateNamespaceRequest>,
) -> Result<(StatusCode, Json<CreateNamespaceResponse>)> {
    request.validate()?;

    let mut namespace = Namespace::new(request.name, request.state);
    if let Some(id) = request.id {
        namespace = namespace.with_id(id);
    }
    namespace.metadata = request.metadata;

    let id = state.namespaces.create(namespace).await?;
    Ok((StatusCode::CREATED, Json(CreateNamespaceResponse { id })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNamespaceRequest {
    pub id: Option<Uuid>,
    #[validate(length(min = 3, max = 100))]
    pub name: String,
    pub state: NamespaceState,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct CreateNamespaceResponse {
    pub id: Uuid,
}

/// List namespaces
pub async fn list_namespaces(State(state): State<AppState>) -> Result<Json<NamespaceListResponse>> {
    let namespaces = state.namespaces.list().await?;
    Ok(Json(NamespaceListResponse { namespaces }))
}

#[derive(Debug, Serialize)]
pub struct NamespaceListResponse {
    pub namespaces: Vec<Namespace>,
}

/// Get a namespace by UUID or name
pub async fn get_namespace(
    State(state): State<AppState>,
    Path(urn): Path<String>,
) -> Result<Json<Namespace>> {
    let namespace = state.namespaces.get_by_urn(&urn).await?;
    Ok(Json(namespace))
}

/// Change a namespace's state and replace its metadata
pub async fn update_namespace(
    State(state): State<AppState>,
    Path(urn): Path<String>,
    Json(request): Json<UpdateNamespaceRequest>,
) -> Result<Json<Namespace>> {
    let mut update = NamespaceUpdate {
        state: request.state,
        metadata: request.metadata,
        ..Default::default()
    };
    match Uuid::parse_str(&urn) {
        Ok(id) => update.id = Some(id),
        Err(_) => update.name = Some(urn),
    }

    let namespace = state.namespaces.update(update).await?;
    Ok(Json(namespace))
}

#[derive(Debug, Deserialize)]
pub struct UpdateNamespaceRequest {
    pub state: Option<NamespaceState>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}
