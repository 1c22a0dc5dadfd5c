use crate::config::Environment;
use crate::database::Database;
use crate::error::ApiError;
use crate::query::QueryFeatures;
use crate::request_logging::RequestLogging;
use poem::{
    error::NotFoundError,
    handler,
    http::StatusCode,
    middleware::Cors,
    web::{Data, Json, Path},
    Endpoint, EndpointExt, IntoResponse, Request, Response, Result as PoemResult, Route,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

// Common response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub message: String,
    pub environment: String,
}

/// One page of the TV show listing
#[derive(Debug, Serialize)]
pub struct TvShowPage {
    /// Number of shows on this page
    pub results: usize,
    /// Number of shows matching the filter across all pages, read in the
    /// same transaction as the page
    pub total: i64,
    pub page: u64,
    pub limit: u64,
    pub tv_shows: Vec<Value>,
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid _id: {}.", raw)))
}

fn not_found(id: &Uuid) -> ApiError {
    ApiError::NotFound(format!("No TV show found with ID {}", id))
}

#[handler]
pub async fn health() -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::success(HealthStatus {
        message: "TV shows API is running".to_string(),
        environment: Environment::current().to_string(),
    }))
}

#[handler]
pub async fn list_tv_shows(
    db: Data<&Arc<Database>>,
    req: &Request,
) -> PoemResult<Json<ApiResponse<TvShowPage>>> {
    let features = QueryFeatures::parse(req.uri().query().unwrap_or_default())
        .map_err(ApiError::from)?;

    let (tv_shows, total) = db
        .list_tv_shows(&features)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::success(TvShowPage {
        results: tv_shows.len(),
        total,
        page: features.pagination.page,
        limit: features.pagination.limit,
        tv_shows,
    })))
}

#[handler]
pub async fn get_tv_show(
    db: Data<&Arc<Database>>,
    Path(id): Path<String>,
) -> PoemResult<Json<ApiResponse<Value>>> {
    let id = parse_id(&id)?;
    let tv_show = db
        .get_tv_show(&id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(ApiResponse::success(tv_show)))
}

#[handler]
pub async fn create_tv_show(
    db: Data<&Arc<Database>>,
    body: PoemResult<Json<Value>>,
) -> PoemResult<Response> {
    let Json(body) =
        body.map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;
    let tv_show = db.create_tv_show(body).await.map_err(ApiError::from)?;
    Ok(Json(ApiResponse::success(tv_show))
        .with_status(StatusCode::CREATED)
        .into_response())
}

#[handler]
pub async fn update_tv_show(
    db: Data<&Arc<Database>>,
    Path(id): Path<String>,
    body: PoemResult<Json<Value>>,
) -> PoemResult<Json<ApiResponse<Value>>> {
    let id = parse_id(&id)?;
    let Json(patch) =
        body.map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;
    let tv_show = db
        .update_tv_show(&id, patch)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(ApiResponse::success(tv_show)))
}

#[handler]
pub async fn delete_tv_show(
    db: Data<&Arc<Database>>,
    Path(id): Path<String>,
) -> PoemResult<StatusCode> {
    let id = parse_id(&id)?;
    if !db.delete_tv_show(&id).await.map_err(ApiError::from)? {
        return Err(not_found(&id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Builds the HTTP application: versioned routes, the JSON 404 for unknown
/// paths, CORS and request logging.
pub fn build_app(db: Arc<Database>) -> impl Endpoint<Output = Response> {
    let api = Route::new()
        .at("/health", poem::get(health))
        .at(
            "/tv-shows",
            poem::get(list_tv_shows).post(create_tv_show),
        )
        .at(
            "/tv-shows/:id",
            poem::get(get_tv_show)
                .put(update_tv_show)
                .delete(delete_tv_show),
        );

    Route::new()
        .nest("/api/v1", api)
        .around(|ep, req| async move {
            let path = req.uri().path().to_string();
            match ep.call(req).await {
                Err(err) if err.is::<NotFoundError>() => Err(ApiError::NotFound(format!(
                    "Can't find {} on this server!",
                    path
                ))
                .into()),
                other => other.map(IntoResponse::into_response),
            }
        })
        .data(db)
        .with(Cors::new())
        .with(RequestLogging)
        .map_to_response()
}
