use crate::api_handlers::ApiResponse;
use crate::config::Environment;
use crate::query::QueryError;
use crate::validation::ValidationError;
use poem::error::ResponseError;
use poem::http::StatusCode;
use poem::web::Json;
use poem::{IntoResponse, Response};

/// Message shown for internal failures in production
const GENERIC_INTERNAL_MESSAGE: &str = "Something went wrong!";

/// Request-level failure, rendered as an [`ApiResponse`] error envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0:#}")]
    Internal(anyhow::Error),
}

impl ApiError {
    /// Message sent to the client; internal details stay hidden in production.
    pub fn public_message(&self, environment: Environment) -> String {
        match self {
            ApiError::Internal(_) if environment.is_production() => {
                GENERIC_INTERNAL_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Query and validation failures bubbled up through `anyhow` keep their 400 status.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<QueryError>() {
            Ok(query) => return ApiError::Query(query),
            Err(err) => err,
        };
        match err.downcast::<ValidationError>() {
            Ok(validation) => ApiError::Validation(validation),
            Err(err) => ApiError::Internal(err),
        }
    }
}

impl ResponseError for ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Query(_) | ApiError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn as_response(&self) -> Response {
        Json(ApiResponse::<()>::error(self.public_message(Environment::current())))
            .with_status(self.status())
            .into_response()
    }
}

#[cfg(test)]
mod tests;
