use super::*;
use anyhow::anyhow;

#[test]
fn test_status_codes() {
    assert_eq!(
        ApiError::BadRequest("Invalid _id: abc.".to_string()).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        ApiError::NotFound("No TV show found with that ID".to_string()).status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        ApiError::Validation(ValidationError::Required("name".to_string())).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        ApiError::Internal(anyhow!("disk full")).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_anyhow_downcasts_to_client_errors() {
    let err: anyhow::Error = QueryError::InvalidFieldPath("a..b".to_string()).into();
    assert!(matches!(ApiError::from(err), ApiError::Query(_)));

    let err: anyhow::Error = ValidationError::Negative("runtime".to_string()).into();
    assert!(matches!(ApiError::from(err), ApiError::Validation(_)));

    let err = anyhow!("connection reset");
    assert!(matches!(ApiError::from(err), ApiError::Internal(_)));
}

#[test]
fn test_messages() {
    let err = ApiError::Validation(ValidationError::Required("name".to_string()));
    assert_eq!(
        err.public_message(Environment::Development),
        "name is required"
    );

    let err = ApiError::Internal(anyhow!("disk full").context("saving TV show"));
    assert_eq!(err.to_string(), "saving TV show: disk full");
    assert_eq!(
        err.public_message(Environment::Development),
        "saving TV show: disk full"
    );
}

#[test]
fn test_production_hides_internal_details() {
    let err = ApiError::Internal(anyhow!("disk full").context("saving TV show"));
    assert_eq!(
        err.public_message(Environment::Production),
        "Something went wrong!"
    );

    let client_errors = [
        ApiError::BadRequest("Invalid _id: abc.".to_string()),
        ApiError::NotFound("No TV show found with that ID".to_string()),
        ApiError::Validation(ValidationError::Negative("runtime".to_string())),
        ApiError::Query(QueryError::InvalidFieldPath("a..b".to_string())),
    ];
    for err in client_errors {
        assert_eq!(err.public_message(Environment::Production), err.to_string());
    }
    assert_eq!(
        ApiError::BadRequest("Invalid _id: abc.".to_string())
            .public_message(Environment::Production),
        "Invalid _id: abc."
    );
}
