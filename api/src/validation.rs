use crate::database::TvShow;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

static URL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
static IMDB_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

const MAX_URL_LENGTH: usize = 2048;
const MAX_RATING: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid TV show: {0}")]
    Malformed(String),

    #[error("{0} is required")]
    Required(String),

    #[error("Invalid {field}: '{value}' is not an http(s) URL")]
    InvalidUrl { field: String, value: String },

    #[error("Invalid {field}: '{value}'")]
    InvalidFormat { field: String, value: String },

    #[error("{0} cannot be negative")]
    Negative(String),

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },
}

fn url_regex() -> Option<&'static Regex> {
    URL_REGEX
        .get_or_init(|| Regex::new(r"^https?://[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}(:\d+)?(/.*)?$").ok())
        .as_ref()
}

fn imdb_regex() -> Option<&'static Regex> {
    IMDB_REGEX
        .get_or_init(|| Regex::new(r"^tt\d{7,}$").ok())
        .as_ref()
}

pub fn validate_required(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field.to_string()));
    }
    Ok(())
}

pub fn validate_url(field: &str, url: &str) -> Result<(), ValidationError> {
    validate_required(field, url)?;
    if url.len() > MAX_URL_LENGTH || !url_regex().is_some_and(|re| re.is_match(url)) {
        return Err(ValidationError::InvalidUrl {
            field: field.to_string(),
            value: url.to_string(),
        });
    }
    Ok(())
}

fn validate_non_negative(field: &str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::Negative(field.to_string()));
    }
    Ok(())
}

/// Checks a normalized show: required text present, links well formed,
/// counters non-negative and the rating on the 0..=10 scale.
pub fn validate_tv_show(show: &TvShow) -> Result<(), ValidationError> {
    for (field, value) in [
        ("name", &show.name),
        ("type", &show.show_type),
        ("language", &show.language),
        ("status", &show.status),
        ("summary", &show.summary),
        ("schedule.time", &show.schedule.time),
        ("network.name", &show.network.name),
        ("network.country.name", &show.network.country.name),
        ("network.country.code", &show.network.country.code),
        ("network.country.timezone", &show.network.country.timezone),
        ("externals.imdb", &show.externals.imdb),
    ] {
        validate_required(field, value)?;
    }

    for (field, value) in [
        ("url", &show.url),
        ("officialSite", &show.official_site),
        ("image.medium", &show.image.medium),
        ("image.original", &show.image.original),
        ("_links.self.href", &show.links.self_link.href),
        ("_links.previousepisode.href", &show.links.previousepisode.href),
    ] {
        validate_url(field, value)?;
    }

    if !imdb_regex().is_some_and(|re| re.is_match(&show.externals.imdb)) {
        return Err(ValidationError::InvalidFormat {
            field: "externals.imdb".to_string(),
            value: show.externals.imdb.clone(),
        });
    }

    for (field, value) in [
        ("id", show.id),
        ("runtime", show.runtime),
        ("weight", show.weight),
        ("updated", show.updated),
        ("network.id", show.network.id),
        ("externals.tvrage", show.externals.tvrage),
        ("externals.thetvdb", show.externals.thetvdb),
    ] {
        validate_non_negative(field, value)?;
    }

    let average = show.rating.average;
    if !(0.0..=MAX_RATING).contains(&average) {
        return Err(ValidationError::OutOfRange {
            field: "rating.average".to_string(),
            min: 0.0,
            max: MAX_RATING,
        });
    }

    Ok(())
}

/// Deserializes a client document into a [`TvShow`], trims its text and
/// validates it. Missing or mistyped fields are reported as
/// [`ValidationError::Malformed`] with the decoder's message.
pub fn parse_tv_show(document: Value) -> Result<TvShow, ValidationError> {
    let mut show: TvShow = serde_json::from_value(document)
        .map_err(|e| ValidationError::Malformed(e.to_string()))?;
    show.normalize();
    validate_tv_show(&show)?;
    Ok(show)
}
