/// Shared test helpers for database tests
use super::Database;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Set up a fresh in-memory database with all migrations applied.
/// A single connection that never expires keeps the memory database alive
/// for the whole test.
pub async fn setup_test_db() -> Database {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Invalid in-memory database URL")
        .with_regexp();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory database");

    Database::from_pool(pool).await.expect("Migration failed")
}

/// A complete, valid TV show document
pub fn sample_tv_show(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "url": format!("https://www.tvmaze.com/shows/{}/show", id),
        "name": name,
        "type": "Scripted",
        "language": "English",
        "genres": ["Drama", "Science-Fiction", "Thriller"],
        "status": "Ended",
        "runtime": 60,
        "premiered": "2013-06-24",
        "officialSite": "http://www.cbs.com/shows/under-the-dome/",
        "schedule": { "time": "22:00", "days": ["Thursday"] },
        "rating": { "average": 6.5 },
        "weight": 97,
        "network": {
            "id": 2,
            "name": "CBS",
            "country": { "name": "United States", "code": "US", "timezone": "America/New_York" }
        },
        "webChannel": null,
        "externals": { "tvrage": 25988, "thetvdb": 264492, "imdb": "tt1553656" },
        "image": {
            "medium": "https://static.tvmaze.com/uploads/images/medium_portrait/81/202627.jpg",
            "original": "https://static.tvmaze.com/uploads/images/original_untouched/81/202627.jpg"
        },
        "summary": "<p>A town is sealed off under an invisible dome.</p>",
        "updated": 1_573_667_713,
        "_links": {
            "self": { "href": format!("https://api.tvmaze.com/shows/{}", id) },
            "previousepisode": { "href": "https://api.tvmaze.com/episodes/185054" }
        }
    })
}

/// [`sample_tv_show`] with top-level fields replaced
pub fn sample_tv_show_with(id: i64, name: &str, overrides: Value) -> Value {
    let mut show = sample_tv_show(id, name);
    if let (Value::Object(target), Value::Object(fields)) = (&mut show, overrides) {
        target.extend(fields);
    }
    show
}
