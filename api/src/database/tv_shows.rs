use super::types::{Database, DOCUMENT_COLUMN, TV_SHOWS_TABLE};
use crate::query::{
    build_count, build_select, FilterExpression, QueryFeatures, SqlValue, ID_FIELD, VERSION_FIELD,
};
use crate::validation::{parse_tv_show, ValidationError};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::query::QueryScalar;
use sqlx::sqlite::{SqliteArguments, SqliteConnection};
use sqlx::Sqlite;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    pub code: String,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub id: i64,
    pub name: String,
    pub country: Country,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub time: String,
    pub days: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Externals {
    pub tvrage: i64,
    pub thetvdb: i64,
    pub imdb: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub medium: String,
    pub original: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: Link,
    pub previousepisode: Link,
}

/// A TV show as clients send it. Every field except `webChannel` is required;
/// unknown fields are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TvShow {
    pub id: i64,
    pub url: String,
    pub name: String,
    #[serde(rename = "type")]
    pub show_type: String,
    pub language: String,
    pub genres: Vec<String>,
    pub status: String,
    pub runtime: i64,
    pub premiered: NaiveDate,
    pub official_site: String,
    pub schedule: Schedule,
    pub rating: Rating,
    pub weight: i64,
    pub network: Network,
    #[serde(default)]
    pub web_channel: Option<Value>,
    pub externals: Externals,
    pub image: Image,
    pub summary: String,
    /// Upstream last-modified time, seconds since the epoch
    pub updated: i64,
    #[serde(rename = "_links")]
    pub links: Links,
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

impl TvShow {
    /// Trims surrounding whitespace from every text field.
    pub fn normalize(&mut self) {
        for text in [
            &mut self.url,
            &mut self.name,
            &mut self.show_type,
            &mut self.language,
            &mut self.status,
            &mut self.official_site,
            &mut self.schedule.time,
            &mut self.network.name,
            &mut self.network.country.name,
            &mut self.network.country.code,
            &mut self.network.country.timezone,
            &mut self.externals.imdb,
            &mut self.image.medium,
            &mut self.image.original,
            &mut self.summary,
            &mut self.links.self_link.href,
            &mut self.links.previousepisode.href,
        ] {
            trim_in_place(text);
        }
        for item in self.genres.iter_mut().chain(self.schedule.days.iter_mut()) {
            trim_in_place(item);
        }
    }

    /// Stored form: `_id` first, the show fields, then the `__v` counter.
    pub fn to_document(&self, id: &Uuid, version: i64) -> Result<Value> {
        let Value::Object(fields) = serde_json::to_value(self)? else {
            bail!("TV show did not serialize to a JSON object");
        };
        let mut document = Map::with_capacity(fields.len() + 2);
        document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        document.extend(fields);
        document.insert(VERSION_FIELD.to_string(), Value::from(version));
        Ok(Value::Object(document))
    }
}

fn bind_values<'q, O>(
    mut query: QueryScalar<'q, Sqlite, O, SqliteArguments<'q>>,
    values: &'q [SqlValue],
) -> QueryScalar<'q, Sqlite, O, SqliteArguments<'q>> {
    for value in values {
        query = match value {
            SqlValue::String(s) => query.bind(s.as_str()),
            SqlValue::Integer(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Bool(b) => query.bind(*b),
        };
    }
    query
}

fn parse_document(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).context("Stored TV show is not valid JSON")
}

fn now_ns() -> i64 {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
}

async fn select_documents(
    conn: &mut SqliteConnection,
    features: &QueryFeatures,
) -> Result<Vec<Value>> {
    let query = build_select(TV_SHOWS_TABLE, DOCUMENT_COLUMN, features)?;
    tracing::debug!(sql = %query.sql, binds = query.binds.len(), "listing tv shows");

    let rows = bind_values(sqlx::query_scalar::<_, String>(&query.sql), &query.binds)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter()
        .map(|raw| -> Result<Value> { Ok(features.projection.apply(parse_document(raw)?)) })
        .collect()
}

async fn select_count(conn: &mut SqliteConnection, filter: &FilterExpression) -> Result<i64> {
    let query = build_count(TV_SHOWS_TABLE, DOCUMENT_COLUMN, filter)?;
    let count = bind_values(sqlx::query_scalar::<_, i64>(&query.sql), &query.binds)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

impl Database {
    /// One page of TV shows matching `features` with the projection applied,
    /// plus the number of matches across all pages. Both reads share one
    /// transaction so the total agrees with the page.
    pub async fn list_tv_shows(&self, features: &QueryFeatures) -> Result<(Vec<Value>, i64)> {
        let mut tx = self.pool.begin().await?;
        let tv_shows = select_documents(&mut tx, features).await?;
        let total = select_count(&mut tx, &features.filter).await?;
        tx.commit().await?;
        Ok((tv_shows, total))
    }

    pub async fn get_tv_show(&self, id: &Uuid) -> Result<Option<Value>> {
        let id = id.to_string();
        let raw: Option<String> = sqlx::query_scalar("SELECT doc FROM tv_shows WHERE id = ?")
            .bind(&id)
            .fetch_optional(&self.pool)
            .await?;
        raw.map(|raw| parse_document(&raw).with_context(|| format!("Reading TV show {}", id)))
            .transpose()
    }

    /// Validates `body` and stores it under a fresh id with version 0.
    pub async fn create_tv_show(&self, body: Value) -> Result<Value> {
        let show = parse_tv_show(body)?;
        let id = Uuid::new_v4();
        let document = show.to_document(&id, 0)?;
        let now = now_ns();

        sqlx::query(
            "INSERT INTO tv_shows (id, doc, created_at_ns, updated_at_ns) VALUES (?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(document.to_string())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        tracing::info!(%id, name = %show.name, "created tv show");
        Ok(document)
    }

    /// Merges the top-level fields of `patch` into the stored show, validates
    /// the result and bumps its version. `_id` and `__v` in the patch are
    /// ignored. Returns `None` when no show has this id.
    pub async fn update_tv_show(&self, id: &Uuid, patch: Value) -> Result<Option<Value>> {
        let Value::Object(patch) = patch else {
            return Err(ValidationError::Malformed(
                "update body must be a JSON object".to_string(),
            )
            .into());
        };
        let id_text = id.to_string();

        let mut tx = self.pool.begin().await?;

        let raw: Option<String> = sqlx::query_scalar("SELECT doc FROM tv_shows WHERE id = ?")
            .bind(&id_text)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let Value::Object(mut current) = parse_document(&raw)? else {
            bail!("Stored TV show {} is not a JSON object", id_text);
        };

        let version = current
            .get(VERSION_FIELD)
            .and_then(Value::as_i64)
            .unwrap_or(0);
        for (key, value) in patch {
            if key == ID_FIELD || key == VERSION_FIELD {
                continue;
            }
            current.insert(key, value);
        }

        let show = parse_tv_show(Value::Object(current))?;
        let document = show.to_document(id, version + 1)?;

        sqlx::query("UPDATE tv_shows SET doc = ?, updated_at_ns = ? WHERE id = ?")
            .bind(document.to_string())
            .bind(now_ns())
            .bind(&id_text)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(id = %id_text, version = version + 1, "updated tv show");
        Ok(Some(document))
    }

    /// Returns whether a show was deleted.
    pub async fn delete_tv_show(&self, id: &Uuid) -> Result<bool> {
        let rows_affected = sqlx::query("DELETE FROM tv_shows WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected > 0 {
            tracing::info!(%id, "deleted tv show");
        }
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests;
