use super::error::QueryError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Internal version-tracking field, hidden unless a projection asks for it
pub const VERSION_FIELD: &str = "__v";

/// Document identifier, always returned by inclusion projections
pub const ID_FIELD: &str = "_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    Include,
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionSpec {
    pub mode: ProjectionMode,
    pub fields: Vec<String>,
}

impl ProjectionSpec {
    pub fn default_exclusion() -> Self {
        Self {
            mode: ProjectionMode::Exclude,
            fields: vec![VERSION_FIELD.to_string()],
        }
    }

    /// Applies the projection to one stored document. Dotted fields address
    /// nested objects.
    pub fn apply(&self, doc: Value) -> Value {
        let Value::Object(source) = doc else {
            return doc;
        };

        match self.mode {
            ProjectionMode::Exclude => {
                let mut projected = source;
                for field in &self.fields {
                    let path: Vec<&str> = field.split('.').collect();
                    remove_path(&mut projected, &path);
                }
                Value::Object(projected)
            }
            ProjectionMode::Include => {
                let mut projected = Map::new();
                if let Some(id) = source.get(ID_FIELD) {
                    projected.insert(ID_FIELD.to_string(), id.clone());
                }
                for field in &self.fields {
                    let path: Vec<&str> = field.split('.').collect();
                    copy_path(&source, &mut projected, &path);
                }
                Value::Object(projected)
            }
        }
    }
}

/// Translates `fields=name,rating` (inclusion) or `fields=-summary`
/// (exclusion).
///
/// Absent or empty input hides the version field. Mixing both prefixes in one
/// request is rejected.
pub fn translate_projection(raw: Option<&str>) -> Result<ProjectionSpec, QueryError> {
    let raw = raw.unwrap_or_default();
    let mut mode = None;
    let mut fields = Vec::new();

    for segment in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (field, segment_mode) = match segment.strip_prefix('-') {
            Some(field) => (field.trim(), ProjectionMode::Exclude),
            None => (segment, ProjectionMode::Include),
        };
        if field.is_empty() {
            continue;
        }
        match mode {
            None => mode = Some(segment_mode),
            Some(current) if current != segment_mode => {
                return Err(QueryError::MixedProjection {
                    fields: raw.to_string(),
                });
            }
            Some(_) => {}
        }
        fields.push(field.to_string());
    }

    Ok(match mode {
        Some(mode) => ProjectionSpec { mode, fields },
        None => ProjectionSpec::default_exclusion(),
    })
}

fn remove_path(map: &mut Map<String, Value>, path: &[&str]) {
    match path {
        [] => {}
        [last] => {
            map.remove(*last);
        }
        [head, rest @ ..] => {
            if let Some(Value::Object(child)) = map.get_mut(*head) {
                remove_path(child, rest);
            }
        }
    }
}

fn copy_path(source: &Map<String, Value>, target: &mut Map<String, Value>, path: &[&str]) {
    match path {
        [] => {}
        [last] => {
            if let Some(value) = source.get(*last) {
                target.insert(last.to_string(), value.clone());
            }
        }
        [head, rest @ ..] => {
            let Some(Value::Object(child)) = source.get(*head) else {
                return;
            };
            let slot = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(slot) = slot {
                copy_path(child, slot, rest);
            }
        }
    }
}
