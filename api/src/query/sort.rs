use serde::Serialize;
use std::fmt;

/// Field used when no sort is requested; sorted newest first
pub const DEFAULT_SORT_FIELD: &str = "updated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SortSpec {
    pub keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn default_order() -> Self {
        Self {
            keys: vec![SortKey::new(DEFAULT_SORT_FIELD, SortDirection::Descending)],
        }
    }
}

/// Space separated form, `-` marking descending keys: `name -rating`
impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .keys
            .iter()
            .map(|key| match key.direction {
                SortDirection::Ascending => key.field.clone(),
                SortDirection::Descending => format!("-{}", key.field),
            })
            .collect();
        f.write_str(&rendered.join(" "))
    }
}

/// Translates `sort=name,-rating` into ordered sort keys.
///
/// Absent or empty input sorts by `updated`, descending.
pub fn translate_sort(raw: Option<&str>) -> SortSpec {
    let keys: Vec<SortKey> = raw
        .unwrap_or_default()
        .split(',')
        .filter_map(parse_sort_key)
        .collect();

    if keys.is_empty() {
        return SortSpec::default_order();
    }
    SortSpec { keys }
}

fn parse_sort_key(segment: &str) -> Option<SortKey> {
    let segment = segment.trim();
    let (field, direction) = match segment.strip_prefix('-') {
        Some(field) => (field.trim(), SortDirection::Descending),
        None => (segment, SortDirection::Ascending),
    };
    if field.is_empty() {
        return None;
    }
    Some(SortKey::new(field, direction))
}
