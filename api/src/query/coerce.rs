use super::types::FilterValue;

/// Coerces one query-string value into a typed filter value.
///
/// Precedence: array literal, then number, then boolean. Anything else stays
/// the original string. The function is total and never fails.
pub fn coerce_scalar(text: &str) -> FilterValue {
    if let Some(items) = parse_array_literal(text) {
        return FilterValue::Array(items);
    }
    if let Some(number) = parse_number(text) {
        return FilterValue::Number(number);
    }
    if text.eq_ignore_ascii_case("true") {
        return FilterValue::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return FilterValue::Bool(false);
    }
    FilterValue::String(text.to_string())
}

/// Parses `["Drama","Comedy"]` style values. Elements keep their JSON types
/// and are not coerced further.
pub fn parse_array_literal(text: &str) -> Option<Vec<FilterValue>> {
    if !(text.starts_with('[') && text.ends_with(']')) {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(text.trim()) {
        Ok(serde_json::Value::Array(items)) => {
            Some(items.into_iter().map(FilterValue::from_json).collect())
        }
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(value = %text, error = %e, "failed to parse array from query parameter");
            None
        }
    }
}

/// Whole-string float parse; surrounding whitespace is ignored, `inf` and `NaN` are not numbers.
fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}
