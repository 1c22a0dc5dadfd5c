use super::coerce::coerce_scalar;
use super::operator::{Operator, OPERATOR_MARKER};
use super::raw::{RawQueryParameters, RawValue};
use super::types::{FilterDocument, FilterExpression, FilterKey, FilterValue};

/// Translates query parameters into a filter expression.
///
/// The reserved control keys must already be removed by the caller. Keys go
/// through operator detection, values through [`coerce_scalar`]; nested
/// parameters are translated recursively, lists are kept as strings.
pub fn translate_filter(raw: &RawQueryParameters) -> FilterExpression {
    let filter = translate_document(raw);
    tracing::debug!(
        parameters = raw.len(),
        filter = %serde_json::to_string(&filter).unwrap_or_default(),
        "translated query parameters into filter"
    );
    filter
}

fn translate_document(raw: &RawQueryParameters) -> FilterDocument {
    let mut doc = FilterDocument::new();
    for (key, value) in raw.iter() {
        doc.insert(translate_key(key), translate_value(value));
    }
    doc
}

fn translate_value(value: &RawValue) -> FilterValue {
    match value {
        RawValue::Text(text) => coerce_scalar(text),
        RawValue::List(items) => FilterValue::Array(
            items
                .iter()
                .map(|item| FilterValue::String(item.clone()))
                .collect(),
        ),
        RawValue::Nested(nested) => FilterValue::Document(translate_document(nested)),
    }
}

/// Marks every whole-word operator inside `key`.
///
/// A key that is exactly one operator word becomes an operator key. Any other
/// key stays a field path, where marked words become literal path text: a
/// field named `in` is read as the `$in` operator and `network.in` turns into
/// the field `network.$in`.
pub fn translate_key(key: &str) -> FilterKey {
    let marked = mark_operator_words(key);
    match marked
        .strip_prefix(OPERATOR_MARKER)
        .and_then(Operator::from_word)
    {
        Some(op) => FilterKey::Operator(op),
        None => FilterKey::Field(marked),
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// Words already preceded by the marker are left alone.
fn mark_operator_words(key: &str) -> String {
    let mut marked = String::with_capacity(key.len() + 1);
    let mut rest = key;
    while let Some(start) = rest.find(is_word_char) {
        let (before, tail) = rest.split_at(start);
        marked.push_str(before);

        let end = tail.find(|c: char| !is_word_char(c)).unwrap_or(tail.len());
        let (word, after) = tail.split_at(end);
        if Operator::from_word(word).is_some() && !marked.ends_with(OPERATOR_MARKER) {
            marked.push(OPERATOR_MARKER);
        }
        marked.push_str(word);
        rest = after;
    }
    marked.push_str(rest);
    marked
}
