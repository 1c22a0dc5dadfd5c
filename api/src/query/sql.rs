use super::error::QueryError;
use super::features::QueryFeatures;
use super::operator::Operator;
use super::sort::{SortDirection, SortSpec};
use super::types::{FilterExpression, FilterKey, FilterValue};
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

/// SQL text with `?` placeholders and the values bound to them, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlQuery {
    pub sql: String,
    pub binds: Vec<SqlValue>,
}

/// Builds the page query over JSON documents stored in `table.column`.
pub fn build_select(
    table: &str,
    column: &str,
    features: &QueryFeatures,
) -> Result<SqlQuery, QueryError> {
    let mut binds = Vec::new();
    let mut sql = format!("SELECT {} FROM {}", column, table);

    let where_clause = build_where(column, &features.filter, &mut binds)?;
    if !where_clause.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_clause);
    }

    sql.push_str(" ORDER BY ");
    sql.push_str(&build_order_by(column, &features.sort, &mut binds)?);

    sql.push_str(" LIMIT ? OFFSET ?");
    binds.push(SqlValue::Integer(to_sql_integer(features.pagination.limit)));
    binds.push(SqlValue::Integer(to_sql_integer(features.pagination.skip)));

    Ok(SqlQuery { sql, binds })
}

/// Builds a `COUNT(*)` over the documents matching `filter`.
pub fn build_count(
    table: &str,
    column: &str,
    filter: &FilterExpression,
) -> Result<SqlQuery, QueryError> {
    let mut binds = Vec::new();
    let mut sql = format!("SELECT COUNT(*) FROM {}", table);
    let where_clause = build_where(column, filter, &mut binds)?;
    if !where_clause.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_clause);
    }
    Ok(SqlQuery { sql, binds })
}

/// Builds the WHERE clause for `filter`, appending bind values in placeholder
/// order. An empty filter yields an empty string.
///
/// Field paths resolve with `json_each`, so a field holding an array matches
/// when any element matches. Operators at the top level have no field to
/// apply to and are rejected.
pub fn build_where(
    column: &str,
    filter: &FilterExpression,
    binds: &mut Vec<SqlValue>,
) -> Result<String, QueryError> {
    let mut clauses = Vec::new();
    for (key, value) in filter.iter() {
        match key {
            FilterKey::Operator(op) => return Err(QueryError::RootOperator { operator: *op }),
            FilterKey::Field(name) => {
                let path = split_field(name)?;
                field_clauses(column, &path, value, binds, &mut clauses)?;
            }
        }
    }
    Ok(clauses.join(" AND "))
}

fn build_order_by(
    column: &str,
    sort: &SortSpec,
    binds: &mut Vec<SqlValue>,
) -> Result<String, QueryError> {
    let mut terms = Vec::with_capacity(sort.keys.len() + 1);
    for key in &sort.keys {
        let path = split_field(&key.field)?;
        binds.push(SqlValue::String(json_path(&path)));
        let direction = match key.direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        terms.push(format!("json_extract({}, ?) {}", column, direction));
    }
    // ties keep insertion order
    terms.push("rowid ASC".to_string());
    Ok(terms.join(", "))
}

fn field_clauses(
    column: &str,
    path: &[String],
    value: &FilterValue,
    binds: &mut Vec<SqlValue>,
    out: &mut Vec<String>,
) -> Result<(), QueryError> {
    match value {
        FilterValue::Document(doc) => {
            for (key, inner) in doc.iter() {
                match key {
                    FilterKey::Operator(op) => {
                        out.push(operator_clause(column, path, *op, inner, binds)?);
                    }
                    FilterKey::Field(sub) => {
                        let mut nested = path.to_vec();
                        nested.extend(split_field(sub)?);
                        field_clauses(column, &nested, inner, binds, out)?;
                    }
                }
            }
            Ok(())
        }
        _ => {
            out.push(operator_clause(column, path, Operator::Eq, value, binds)?);
            Ok(())
        }
    }
}

fn operator_clause(
    column: &str,
    path: &[String],
    op: Operator,
    value: &FilterValue,
    binds: &mut Vec<SqlValue>,
) -> Result<String, QueryError> {
    let field = path.join(".");
    match op {
        Operator::Eq => equality(column, path, &field, value, binds),
        Operator::Ne => Ok(negate(&equality(column, path, &field, value, binds)?)),
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
            comparison(column, path, op, &field, value, binds)
        }
        Operator::In => membership(column, path, op, &field, value, binds),
        Operator::Nin | Operator::NotIn => {
            Ok(negate(&membership(column, path, op, &field, value, binds)?))
        }
        Operator::Exists => Ok(existence(column, path, is_truthy(value), binds)),
        Operator::NExists => Ok(existence(column, path, !is_truthy(value), binds)),
        Operator::Regex => regex_match(column, path, op, &field, value, binds),
        Operator::NRegex | Operator::NotRegex => {
            Ok(negate(&regex_match(column, path, op, &field, value, binds)?))
        }
        Operator::Like => text_match(column, path, op, &field, value, "je.value LIKE ?", binds),
        Operator::NLike => Ok(negate(&text_match(
            column,
            path,
            op,
            &field,
            value,
            "je.value LIKE ?",
            binds,
        )?)),
        Operator::ILike => text_match(
            column,
            path,
            op,
            &field,
            value,
            "instr(lower(je.value), lower(?)) > 0",
            binds,
        ),
        Operator::NotILike => Ok(negate(&text_match(
            column,
            path,
            op,
            &field,
            value,
            "instr(lower(je.value), lower(?)) > 0",
            binds,
        )?)),
        Operator::Contains => text_match(
            column,
            path,
            op,
            &field,
            value,
            "instr(je.value, ?) > 0",
            binds,
        ),
        Operator::NContains => Ok(negate(&text_match(
            column,
            path,
            op,
            &field,
            value,
            "instr(je.value, ?) > 0",
            binds,
        )?)),
        Operator::Size => array_size(column, path, op, &field, value, binds),
        Operator::NSize => Ok(negate(&array_size(column, path, op, &field, value, binds)?)),
        Operator::All => all_elements(column, path, op, &field, value, binds),
        Operator::Not => negation(column, path, &field, value, binds),
    }
}

/// `EXISTS` over the elements at `path`; a scalar counts as one element.
/// Pushes the path bind, so operand binds go after the call.
fn any_element(column: &str, path: &[String], condition: &str, binds: &mut Vec<SqlValue>) -> String {
    binds.push(SqlValue::String(json_path(path)));
    format!(
        "EXISTS (SELECT 1 FROM json_each({}, ?) AS je WHERE {})",
        column, condition
    )
}

fn equality(
    column: &str,
    path: &[String],
    field: &str,
    value: &FilterValue,
    binds: &mut Vec<SqlValue>,
) -> Result<String, QueryError> {
    match value {
        FilterValue::Array(_) => {
            binds.push(SqlValue::String(json_path(path)));
            binds.push(SqlValue::String(
                serde_json::to_string(value).unwrap_or_default(),
            ));
            Ok(format!("json_extract({}, ?) = json(?)", column))
        }
        FilterValue::Null => {
            binds.push(SqlValue::String(json_path(path)));
            binds.push(SqlValue::String(json_path(path)));
            Ok(format!(
                "(json_type({}, ?) IS NULL OR json_type({}, ?) = 'null')",
                column, column
            ))
        }
        FilterValue::Document(_) => Err(invalid_operand(
            Operator::Eq,
            field,
            "a scalar value or an array",
        )),
        scalar => {
            let bind = scalar_bind(scalar)
                .ok_or_else(|| invalid_operand(Operator::Eq, field, "a scalar value"))?;
            match text_form(scalar) {
                Some(text) => {
                    let clause = any_element(
                        column,
                        path,
                        "(je.value = ? OR (je.type = 'text' AND je.value = ?))",
                        binds,
                    );
                    binds.push(bind);
                    binds.push(text);
                    Ok(clause)
                }
                None => {
                    let clause = any_element(column, path, "je.value = ?", binds);
                    binds.push(bind);
                    Ok(clause)
                }
            }
        }
    }
}

fn comparison(
    column: &str,
    path: &[String],
    op: Operator,
    field: &str,
    value: &FilterValue,
    binds: &mut Vec<SqlValue>,
) -> Result<String, QueryError> {
    let sql_op = match op {
        Operator::Gt => ">",
        Operator::Gte => ">=",
        Operator::Lt => "<",
        _ => "<=",
    };
    // values of another JSON type never compare as matching
    let type_guard = match value {
        FilterValue::Number(_) => "je.type IN ('integer', 'real')",
        FilterValue::String(_) => "je.type = 'text'",
        FilterValue::Bool(_) => "je.type IN ('true', 'false')",
        _ => {
            return Err(invalid_operand(
                op,
                field,
                "a number, a string or a boolean",
            ))
        }
    };
    let bind = scalar_bind(value)
        .ok_or_else(|| invalid_operand(op, field, "a number, a string or a boolean"))?;
    // numbers also compare against text elements by their text form, so
    // `premiered[gte]=2014` orders against ISO dates
    if let (FilterValue::Number(_), Some(text)) = (value, text_form(value)) {
        let condition = format!(
            "(({} AND je.value {} ?) OR (je.type = 'text' AND je.value {} ?))",
            type_guard, sql_op, sql_op
        );
        let clause = any_element(column, path, &condition, binds);
        binds.push(bind);
        binds.push(text);
        return Ok(clause);
    }
    let condition = format!("{} AND je.value {} ?", type_guard, sql_op);
    let clause = any_element(column, path, &condition, binds);
    binds.push(bind);
    Ok(clause)
}

fn membership(
    column: &str,
    path: &[String],
    op: Operator,
    field: &str,
    value: &FilterValue,
    binds: &mut Vec<SqlValue>,
) -> Result<String, QueryError> {
    let items: Vec<&FilterValue> = match value {
        FilterValue::Array(items) => items.iter().collect(),
        scalar if scalar.is_scalar() => vec![scalar],
        _ => return Err(invalid_operand(op, field, "a list of scalar values")),
    };
    if items.is_empty() {
        return Ok("0 = 1".to_string());
    }

    let values = items
        .iter()
        .map(|item| {
            scalar_bind(item).ok_or_else(|| invalid_operand(op, field, "a list of scalar values"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let texts: Vec<SqlValue> = items.iter().filter_map(|item| text_form(item)).collect();

    let placeholders = vec!["?"; values.len()].join(", ");
    let condition = if texts.is_empty() {
        format!("je.value IN ({})", placeholders)
    } else {
        format!(
            "(je.value IN ({}) OR (je.type = 'text' AND je.value IN ({})))",
            placeholders,
            vec!["?"; texts.len()].join(", ")
        )
    };
    let clause = any_element(column, path, &condition, binds);
    binds.extend(values);
    binds.extend(texts);
    Ok(clause)
}

fn existence(column: &str, path: &[String], present: bool, binds: &mut Vec<SqlValue>) -> String {
    binds.push(SqlValue::String(json_path(path)));
    if present {
        format!("json_type({}, ?) IS NOT NULL", column)
    } else {
        format!("json_type({}, ?) IS NULL", column)
    }
}

fn regex_match(
    column: &str,
    path: &[String],
    op: Operator,
    field: &str,
    value: &FilterValue,
    binds: &mut Vec<SqlValue>,
) -> Result<String, QueryError> {
    let valid = operand_text(value).is_some_and(|pattern| Regex::new(&pattern).is_ok());
    if !valid {
        return Err(invalid_operand(op, field, "a valid regular expression"));
    }
    text_match(column, path, op, field, value, "je.value REGEXP ?", binds)
}

fn text_match(
    column: &str,
    path: &[String],
    op: Operator,
    field: &str,
    value: &FilterValue,
    condition: &str,
    binds: &mut Vec<SqlValue>,
) -> Result<String, QueryError> {
    let text = operand_text(value).ok_or_else(|| invalid_operand(op, field, "a string"))?;
    let condition = format!("je.type = 'text' AND {}", condition);
    let clause = any_element(column, path, &condition, binds);
    binds.push(SqlValue::String(text));
    Ok(clause)
}

fn array_size(
    column: &str,
    path: &[String],
    op: Operator,
    field: &str,
    value: &FilterValue,
    binds: &mut Vec<SqlValue>,
) -> Result<String, QueryError> {
    let size = value
        .as_integer()
        .filter(|n| *n >= 0)
        .ok_or_else(|| invalid_operand(op, field, "a non-negative integer"))?;
    binds.push(SqlValue::String(json_path(path)));
    binds.push(SqlValue::String(json_path(path)));
    binds.push(SqlValue::Integer(size));
    Ok(format!(
        "COALESCE(json_type({}, ?) = 'array' AND json_array_length({}, ?) = ?, 0)",
        column, column
    ))
}

fn all_elements(
    column: &str,
    path: &[String],
    op: Operator,
    field: &str,
    value: &FilterValue,
    binds: &mut Vec<SqlValue>,
) -> Result<String, QueryError> {
    let items: Vec<&FilterValue> = match value {
        FilterValue::Array(items) => items.iter().collect(),
        scalar if scalar.is_scalar() => vec![scalar],
        _ => return Err(invalid_operand(op, field, "a list of scalar values")),
    };
    if items.is_empty() {
        return Ok("0 = 1".to_string());
    }

    let mut clauses = Vec::with_capacity(items.len());
    for item in items {
        let bind = scalar_bind(item)
            .ok_or_else(|| invalid_operand(op, field, "a list of scalar values"))?;
        clauses.push(any_element(column, path, "je.value = ?", binds));
        binds.push(bind);
    }
    Ok(format!("({})", clauses.join(" AND ")))
}

fn negation(
    column: &str,
    path: &[String],
    field: &str,
    value: &FilterValue,
    binds: &mut Vec<SqlValue>,
) -> Result<String, QueryError> {
    match value {
        FilterValue::Document(doc) if !doc.is_empty() => {
            let mut clauses = Vec::with_capacity(doc.len());
            for (key, inner) in doc.iter() {
                let FilterKey::Operator(op) = key else {
                    return Err(invalid_operand(
                        Operator::Not,
                        field,
                        "a document of operators",
                    ));
                };
                clauses.push(operator_clause(column, path, *op, inner, binds)?);
            }
            Ok(negate(&clauses.join(" AND ")))
        }
        FilterValue::String(_) => Ok(negate(&regex_match(
            column,
            path,
            Operator::Not,
            field,
            value,
            binds,
        )?)),
        _ => Err(invalid_operand(
            Operator::Not,
            field,
            "a document of operators or a regular expression",
        )),
    }
}

fn negate(clause: &str) -> String {
    format!("NOT ({})", clause)
}

fn invalid_operand(operator: Operator, field: &str, expected: &'static str) -> QueryError {
    QueryError::InvalidOperand {
        operator,
        field: field.to_string(),
        expected,
    }
}

fn is_truthy(value: &FilterValue) -> bool {
    match value {
        FilterValue::Null => false,
        FilterValue::Bool(b) => *b,
        FilterValue::Number(n) => *n != 0.0,
        FilterValue::String(s) => !s.is_empty(),
        FilterValue::Array(_) | FilterValue::Document(_) => true,
    }
}

fn scalar_bind(value: &FilterValue) -> Option<SqlValue> {
    match value {
        FilterValue::Bool(b) => Some(SqlValue::Bool(*b)),
        FilterValue::Number(n) => Some(match value.as_integer() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Float(*n),
        }),
        FilterValue::String(s) => Some(SqlValue::String(s.clone())),
        FilterValue::Null | FilterValue::Array(_) | FilterValue::Document(_) => None,
    }
}

/// Text form of a coerced number or boolean, so `name=24` still matches a
/// stored `"24"`. Strings need no second bind.
fn text_form(value: &FilterValue) -> Option<SqlValue> {
    match value {
        FilterValue::Number(_) | FilterValue::Bool(_) => operand_text(value).map(SqlValue::String),
        _ => None,
    }
}

/// Text operand for the string matching operators; `name[contains]=24` was
/// coerced to a number and is matched as `"24"`.
fn operand_text(value: &FilterValue) -> Option<String> {
    match value {
        FilterValue::String(s) => Some(s.clone()),
        FilterValue::Number(n) => Some(match value.as_integer() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        }),
        FilterValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Splits a dotted field into path segments, rejecting empty segments and
/// double quotes (which would break the quoted JSON path).
fn split_field(field: &str) -> Result<Vec<String>, QueryError> {
    let segments: Vec<String> = field.split('.').map(str::to_string).collect();
    if segments
        .iter()
        .any(|segment| segment.is_empty() || segment.contains('"'))
    {
        return Err(QueryError::InvalidFieldPath(field.to_string()));
    }
    Ok(segments)
}

/// SQLite JSON path with every label quoted: `$."network"."name"`
fn json_path(path: &[String]) -> String {
    let mut rendered = String::from("$");
    for segment in path {
        rendered.push_str(".\"");
        rendered.push_str(segment);
        rendered.push('"');
    }
    rendered
}

fn to_sql_integer(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
