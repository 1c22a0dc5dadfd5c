use super::operator::Operator;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("Cannot mix field inclusion and exclusion in projection: {fields}")]
    MixedProjection { fields: String },

    #[error("Operator ${operator} cannot be used at the top level of a filter")]
    RootOperator { operator: Operator },

    #[error("Operator ${operator} on field '{field}' expects {expected}")]
    InvalidOperand {
        operator: Operator,
        field: String,
        expected: &'static str,
    },

    #[error("Invalid field path: '{0}'")]
    InvalidFieldPath(String),
}
