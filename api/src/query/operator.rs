use strum::{Display, EnumString};

/// Marker prepended to an operator word when it is recognized inside a key.
pub const OPERATOR_MARKER: char = '$';

/// Operator vocabulary recognized in query-string keys.
///
/// Words are matched case-sensitively and only as whole words, so `gte` is an
/// operator while `gtE` or `integer` are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    NotIn,
    Exists,
    NExists,
    Regex,
    NRegex,
    NotRegex,
    Like,
    NLike,
    ILike,
    NotILike,
    Not,
    Contains,
    NContains,
    Size,
    NSize,
    All,
}

impl Operator {
    pub fn from_word(word: &str) -> Option<Self> {
        word.parse().ok()
    }

    /// The operator word with its marker, e.g. `$gte`
    pub fn marked(&self) -> String {
        format!("{}{}", OPERATOR_MARKER, self)
    }
}
