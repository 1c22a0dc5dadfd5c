use indexmap::IndexMap;

/// Bracket nesting deeper than this is kept as a literal key suffix
const MAX_DEPTH: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    /// Key repeated in the query string, or written with a trailing `[]`
    List(Vec<String>),
    Nested(RawQueryParameters),
}

impl RawValue {
    /// Scalar view used for control keys; the first element stands in for a list.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(text) => Some(text),
            RawValue::List(items) => items.first().map(String::as_str),
            RawValue::Nested(_) => None,
        }
    }
}

/// Query parameters of one request, before translation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawQueryParameters {
    entries: IndexMap<String, RawValue>,
}

impl RawQueryParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw query string such as `weight[gte]=60&genres=["Drama"]`.
    pub fn parse(query: &str) -> Self {
        let pairs = query
            .trim_start_matches('?')
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(key), decode_component(value))
            });
        Self::from_pairs(pairs)
    }

    /// Builds the parameters from already decoded key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            let key = key.as_ref();
            if key.is_empty() {
                continue;
            }
            let (path, append) = split_key(key);
            params.insert_path(&path, value.into(), append);
        }
        params
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.entries.get(key)
    }

    /// Removes a key, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<RawValue> {
        self.entries.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn insert_path(&mut self, path: &[String], value: String, append: bool) {
        let Some((head, rest)) = path.split_first() else {
            return;
        };

        if rest.is_empty() {
            match self.entries.get_mut(head.as_str()) {
                Some(existing) => {
                    let previous = std::mem::replace(existing, RawValue::List(Vec::new()));
                    *existing = merge_scalar(previous, value);
                }
                None if append => {
                    self.entries.insert(head.clone(), RawValue::List(vec![value]));
                }
                None => {
                    self.entries.insert(head.clone(), RawValue::Text(value));
                }
            }
            return;
        }

        let entry = self
            .entries
            .entry(head.clone())
            .or_insert_with(|| RawValue::Nested(RawQueryParameters::new()));
        if !matches!(entry, RawValue::Nested(_)) {
            tracing::debug!(key = %head, "replacing scalar query parameter with nested parameters");
            *entry = RawValue::Nested(RawQueryParameters::new());
        }
        if let RawValue::Nested(nested) = entry {
            nested.insert_path(rest, value, append);
        }
    }
}

fn merge_scalar(existing: RawValue, value: String) -> RawValue {
    match existing {
        RawValue::Text(previous) => RawValue::List(vec![previous, value]),
        RawValue::List(mut items) => {
            items.push(value);
            RawValue::List(items)
        }
        RawValue::Nested(_) => RawValue::Text(value),
    }
}

/// Splits `a[b][c]` into `["a", "b", "c"]`. A trailing `[]` marks list
/// appends. Keys with unbalanced brackets are kept whole.
fn split_key(key: &str) -> (Vec<String>, bool) {
    let Some(open) = key.find('[') else {
        return (vec![key.to_string()], false);
    };
    if open == 0 {
        return (vec![key.to_string()], false);
    }

    let mut segments = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            return (vec![key.to_string()], false);
        };
        segments.push(inner[..close].to_string());
        rest = &inner[close + 1..];
    }
    if !rest.is_empty() {
        return (vec![key.to_string()], false);
    }

    let append = segments.last().is_some_and(String::is_empty);
    if append {
        segments.pop();
    }
    if segments.iter().skip(1).any(String::is_empty) {
        return (vec![key.to_string()], false);
    }
    if segments.len() > MAX_DEPTH + 1 {
        let tail = format!("[{}]", segments[MAX_DEPTH + 1..].join("]["));
        segments.truncate(MAX_DEPTH + 1);
        segments.push(tail);
    }
    (segments, append)
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}
