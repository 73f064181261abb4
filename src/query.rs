//! Multi-value query string parameters.

use lambda_http::aws_lambda_events::query_map::QueryMap;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::borrow::Cow;
use std::collections::HashMap;
use url::form_urlencoded;

/// Bytes escaped in a request path. `/`, sub-delimiters and existing `%XX`
/// escapes pass through; non-ASCII is always escaped.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'^')
    .add(b'|')
    .add(b'\\')
    .add(b'[')
    .add(b']');

/// Ordered multi-value query parameter map.
///
/// Names are case-sensitive and keep first-seen order; values under a name
/// keep insertion order and duplicates are preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parse an `application/x-www-form-urlencoded` string such as
    /// `a=1&b=2&a=3`. A leading `?` is ignored.
    pub fn parse(raw: &str) -> Self {
        form_urlencoded::parse(raw.trim_start_matches('?').as_bytes()).collect()
    }

    /// Merge the single- and multi-value representations of an event.
    ///
    /// A name present in `multi` takes its values from there only; `single`
    /// contributes the names `multi` does not have.
    pub fn merge(single: HashMap<String, String>, multi: HashMap<String, Vec<String>>) -> Self {
        let mut params = Self::new();

        let mut multi: Vec<_> = multi.into_iter().collect();
        multi.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, values) in multi {
            for value in values {
                params.append(name.clone(), value);
            }
        }

        let mut single: Vec<_> = single.into_iter().collect();
        single.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, value) in single {
            if !params.contains(&name) {
                params.append(name, value);
            }
        }
        params
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// First value for `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.all(name).first().map(String::as_str)
    }

    /// Every value for `name`, empty when absent.
    pub fn all(&self, name: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Split every comma-joined value into separate values. Pieces are
    /// trimmed; empty pieces stay, so `a,,b` yields three values.
    pub fn expand_commas(self) -> Self {
        let entries = self
            .entries
            .into_iter()
            .map(|(name, values)| {
                let expanded = values
                    .iter()
                    .flat_map(|value| value.split(',').map(|piece| piece.trim().to_string()))
                    .collect();
                (name, expanded)
            })
            .collect();
        Self { entries }
    }

    /// Form-decode every name and value (ALB passes them through encoded).
    pub fn decoded(self) -> Self {
        let mut params = Self::new();
        for (name, values) in self.entries {
            let name = form_decode(&name);
            for value in values {
                params.append(name.clone(), form_decode(&value));
            }
        }
        params
    }

    /// Form-encoded representation, without a leading `?`.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, values) in &self.entries {
            for value in values {
                serializer.append_pair(name, value);
            }
        }
        serializer.finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.append(name, value);
        }
        params
    }
}

impl From<QueryParams> for QueryMap {
    fn from(params: QueryParams) -> Self {
        params
            .entries
            .into_iter()
            .collect::<HashMap<String, Vec<String>>>()
            .into()
    }
}

/// Decode a single form component: `+` is a space, malformed escapes stay literal.
fn form_decode(input: &str) -> String {
    percent_decode_str(&input.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

/// Decode `%XX` escapes in a URI path. `+` stays a plus.
pub(crate) fn decode_path(path: &str) -> Cow<'_, str> {
    percent_decode_str(path).decode_utf8_lossy()
}

pub(crate) fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH).to_string()
}
