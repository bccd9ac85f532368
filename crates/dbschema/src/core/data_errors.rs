//! Validation results returned as data.

use std::collections::BTreeMap;
use std::fmt;

/// Mapping from property name to the invariant violations found on it.
///
/// Empty when the validated object is valid. Keys are sorted so reports are
/// stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl DataErrors {
    /// Create an empty error map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation on a property.
    pub fn add(&mut self, property: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(property.into())
            .or_default()
            .push(message.into());
    }

    /// Merge another map, prefixing its property names with `prefix.`.
    pub fn merge_prefixed(&mut self, prefix: &str, other: DataErrors) {
        for (property, messages) in other.errors {
            let key = if prefix.is_empty() {
                property
            } else {
                format!("{}.{}", prefix, property)
            };
            self.errors.entry(key).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of messages across all properties.
    pub fn len(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    /// Messages recorded for a property.
    pub fn get(&self, property: &str) -> Option<&[String]> {
        self.errors.get(property).map(Vec::as_slice)
    }

    pub fn contains(&self, property: &str) -> bool {
        self.errors.contains_key(property)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.errors.iter()
    }

    /// Render as a multi-line report, one violation per line.
    pub fn to_report(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DataErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (property, messages) in &self.errors {
            for message in messages {
                if !first {
                    writeln!(f)?;
                }
                write!(f, "{}: {}", property, message)?;
                first = false;
            }
        }
        Ok(())
    }
}
