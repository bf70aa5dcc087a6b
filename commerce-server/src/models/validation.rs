//! Field-level validation problems

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Field name → human-readable problem, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Problems(BTreeMap<String, String>);

impl Problems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem for `field`. The first problem reported for a field wins.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Fold another set of problems in, keeping existing entries.
    pub fn merge(&mut self, other: Problems) {
        for (field, message) in other.0 {
            self.insert(field, message);
        }
    }

    /// `Ok(())` when empty, otherwise the problems themselves.
    pub fn into_result(self) -> Result<(), Problems> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for Problems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// Self-validation for decoded request payloads.
///
/// Runs at the HTTP boundary before any service is invoked.
pub trait Validate {
    fn validate(&self) -> Problems;
}
