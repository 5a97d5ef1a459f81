//! Matching `FIELD=VALUE` requests to form fields
//!
//! A key names a field either by its fully-qualified name or by the decimal
//! object id of its widget. The name is tried first so that fields with
//! numeric names are not shadowed by an unrelated object id.

use std::collections::BTreeMap;
use std::io::Write;

use crate::codec::{self, WriteOutcome};
use crate::error::{Error, Result};
use crate::pdf::field::FormField;

/// Split `FIELD=VALUE` on the first `=`
///
/// The value may be empty and may contain further `=` characters.
pub fn parse_assignment(spec: &str) -> Result<(&str, &str)> {
    spec.split_once('=')
        .ok_or_else(|| Error::NotAnAssignment(spec.to_string()))
}

/// An assignment that matched a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The key that matched, name or id
    pub key: String,
    pub outcome: WriteOutcome,
}

/// Requested values by key, with per-key fulfilment
///
/// A key is fulfilled once a write through it was applied to at least one
/// field. Skipped and rejected writes do not count.
#[derive(Debug, Default, Clone)]
pub struct Assignments {
    values: BTreeMap<String, String>,
    fulfilled: BTreeMap<String, bool>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request; a repeated key replaces the earlier value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.fulfilled.insert(key.clone(), false);
        self.values.insert(key, value.into());
    }

    /// Parse and add a `FIELD=VALUE` operand
    pub fn insert_spec(&mut self, spec: &str) -> Result<()> {
        let (key, value) = parse_assignment(spec)?;
        self.insert(key, value);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_fulfilled(&self, key: &str) -> bool {
        self.fulfilled.get(key).copied().unwrap_or(false)
    }

    /// Keys that never reached a field, in ascending order
    pub fn unfulfilled(&self) -> impl Iterator<Item = &str> {
        self.fulfilled
            .iter()
            .filter(|(_, done)| !**done)
            .map(|(key, _)| key.as_str())
    }

    /// Find the request for `field` and write it
    ///
    /// At most one key is applied per field: the fully-qualified name when
    /// present, otherwise the object id.
    pub fn apply<F: FormField + ?Sized>(
        &mut self,
        field: &mut F,
        diagnostics: &mut dyn Write,
    ) -> Result<Option<Resolution>> {
        let key = if self.values.contains_key(field.fully_qualified_name()) {
            field.fully_qualified_name().to_string()
        } else {
            let id = field.id().to_string();
            if !self.values.contains_key(&id) {
                return Ok(None);
            }
            id
        };

        let value = self.values[&key].clone();
        let outcome = codec::write(field, &value, diagnostics)?;
        if outcome.is_applied() {
            self.fulfilled.insert(key.clone(), true);
        }

        Ok(Some(Resolution { key, outcome }))
    }
}
