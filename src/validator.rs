use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

use crate::error::ValidationErrors;

/// Collects field-level findings. Every check runs; nothing short-circuits.
#[derive(Debug, Default)]
pub struct Validator {
    errors: BTreeMap<&'static str, Vec<&'static str>>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if no finding has been recorded.
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: &'static str, message: &'static str) {
        self.errors.entry(field).or_default().push(message);
    }

    /// Record `message` for `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &'static str, message: &'static str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

/// True if no two values are equal.
pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|v| seen.insert(v))
}

/// True if `value` is one of `permitted`.
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}
