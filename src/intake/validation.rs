//! Shared validation helpers for intake forms.

use crate::error::ValidationError;

/// Collects unset required fields, then reports them all at once.
#[derive(Debug, Default)]
pub struct Checklist {
    missing: Vec<&'static str>,
    invalid: Option<ValidationError>,
}

impl Checklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require an optional value to be set.
    pub fn require<T>(&mut self, field: &'static str, value: &Option<T>) -> &mut Self {
        if value.is_none() {
            self.missing.push(field);
        }
        self
    }

    /// Require text with at least one non-whitespace character.
    pub fn require_text(&mut self, field: &'static str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.missing.push(field);
        }
        self
    }

    /// Require at least one selected entry.
    pub fn require_any<T>(&mut self, field: &'static str, values: &[T]) -> &mut Self {
        if values.is_empty() {
            self.missing.push(field);
        }
        self
    }

    /// Require an integer within an inclusive range.
    pub fn require_range(
        &mut self,
        field: &'static str,
        value: u8,
        range: std::ops::RangeInclusive<u8>,
    ) -> &mut Self {
        if !range.contains(&value) {
            let err = ValidationError::invalid(
                field,
                format!("must be between {} and {}", range.start(), range.end()),
            );
            self.invalid = Some(match self.invalid.take() {
                Some(prev) => prev.merge(err),
                None => err,
            });
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ValidationError> {
        let missing = std::mem::take(&mut self.missing);
        match (missing.is_empty(), self.invalid.take()) {
            (true, None) => Ok(()),
            (false, None) => Err(ValidationError::missing(missing)),
            (true, Some(invalid)) => Err(invalid),
            (false, Some(invalid)) => Err(ValidationError::missing(missing).merge(invalid)),
        }
    }
}

/// Toggle membership: remove `value` if present, otherwise append it.
pub fn toggle<T: PartialEq>(selection: &mut Vec<T>, value: T) {
    if let Some(pos) = selection.iter().position(|v| *v == value) {
        selection.remove(pos);
    } else {
        selection.push(value);
    }
}
