//! Submission validation: resource hooks, per-column rule chains and type checks.

use crate::error::InvalidInput;
use crate::model::{ColumnDefinition, FormPostEntry, Resource, ValidationMode, ValidationRule};

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

impl ValidationRule {
    /// Check one raw submitted value against this rule.
    pub fn check(&self, column: &ColumnDefinition, value: &str) -> Result<(), InvalidInput> {
        let name = &column.name;
        match self {
            ValidationRule::Required => {
                if is_blank(value) {
                    return Err(InvalidInput::Rejected(format!("{} is empty but is required", name)));
                }
            }
            ValidationRule::MinimumLength(n) => {
                if is_blank(value) || value.chars().count() < *n {
                    return Err(InvalidInput::Rejected(format!(
                        "{} is less than {} characters",
                        name, n
                    )));
                }
            }
            ValidationRule::MaximumLength(n) => {
                if value.chars().count() > *n {
                    return Err(InvalidInput::Rejected(format!(
                        "{} is more than {} characters long",
                        name, n
                    )));
                }
            }
            ValidationRule::Pattern(re) => {
                if !is_blank(value) && !re.is_match(value) {
                    return Err(InvalidInput::Rejected(format!(
                        "{} does not match required pattern",
                        name
                    )));
                }
            }
            ValidationRule::Custom(f) => f(column, value)?,
        }
        Ok(())
    }
}

pub struct InputValidator;

impl InputValidator {
    /// Validate `entry` for `resource`. Stops at the first failure; hooks may rewrite the entry.
    pub fn validate(
        entry: &mut FormPostEntry,
        resource: &Resource,
        mode: ValidationMode,
    ) -> Result<(), InvalidInput> {
        if let Some(hook) = resource.before_validation() {
            hook(mode, entry)?;
        }

        if mode == ValidationMode::Edit {
            for key in resource.primary_keys() {
                match entry.key_value(&key.name) {
                    Some(v) if !is_blank(v) => {}
                    _ => return Err(InvalidInput::MissingKeyColumn(key.name.clone())),
                }
            }
        }

        for (column, value) in entry.values() {
            if !column.editable {
                return Err(InvalidInput::ColumnNotEditable(column.name.clone()));
            }
            for rule in &column.rules {
                rule.check(column, value)?;
            }
        }

        for (column, value) in entry.key_values().iter().chain(entry.values()) {
            column.column_type.parse(&column.name, value)?;
        }

        if let Some(hook) = resource.after_validation() {
            hook(mode, entry)?;
        }
        Ok(())
    }
}
