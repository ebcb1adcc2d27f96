//! Service layer for business logic
//!
//! Shared by the HTTP handlers and the batch commands. Services hold an
//! `Arc<SeaOrmStorage>` and return `PortalError` on failure; form checks
//! collect every field error before anything is written.

mod accounts;
mod articles;
mod editorial;
mod feedback;
pub mod media;
mod personalization;
mod polls;
mod saved;

pub use accounts::*;
pub use articles::*;
pub use editorial::*;
pub use feedback::*;
pub use media::{MediaKind, MediaStore};
pub use personalization::*;
pub use polls::*;
pub use saved::*;

use validator::Validate;

use crate::errors::{FieldErrors, PortalError, Result};

/// Field errors reported by the form's `validator` rules
pub(crate) fn form_errors<T: Validate>(form: &T) -> FieldErrors {
    match form.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => match PortalError::from(e) {
            PortalError::InvalidForm(fields) => fields,
            _ => FieldErrors::new(),
        },
    }
}

pub(crate) fn push_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

/// `Ok(())` when no field failed
pub(crate) fn finish_form(errors: FieldErrors) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(PortalError::InvalidForm(errors))
    }
}

/// Trimmed text, `None` when blank
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
