//! Contact form validation.
//!
//! Turns an untrusted [`SubmissionInput`] into either a [`ValidatedSubmission`]
//! or the full set of field errors. Validation is pure: it never fails, never
//! touches I/O, and reports every failing field rather than stopping at the
//! first one.

mod rules;

use serde::Serialize;
use tracing::debug;

use contactdesk_shared::{ErrorReason, Field, FieldErrors, SubmissionInput, ValidationError};

pub use rules::is_valid_email;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A submission that passed validation.
///
/// Only [`validate`] can build one. `name`, `email` and `message` are
/// non-blank and `email` is well-formed; optional fields are `""` when they
/// were not supplied. Values are kept exactly as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedSubmission {
    name: String,
    company: String,
    phone: String,
    email: String,
    message: String,
    locale: String,
}

impl ValidatedSubmission {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid(ValidatedSubmission),
    Invalid(FieldErrors),
}

impl ValidationResult {
    /// Convert into a `Result`, with field errors on the error side.
    pub fn into_result(self) -> std::result::Result<ValidatedSubmission, FieldErrors> {
        match self {
            ValidationResult::Valid(s) => Ok(s),
            ValidationResult::Invalid(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Validate a raw contact submission.
pub fn validate(input: &SubmissionInput) -> ValidationResult {
    let errors: FieldErrors = field_errors(input).collect();

    if !errors.is_empty() {
        debug!(fields = ?errors.fields(), "submission rejected by validator");
        return ValidationResult::Invalid(errors);
    }

    let owned = |field: Field| input.get(field).unwrap_or_default().to_string();

    ValidationResult::Valid(ValidatedSubmission {
        name: owned(Field::Name),
        company: owned(Field::Company),
        phone: owned(Field::Phone),
        email: owned(Field::Email),
        message: owned(Field::Message),
        locale: owned(Field::Locale),
    })
}

/// Every rule violation in `input`, in field order.
fn field_errors(input: &SubmissionInput) -> impl Iterator<Item = ValidationError> + '_ {
    Field::ALL
        .into_iter()
        .filter_map(|field| check_field(field, input.get(field)))
}

fn check_field(field: Field, value: Option<&str>) -> Option<ValidationError> {
    let reason = match field {
        Field::Name | Field::Message if rules::is_blank(value) => ErrorReason::Required,
        Field::Email if rules::is_blank(value) => ErrorReason::Required,
        Field::Email if !rules::is_valid_email(value.unwrap_or_default()) => {
            ErrorReason::InvalidFormat
        }
        _ => return None,
    };
    Some(ValidationError::new(field.as_str(), reason))
}
