//! Core domain types shared by the ContactDesk crates.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// SubmissionId
// ---------------------------------------------------------------------------

/// A UUID v7 identifying one submission in logs (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
    /// Generate a new time-sortable submission identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Field names and error reasons
// ---------------------------------------------------------------------------

/// A named contact-form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Company,
    Phone,
    Email,
    Message,
    Locale,
}

impl Field {
    /// Every contact field, in form order.
    pub const ALL: [Field; 6] = [
        Field::Name,
        Field::Company,
        Field::Phone,
        Field::Email,
        Field::Message,
        Field::Locale,
    ];

    /// Wire name of the field.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Company => "company",
            Field::Phone => "phone",
            Field::Email => "email",
            Field::Message => "message",
            Field::Locale => "locale",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown field '{s}'"))
    }
}

/// Why a single field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
    /// Absent, empty, or whitespace-only.
    Required,
    /// Present but does not match the expected shape.
    InvalidFormat,
    /// Longer than the field's limit.
    TooLong,
}

impl ErrorReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorReason::Required => "required",
            ErrorReason::InvalidFormat => "invalid_format",
            ErrorReason::TooLong => "too_long",
        }
    }
}

impl std::fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validation failure tied to a named field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub reason: ErrorReason,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: ErrorReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }
}

// ---------------------------------------------------------------------------
// FieldErrors
// ---------------------------------------------------------------------------

/// Field name → ordered list of reasons.
///
/// Fields keep the order they were first reported in, so a validator that
/// walks the form top to bottom reports errors in form order. Entries are
/// only created by [`FieldErrors::push`], so a field present in the map always
/// has at least one reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(IndexMap<String, Vec<ErrorReason>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`, after any earlier ones for it.
    pub fn push(&mut self, error: ValidationError) {
        self.0.entry(error.field).or_default().push(error.reason);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with at least one error.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Reasons recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&[ErrorReason]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Iterate `(field, reasons)` in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ErrorReason])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Field names with errors, in reporting order.
    pub fn fields(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }
}

impl FromIterator<ValidationError> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        let mut errors = FieldErrors::new();
        for e in iter {
            errors.push(e);
        }
        errors
    }
}

// ---------------------------------------------------------------------------
// SubmissionInput
// ---------------------------------------------------------------------------

/// Raw, untrusted contact-form values for one request.
///
/// Deserializes from JSON or form-encoded bodies; unknown keys are ignored
/// and absent keys stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl SubmissionInput {
    /// Build from a field name → value mapping, ignoring unknown names.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut input = SubmissionInput::default();
        for (key, value) in fields {
            if let Ok(field) = key.as_ref().parse::<Field>() {
                input.set(field, value.into());
            }
        }
        input
    }

    /// Raw value of `field`, if supplied.
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Name => self.name.as_deref(),
            Field::Company => self.company.as_deref(),
            Field::Phone => self.phone.as_deref(),
            Field::Email => self.email.as_deref(),
            Field::Message => self.message.as_deref(),
            Field::Locale => self.locale.as_deref(),
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Company => &mut self.company,
            Field::Phone => &mut self.phone,
            Field::Email => &mut self.email,
            Field::Message => &mut self.message,
            Field::Locale => &mut self.locale,
        };
        *slot = Some(value);
    }
}
