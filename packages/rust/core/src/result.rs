//! The caller-facing outcome of one submission.

use serde::ser::{Serialize, SerializeMap, Serializer};

use contactdesk_shared::FieldErrors;

/// Warning attached to an accepted submission whose notification failed.
pub const NOTIFICATION_FAILED: &str = "notification failed";

/// What the caller renders after a submission.
///
/// Serializes as `{"ok":true}`, `{"ok":true,"warning":"..."}` or
/// `{"ok":false,"fieldErrors":{...}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    /// Validated and every notification delivered.
    Accepted,
    /// Validated, but a notification could not be delivered.
    AcceptedWithWarning(String),
    /// Failed validation; nothing was dispatched.
    Rejected(FieldErrors),
}

impl SubmissionResult {
    /// Whether the submission was received (with or without a warning).
    pub fn is_ok(&self) -> bool {
        !matches!(self, SubmissionResult::Rejected(_))
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            SubmissionResult::AcceptedWithWarning(w) => Some(w),
            _ => None,
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            SubmissionResult::Rejected(errors) => Some(errors),
            _ => None,
        }
    }
}

impl Serialize for SubmissionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("ok", &self.is_ok())?;
        match self {
            SubmissionResult::Accepted => {}
            SubmissionResult::AcceptedWithWarning(warning) => {
                map.serialize_entry("warning", warning)?;
            }
            SubmissionResult::Rejected(errors) => {
                map.serialize_entry("fieldErrors", errors)?;
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contactdesk_shared::{ErrorReason, ValidationError};
    use serde_json::json;

    #[test]
    fn wire_shapes() {
        assert_eq!(
            serde_json::to_value(SubmissionResult::Accepted).unwrap(),
            json!({ "ok": true })
        );
        assert_eq!(
            serde_json::to_value(SubmissionResult::AcceptedWithWarning(
                NOTIFICATION_FAILED.into()
            ))
            .unwrap(),
            json!({ "ok": true, "warning": "notification failed" })
        );

        let errors: FieldErrors = [ValidationError::new("name", ErrorReason::Required)]
            .into_iter()
            .collect();
        assert_eq!(
            serde_json::to_value(SubmissionResult::Rejected(errors)).unwrap(),
            json!({ "ok": false, "fieldErrors": { "name": ["required"] } })
        );
    }

    #[test]
    fn accessors() {
        let warned = SubmissionResult::AcceptedWithWarning(NOTIFICATION_FAILED.into());
        assert!(warned.is_ok());
        assert_eq!(warned.warning(), Some(NOTIFICATION_FAILED));
        assert!(warned.field_errors().is_none());

        let rejected = SubmissionResult::Rejected(FieldErrors::new());
        assert!(!rejected.is_ok());
        assert!(rejected.field_errors().is_some());
    }
}
