//! Sink-specific request bodies.

use serde_json::{Value, json};

use contactdesk_shared::PayloadFormat;
use contactdesk_validation::ValidatedSubmission;

/// All submission fields as a flat JSON object.
pub fn fields_json(submission: &ValidatedSubmission) -> Value {
    json!({
        "name": submission.name(),
        "company": submission.company(),
        "phone": submission.phone(),
        "email": submission.email(),
        "message": submission.message(),
        "locale": submission.locale(),
    })
}

/// Render the body for a sink of the given format.
pub fn render(format: PayloadFormat, submission: &ValidatedSubmission) -> Value {
    let fields = fields_json(submission);
    match format {
        PayloadFormat::Json => fields,
        PayloadFormat::Slack => json!({ "text": fields.to_string() }),
    }
}
