use validator::ValidationErrors;

/// Flatten validation errors into human readable messages.
///
/// Fields are visited in name order so the output is stable across runs.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    let mut messages = Vec::new();
    for (field, errors) in fields {
        for error in errors.iter() {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value for field '{}'", field));
            messages.push(message);
        }
    }

    messages
}
