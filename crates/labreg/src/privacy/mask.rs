//! Field-level masking of personal data in public views.

use serde_json::{Map, Value};

/// Fields masked when no explicit list is given.
pub const DEFAULT_MASK_FIELDS: &[&str] = &["email", "am", "tel"];

/// Masks personally identifying fields of JSON records.
#[derive(Debug, Clone)]
pub struct PiiMasker {
    fields: Vec<String>,
}

impl Default for PiiMasker {
    fn default() -> Self {
        Self::new(DEFAULT_MASK_FIELDS.iter().copied())
    }
}

impl PiiMasker {
    /// Create a masker for the given field names.
    #[must_use]
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Field names this masker touches.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Mask a JSON value.
    ///
    /// Objects get their listed fields masked; any other value is returned
    /// unchanged.
    #[must_use]
    pub fn mask(&self, data: &Value) -> Value {
        match data {
            Value::Object(map) => Value::Object(self.mask_object(map)),
            other => other.clone(),
        }
    }

    /// Serialize `record` and mask it.
    ///
    /// # Errors
    ///
    /// Returns an error if `record` cannot be serialized.
    pub fn mask_record<T: serde::Serialize>(&self, record: &T) -> serde_json::Result<Value> {
        Ok(self.mask(&serde_json::to_value(record)?))
    }

    fn mask_object(&self, map: &Map<String, Value>) -> Map<String, Value> {
        let mut masked = map.clone();
        for field in &self.fields {
            let Some(value) = masked.get_mut(field) else {
                continue;
            };
            let text = match &*value {
                Value::Null | Value::Bool(false) => continue,
                Value::String(s) if s.is_empty() => continue,
                Value::Number(n) if n.as_i64() == Some(0) => continue,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if let Some(replacement) = mask_field(field, &text) {
                *value = Value::String(replacement);
            }
        }
        masked
    }
}

/// Mask one field value by name.
///
/// Returns `None` when the field has no masking rule or the value does not
/// have the expected shape (an email without exactly one `@`).
#[must_use]
pub fn mask_field(field: &str, value: &str) -> Option<String> {
    match field {
        "email" => mask_email(value),
        _ => Some(mask_identifier(value)),
    }
}

/// `jane@uni.gr` becomes `ja***@uni.gr`.
#[must_use]
pub fn mask_email(email: &str) -> Option<String> {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    let prefix: String = local.chars().take(2).collect();
    Some(format!("{prefix}***@{domain}"))
}

/// Keep the first and last two characters of values longer than four.
#[must_use]
pub fn mask_identifier(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 4 {
        let head: String = chars[..2].iter().collect();
        let tail: String = chars[chars.len() - 2..].iter().collect();
        format!("{head}***{tail}")
    } else {
        "***".to_string()
    }
}
