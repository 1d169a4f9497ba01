//! Privacy protection for records shown outside their owner's session.
//!
//! - **Field masking**: register numbers, phone numbers and emails in JSON
//!   records are truncated before they reach public listings.
//!
//! - **Free-text redaction**: the same kinds of data are found by regex and
//!   masked inside audit text when the deployment asks for it.
//!
//! # Example
//!
//! ```
//! use labreg::privacy::PiiMasker;
//! use serde_json::json;
//!
//! let masked = PiiMasker::default().mask(&json!({ "am": 13628, "name": "Eleni" }));
//! assert_eq!(masked["am"], "13***28");
//! assert_eq!(masked["name"], "Eleni");
//! ```

mod mask;
mod patterns;

pub use mask::{mask_email, mask_field, mask_identifier, PiiMasker, DEFAULT_MASK_FIELDS};
pub use patterns::{builtin_patterns, redact_text, RedactionPattern};
