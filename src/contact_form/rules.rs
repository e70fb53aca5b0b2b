use std::fmt;
use std::str::FromStr;

use super::email::is_valid_email;
use crate::Error;

/// One named input slot of the contact form, in document (tab) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Name,
    Email,
    Subject,
    Message,
}

impl Field {
    /// Validation order, which is also the markup order.
    pub const ALL: [Field; 4] = [Field::Name, Field::Email, Field::Subject, Field::Message];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Subject => "subject",
            Self::Message => "message",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Name => 0,
            Self::Email => 1,
            Self::Subject => 2,
            Self::Message => 3,
        }
    }

    pub(crate) fn input_test_id(self) -> &'static str {
        match self {
            Self::Name => "test-contact-name",
            Self::Email => "test-contact-email",
            Self::Subject => "test-contact-subject",
            Self::Message => "test-contact-message",
        }
    }

    pub(crate) fn error_test_id(self) -> &'static str {
        match self {
            Self::Name => "test-contact-error-name",
            Self::Email => "test-contact-error-email",
            Self::Subject => "test-contact-error-subject",
            Self::Message => "test-contact-error-message",
        }
    }

    pub(crate) fn audit_label(self) -> &'static str {
        match self {
            Self::Name => "Name Input",
            Self::Email => "Email Input",
            Self::Subject => "Subject Input",
            Self::Message => "Message Input",
        }
    }

    /// Applies this field's rule to a raw input value.
    pub fn check(self, raw: &str) -> FieldVerdict {
        let value = trim_input(raw);
        if value.is_empty() {
            return FieldVerdict::Invalid(self.required_message().to_string());
        }

        let length = text_length(value);
        match self {
            Self::Name if length < 2 => {
                FieldVerdict::Invalid("Name must be at least 2 characters".into())
            }
            Self::Email if !is_valid_email(value) => FieldVerdict::Invalid(
                "Please enter a valid email (e.g., name@example.com)".into(),
            ),
            Self::Subject if length < 3 => {
                FieldVerdict::Invalid("Subject must be at least 3 characters".into())
            }
            Self::Message if length < 10 => FieldVerdict::Invalid(format!(
                "Message must be at least 10 characters ({length}/10)"
            )),
            _ => FieldVerdict::Valid,
        }
    }

    fn required_message(self) -> &'static str {
        match self {
            Self::Name => "Full name is required",
            Self::Email => "Email is required",
            Self::Subject => "Subject is required",
            Self::Message => "Message is required",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str() == value)
            .ok_or_else(|| Error::UnknownField(value.to_string()))
    }
}

/// Outcome of applying a field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldVerdict {
    Valid,
    Invalid(String),
}

impl FieldVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Error text to display; `None` when the value is accepted.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid(message) => Some(message),
        }
    }
}

// Matches `String.prototype.trim`: the WhiteSpace and LineTerminator sets.
fn trim_input(raw: &str) -> &str {
    raw.trim_matches(is_trimmed_space)
}

fn is_trimmed_space(ch: char) -> bool {
    matches!(
        ch,
        '\u{0009}'
            | '\u{000A}'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{000D}'
            | '\u{0020}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

// DOM string length counts UTF-16 code units.
fn text_length(value: &str) -> usize {
    value.encode_utf16().count()
}
