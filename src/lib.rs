//! Contact form and profile card controllers running against a small,
//! deterministic document model.
//!
//! A [`Page`] parses markup into an in-memory document, owns a virtual clock,
//! and routes user actions (typing, focus changes, clicks, submits, image
//! loads) and elapsed timers to the controllers attached to it.
//!
//! ```
//! use pagekit::{ContactFormConfig, Field, Page};
//!
//! # fn main() -> pagekit::Result<()> {
//! let mut page = Page::from_html(
//!     r#"<form id="contactForm">
//!          <input data-testid="test-contact-name">
//!          <span data-testid="test-contact-error-name"></span>
//!        </form>"#,
//! )?;
//! page.attach_contact_form(ContactFormConfig::default())?;
//! page.finish_loading()?;
//!
//! let mut form = page.contact_form().expect("form attached");
//! assert!(!form.validate_field(Field::Name)?);
//! page.assert_text(
//!     "[data-testid='test-contact-error-name']",
//!     "Full name is required",
//! )?;
//! # Ok(())
//! # }
//! ```

mod console;
pub mod contact_form;
mod date_time;
mod document;
mod dom;
mod html;
mod page;
mod pattern;
pub mod profile_card;
mod scheduler;
mod selector;

pub use console::{ConsoleEntry, ConsoleLevel};
pub use contact_form::{
    ContactFormConfig, ContactFormElements, Field, FieldVerdict, SubmissionState, is_valid_email,
};
pub use date_time::format_iso_8601_utc;
pub use dom::NodeId;
pub use page::{ContactFormHandle, EventOutcome, Page, PageConfig, ProfileCardHandle, ReadyState};
pub use profile_card::{ProfileCardConfig, ProfileCardElements};
pub use scheduler::{PendingTimer, TimerId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("html parse error: {0}")]
    HtmlParse(String),
    #[error("dom error: {0}")]
    Dom(String),
    #[error("timer error: {0}")]
    Timer(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("unknown form field: {0}")]
    UnknownField(String),
    #[error("selector not found: {0}")]
    SelectorNotFound(String),
    #[error("unsupported selector: {0}")]
    UnsupportedSelector(String),
    #[error("type mismatch for {selector}: expected {expected}, actual {actual}")]
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    #[error(
        "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
    )]
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}
