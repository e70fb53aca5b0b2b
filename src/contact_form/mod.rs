//! Contact form validation and simulated submission.
//!
//! The controller owns four fields, their error slots, a submit control and a
//! success banner. It is an explicit state machine: a valid `submit` moves it
//! to [`SubmissionState::Loading`]; the `SubmissionComplete` timer resets the
//! form, shows the banner and returns to [`SubmissionState::Idle`]; the
//! `DismissBanner` timer hides the banner again.

mod email;
mod rules;

pub use email::is_valid_email;
pub use rules::{Field, FieldVerdict};

use crate::document::{Document, EventState, Handler, TimerTask};
use crate::dom::{Dom, NodeId};
use crate::scheduler::TimerId;
use crate::{Error, Result};

const FORM_SELECTOR: &str = "#contactForm";
const SUBMIT_SELECTOR: &str = "[data-testid=\"test-contact-submit\"]";
const SUCCESS_MESSAGE_SELECTOR: &str = "#success-message";
const BUTTON_LABEL_SELECTOR: &str = ".button-text";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Loading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormEvent {
    Submit,
    Blur(Field),
    Input(Field),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormTimer {
    SubmissionComplete,
    DismissBanner,
}

// Result of the simulated round trip. A failure variant would be handled in
// `ContactForm::complete_submission`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmissionOutcome {
    Delivered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFormConfig {
    submit_delay_ms: i64,
    banner_dismiss_ms: i64,
    sending_label: String,
    idle_label: String,
}

impl Default for ContactFormConfig {
    fn default() -> Self {
        Self {
            submit_delay_ms: 1000,
            banner_dismiss_ms: 5000,
            sending_label: "Sending...".into(),
            idle_label: "Send Message".into(),
        }
    }
}

impl ContactFormConfig {
    /// Simulated network latency between a valid submit and completion.
    pub fn submit_delay_ms(&self) -> i64 {
        self.submit_delay_ms
    }

    pub fn set_submit_delay_ms(&mut self, delay_ms: i64) -> Result<()> {
        self.submit_delay_ms = positive_duration("submit_delay_ms", delay_ms)?;
        Ok(())
    }

    /// How long the success banner stays up before hiding itself.
    pub fn banner_dismiss_ms(&self) -> i64 {
        self.banner_dismiss_ms
    }

    pub fn set_banner_dismiss_ms(&mut self, delay_ms: i64) -> Result<()> {
        self.banner_dismiss_ms = positive_duration("banner_dismiss_ms", delay_ms)?;
        Ok(())
    }

    pub fn sending_label(&self) -> &str {
        &self.sending_label
    }

    pub fn idle_label(&self) -> &str {
        &self.idle_label
    }

    /// Captions for the submit control while loading and while idle.
    pub fn set_labels(&mut self, sending: &str, idle: &str) -> Result<()> {
        if sending.trim().is_empty() || idle.trim().is_empty() {
            return Err(Error::Config("submit labels must not be blank".into()));
        }
        self.sending_label = sending.to_string();
        self.idle_label = idle.to_string();
        Ok(())
    }
}

pub(crate) fn positive_duration(name: &str, value: i64) -> Result<i64> {
    if value <= 0 {
        return Err(Error::Config(format!(
            "{name} must be a positive number of milliseconds (got {value})"
        )));
    }
    Ok(value)
}

/// Element handles the controller works against. Any handle may be missing;
/// the matching behavior is then skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFormElements {
    pub form: Option<NodeId>,
    pub submit: Option<NodeId>,
    pub success_message: Option<NodeId>,
    inputs: [Option<NodeId>; 4],
    error_slots: [Option<NodeId>; 4],
}

impl ContactFormElements {
    pub fn input(&self, field: Field) -> Option<NodeId> {
        self.inputs[field.index()]
    }

    pub fn error_slot(&self, field: Field) -> Option<NodeId> {
        self.error_slots[field.index()]
    }

    pub fn with_input(mut self, field: Field, node: NodeId) -> Self {
        self.inputs[field.index()] = Some(node);
        self
    }

    pub fn with_error_slot(mut self, field: Field, node: NodeId) -> Self {
        self.error_slots[field.index()] = Some(node);
        self
    }

    pub(crate) fn resolve(dom: &Dom) -> Result<Self> {
        let mut elements = Self {
            form: dom.query_selector(FORM_SELECTOR)?,
            submit: dom.query_selector(SUBMIT_SELECTOR)?,
            success_message: dom.query_selector(SUCCESS_MESSAGE_SELECTOR)?,
            ..Self::default()
        };
        for field in Field::ALL {
            elements.inputs[field.index()] =
                dom.query_selector(&test_id_selector(field.input_test_id()))?;
            elements.error_slots[field.index()] =
                dom.query_selector(&test_id_selector(field.error_test_id()))?;
        }
        Ok(elements)
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        [self.form, self.submit, self.success_message]
            .into_iter()
            .chain(self.inputs)
            .chain(self.error_slots)
            .flatten()
    }

    fn field_for_input(&self, node: NodeId) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|field| self.input(*field) == Some(node))
    }
}

fn test_id_selector(test_id: &str) -> String {
    format!("[data-testid=\"{test_id}\"]")
}

#[derive(Debug)]
pub(crate) struct ContactForm {
    config: ContactFormConfig,
    elements: ContactFormElements,
    state: SubmissionState,
    // Per-field validity record: true while the field shows an error.
    showing_error: [bool; 4],
    submission_timer: Option<TimerId>,
    banner_timer: Option<TimerId>,
    suppressed_blur: Option<Field>,
    initialized: bool,
}

impl ContactForm {
    pub(crate) fn new(config: ContactFormConfig, elements: ContactFormElements) -> Self {
        Self {
            config,
            elements,
            state: SubmissionState::Idle,
            showing_error: [false; 4],
            submission_timer: None,
            banner_timer: None,
            suppressed_blur: None,
            initialized: false,
        }
    }

    pub(crate) fn state(&self) -> SubmissionState {
        self.state
    }

    pub(crate) fn elements(&self) -> &ContactFormElements {
        &self.elements
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn init(&mut self, doc: &mut Document) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        if let Some(form) = self.elements.form {
            doc.listeners
                .add(form, "submit", Handler::ContactForm(FormEvent::Submit));
        }
        for field in Field::ALL {
            if let Some(input) = self.elements.input(field) {
                doc.listeners
                    .add(input, "blur", Handler::ContactForm(FormEvent::Blur(field)));
                doc.listeners
                    .add(input, "input", Handler::ContactForm(FormEvent::Input(field)));
            }
        }

        doc.console.log("Contact form initialized successfully");
        self.audit_required_elements(doc);
    }

    fn audit_required_elements(&self, doc: &mut Document) {
        let mut required = vec![("Form", self.elements.form)];
        required.extend(
            Field::ALL
                .into_iter()
                .map(|field| (field.audit_label(), self.elements.input(field))),
        );
        required.push(("Submit Button", self.elements.submit));

        let missing = required
            .into_iter()
            .filter(|(_, node)| node.is_none())
            .map(|(label, _)| label)
            .collect::<Vec<_>>();
        if missing.is_empty() {
            doc.console.log("All required form elements are present");
        } else {
            doc.console
                .warn(format!("Missing elements: {}", missing.join(", ")));
        }
    }

    /// Releases listeners and timers owned by this controller.
    pub(crate) fn detach(&mut self, doc: &mut Document) {
        let timers = doc
            .timers
            .clear_where(|task| matches!(task, TimerTask::ContactForm(_)));
        let listeners = doc
            .listeners
            .remove_where(|handler| matches!(handler, Handler::ContactForm(_)));
        self.submission_timer = None;
        self.banner_timer = None;
        tracing::debug!(timers, listeners, "contact form detached");
    }

    pub(crate) fn handle_event(
        &mut self,
        doc: &mut Document,
        event: FormEvent,
        state: &mut EventState,
    ) -> Result<()> {
        match event {
            FormEvent::Submit => self.on_submit(doc, state),
            FormEvent::Blur(field) => {
                if self.suppressed_blur == Some(field) {
                    self.suppressed_blur = None;
                    return Ok(());
                }
                self.validate_field(doc, field).map(|_| ())
            }
            FormEvent::Input(field) => {
                if self.showing_error[field.index()] {
                    self.validate_field(doc, field)?;
                }
                Ok(())
            }
        }
    }

    pub(crate) fn handle_timer(&mut self, doc: &mut Document, timer: FormTimer) -> Result<()> {
        match timer {
            FormTimer::SubmissionComplete => {
                self.submission_timer = None;
                let outcome = SubmissionOutcome::Delivered;
                self.complete_submission(doc, outcome)
            }
            FormTimer::DismissBanner => {
                self.banner_timer = None;
                self.hide_success_message(doc)
            }
        }
    }

    fn on_submit(&mut self, doc: &mut Document, event: &mut EventState) -> Result<()> {
        event.prevent_default();
        if self.state == SubmissionState::Loading {
            tracing::debug!("submit ignored while a submission is in flight");
            return Ok(());
        }

        self.hide_success_message(doc)?;
        if !self.validate_all(doc)? {
            doc.console.log("Form validation failed");
            self.focus_first_error(doc);
            return Ok(());
        }

        self.set_submission_state(doc, SubmissionState::Loading)?;
        let id = doc.timers.set_timeout(
            TimerTask::ContactForm(FormTimer::SubmissionComplete),
            self.config.submit_delay_ms,
        );
        self.submission_timer = Some(id);
        Ok(())
    }

    fn complete_submission(
        &mut self,
        doc: &mut Document,
        outcome: SubmissionOutcome,
    ) -> Result<()> {
        match outcome {
            SubmissionOutcome::Delivered => {
                if let Some(form) = self.elements.form {
                    doc.dom.reset_form(form)?;
                }
                self.clear_all_errors(doc)?;
                self.show_success_message(doc)?;
                doc.console.log("Form submitted successfully");
            }
        }
        self.set_submission_state(doc, SubmissionState::Idle)
    }

    /// Validates every field in order; never short-circuits.
    pub(crate) fn validate_all(&mut self, doc: &mut Document) -> Result<bool> {
        let mut all_valid = true;
        for field in Field::ALL {
            all_valid &= self.validate_field(doc, field)?;
        }
        Ok(all_valid)
    }

    pub(crate) fn validate_field(&mut self, doc: &mut Document, field: Field) -> Result<bool> {
        // A missing input reads as empty.
        let raw = match self.elements.input(field) {
            Some(input) => doc.dom.value(input)?,
            None => String::new(),
        };
        let verdict = field.check(&raw);
        self.showing_error[field.index()] = !verdict.is_valid();

        match verdict.message() {
            Some(message) => self.show_field_error(doc, field, message)?,
            None => self.clear_field_error(doc, field)?,
        }
        Ok(verdict.is_valid())
    }

    fn show_field_error(&self, doc: &mut Document, field: Field, message: &str) -> Result<()> {
        let (Some(input), Some(slot)) = (self.elements.input(field), self.elements.error_slot(field))
        else {
            return Ok(());
        };
        doc.dom.set_text_content(slot, message)?;
        doc.dom.set_style_property(slot, "display", "block")?;
        doc.dom.class_add(input, "error")?;
        doc.dom.set_attr(input, "aria-invalid", "true")
    }

    fn clear_field_error(&self, doc: &mut Document, field: Field) -> Result<()> {
        let (Some(input), Some(slot)) = (self.elements.input(field), self.elements.error_slot(field))
        else {
            return Ok(());
        };
        doc.dom.set_text_content(slot, "")?;
        doc.dom.set_style_property(slot, "display", "none")?;
        doc.dom.class_remove(input, "error")?;
        doc.dom.set_attr(input, "aria-invalid", "false")
    }

    fn clear_all_errors(&mut self, doc: &mut Document) -> Result<()> {
        for field in Field::ALL {
            self.showing_error[field.index()] = false;
            self.clear_field_error(doc, field)?;
        }
        Ok(())
    }

    fn focus_first_error(&self, doc: &mut Document) {
        // Only fields whose indicator was actually drawn count.
        let mut errored = Field::ALL
            .into_iter()
            .filter(|field| self.showing_error[field.index()])
            .filter(|field| self.elements.error_slot(*field).is_some())
            .filter_map(|field| self.elements.input(field))
            .collect::<Vec<_>>();
        doc.dom.sort_in_document_order(&mut errored);
        if let Some(first) = errored.first() {
            doc.focus(*first);
        }
    }

    fn set_submission_state(&mut self, doc: &mut Document, state: SubmissionState) -> Result<()> {
        tracing::debug!(from = ?self.state, to = ?state, "submission state");
        self.state = state;
        let Some(submit) = self.elements.submit else {
            return Ok(());
        };

        let loading = state == SubmissionState::Loading;
        doc.dom.set_disabled(submit, loading)?;
        let label = if loading {
            doc.dom.class_add(submit, "loading")?;
            self.config.sending_label.as_str()
        } else {
            doc.dom.class_remove(submit, "loading")?;
            self.config.idle_label.as_str()
        };

        // Controls without a dedicated label element carry the caption directly.
        let label_node = doc
            .dom
            .query_selector_all_from(submit, BUTTON_LABEL_SELECTOR)?
            .into_iter()
            .next()
            .unwrap_or(submit);
        doc.dom.set_text_content(label_node, label)
    }

    fn show_success_message(&mut self, doc: &mut Document) -> Result<()> {
        let Some(banner) = self.elements.success_message else {
            return Ok(());
        };
        doc.dom.class_remove(banner, "hidden")?;
        doc.dom.set_attr(banner, "tabindex", "-1")?;

        // The form was just reset; the blur from leaving a field must not
        // re-validate it.
        let previous = doc.active_element();
        if doc.focus(banner) {
            self.suppressed_blur = previous
                .filter(|node| *node != banner)
                .and_then(|node| self.elements.field_for_input(node));
        }

        if let Some(id) = self.banner_timer.take() {
            doc.timers.clear(id);
        }
        let id = doc.timers.set_timeout(
            TimerTask::ContactForm(FormTimer::DismissBanner),
            self.config.banner_dismiss_ms,
        );
        self.banner_timer = Some(id);
        Ok(())
    }

    fn hide_success_message(&mut self, doc: &mut Document) -> Result<()> {
        if let Some(id) = self.banner_timer.take() {
            doc.timers.clear(id);
        }
        match self.elements.success_message {
            Some(banner) => doc.dom.class_add(banner, "hidden"),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;

    const FORM: &str = r#"
        <form id="contactForm">
          <input data-testid="test-contact-name">
          <span data-testid="test-contact-error-name"></span>
          <input data-testid="test-contact-email">
          <span data-testid="test-contact-error-email"></span>
          <input data-testid="test-contact-subject">
          <span data-testid="test-contact-error-subject"></span>
          <textarea data-testid="test-contact-message"></textarea>
          <span data-testid="test-contact-error-message"></span>
          <button type="submit" data-testid="test-contact-submit"><span class="button-text">Send Message</span></button>
        </form>
        <div id="success-message" class="hidden">Thanks!</div>
    "#;

    fn setup(html: &str) -> Result<(Document, ContactForm)> {
        let dom = parse_html(html)?;
        let elements = ContactFormElements::resolve(&dom)?;
        let mut doc = Document::new(dom, 0, 100);
        let mut form = ContactForm::new(ContactFormConfig::default(), elements);
        form.init(&mut doc);
        Ok((doc, form))
    }

    fn set(doc: &mut Document, form: &ContactForm, field: Field, value: &str) -> Result<()> {
        let input = form
            .elements()
            .input(field)
            .ok_or_else(|| Error::Dom(format!("missing {field} input")))?;
        doc.dom.set_value(input, value)
    }

    #[test]
    fn resolves_every_element_from_markup() -> Result<()> {
        let dom = parse_html(FORM)?;
        let elements = ContactFormElements::resolve(&dom)?;
        assert!(elements.form.is_some());
        assert!(elements.submit.is_some());
        assert!(elements.success_message.is_some());
        for field in Field::ALL {
            assert!(elements.input(field).is_some(), "{field} input");
            assert!(elements.error_slot(field).is_some(), "{field} slot");
        }
        Ok(())
    }

    #[test]
    fn invalid_field_shows_error_and_valid_field_clears_it() -> Result<()> {
        let (mut doc, mut form) = setup(FORM)?;
        let input = form.elements().input(Field::Name).ok_or_else(|| Error::Dom("name".into()))?;
        let slot = form
            .elements()
            .error_slot(Field::Name)
            .ok_or_else(|| Error::Dom("slot".into()))?;

        assert!(!form.validate_field(&mut doc, Field::Name)?);
        assert_eq!(doc.dom.text_content(slot), "Full name is required");
        assert_eq!(doc.dom.style_property(slot, "display")?, "block");
        assert!(doc.dom.class_contains(input, "error")?);
        assert_eq!(doc.dom.attr(input, "aria-invalid").as_deref(), Some("true"));

        set(&mut doc, &form, Field::Name, "Jo")?;
        assert!(form.validate_field(&mut doc, Field::Name)?);
        assert_eq!(doc.dom.text_content(slot), "");
        assert_eq!(doc.dom.style_property(slot, "display")?, "none");
        assert!(!doc.dom.class_contains(input, "error")?);
        assert_eq!(doc.dom.attr(input, "aria-invalid").as_deref(), Some("false"));
        Ok(())
    }

    #[test]
    fn validate_all_does_not_short_circuit() -> Result<()> {
        let (mut doc, mut form) = setup(FORM)?;
        set(&mut doc, &form, Field::Message, "short")?;
        assert!(!form.validate_all(&mut doc)?);
        assert_eq!(form.showing_error, [true; 4]);
        Ok(())
    }

    #[test]
    fn missing_slot_skips_display_but_still_validates() -> Result<()> {
        let (mut doc, mut form) = setup(r#"<form id="contactForm"><input data-testid="test-contact-name"></form>"#)?;
        assert!(!form.validate_field(&mut doc, Field::Name)?);
        set(&mut doc, &form, Field::Name, "Ada")?;
        assert!(form.validate_field(&mut doc, Field::Name)?);
        // No email input at all reads as empty.
        assert!(!form.validate_field(&mut doc, Field::Email)?);
        Ok(())
    }

    #[test]
    fn init_reports_missing_elements_once() -> Result<()> {
        let (mut doc, mut form) = setup(r#"<form id="contactForm"><input data-testid="test-contact-name"></form>"#)?;
        form.init(&mut doc);
        let messages = doc
            .console
            .take()
            .into_iter()
            .map(|entry| entry.message)
            .collect::<Vec<_>>();
        assert_eq!(
            messages,
            vec![
                "Contact form initialized successfully".to_string(),
                "Missing elements: Email Input, Subject Input, Message Input, Submit Button"
                    .to_string(),
            ]
        );
        Ok(())
    }

    #[test]
    fn valid_submit_enters_loading_and_schedules_completion() -> Result<()> {
        let (mut doc, mut form) = setup(FORM)?;
        set(&mut doc, &form, Field::Name, "Jo")?;
        set(&mut doc, &form, Field::Email, "a@b.co")?;
        set(&mut doc, &form, Field::Subject, "Hi!")?;
        set(&mut doc, &form, Field::Message, "1234567890")?;

        let form_node = form.elements().form.ok_or_else(|| Error::Dom("form".into()))?;
        let mut event = EventState::new("submit", form_node);
        form.handle_event(&mut doc, FormEvent::Submit, &mut event)?;

        assert!(event.default_prevented);
        assert_eq!(form.state(), SubmissionState::Loading);
        let pending = doc.timers.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].due_at, 1000);

        // A second submit while loading changes nothing.
        let mut again = EventState::new("submit", form_node);
        form.handle_event(&mut doc, FormEvent::Submit, &mut again)?;
        assert!(again.default_prevented);
        assert_eq!(doc.timers.pending().len(), 1);
        Ok(())
    }

    #[test]
    fn config_rejects_non_positive_durations() {
        let mut config = ContactFormConfig::default();
        assert!(matches!(config.set_submit_delay_ms(0), Err(Error::Config(_))));
        assert!(matches!(config.set_banner_dismiss_ms(-5), Err(Error::Config(_))));
        assert!(matches!(config.set_labels(" ", "Send"), Err(Error::Config(_))));
        assert_eq!(config.submit_delay_ms(), 1000);
        assert_eq!(config.banner_dismiss_ms(), 5000);
        assert_eq!(config.sending_label(), "Sending...");
        assert_eq!(config.idle_label(), "Send Message");
    }
}
