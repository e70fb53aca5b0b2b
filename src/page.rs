//! The deterministic host page.
//!
//! [`Page`] owns the parsed document, the virtual clock and the attached
//! controllers. User actions and timer runs are routed through it; assertions
//! report failures with a snippet of the offending node.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::console::ConsoleEntry;
use crate::contact_form::{
    ContactForm, ContactFormConfig, ContactFormElements, Field, SubmissionState, is_valid_email,
};
use crate::document::{Document, EventState, Handler, TimerTask};
use crate::dom::{NodeId, truncate_chars};
use crate::html::parse_html;
use crate::profile_card::{ProfileCard, ProfileCardConfig, ProfileCardElements};
use crate::scheduler::{PendingTimer, ScheduledTask, TimerId};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageConfig {
    clock_origin_ms: i64,
    timer_step_limit: usize,
    console_limit: usize,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            clock_origin_ms: 0,
            timer_step_limit: 10_000,
            console_limit: 1_000,
        }
    }
}

impl PageConfig {
    /// Starts the virtual clock at the current wall-clock time.
    pub fn with_system_clock() -> Self {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        Self {
            clock_origin_ms: now_ms,
            ..Self::default()
        }
    }

    pub fn clock_origin_ms(&self) -> i64 {
        self.clock_origin_ms
    }

    pub fn set_clock_origin_ms(&mut self, origin_ms: i64) -> Result<()> {
        if origin_ms < 0 {
            return Err(Error::Config(
                "clock origin must be a non-negative epoch time".into(),
            ));
        }
        self.clock_origin_ms = origin_ms;
        Ok(())
    }

    pub fn timer_step_limit(&self) -> usize {
        self.timer_step_limit
    }

    /// Upper bound on timer callbacks per run; guards against intervals that
    /// are never cleared.
    pub fn set_timer_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::Config(
                "set_timer_step_limit requires at least 1 step".into(),
            ));
        }
        self.timer_step_limit = max_steps;
        Ok(())
    }

    pub fn console_limit(&self) -> usize {
        self.console_limit
    }

    pub fn set_console_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Config(
                "set_console_limit requires at least 1 entry".into(),
            ));
        }
        self.console_limit = max_entries;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Complete,
    Unloaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventOutcome {
    pub default_prevented: bool,
}

#[derive(Debug)]
pub struct Page {
    document: Document,
    config: PageConfig,
    ready_state: ReadyState,
    contact_form: Option<ContactForm>,
    profile_card: Option<ProfileCard>,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_with_config(html, PageConfig::default())
    }

    pub fn from_html_with_config(html: &str, config: PageConfig) -> Result<Self> {
        let dom = parse_html(html)?;
        let document = Document::new(dom, config.clock_origin_ms, config.console_limit);
        Ok(Self {
            document,
            config,
            ready_state: ReadyState::Loading,
            contact_form: None,
            profile_card: None,
        })
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn set_timer_step_limit(&mut self, max_steps: usize) -> Result<()> {
        self.config.set_timer_step_limit(max_steps)
    }

    pub fn set_console_limit(&mut self, max_entries: usize) -> Result<()> {
        self.config.set_console_limit(max_entries)?;
        self.document.console.set_limit(max_entries);
        Ok(())
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn resolve_contact_form_elements(&self) -> Result<ContactFormElements> {
        ContactFormElements::resolve(&self.document.dom)
    }

    pub fn resolve_profile_card_elements(&self) -> Result<ProfileCardElements> {
        ProfileCardElements::resolve(&self.document.dom)
    }

    /// Attaches the contact form controller to elements found in the page.
    pub fn attach_contact_form(&mut self, config: ContactFormConfig) -> Result<()> {
        let elements = self.resolve_contact_form_elements()?;
        self.attach_contact_form_with(config, elements)
    }

    pub fn attach_contact_form_with(
        &mut self,
        config: ContactFormConfig,
        elements: ContactFormElements,
    ) -> Result<()> {
        self.ensure_attachable("contact form", self.contact_form.is_some())?;
        self.ensure_elements(elements.nodes())?;
        self.contact_form = Some(ContactForm::new(config, elements));
        if self.ready_state == ReadyState::Complete {
            self.init_controllers()?;
        }
        Ok(())
    }

    pub fn attach_profile_card(&mut self, config: ProfileCardConfig) -> Result<()> {
        let elements = self.resolve_profile_card_elements()?;
        self.attach_profile_card_with(config, elements)
    }

    pub fn attach_profile_card_with(
        &mut self,
        config: ProfileCardConfig,
        elements: ProfileCardElements,
    ) -> Result<()> {
        self.ensure_attachable("profile card", self.profile_card.is_some())?;
        self.ensure_elements(elements.nodes())?;
        self.profile_card = Some(ProfileCard::new(config, elements));
        if self.ready_state == ReadyState::Complete {
            self.init_controllers()?;
        }
        Ok(())
    }

    fn ensure_attachable(&self, what: &str, already_attached: bool) -> Result<()> {
        if self.ready_state == ReadyState::Unloaded {
            return Err(Error::Dom(format!("cannot attach {what} to an unloaded page")));
        }
        if already_attached {
            return Err(Error::Config(format!("{what} is already attached")));
        }
        Ok(())
    }

    fn ensure_elements(&self, nodes: impl Iterator<Item = NodeId>) -> Result<()> {
        for node in nodes {
            if self.document.dom.element(node).is_none() {
                return Err(Error::Dom(format!(
                    "node {} is not an element of this page",
                    node.0
                )));
            }
        }
        Ok(())
    }

    /// Signals that the document is ready. Deferred controllers initialize
    /// now; later calls do nothing.
    pub fn finish_loading(&mut self) -> Result<()> {
        if self.ready_state != ReadyState::Loading {
            return Ok(());
        }
        self.ready_state = ReadyState::Complete;
        tracing::debug!(now_ms = self.document.timers.now_ms(), "document ready");
        self.init_controllers()
    }

    fn init_controllers(&mut self) -> Result<()> {
        if let Some(form) = self.contact_form.as_mut() {
            form.init(&mut self.document);
        }
        if let Some(card) = self.profile_card.as_mut() {
            card.init(&mut self.document)?;
        }
        self.deliver_queued_events()
    }

    /// Tears the page down: controller timers and listeners are dropped.
    pub fn unload(&mut self) {
        if self.ready_state == ReadyState::Unloaded {
            return;
        }
        if let Some(mut form) = self.contact_form.take() {
            form.detach(&mut self.document);
        }
        if let Some(mut card) = self.profile_card.take() {
            card.detach(&mut self.document);
        }
        self.ready_state = ReadyState::Unloaded;
        tracing::debug!(pending_timers = self.document.timers.len(), "page unloaded");
    }

    /// Testing surface of the contact form, once it has initialized.
    pub fn contact_form(&mut self) -> Option<ContactFormHandle<'_>> {
        self.contact_form
            .as_ref()
            .is_some_and(ContactForm::is_initialized)
            .then_some(ContactFormHandle { page: self })
    }

    pub fn profile_card(&mut self) -> Option<ProfileCardHandle<'_>> {
        self.profile_card
            .as_ref()
            .is_some_and(ProfileCard::is_initialized)
            .then_some(ProfileCardHandle { page: self })
    }

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.text_control(selector)?;
        if self.document.dom.disabled(target) {
            return Ok(());
        }
        self.document.dom.set_value(target, text)?;
        self.dispatch_event(target, "input")?;
        Ok(())
    }

    /// Types `text` one character at a time, firing `input` after each.
    pub fn type_keys(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.text_control(selector)?;
        if self.document.dom.disabled(target) {
            return Ok(());
        }
        for ch in text.chars() {
            let mut value = self.document.dom.value(target)?;
            value.push(ch);
            self.document.dom.set_value(target, &value)?;
            self.dispatch_event(target, "input")?;
        }
        Ok(())
    }

    fn text_control(&self, selector: &str) -> Result<NodeId> {
        let target = self.select_one(selector)?;
        let tag = self
            .document
            .dom
            .tag_name(target)
            .unwrap_or_default()
            .to_ascii_lowercase();
        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }
        Ok(target)
    }

    pub fn focus(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.document.focus(target);
        self.deliver_queued_events()
    }

    pub fn blur(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.document.blur(target);
        self.deliver_queued_events()
    }

    /// Clicks an element. Disabled controls ignore clicks; submit controls
    /// submit their form unless the click was canceled.
    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.document.dom.disabled(target) {
            return Ok(());
        }
        if self.is_focusable(target) {
            self.document.focus(target);
            self.deliver_queued_events()?;
        }

        let outcome = self.dispatch_event(target, "click")?;
        if outcome.default_prevented || !self.is_submit_control(target) {
            return Ok(());
        }
        match self.document.dom.find_ancestor_by_tag(target, "form") {
            Some(form) => self.request_submit(form).map(|_| ()),
            None => Ok(()),
        }
    }

    /// Submits the form at `selector` (or the form containing it).
    pub fn submit(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let form = if self.document.dom.is_tag(target, "form") {
            Some(target)
        } else {
            self.document.dom.find_ancestor_by_tag(target, "form")
        };
        match form {
            Some(form) => self.request_submit(form).map(|_| ()),
            None => Ok(()),
        }
    }

    fn request_submit(&mut self, form: NodeId) -> Result<EventOutcome> {
        let outcome = self.dispatch_event(form, "submit")?;
        if !outcome.default_prevented {
            tracing::debug!(form = form.0, "form submission was not intercepted");
        }
        Ok(outcome)
    }

    pub fn dispatch(&mut self, selector: &str, event: &str) -> Result<EventOutcome> {
        let target = self.select_one(selector)?;
        self.dispatch_event(target, event)
    }

    /// Fires `load` on an image.
    pub fn load_image(&mut self, selector: &str) -> Result<()> {
        let target = self.image(selector)?;
        self.dispatch_event(target, "load").map(|_| ())
    }

    /// Fires `error` on an image, as when its source fails to load.
    pub fn fail_image(&mut self, selector: &str) -> Result<()> {
        let target = self.image(selector)?;
        self.dispatch_event(target, "error").map(|_| ())
    }

    fn image(&self, selector: &str) -> Result<NodeId> {
        let target = self.select_one(selector)?;
        if !self.document.dom.is_tag(target, "img") {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "img".into(),
                actual: self
                    .document
                    .dom
                    .tag_name(target)
                    .unwrap_or_default()
                    .to_ascii_lowercase(),
            });
        }
        Ok(target)
    }

    fn is_focusable(&self, node: NodeId) -> bool {
        let dom = &self.document.dom;
        ["input", "textarea", "button", "select", "a"]
            .iter()
            .any(|tag| dom.is_tag(node, tag))
            || dom.attr(node, "tabindex").is_some()
    }

    fn is_submit_control(&self, node: NodeId) -> bool {
        let dom = &self.document.dom;
        let kind = dom
            .attr(node, "type")
            .map(|kind| kind.to_ascii_lowercase());
        if dom.is_tag(node, "button") {
            return kind.as_deref().is_none_or(|kind| kind == "submit");
        }
        dom.is_tag(node, "input") && kind.as_deref() == Some("submit")
    }

    fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<EventOutcome> {
        let outcome = self.dispatch_now(target, event_type)?;
        self.deliver_queued_events()?;
        Ok(outcome)
    }

    fn dispatch_now(&mut self, target: NodeId, event_type: &str) -> Result<EventOutcome> {
        let mut event = EventState::new(event_type, target);
        let path = if event.bubbles() {
            let mut path = vec![target];
            let mut cursor = self.document.dom.parent(target);
            while let Some(node) = cursor {
                path.push(node);
                cursor = self.document.dom.parent(node);
            }
            path
        } else {
            vec![target]
        };

        for node in path {
            event.current_target = node;
            for handler in self.document.listeners.get(node, event_type) {
                self.invoke(handler, &mut event)?;
            }
        }
        tracing::trace!(
            event = %event.event_type,
            target = target.0,
            default_prevented = event.default_prevented,
            "dispatched"
        );
        Ok(EventOutcome {
            default_prevented: event.default_prevented,
        })
    }

    fn invoke(&mut self, handler: Handler, event: &mut EventState) -> Result<()> {
        tracing::trace!(
            ?handler,
            target = event.target.0,
            current_target = event.current_target.0,
            "invoke listener"
        );
        match handler {
            Handler::ContactForm(form_event) => match self.contact_form.as_mut() {
                Some(form) => form.handle_event(&mut self.document, form_event, event),
                None => Ok(()),
            },
            Handler::ProfileCard(card_event) => match self.profile_card.as_mut() {
                Some(card) => card.handle_event(&mut self.document, card_event, event),
                None => Ok(()),
            },
        }
    }

    fn deliver_queued_events(&mut self) -> Result<()> {
        while let Some((node, event_type)) = self.document.next_queued_event() {
            self.dispatch_now(node, event_type)?;
        }
        Ok(())
    }

    pub fn now_ms(&self) -> i64 {
        self.document.timers.now_ms()
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        self.document.timers.pending()
    }

    pub fn clear_timer(&mut self, id: TimerId) -> bool {
        self.document.timers.clear(id)
    }

    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if delta_ms < 0 {
            return Err(Error::Timer(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let from = self.now_ms();
        let to = from.saturating_add(delta_ms);
        self.advance_clock(to)?;
        tracing::debug!(delta_ms, from, to, "advance time");
        Ok(())
    }

    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        let now_ms = self.now_ms();
        if target_ms < now_ms {
            return Err(Error::Timer(format!(
                "advance_time_to requires target >= now_ms (target={target_ms}, now_ms={now_ms})"
            )));
        }
        self.advance_clock(target_ms)?;
        tracing::debug!(from = now_ms, to = target_ms, "advance time to");
        Ok(())
    }

    // Runs each due timer with the clock at its own due time, then settles
    // the clock at `target_ms`.
    fn advance_clock(&mut self, target_ms: i64) -> Result<()> {
        self.run_timer_queue(Some(target_ms), true)?;
        self.document.timers.set_now_ms(target_ms);
        Ok(())
    }

    /// Runs every pending timer, moving the clock forward as needed. Fails
    /// with a step-limit error while an interval is still scheduled.
    pub fn flush(&mut self) -> Result<()> {
        let from = self.now_ms();
        let ran = self.run_timer_queue(None, true)?;
        tracing::debug!(from, to = self.now_ms(), ran, "flush");
        Ok(())
    }

    pub fn run_next_timer(&mut self) -> Result<bool> {
        let Some(task) = self.document.timers.begin_next(None, true) else {
            return Ok(false);
        };
        self.execute_timer(task)?;
        Ok(true)
    }

    pub fn run_due_timers(&mut self) -> Result<usize> {
        let now_ms = self.now_ms();
        self.run_timer_queue(Some(now_ms), false)
    }

    fn run_timer_queue(&mut self, due_limit: Option<i64>, advance_clock: bool) -> Result<usize> {
        let max_steps = self.config.timer_step_limit;
        let mut steps = 0usize;
        while self.document.timers.next_due_at(due_limit).is_some() {
            steps += 1;
            if steps > max_steps {
                return Err(self.timer_step_limit_error(max_steps, steps, due_limit));
            }
            let Some(task) = self.document.timers.begin_next(due_limit, advance_clock) else {
                break;
            };
            self.execute_timer(task)?;
        }
        Ok(steps)
    }

    fn timer_step_limit_error(&self, max_steps: usize, steps: usize, due_limit: Option<i64>) -> Error {
        let due_limit_desc = due_limit
            .map(|value| value.to_string())
            .unwrap_or_else(|| "none".into());
        let next_task_desc = self
            .pending_timers()
            .into_iter()
            .find(|timer| due_limit.is_none_or(|limit| timer.due_at <= limit))
            .map(|timer| {
                let interval_desc = timer
                    .interval_ms
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "none".into());
                format!(
                    "id={},due_at={},order={},interval_ms={}",
                    timer.id.get(),
                    timer.due_at,
                    timer.order,
                    interval_desc
                )
            })
            .unwrap_or_else(|| "none".into());

        Error::Timer(format!(
            "flush exceeded max task steps (possible uncleared interval): limit={max_steps}, steps={steps}, now_ms={}, due_limit={due_limit_desc}, pending_tasks={}, next_task={next_task_desc}",
            self.now_ms(),
            self.document.timers.len(),
        ))
    }

    fn execute_timer(&mut self, task: ScheduledTask<TimerTask>) -> Result<()> {
        let result = match task.task {
            TimerTask::ContactForm(timer) => match self.contact_form.as_mut() {
                Some(form) => form.handle_timer(&mut self.document, timer),
                None => Ok(()),
            },
            TimerTask::ProfileCard(timer) => match self.profile_card.as_mut() {
                Some(card) => card.handle_timer(&mut self.document, timer),
                None => Ok(()),
            },
        };
        tracing::trace!(id = task.id.get(), due_at = task.due_at, "timer done");
        self.document.timers.finish(task);
        result?;
        self.deliver_queued_events()
    }

    /// Node handle for the first match of `selector`.
    pub fn select(&self, selector: &str) -> Result<NodeId> {
        self.select_one(selector)
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.document.dom.text_content(target))
    }

    pub fn value(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.document.dom.value(target)
    }

    pub fn attr(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let target = self.select_one(selector)?;
        Ok(self.document.dom.attr(target, name))
    }

    /// Value of one inline style property, empty when unset.
    pub fn style_property(&self, selector: &str, property: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.document.dom.style_property(target, property)
    }

    pub fn has_class(&self, selector: &str, class_name: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        self.document.dom.class_contains(target, class_name)
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.document.active_element()
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.document.dom.text_content(target);
        self.check(selector, target, expected, actual)
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.document.dom.value(target)?;
        self.check(selector, target, expected, actual)
    }

    /// `expected` of `None` asserts the attribute is absent.
    pub fn assert_attr(&self, selector: &str, name: &str, expected: Option<&str>) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.document.dom.attr(target, name);
        if actual.as_deref() != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("{name}={expected:?}"),
                actual: format!("{name}={actual:?}"),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_class(&self, selector: &str, class_name: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.document.dom.class_contains(target, class_name)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("class {class_name} present={expected}"),
                actual: format!("class {class_name} present={actual}"),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_disabled(&self, selector: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.document.dom.disabled(target);
        self.check(selector, target, &expected.to_string(), actual.to_string())
    }

    pub fn assert_focused(&self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let active = self.document.active_element();
        if active != Some(target) {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: "focused".into(),
                actual: active
                    .map(|node| truncate_chars(&self.document.dom.dump_node(node), 80))
                    .unwrap_or_else(|| "no focused element".into()),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    fn check(&self, selector: &str, target: NodeId, expected: &str, actual: String) -> Result<()> {
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.document.dom.dump_node(target))
    }

    pub fn console_logs(&self) -> Vec<ConsoleEntry> {
        self.document.console.entries()
    }

    pub fn take_console_logs(&mut self) -> Vec<ConsoleEntry> {
        self.document.console.take()
    }

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.document
            .dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.document.dom.dump_node(node_id), 200)
    }
}

/// Testing surface exposed by an initialized contact form.
#[derive(Debug)]
pub struct ContactFormHandle<'a> {
    page: &'a mut Page,
}

impl ContactFormHandle<'_> {
    fn with_form<R>(&mut self, run: impl FnOnce(&mut ContactForm, &mut Document) -> Result<R>) -> Result<R> {
        let page = &mut *self.page;
        let form = page
            .contact_form
            .as_mut()
            .ok_or_else(|| Error::Dom("contact form is not attached".into()))?;
        let result = run(form, &mut page.document)?;
        page.deliver_queued_events()?;
        Ok(result)
    }

    /// Validates every field, updating all error slots.
    pub fn validate(&mut self) -> Result<bool> {
        self.with_form(|form, doc| form.validate_all(doc))
    }

    pub fn validate_field(&mut self, field: Field) -> Result<bool> {
        self.with_form(|form, doc| form.validate_field(doc, field))
    }

    /// Like [`validate_field`](Self::validate_field) with the field given by
    /// name (`"name"`, `"email"`, `"subject"` or `"message"`).
    pub fn validate_field_named(&mut self, name: &str) -> Result<bool> {
        let field = name.parse::<Field>()?;
        self.validate_field(field)
    }

    pub fn is_valid_email(&self, value: &str) -> bool {
        is_valid_email(value)
    }

    pub fn state(&self) -> SubmissionState {
        self.page
            .contact_form
            .as_ref()
            .map(ContactForm::state)
            .unwrap_or_default()
    }

    pub fn elements(&self) -> Option<&ContactFormElements> {
        self.page.contact_form.as_ref().map(ContactForm::elements)
    }
}

/// Testing surface exposed by an initialized profile card.
#[derive(Debug)]
pub struct ProfileCardHandle<'a> {
    page: &'a mut Page,
}

impl ProfileCardHandle<'_> {
    pub fn update_time(&mut self) -> Result<()> {
        let page = &mut *self.page;
        let card = page
            .profile_card
            .as_ref()
            .ok_or_else(|| Error::Dom("profile card is not attached".into()))?;
        card.update_time(&mut page.document)
    }

    pub fn elements(&self) -> Option<&ProfileCardElements> {
        self.page.profile_card.as_ref().map(ProfileCard::elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controllers_wait_for_readiness() -> Result<()> {
        let mut page = Page::from_html("<time data-testid='test-user-time'></time>")?;
        page.attach_profile_card(ProfileCardConfig::default())?;
        assert_eq!(page.ready_state(), ReadyState::Loading);
        assert!(page.profile_card().is_none());
        assert!(page.pending_timers().is_empty());

        page.finish_loading()?;
        page.finish_loading()?;
        assert!(page.profile_card().is_some());
        assert_eq!(page.pending_timers().len(), 1);
        page.assert_text("time", "0")?;
        Ok(())
    }

    #[test]
    fn attaching_after_readiness_initializes_immediately() -> Result<()> {
        let mut page = Page::from_html("<form id='contactForm'></form>")?;
        page.finish_loading()?;
        page.attach_contact_form(ContactFormConfig::default())?;
        assert!(page.contact_form().is_some());
        assert!(matches!(
            page.attach_contact_form(ContactFormConfig::default()),
            Err(Error::Config(_))
        ));
        Ok(())
    }

    #[test]
    fn negative_or_backward_time_is_rejected() -> Result<()> {
        let mut page = Page::from_html("<p></p>")?;
        page.advance_time(10)?;
        assert!(matches!(page.advance_time(-1), Err(Error::Timer(_))));
        assert!(matches!(page.advance_time_to(5), Err(Error::Timer(_))));
        assert_eq!(page.now_ms(), 10);
        Ok(())
    }

    #[test]
    fn flush_reports_runaway_interval() -> Result<()> {
        let mut config = PageConfig::default();
        config.set_timer_step_limit(5)?;
        let mut page = Page::from_html_with_config("<time data-testid='test-user-time'></time>", config)?;
        page.attach_profile_card(ProfileCardConfig::default())?;
        page.finish_loading()?;

        let err = page.flush().expect_err("interval never stops");
        match err {
            Error::Timer(message) => {
                assert!(message.contains("limit=5"), "{message}");
                assert!(message.contains("interval_ms=1000"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn assertion_failure_carries_snippet() -> Result<()> {
        let page = Page::from_html("<p id='greeting'>hello</p>")?;
        let err = page
            .assert_text("#greeting", "bye")
            .expect_err("text differs");
        assert_eq!(
            err,
            Error::AssertionFailed {
                selector: "#greeting".into(),
                expected: "bye".into(),
                actual: "hello".into(),
                dom_snippet: "<p id=\"greeting\">hello</p>".into(),
            }
        );
        assert!(matches!(
            page.assert_exists("#missing"),
            Err(Error::SelectorNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn typing_into_non_text_control_is_a_type_mismatch() -> Result<()> {
        let mut page = Page::from_html("<div id='d'></div>")?;
        assert!(matches!(
            page.type_text("#d", "x"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            page.load_image("#d"),
            Err(Error::TypeMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn page_config_rejects_zero_limits() {
        let mut config = PageConfig::default();
        assert!(config.set_timer_step_limit(0).is_err());
        assert!(config.set_console_limit(0).is_err());
        assert!(config.set_clock_origin_ms(-1).is_err());
        assert_eq!(config.timer_step_limit(), 10_000);
        assert!(PageConfig::with_system_clock().clock_origin_ms() > 0);
    }
}
