use std::collections::{HashMap, VecDeque};

use crate::console::Console;
use crate::contact_form::{FormEvent, FormTimer};
use crate::dom::{Dom, NodeId};
use crate::profile_card::{CardEvent, CardTimer};
use crate::scheduler::TimerQueue;

/// Which controller a listener or timer belongs to, and what it should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Handler {
    ContactForm(FormEvent),
    ProfileCard(CardEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerTask {
    ContactForm(FormTimer),
    ProfileCard(CardTimer),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Handler>>>,
}

impl ListenerStore {
    pub(crate) fn add(&mut self, node_id: NodeId, event: &str, handler: Handler) {
        let listeners = self
            .map
            .entry(node_id)
            .or_default()
            .entry(event.to_string())
            .or_default();
        // Re-registering the same handler for the same type is a no-op.
        if !listeners.contains(&handler) {
            listeners.push(handler);
        }
    }

    pub(crate) fn get(&self, node_id: NodeId, event: &str) -> Vec<Handler> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn remove_where(&mut self, mut predicate: impl FnMut(&Handler) -> bool) -> usize {
        let mut removed = 0;
        for events in self.map.values_mut() {
            for listeners in events.values_mut() {
                let before = listeners.len();
                listeners.retain(|handler| !predicate(handler));
                removed += before - listeners.len();
            }
        }
        removed
    }
}

#[derive(Debug, Clone)]
pub(crate) struct EventState {
    pub(crate) event_type: String,
    pub(crate) target: NodeId,
    pub(crate) current_target: NodeId,
    pub(crate) default_prevented: bool,
}

impl EventState {
    pub(crate) fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            default_prevented: false,
        }
    }

    pub(crate) fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub(crate) fn bubbles(&self) -> bool {
        !matches!(
            self.event_type.as_str(),
            "focus" | "blur" | "load" | "error"
        )
    }
}

/// Document state shared between the page host and its controllers.
///
/// Controllers never dispatch events directly. Anything they trigger (focus
/// moves, mostly) is queued and delivered by the page once the running
/// handler returns.
#[derive(Debug)]
pub(crate) struct Document {
    pub(crate) dom: Dom,
    pub(crate) timers: TimerQueue<TimerTask>,
    pub(crate) console: Console,
    pub(crate) listeners: ListenerStore,
    active_element: Option<NodeId>,
    queued_events: VecDeque<(NodeId, &'static str)>,
}

impl Document {
    pub(crate) fn new(dom: Dom, now_ms: i64, console_limit: usize) -> Self {
        Self {
            dom,
            timers: TimerQueue::new(now_ms),
            console: Console::new(console_limit),
            listeners: ListenerStore::default(),
            active_element: None,
            queued_events: VecDeque::new(),
        }
    }

    pub(crate) fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    /// Moves focus to `node`. Disabled controls cannot take focus.
    pub(crate) fn focus(&mut self, node: NodeId) -> bool {
        if self.dom.element(node).is_none() || self.dom.disabled(node) {
            return false;
        }
        if self.active_element == Some(node) {
            return true;
        }
        if let Some(current) = self.active_element {
            self.blur(current);
        }
        self.active_element = Some(node);
        self.queued_events.push_back((node, "focusin"));
        self.queued_events.push_back((node, "focus"));
        tracing::debug!(node = node.0, "focus");
        true
    }

    pub(crate) fn blur(&mut self, node: NodeId) -> bool {
        if self.active_element != Some(node) {
            return false;
        }
        self.queued_events.push_back((node, "focusout"));
        self.queued_events.push_back((node, "blur"));
        self.active_element = None;
        tracing::debug!(node = node.0, "blur");
        true
    }

    pub(crate) fn next_queued_event(&mut self) -> Option<(NodeId, &'static str)> {
        self.queued_events.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Result};
    use crate::html::parse_html;

    fn document(html: &str) -> Result<Document> {
        Ok(Document::new(parse_html(html)?, 0, 50))
    }

    fn drain(doc: &mut Document) -> Vec<(NodeId, &'static str)> {
        std::iter::from_fn(|| doc.next_queued_event()).collect()
    }

    #[test]
    fn moving_focus_queues_blur_before_focus() -> Result<()> {
        let mut doc = document("<input id='a'><input id='b'>")?;
        let a = doc.dom.by_id("a").ok_or_else(|| Error::Dom("a".into()))?;
        let b = doc.dom.by_id("b").ok_or_else(|| Error::Dom("b".into()))?;

        assert!(doc.focus(a));
        drain(&mut doc);
        assert!(doc.focus(b));
        assert_eq!(
            drain(&mut doc),
            vec![(a, "focusout"), (a, "blur"), (b, "focusin"), (b, "focus")]
        );
        assert_eq!(doc.active_element(), Some(b));
        Ok(())
    }

    #[test]
    fn disabled_controls_do_not_take_focus() -> Result<()> {
        let mut doc = document("<button id='b' disabled>Go</button>")?;
        let button = doc.dom.by_id("b").ok_or_else(|| Error::Dom("b".into()))?;
        assert!(!doc.focus(button));
        assert_eq!(doc.active_element(), None);
        assert!(drain(&mut doc).is_empty());
        Ok(())
    }

    #[test]
    fn listener_registration_is_deduplicated() -> Result<()> {
        let doc = document("<form id='f'></form>")?;
        let form = doc.dom.by_id("f").ok_or_else(|| Error::Dom("f".into()))?;
        let mut store = ListenerStore::default();
        let handler = Handler::ContactForm(FormEvent::Submit);
        store.add(form, "submit", handler);
        store.add(form, "submit", handler);
        assert_eq!(store.get(form, "submit"), vec![handler]);
        assert_eq!(store.remove_where(|_| true), 1);
        assert!(store.get(form, "submit").is_empty());
        Ok(())
    }
}
