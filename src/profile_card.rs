//! Profile card live widget: a ticking timestamp, one-time accessibility
//! enrichment, and a fallback for a broken avatar image.

use crate::contact_form::positive_duration;
use crate::date_time::format_iso_8601_utc;
use crate::document::{Document, EventState, Handler, TimerTask};
use crate::dom::{Dom, NodeId};
use crate::scheduler::TimerId;
use crate::{Error, Result};

const CARD_TEST_ID: &str = "test-profile-card";
const TIME_TEST_ID: &str = "test-user-time";
const AVATAR_TEST_ID: &str = "test-user-avatar";
const SOCIAL_PREFIX: &str = "test-user-social-";
const SOCIAL_LIST_TEST_ID: &str = "test-user-social-links";

const DEFAULT_REQUIRED_TEST_IDS: [&str; 8] = [
    "test-profile-card",
    "test-user-name",
    "test-user-bio",
    "test-user-time",
    "test-user-avatar",
    "test-user-social-links",
    "test-user-hobbies",
    "test-user-dislikes",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CardEvent {
    AvatarError,
    AvatarLoad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CardTimer {
    Tick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileCardConfig {
    tick_interval_ms: i64,
    avatar_fallback_src: String,
    required_test_ids: Vec<String>,
}

impl Default for ProfileCardConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            avatar_fallback_src: "https://api.dicebear.com/7.x/avataaars/svg?seed=fallback".into(),
            required_test_ids: DEFAULT_REQUIRED_TEST_IDS
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl ProfileCardConfig {
    pub fn tick_interval_ms(&self) -> i64 {
        self.tick_interval_ms
    }

    pub fn set_tick_interval_ms(&mut self, interval_ms: i64) -> Result<()> {
        self.tick_interval_ms = positive_duration("tick_interval_ms", interval_ms)?;
        Ok(())
    }

    pub fn avatar_fallback_src(&self) -> &str {
        &self.avatar_fallback_src
    }

    pub fn set_avatar_fallback_src(&mut self, src: &str) -> Result<()> {
        if src.trim().is_empty() {
            return Err(Error::Config("avatar fallback src must not be blank".into()));
        }
        self.avatar_fallback_src = src.to_string();
        Ok(())
    }

    /// `data-testid` values checked at initialization.
    pub fn required_test_ids(&self) -> &[String] {
        &self.required_test_ids
    }

    pub fn set_required_test_ids<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_test_ids = ids.into_iter().map(Into::into).collect();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileCardElements {
    pub card: Option<NodeId>,
    pub time: Option<NodeId>,
    pub avatar: Option<NodeId>,
    pub social_links: Vec<NodeId>,
}

impl ProfileCardElements {
    pub(crate) fn resolve(dom: &Dom) -> Result<Self> {
        let social_links = dom
            .query_selector_all(&format!("[data-testid^=\"{SOCIAL_PREFIX}\"]"))?
            .into_iter()
            .filter(|node| dom.attr(*node, "data-testid").as_deref() != Some(SOCIAL_LIST_TEST_ID))
            .collect();
        Ok(Self {
            card: dom.query_selector(&test_id_selector(CARD_TEST_ID))?,
            time: dom.query_selector(&test_id_selector(TIME_TEST_ID))?,
            avatar: dom.query_selector(&test_id_selector(AVATAR_TEST_ID))?,
            social_links,
        })
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        [self.card, self.time, self.avatar]
            .into_iter()
            .flatten()
            .chain(self.social_links.iter().copied())
    }
}

fn test_id_selector(test_id: &str) -> String {
    format!("[data-testid=\"{test_id}\"]")
}

#[derive(Debug)]
pub(crate) struct ProfileCard {
    config: ProfileCardConfig,
    elements: ProfileCardElements,
    tick_timer: Option<TimerId>,
    initialized: bool,
}

impl ProfileCard {
    pub(crate) fn new(config: ProfileCardConfig, elements: ProfileCardElements) -> Self {
        Self {
            config,
            elements,
            tick_timer: None,
            initialized: false,
        }
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn elements(&self) -> &ProfileCardElements {
        &self.elements
    }

    pub(crate) fn init(&mut self, doc: &mut Document) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.initialized = true;

        self.update_time(doc)?;
        let id = doc.timers.set_interval(
            TimerTask::ProfileCard(CardTimer::Tick),
            self.config.tick_interval_ms,
        );
        self.tick_timer = Some(id);

        self.enrich_accessibility(doc)?;
        if let Some(avatar) = self.elements.avatar {
            doc.listeners
                .add(avatar, "error", Handler::ProfileCard(CardEvent::AvatarError));
            doc.listeners
                .add(avatar, "load", Handler::ProfileCard(CardEvent::AvatarLoad));
        }

        doc.console.log("Profile Card initialized successfully");
        doc.console
            .log(format!("Current timestamp: {}", doc.timers.now_ms()));
        self.audit_test_ids(doc)
    }

    /// Writes the clock into the time element as text and as `datetime`.
    pub(crate) fn update_time(&self, doc: &mut Document) -> Result<()> {
        let Some(time) = self.elements.time else {
            return Ok(());
        };
        let now_ms = doc.timers.now_ms();
        doc.dom.set_text_content(time, &now_ms.to_string())?;
        doc.dom
            .set_attr(time, "datetime", &format_iso_8601_utc(now_ms))
    }

    fn enrich_accessibility(&self, doc: &mut Document) -> Result<()> {
        if let Some(card) = self.elements.card {
            doc.dom.set_attr(card, "role", "article")?;
        }

        for link in &self.elements.social_links {
            let labeled = doc
                .dom
                .attr(*link, "aria-label")
                .is_some_and(|label| !label.is_empty());
            if labeled {
                continue;
            }
            let text = doc.dom.text_content(*link);
            doc.dom
                .set_attr(*link, "aria-label", &format!("Visit {} profile", text.trim()))?;
        }

        if let Some(time) = self.elements.time {
            doc.dom.set_attr(time, "aria-live", "polite")?;
            doc.dom.set_attr(time, "aria-atomic", "true")?;
        }
        Ok(())
    }

    fn audit_test_ids(&self, doc: &mut Document) -> Result<()> {
        let mut missing = Vec::new();
        for test_id in &self.config.required_test_ids {
            if doc.dom.query_selector(&test_id_selector(test_id))?.is_none() {
                missing.push(test_id.as_str());
            }
        }
        if missing.is_empty() {
            doc.console.log("All required test IDs are present");
        } else {
            doc.console
                .warn(format!("Missing test IDs: {}", missing.join(", ")));
        }
        Ok(())
    }

    pub(crate) fn detach(&mut self, doc: &mut Document) {
        let timers = doc
            .timers
            .clear_where(|task| matches!(task, TimerTask::ProfileCard(_)));
        let listeners = doc
            .listeners
            .remove_where(|handler| matches!(handler, Handler::ProfileCard(_)));
        self.tick_timer = None;
        tracing::debug!(timers, listeners, "profile card detached");
    }

    pub(crate) fn handle_event(
        &mut self,
        doc: &mut Document,
        event: CardEvent,
        state: &mut EventState,
    ) -> Result<()> {
        let avatar = state.current_target;
        match event {
            CardEvent::AvatarError => {
                // The fallback failing too must not loop.
                let src = doc.dom.attr(avatar, "src").unwrap_or_default();
                if src == self.config.avatar_fallback_src {
                    return Ok(());
                }
                doc.console
                    .warn("Avatar image failed to load, using fallback");
                doc.dom
                    .set_attr(avatar, "src", &self.config.avatar_fallback_src)
            }
            CardEvent::AvatarLoad => doc.dom.set_style_property(avatar, "opacity", "1"),
        }
    }

    pub(crate) fn handle_timer(&mut self, doc: &mut Document, timer: CardTimer) -> Result<()> {
        match timer {
            CardTimer::Tick => self.update_time(doc),
        }
    }
}
