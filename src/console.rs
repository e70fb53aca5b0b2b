use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Log,
    Warn,
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Log => f.write_str("log"),
            Self::Warn => f.write_str("warn"),
        }
    }
}

/// One diagnostic line written by a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleEntry {
    pub level: ConsoleLevel,
    pub message: String,
}

/// Bounded capture of controller diagnostics, mirrored to `tracing`.
#[derive(Debug, Clone)]
pub(crate) struct Console {
    entries: VecDeque<ConsoleEntry>,
    limit: usize,
}

impl Console {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub(crate) fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(target: "pagekit::console", "{message}");
        self.push(ConsoleLevel::Log, message);
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(target: "pagekit::console", "{message}");
        self.push(ConsoleLevel::Warn, message);
    }

    fn push(&mut self, level: ConsoleLevel, message: String) {
        while self.entries.len() >= self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(ConsoleEntry { level, message });
    }

    pub(crate) fn entries(&self) -> Vec<ConsoleEntry> {
        self.entries.iter().cloned().collect()
    }

    pub(crate) fn take(&mut self) -> Vec<ConsoleEntry> {
        self.entries.drain(..).collect()
    }

    pub(crate) fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }
}
