//! Bounded log of recent model exchanges, for `--debug` style inspection.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use crate::types::Message;

/// Default number of exchanges kept per client.
pub const DEFAULT_HISTORY_CAPACITY: usize = 32;

/// One request/response pair as seen by the client.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub model: String,
    pub messages: Vec<Message>,
    pub response: String,
    pub duration_ms: u128,
}

/// Shared ring buffer of exchanges. Clones share the same buffer.
#[derive(Debug, Clone)]
pub struct History {
    entries: Arc<Mutex<VecDeque<Exchange>>>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Record an exchange, evicting the oldest one when full.
    pub fn record(&self, exchange: Exchange) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(exchange);
    }

    /// The last `n` exchanges, oldest first.
    pub fn recent(&self, n: usize) -> Vec<Exchange> {
        let entries = self.entries.lock().unwrap();
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human-readable dump of the last `n` exchanges.
    pub fn render(&self, n: usize) -> String {
        let mut out = String::new();
        for exchange in self.recent(n) {
            let _ = writeln!(
                out,
                "--- {} ({} ms) ---",
                exchange.model, exchange.duration_ms
            );
            for message in &exchange.messages {
                let _ = writeln!(out, "[{}] {}", message.role, message.content);
            }
            let _ = writeln!(out, "[response] {}", exchange.response);
            out.push('\n');
        }
        out
    }
}
