//! Request counter for locally answered queries.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

pub const REQUEST_COUNT: &str = "hostmap_request_count_total";

/// Monotonic counter of locally answered queries, labelled by server.
#[derive(Debug, Default)]
pub struct RequestCounter {
    counts: DashMap<String, AtomicU64>,
}

impl RequestCounter {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn increment(&self, server: &str) {
        if let Some(count) = self.counts.get(server) {
            count.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.counts
            .entry(server.to_string())
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, server: &str) -> u64 {
        self.counts
            .get(server)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts
            .iter()
            .map(|c| c.value().load(Ordering::Relaxed))
            .sum()
    }

    /// Prometheus text exposition of the counter, one line per server.
    pub fn render(&self) -> String {
        let mut out = format!("# TYPE {} counter\n", REQUEST_COUNT);
        let mut rows: Vec<(String, u64)> = self
            .counts
            .iter()
            .map(|c| (c.key().clone(), c.value().load(Ordering::Relaxed)))
            .collect();
        rows.sort();
        for (server, count) in rows {
            let _ = writeln!(out, "{}{{server=\"{}\"}} {}", REQUEST_COUNT, server, count);
        }
        out
    }
}
