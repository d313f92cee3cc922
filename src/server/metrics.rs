//! Server metrics collection.
//!
//! Aggregate counters only; no per-user or per-destination data is kept.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::proxy::{Dialect, SessionStats};

/// Server metrics collector.
pub struct ServerMetrics {
    /// Server start time
    start_time: Instant,
    /// Total sessions accepted
    total_sessions: AtomicU64,
    /// Currently running sessions
    active_sessions: AtomicU64,
    /// Completed SOCKS4/4a sessions
    socks4_sessions: AtomicU64,
    /// Completed SOCKS5 sessions
    socks5_sessions: AtomicU64,
    /// Completed HTTP sessions
    http_sessions: AtomicU64,
    /// Sessions ended by an error or panic
    failed_sessions: AtomicU64,
    /// Bytes relayed toward destinations
    bytes_up: AtomicU64,
    /// Bytes relayed toward clients
    bytes_down: AtomicU64,
}

impl ServerMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            total_sessions: AtomicU64::new(0),
            active_sessions: AtomicU64::new(0),
            socks4_sessions: AtomicU64::new(0),
            socks5_sessions: AtomicU64::new(0),
            http_sessions: AtomicU64::new(0),
            failed_sessions: AtomicU64::new(0),
            bytes_up: AtomicU64::new(0),
            bytes_down: AtomicU64::new(0),
        }
    }

    /// Count a newly accepted session.
    pub fn session_opened(&self) {
        self.total_sessions.fetch_add(1, Ordering::Relaxed);
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a session leaving the active set.
    pub fn session_closed(&self) {
        self.active_sessions.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a completed session's dialect and traffic.
    pub fn record_session(&self, stats: &SessionStats) {
        match stats.dialect {
            Dialect::Socks4 => self.socks4_sessions.fetch_add(1, Ordering::Relaxed),
            Dialect::Socks5 => self.socks5_sessions.fetch_add(1, Ordering::Relaxed),
            Dialect::Http => self.http_sessions.fetch_add(1, Ordering::Relaxed),
        };
        self.bytes_up.fetch_add(stats.bytes_up, Ordering::Relaxed);
        self.bytes_down.fetch_add(stats.bytes_down, Ordering::Relaxed);
    }

    /// Record a session that ended in an error or panic.
    pub fn record_failure(&self) {
        self.failed_sessions.fetch_add(1, Ordering::Relaxed);
    }

    /// Get uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get total sessions.
    pub fn total_sessions(&self) -> u64 {
        self.total_sessions.load(Ordering::Relaxed)
    }

    /// Get currently running sessions.
    pub fn active_sessions(&self) -> u64 {
        self.active_sessions.load(Ordering::Relaxed)
    }

    /// Get failed sessions.
    pub fn failed_sessions(&self) -> u64 {
        self.failed_sessions.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.uptime_secs(),
            total_sessions: self.total_sessions(),
            active_sessions: self.active_sessions(),
            socks4_sessions: self.socks4_sessions.load(Ordering::Relaxed),
            socks5_sessions: self.socks5_sessions.load(Ordering::Relaxed),
            http_sessions: self.http_sessions.load(Ordering::Relaxed),
            failed_sessions: self.failed_sessions(),
            bytes_up: self.bytes_up.load(Ordering::Relaxed),
            bytes_down: self.bytes_down.load(Ordering::Relaxed),
        }
    }

    /// Format metrics as a simple text report.
    pub fn format_report(&self) -> String {
        let snapshot = self.snapshot();

        format!(
            r#"Tunnel Server Metrics
=====================
Uptime: {} seconds

Sessions:
  Total:   {}
  Active:  {}
  SOCKS4:  {}
  SOCKS5:  {}
  HTTP:    {}
  Failed:  {}

Traffic:
  Up:   {} bytes
  Down: {} bytes
"#,
            snapshot.uptime_secs,
            snapshot.total_sessions,
            snapshot.active_sessions,
            snapshot.socks4_sessions,
            snapshot.socks5_sessions,
            snapshot.http_sessions,
            snapshot.failed_sessions,
            snapshot.bytes_up,
            snapshot.bytes_down,
        )
    }
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of all counters at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub total_sessions: u64,
    pub active_sessions: u64,
    pub socks4_sessions: u64,
    pub socks5_sessions: u64,
    pub http_sessions: u64,
    pub failed_sessions: u64,
    pub bytes_up: u64,
    pub bytes_down: u64,
}
