// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Session configuration.
//!
//! # Examples
//!
//! ```
//! use std::net::Ipv4Addr;
//! use std::time::Duration;
//! use ping_client::config::PingConfig;
//!
//! let config = PingConfig::new(Ipv4Addr::new(203, 0, 113, 7), Duration::from_secs(1))
//!     .max_datagrams_per_poll(16)
//!     .receive_timeout(Duration::from_millis(200));
//! assert_eq!(config.timeout_ms(), 1000);
//! ```

use std::net::Ipv4Addr;
use std::time::Duration;

/// Configuration for one [`PingSession`](crate::session::PingSession).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PingConfig {
    /// The already-resolved host to ping.
    pub remote: Ipv4Addr,
    /// How long to wait for a reply before resending.
    pub timeout: Duration,
    /// OS-level `SO_RCVTIMEO`. `None` uses [`timeout`](Self::timeout).
    pub receive_timeout: Option<Duration>,
    /// Upper bound on datagrams inspected by a single `poll`.
    pub max_datagrams_per_poll: usize,
    /// Upper bound on bytes discarded while draining one oversized datagram.
    /// A longer tail is fatal to the session.
    pub discard_budget: usize,
}

impl PingConfig {
    /// Default reply timeout (1 second).
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

    /// Default cap on datagrams inspected per poll.
    pub const DEFAULT_MAX_DATAGRAMS_PER_POLL: usize = 64;

    /// Default drain budget: the largest possible IPv4 datagram.
    pub const DEFAULT_DISCARD_BUDGET: usize = u16::MAX as usize;

    /// Create a configuration for `remote` with the given reply timeout.
    pub fn new(remote: Ipv4Addr, timeout: Duration) -> Self {
        PingConfig {
            remote,
            timeout,
            receive_timeout: None,
            max_datagrams_per_poll: Self::DEFAULT_MAX_DATAGRAMS_PER_POLL,
            discard_budget: Self::DEFAULT_DISCARD_BUDGET,
        }
    }

    /// Set the OS-level receive timeout.
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = Some(timeout);
        self
    }

    /// Cap the datagrams inspected per poll. Values below 1 are raised to 1.
    pub fn max_datagrams_per_poll(mut self, max: usize) -> Self {
        self.max_datagrams_per_poll = max.max(1);
        self
    }

    /// Cap the bytes discarded while draining one oversized datagram.
    pub fn discard_budget(mut self, budget: usize) -> Self {
        self.discard_budget = budget;
        self
    }

    /// The reply timeout in whole milliseconds, saturating at `u64::MAX`.
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// The receive timeout that will be applied to the socket.
    pub fn effective_receive_timeout(&self) -> Duration {
        self.receive_timeout.unwrap_or(self.timeout)
    }
}

impl Default for PingConfig {
    fn default() -> Self {
        PingConfig::new(Ipv4Addr::LOCALHOST, Self::DEFAULT_TIMEOUT)
    }
}
