// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

/*!
Non-blocking, poll-driven ICMP Echo ("ping") client over raw IPv4 sockets.

A [`PingSession`] measures round-trip latency to one IPv4 host. It never
blocks and never spawns anything: the owner calls [`PingSession::poll`] with
the current time in milliseconds, typically from an existing event loop, and
gets back one [`Outcome`] per call.

# Example

```rust,no_run
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use ping_client::Outcome;

let mut session = ping_client::create_session(
    Duration::from_secs(1),
    Ipv4Addr::new(192, 0, 2, 1),
)
.expect("raw sockets need CAP_NET_RAW");

let start = Instant::now();
loop {
    let now_ms = start.elapsed().as_millis() as u64;
    if let Outcome::Reply { latency_ms } = session.poll(now_ms) {
        println!("{latency_ms} ms");
    }
    std::thread::sleep(Duration::from_millis(100));
}
```

Raw sockets require root or `CAP_NET_RAW` on most systems.
*/

#![warn(missing_docs)]

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use log::warn;

// Re-export codec types from ping_proto for convenience.
pub use ping_proto::{checksum, icmp, ipv4};

/// Session configuration.
pub mod config;

/// Fatal and discard reasons carried by poll outcomes.
pub mod error;

/// Receiving, truncating, and draining raw datagrams.
pub mod receive;

/// The ping session state machine.
pub mod session;

/// The raw socket and the transport seam.
pub mod transport;

pub use config::PingConfig;
pub use error::{BadPacketReason, FatalReason};
pub use session::{Outcome, PingSession, SessionStats};
pub use transport::{IcmpTransport, RawSocket};

/// Create a session pinging `remote`, waiting `timeout` for each reply.
///
/// Returns `None` if the raw socket cannot be created or configured; the OS
/// error is logged at `warn`. Use [`PingSession::open`] to get the error.
pub fn create_session(timeout: Duration, remote: Ipv4Addr) -> Option<PingSession> {
    match PingSession::open(PingConfig::new(remote, timeout)) {
        Ok(session) => Some(session),
        Err(e) => {
            warn!("cannot create ping session for {remote}: {e}");
            None
        }
    }
}

/// Like [`create_session`], for an address of either family.
///
/// IPv6 is not supported and yields `None`.
pub fn create_session_for(timeout: Duration, remote: IpAddr) -> Option<PingSession> {
    match remote {
        IpAddr::V4(v4) => create_session(timeout, v4),
        IpAddr::V6(v6) => {
            warn!("cannot ping {v6}: IPv6 is not supported");
            None
        }
    }
}
