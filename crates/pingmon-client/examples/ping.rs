// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Ping one host from a 100 ms tick loop, the way an embedding event loop
//! would drive a session.
//!
//! Run with (raw sockets need root or `CAP_NET_RAW`):
//! ```sh
//! sudo cargo run -p pingmon-client --example ping -- 192.0.2.1 5
//! ```
//!
//! The optional second argument is the number of replies to wait for.

use std::io;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use ping_client::{Outcome, PingConfig, PingSession};

const TICK: Duration = Duration::from_millis(100);

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let count: u64 = args.next().and_then(|c| c.parse().ok()).unwrap_or(4);

    let remote = match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4,
        Ok(IpAddr::V6(_)) => {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "IPv6 is not supported"));
        }
        Err(e) => return Err(io::Error::new(io::ErrorKind::InvalidInput, e)),
    };

    let config = PingConfig::new(remote, Duration::from_secs(1)).receive_timeout(TICK);
    let mut session = PingSession::open(config)?;
    println!("PING {remote} (identifier {:#06x})", session.identifier());

    let start = Instant::now();
    let mut replies = 0;
    while replies < count {
        let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        match session.poll(now_ms) {
            Outcome::Reply { latency_ms } => {
                replies += 1;
                println!("reply from {remote}: seq={} time={latency_ms} ms", session.sequence());
            }
            Outcome::Timeout => println!("request timed out, resent as seq={}", session.sequence()),
            Outcome::Waiting => {}
            Outcome::Errno(e) => eprintln!("socket error: {e}"),
            Outcome::Fatal(reason) => return Err(reason.into()),
        }
        std::thread::sleep(TICK);
    }

    let stats = session.stats();
    println!();
    println!("--- {remote} ping statistics ---");
    println!(
        "{} requests sent, {} replies, {} timeouts",
        stats.requests_sent, stats.replies, stats.timeouts
    );
    println!(
        "discarded: {} bad, {} other, {} foreign ({} bytes drained)",
        stats.bad_packets, stats.other_packets, stats.bad_source, stats.bytes_discarded
    );
    Ok(())
}
