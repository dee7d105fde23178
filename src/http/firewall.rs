//! Per-IP request-rate tracking and permanent banning
//!
//! Each source address gets a record of its request timestamps inside a
//! trailing window. An address that exceeds the configured limit within the
//! window is moved into the ban set and its rate record is discarded; from
//! then on every connection from it is rejected before a single request byte
//! is parsed. Bans never expire within the process lifetime and there is no
//! unban path.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rate-limiting thresholds
#[derive(Debug, Clone)]
pub struct FirewallConfig {
    /// Trailing window over which requests are counted
    pub window: Duration,
    /// Requests allowed per window before a permanent ban
    pub max_requests: usize,
}

impl Default for FirewallConfig {
    fn default() -> Self {
        Self { window: Duration::from_secs(60), max_requests: 100 }
    }
}

/// Outcome of a firewall check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Banned,
}

#[derive(Debug, Default)]
struct FirewallState {
    /// Request timestamps per address, pruned to the trailing window
    history: HashMap<IpAddr, Vec<Instant>>,
    /// Permanently banned addresses; entries are never removed
    banned: HashSet<IpAddr>,
}

/// Sliding-window rate limiter with a permanent ban set.
///
/// One coarse lock guards both maps; the raw maps never leave this module,
/// so the ban decision and the rejection of the same address are
/// indistinguishable from atomic to concurrent callers.
#[derive(Debug)]
pub struct Firewall {
    cfg: FirewallConfig,
    state: Mutex<FirewallState>,
}

impl Firewall {
    pub fn new(cfg: FirewallConfig) -> Self {
        Self { cfg, state: Mutex::new(FirewallState::default()) }
    }

    /// Record a request from `addr` at `now` and decide whether it proceeds.
    ///
    /// The ban set is consulted first, independent of window math. Otherwise
    /// the timestamp is appended, stale entries are pruned, and exceeding the
    /// limit bans the address on the spot — the offending request itself is
    /// rejected.
    pub fn check(&self, addr: IpAddr, now: Instant) -> Verdict {
        let mut state = self.state.lock().expect("firewall mutex poisoned");

        if state.banned.contains(&addr) {
            return Verdict::Banned;
        }

        let window = self.cfg.window;
        let record = state.history.entry(addr).or_default();
        record.push(now);
        record.retain(|&t| now.duration_since(t) < window);

        if record.len() > self.cfg.max_requests {
            state.history.remove(&addr);
            state.banned.insert(addr);
            log::warn!("banning {} for exceeding {} requests per window", addr, self.cfg.max_requests);
            return Verdict::Banned;
        }

        Verdict::Allowed
    }

    /// Whether `addr` is currently banned
    pub fn is_banned(&self, addr: IpAddr) -> bool {
        self.state.lock().expect("firewall mutex poisoned").banned.contains(&addr)
    }
}
