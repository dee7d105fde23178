//! Visitor bookkeeping
//!
//! Tracks, per client IP, how many requests have been recorded and when the
//! last one happened. The registry is shared across connection workers behind
//! a single mutex; every operation on it is atomic from the callers' point of
//! view.
//!
//! On disk the registry is a JSON map of `ip → [count, last_visit]`, a legacy
//! shape kept for compatibility with existing `visitors.json` files. That
//! pair encoding lives only in `load`/`save`; everything else in the crate
//! speaks [`VisitorRecord`].

use std::collections::HashMap;
use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use chrono::{DateTime, Local};

/// One client's visit bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorRecord {
    /// Total recorded requests from this IP
    pub count: u64,
    /// Timestamp of the most recent visit, ISO 8601 with offset
    pub last_visit: String,
}

/// On-disk encoding of a [`VisitorRecord`]: a `[count, timestamp]` pair
type DiskRecord = (u64, String);

/// Shared registry of visitor records, keyed by client IP
#[derive(Debug, Default)]
pub struct VisitorRegistry {
    records: Mutex<HashMap<IpAddr, VisitorRecord>>,
}

impl VisitorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a registry from disk. A missing file is an empty registry, not
    /// an error; a present but unreadable or malformed file is.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            log::debug!("no visitor file at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read visitor file {}", path.display()))?;
        let disk: HashMap<String, DiskRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse visitor file {}", path.display()))?;

        let mut records = HashMap::with_capacity(disk.len());
        for (key, (count, last_visit)) in disk {
            match key.parse::<IpAddr>() {
                Ok(ip) => {
                    records.insert(ip, VisitorRecord { count, last_visit });
                }
                Err(_) => log::warn!(
                    "skipping visitor entry with invalid IP {:?} in {}",
                    key,
                    path.display()
                ),
            }
        }

        log::info!("loaded {} visitor record(s) from {}", records.len(), path.display());
        Ok(Self { records: Mutex::new(records) })
    }

    /// Persist the registry to disk in the legacy pair encoding
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let records = self.records.lock().expect("visitor registry mutex poisoned");
        let disk: HashMap<String, DiskRecord> = records
            .iter()
            .map(|(ip, rec)| (ip.to_string(), (rec.count, rec.last_visit.clone())))
            .collect();
        drop(records);

        let raw = serde_json::to_string_pretty(&disk)?;
        fs::write(path, raw)
            .with_context(|| format!("failed to write visitor file {}", path.display()))?;
        Ok(())
    }

    /// Record one visit from `addr` at `now`, returning the updated record.
    ///
    /// First visit yields count 1; the timestamp always reflects this visit.
    pub fn record_visit(&self, addr: IpAddr, now: DateTime<Local>) -> VisitorRecord {
        let mut records = self.records.lock().expect("visitor registry mutex poisoned");
        let record = records.entry(addr).or_insert_with(|| VisitorRecord {
            count: 0,
            last_visit: String::new(),
        });
        record.count += 1;
        record.last_visit = now.to_rfc3339();
        record.clone()
    }

    /// Look up the record for `addr`, if any
    pub fn get(&self, addr: IpAddr) -> Option<VisitorRecord> {
        self.records
            .lock()
            .expect("visitor registry mutex poisoned")
            .get(&addr)
            .cloned()
    }

    /// Number of distinct IPs recorded
    pub fn len(&self) -> usize {
        self.records.lock().expect("visitor registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(127, 0, 0, last))
    }

    #[test]
    fn first_visit_counts_from_one() {
        let registry = VisitorRegistry::new();
        let record = registry.record_visit(ip(1), Local::now());
        assert_eq!(record.count, 1);
        assert!(!record.last_visit.is_empty());
    }

    #[test]
    fn repeat_visits_increment_and_refresh_timestamp() {
        let registry = VisitorRegistry::new();
        let first = registry.record_visit(ip(1), Local::now());
        let second = registry.record_visit(ip(1), Local::now());
        assert_eq!(first.count, 1);
        assert_eq!(second.count, 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn visitors_are_tracked_per_ip() {
        let registry = VisitorRegistry::new();
        registry.record_visit(ip(1), Local::now());
        registry.record_visit(ip(2), Local::now());
        registry.record_visit(ip(2), Local::now());
        assert_eq!(registry.get(ip(1)).unwrap().count, 1);
        assert_eq!(registry.get(ip(2)).unwrap().count, 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = VisitorRegistry::load(&dir.path().join("visitors.json")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn save_and_load_round_trip_legacy_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visitors.json");

        let registry = VisitorRegistry::new();
        registry.record_visit(ip(1), Local::now());
        registry.record_visit(ip(1), Local::now());
        registry.record_visit(ip(9), Local::now());
        registry.save(&path).unwrap();

        // The file really is a map of [count, timestamp] pairs.
        let raw = std::fs::read_to_string(&path).unwrap();
        let disk: HashMap<String, (u64, String)> = serde_json::from_str(&raw).unwrap();
        assert_eq!(disk["127.0.0.1"].0, 2);

        let reloaded = VisitorRegistry::load(&path).unwrap();
        assert_eq!(reloaded.get(ip(1)).unwrap().count, 2);
        assert_eq!(reloaded.get(ip(9)).unwrap().count, 1);
    }

    #[test]
    fn load_skips_entries_with_invalid_ips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visitors.json");
        std::fs::write(
            &path,
            r#"{"127.0.0.1": [3, "2026-01-01T00:00:00+00:00"], "not-an-ip": [7, "x"]}"#,
        )
        .unwrap();

        let registry = VisitorRegistry::load(&path).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(ip(1)).unwrap().count, 3);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visitors.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(VisitorRegistry::load(&path).is_err());
    }
}
