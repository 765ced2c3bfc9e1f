use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{error, info, warn};

use super::types::{FlushPolicy, Hotspot, LoadStatus, MemoryLedger, TripSummary};
use crate::error::PersistenceError;
use crate::kernel::context::GeoPoint;
use crate::kernel::risk::MAX_SCORE;
use crate::kernel::time::epoch_seconds;

/// Append-only ledger of hotspots and trip summaries, persisted as one JSON file.
///
/// Every mutation rewrites the whole file through a temporary sibling that is
/// renamed over the target, so a crash mid-flush leaves the previous version intact.
/// The store assumes a single writer per file.
#[derive(Debug)]
pub struct MemoryStore {
    path: PathBuf,
    ledger: MemoryLedger,
    status: LoadStatus,
    policy: FlushPolicy,
    unflushed: usize,
    degraded: bool,
}

impl MemoryStore {
    /// Never fails: a missing or unparsable file yields an empty store and
    /// `recovered()` reports it.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        Self::load_with_policy(path, FlushPolicy::default())
    }

    pub fn load_with_policy(path: impl Into<PathBuf>, policy: FlushPolicy) -> Self {
        let path = path.into();

        let (ledger, status) = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<MemoryLedger>(&bytes) {
                Ok(ledger) => {
                    info!(
                        path = %path.display(),
                        hotspots = ledger.hotspots.len(),
                        trips = ledger.trips.len(),
                        "memory store loaded"
                    );
                    (ledger, LoadStatus::Existing)
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "memory store corrupt, starting fresh"
                    );
                    quarantine(&path);
                    (MemoryLedger::default(), LoadStatus::Corrupt(e.to_string()))
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no memory store yet, starting fresh");
                (MemoryLedger::default(), LoadStatus::Missing)
            }
            // Permission and similar errors: the bytes were never seen, so leave them in place.
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "memory store unreadable, starting fresh"
                );
                (MemoryLedger::default(), LoadStatus::Corrupt(e.to_string()))
            }
        };

        Self {
            path,
            ledger,
            status,
            policy,
            unflushed: 0,
            degraded: false,
        }
    }

    /// Appends a hotspot stamped with the current wall clock, then flushes.
    ///
    /// On a flush error the hotspot stays in memory; see `FlushPolicy`.
    /// Non-finite coordinates or scores are refused: JSON has no NaN, and a
    /// `null` in the file would make the whole ledger unreadable.
    pub fn add_hotspot(&mut self, geo: GeoPoint, score: f64) -> Result<(), PersistenceError> {
        if !geo.lat.is_finite() {
            return Err(PersistenceError::NonFinite { field: "lat" });
        }
        if !geo.lon.is_finite() {
            return Err(PersistenceError::NonFinite { field: "lon" });
        }
        if !score.is_finite() {
            return Err(PersistenceError::NonFinite { field: "score" });
        }

        self.ledger.hotspots.push(Hotspot {
            geo,
            score: score.clamp(0.0, MAX_SCORE),
            ts: epoch_seconds(),
        });
        self.unflushed += 1;
        self.flush()
    }

    /// Appends an opaque trip record, then flushes.
    pub fn add_trip(&mut self, summary: serde_json::Value) -> Result<(), PersistenceError> {
        self.ledger.trips.push(summary);
        self.unflushed += 1;
        self.flush()
    }

    pub fn add_trip_summary(&mut self, summary: &TripSummary) -> Result<(), PersistenceError> {
        let value = serde_json::to_value(summary)?;
        self.add_trip(value)
    }

    /// Writes the whole ledger. Also the retry path for earlier failures.
    pub fn flush(&mut self) -> Result<(), PersistenceError> {
        if self.degraded {
            return Err(PersistenceError::Degraded { unflushed: self.unflushed });
        }

        match self.write_atomic() {
            Ok(()) => {
                self.unflushed = 0;
                Ok(())
            }
            Err(e) => {
                error!(
                    path = %self.path.display(),
                    error = %e,
                    unflushed = self.unflushed,
                    "memory flush failed"
                );
                if self.policy == FlushPolicy::InMemoryOnly {
                    warn!(path = %self.path.display(), "memory store degraded to in-memory only");
                    self.degraded = true;
                }
                Err(e)
            }
        }
    }

    fn write_atomic(&self) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(&self.ledger)?;
        let io_err = |source: std::io::Error| PersistenceError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let tmp = tmp_path(&self.path);
        {
            let mut file = File::create(&tmp).map_err(io_err)?;
            file.write_all(json.as_bytes()).map_err(io_err)?;
            file.sync_all().map_err(io_err)?;
        }
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }

    pub fn hotspots(&self) -> &[Hotspot] {
        &self.ledger.hotspots
    }

    pub fn trips(&self) -> &[serde_json::Value] {
        &self.ledger.trips
    }

    /// Trip records written by this crate; foreign records are skipped.
    pub fn trip_summaries(&self) -> Vec<TripSummary> {
        self.ledger
            .trips
            .iter()
            .filter_map(|t| serde_json::from_value(t.clone()).ok())
            .collect()
    }

    /// Hotspots within `radius_km` of `geo`.
    pub fn hotspots_near(&self, geo: &GeoPoint, radius_km: f64) -> Vec<&Hotspot> {
        self.ledger
            .hotspots
            .iter()
            .filter(|h| h.geo.distance_km(geo) <= radius_km)
            .collect()
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.status
    }

    /// True when the store was initialized empty because the file was missing or corrupt.
    pub fn recovered(&self) -> bool {
        !matches!(self.status, LoadStatus::Existing)
    }

    /// Records appended since the last successful flush.
    pub fn unflushed(&self) -> usize {
        self.unflushed
    }

    pub fn is_dirty(&self) -> bool {
        self.unflushed > 0
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Moves a corrupt file aside so the next flush does not destroy it.
///
/// Each quarantine gets its own timestamped name; earlier ones are never overwritten.
fn quarantine(path: &Path) {
    let target = quarantine_path(path, &Utc::now().format("%Y%m%dT%H%M%S%3f").to_string());
    match fs::rename(path, &target) {
        Ok(()) => warn!(
            from = %path.display(),
            to = %target.display(),
            "corrupt memory store moved aside"
        ),
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "could not move corrupt memory store aside"
        ),
    }
}

/// `<file>.corrupt-<stamp>`, with a counter appended if that name is taken.
fn quarantine_path(path: &Path, stamp: &str) -> PathBuf {
    let base = path.file_name().map(OsString::from).unwrap_or_default();
    let mut attempt = 0u32;
    loop {
        let mut name = base.clone();
        name.push(format!(".corrupt-{stamp}"));
        if attempt > 0 {
            name.push(format!("-{attempt}"));
        }
        let candidate = path.with_file_name(name);
        if !candidate.exists() {
            return candidate;
        }
        attempt += 1;
    }
}
