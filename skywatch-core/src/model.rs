use serde::{Deserialize, Serialize};

/// One immutable weather reading for a city, replaced wholesale on each
/// successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub temperature_c: f64,
    /// Free-form condition phrase from the provider, e.g. "light rain".
    /// Matched case-insensitively by the theme classifier.
    pub description: String,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    /// Time zone offset of the queried city, in seconds east of UTC.
    pub utc_offset_secs: i32,
    /// Sunrise/sunset as UTC unix timestamps. `sunrise < sunset` is
    /// assumed but never validated.
    pub sunrise_epoch: i64,
    pub sunset_epoch: i64,
}

/// One-shot geolocation result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A nearby place (police station or rescue/safe place).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub address: Option<String>,
    pub description: Option<String>,
    /// Distance from the queried coordinates, as reported by the service.
    pub distance: f64,
}

/// Holder for the latest committed snapshot, with last-committed-wins
/// semantics for overlapping fetches.
///
/// Each fetch attempt calls [`SnapshotCell::begin`], which clears the
/// previous snapshot and error and hands back a sequence number. The
/// completion then calls [`SnapshotCell::commit`] or [`SnapshotCell::fail`]
/// with that number; a completion superseded by a later-begun,
/// already-committed fetch is dropped instead of overwriting the newer
/// result. At most one error message is held at a time.
#[derive(Debug, Default)]
pub struct SnapshotCell {
    next_seq: u64,
    committed_seq: Option<u64>,
    snapshot: Option<WeatherSnapshot>,
    error: Option<String>,
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new fetch attempt: clears prior weather and error state and
    /// returns the sequence number to complete with.
    pub fn begin(&mut self) -> u64 {
        self.next_seq += 1;
        self.snapshot = None;
        self.error = None;
        self.committed_seq = None;
        self.next_seq
    }

    /// Commit a successful fetch. Returns false (and changes nothing) if a
    /// newer fetch already committed.
    pub fn commit(&mut self, seq: u64, snapshot: WeatherSnapshot) -> bool {
        if self.superseded(seq) {
            return false;
        }
        self.committed_seq = Some(seq);
        self.snapshot = Some(snapshot);
        self.error = None;
        true
    }

    /// Record a failed fetch. The message replaces any previous error.
    /// Returns false if a newer fetch already committed.
    pub fn fail(&mut self, seq: u64, message: impl Into<String>) -> bool {
        if self.superseded(seq) {
            return false;
        }
        self.committed_seq = Some(seq);
        self.snapshot = None;
        self.error = Some(message.into());
        true
    }

    fn superseded(&self, seq: u64) -> bool {
        matches!(self.committed_seq, Some(committed) if committed > seq)
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(city: &str) -> WeatherSnapshot {
        WeatherSnapshot {
            city: city.to_string(),
            temperature_c: 21.0,
            description: "clear sky".to_string(),
            humidity_pct: 40,
            wind_speed_mps: 3.1,
            utc_offset_secs: 0,
            sunrise_epoch: 21_600,
            sunset_epoch: 64_800,
        }
    }

    #[test]
    fn begin_clears_previous_state() {
        let mut cell = SnapshotCell::new();
        let seq = cell.begin();
        assert!(cell.commit(seq, snapshot("Kyiv")));
        assert!(cell.snapshot().is_some());

        cell.begin();
        assert!(cell.snapshot().is_none());
        assert!(cell.error().is_none());
    }

    #[test]
    fn stale_commit_does_not_overwrite_newer_result() {
        let mut cell = SnapshotCell::new();
        let old = cell.begin();
        let new = cell.begin();
        assert!(cell.commit(new, snapshot("Lviv")));

        assert!(!cell.commit(old, snapshot("Kyiv")));
        assert_eq!(cell.snapshot().map(|s| s.city.as_str()), Some("Lviv"));
    }

    #[test]
    fn stale_failure_does_not_clobber_newer_result() {
        let mut cell = SnapshotCell::new();
        let old = cell.begin();
        let new = cell.begin();
        assert!(cell.commit(new, snapshot("Lviv")));

        assert!(!cell.fail(old, "city not found"));
        assert!(cell.error().is_none());
        assert!(cell.snapshot().is_some());
    }

    #[test]
    fn failure_replaces_previous_error() {
        let mut cell = SnapshotCell::new();
        let seq = cell.begin();
        assert!(cell.fail(seq, "network down"));

        let seq = cell.begin();
        assert!(cell.fail(seq, "city not found"));
        assert_eq!(cell.error(), Some("city not found"));
    }
}
