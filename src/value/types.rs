//! Leaf value types shared by the native and wire representations

use chrono::{DateTime, TimeZone, Utc};

use super::errors::{CodecError, CodecResult};

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_MILLI: i64 = 1_000_000;

/// A point in time with nanosecond precision, as carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    seconds: i64,
    nanos: i32,
}

impl Timestamp {
    /// Create a timestamp, rejecting out-of-range nanoseconds
    pub fn new(seconds: i64, nanos: i32) -> CodecResult<Self> {
        if !(0..NANOS_PER_SECOND as i32).contains(&nanos) {
            return Err(CodecError::invalid_argument(
                "nanoseconds",
                format!("Must be in the range [0, 999999999], got {}", nanos),
            ));
        }
        Ok(Self { seconds, nanos })
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Convert from milliseconds since the epoch
    pub fn from_millis(millis: i64) -> Self {
        let seconds = millis.div_euclid(1000);
        let nanos = (millis.rem_euclid(1000) * NANOS_PER_MILLI) as i32;
        Self { seconds, nanos }
    }

    /// Convert from a native date
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos() as i32,
        }
    }

    /// Convert to a native date
    pub fn to_datetime(&self) -> CodecResult<DateTime<Utc>> {
        Utc.timestamp_opt(self.seconds, self.nanos as u32)
            .single()
            .ok_or_else(|| {
                CodecError::decode_failed(format!(
                    "Timestamp {}.{:09} is outside the representable date range",
                    self.seconds, self.nanos
                ))
            })
    }

    /// Milliseconds since the epoch, truncating sub-millisecond precision
    pub fn to_millis(&self) -> i64 {
        self.seconds * 1000 + (self.nanos as i64) / NANOS_PER_MILLI
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn nanos(&self) -> i32 {
        self.nanos
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

/// A geographic coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Create a geo point, rejecting out-of-range coordinates
    pub fn new(latitude: f64, longitude: f64) -> CodecResult<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CodecError::invalid_argument(
                "latitude",
                format!("Must be in the range [-90, 90], got {}", latitude),
            ));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CodecError::invalid_argument(
                "longitude",
                format!("Must be in the range [-180, 180], got {}", longitude),
            ));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// A typed reference to a document, addressed by its slash-separated path
/// relative to the database root (e.g. `users/alice`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    path: String,
}

impl DocumentRef {
    /// Create a reference from a relative document path
    pub fn new(path: impl Into<String>) -> CodecResult<Self> {
        let path = path.into();
        let segments: Vec<&str> = path.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) || segments.len() % 2 != 0 {
            return Err(CodecError::invalid_argument(
                "documentPath",
                format!(
                    "\"{}\" must point to a document (an even number of non-empty segments)",
                    path
                ),
            ));
        }
        Ok(Self { path })
    }

    /// Relative path of the document
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Path of the parent collection
    pub fn parent(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) => &self.path[..idx],
            None => "",
        }
    }
}

/// An insertion-ordered string-keyed map.
///
/// Key order is kept for stable round-trips but is not significant for
/// equality.
#[derive(Debug, Clone)]
pub struct FieldMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> FieldMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert a value, replacing an existing entry in place.
    ///
    /// Returns the previous value if the key was present.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<V> Default for FieldMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: PartialEq> PartialEq for FieldMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |o| o == v))
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for FieldMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V> IntoIterator for FieldMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
