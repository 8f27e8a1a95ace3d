// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types shared by the store and the retrieval layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Great-circle distance to another point in meters (haversine formula).
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_000.0;
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }
}

/// An inclusive time range used for temporal candidate lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Whether the instant falls inside this window (inclusive on both ends).
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t <= self.end
    }
}

/// A single episodic memory known to the retrieval layer.
///
/// Everything except the embedding is flattened into the metadata document
/// stored alongside the vector, so a memory can be rebuilt from a store row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// Unique identifier; doubles as the vector store key.
    #[serde(default)]
    pub id: String,
    /// The textual content of this memory.
    #[serde(default)]
    pub content: String,
    /// Embedding vector for semantic search; empty until generated.
    #[serde(skip)]
    pub embedding: Vec<f32>,
    /// When the remembered event happened.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Where it happened, if known.
    #[serde(default)]
    pub location: Option<GeoPoint>,
    /// People involved in the event.
    #[serde(default)]
    pub people: Vec<String>,
    /// Emotional context labels.
    #[serde(default)]
    pub emotions: Vec<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Importance weight in [0.0, 1.0].
    #[serde(default = "default_importance")]
    pub importance: f64,
    /// How this memory was captured ("conversation", "photo_analysis", ...).
    #[serde(default)]
    pub source: String,
}

fn default_importance() -> f64 {
    0.5
}

impl Memory {
    /// Flatten this memory into the metadata document stored next to its
    /// embedding. The embedding itself is never part of the document.
    pub fn to_metadata(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Rebuild a memory from a store row. The row id is authoritative and
    /// overrides any id present in the document.
    pub fn from_metadata(
        id: &str,
        metadata: &serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        let mut memory: Memory = serde_json::from_value(metadata.clone())?;
        memory.id = id.to_string();
        Ok(memory)
    }
}

/// Ambient context supplied by the caller at retrieval time. All fields are
/// optional; an empty context disables the corresponding boosts.
#[derive(Debug, Clone, Default)]
pub struct RetrievalContext {
    /// Current location, used for the proximity boost.
    pub location: Option<GeoPoint>,
    /// People currently present or under discussion.
    pub people: Vec<String>,
    /// Explicit window for the temporal candidate list. When absent, the
    /// temporal signal is skipped entirely.
    pub time_window: Option<TimeWindow>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_memory() -> Memory {
        Memory {
            id: "mem-1".to_string(),
            content: "Coffee with Dana at the harbor".to_string(),
            embedding: vec![0.1, 0.2, 0.3],
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
            location: Some(GeoPoint { latitude: 47.6, longitude: -122.33 }),
            people: vec!["Dana".to_string()],
            emotions: vec!["content".to_string()],
            tags: vec!["coffee".to_string()],
            importance: 0.8,
            source: "conversation".to_string(),
        }
    }

    #[test]
    fn metadata_roundtrip_preserves_fields() {
        let memory = sample_memory();
        let doc = memory.to_metadata();
        let rebuilt = Memory::from_metadata("mem-1", &doc).unwrap();
        assert_eq!(rebuilt.id, memory.id);
        assert_eq!(rebuilt.content, memory.content);
        assert_eq!(rebuilt.timestamp, memory.timestamp);
        assert_eq!(rebuilt.location, memory.location);
        assert_eq!(rebuilt.people, memory.people);
        assert_eq!(rebuilt.importance, memory.importance);
        // The embedding never travels through metadata.
        assert!(rebuilt.embedding.is_empty());
    }

    #[test]
    fn from_metadata_row_id_wins() {
        let mut memory = sample_memory();
        memory.id = "stale-id".to_string();
        let doc = memory.to_metadata();
        let rebuilt = Memory::from_metadata("fresh-id", &doc).unwrap();
        assert_eq!(rebuilt.id, "fresh-id");
    }

    #[test]
    fn from_metadata_fills_defaults() {
        let doc = serde_json::json!({ "content": "bare note" });
        let rebuilt = Memory::from_metadata("m", &doc).unwrap();
        assert_eq!(rebuilt.content, "bare note");
        assert!(rebuilt.people.is_empty());
        assert!((rebuilt.importance - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn from_metadata_rejects_non_object() {
        let doc = serde_json::json!([1, 2, 3]);
        assert!(Memory::from_metadata("m", &doc).is_err());
    }

    #[test]
    fn haversine_zero_for_same_point() {
        let p = GeoPoint { latitude: 47.6, longitude: -122.33 };
        assert!(p.distance_meters(&p) < 1e-6);
    }

    #[test]
    fn haversine_one_degree_latitude() {
        let a = GeoPoint { latitude: 0.0, longitude: 0.0 };
        let b = GeoPoint { latitude: 1.0, longitude: 0.0 };
        let d = a.distance_meters(&b);
        // One degree of latitude is roughly 111.2 km.
        assert!((d - 111_195.0).abs() < 200.0, "got {d}");
    }

    #[test]
    fn time_window_contains_is_inclusive() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap();
        let window = TimeWindow { start, end };
        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(window.contains(Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()));
    }
}
