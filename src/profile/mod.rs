mod types;

pub use types::*;

use serde::Deserialize;
use std::fs;
use std::hash::{DefaultHasher, Hash, Hasher};

/// Errors that can occur while loading a chart snapshot
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid profile JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for profile loading
pub type ProfileResult<T> = Result<T, ProfileError>;

#[derive(Debug, Deserialize)]
struct RawFrame {
    name: String,
    start: f64,
    end: f64,
    #[serde(default)]
    depth: u32,
    #[serde(default)]
    id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawSpan {
    text: String,
    start: f64,
    end: f64,
    #[serde(default)]
    depth: u32,
    #[serde(alias = "spanId")]
    span_id: u64,
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    #[serde(default)]
    frames: Vec<RawFrame>,
    #[serde(default)]
    spans: Vec<RawSpan>,
}

/// Load a snapshot from a JSON file
pub fn load_profile(path: &str) -> ProfileResult<ProfileSnapshot> {
    let json = fs::read_to_string(path)
        .map_err(|e| ProfileError::Io(format!("Failed to read {}: {}", path, e)))?;
    parse_profile(&json)
}

/// Parse a snapshot from JSON text.
///
/// Frames without an explicit `id` get one derived from their name, start and
/// depth, so reloading the same profile yields the same identities.
pub fn parse_profile(json: &str) -> ProfileResult<ProfileSnapshot> {
    let raw: RawProfile = serde_json::from_str(json)?;

    let frames = raw
        .frames
        .into_iter()
        .map(|f| {
            let identity = match f.id {
                Some(id) => FrameId(id),
                None => derive_frame_id(&f.name, f.start, f.depth),
            };
            Frame::new(f.name, f.start, f.end, f.depth, identity)
        })
        .collect();

    let spans = raw
        .spans
        .into_iter()
        .map(|s| SpanNode::new(s.text, s.start, s.end, s.depth, SpanId(s.span_id)))
        .collect();

    Ok(ProfileSnapshot { frames, spans })
}

/// Derive a stable frame identity from the values that place it on the chart
pub fn derive_frame_id(name: &str, start: f64, depth: u32) -> FrameId {
    // DefaultHasher::new() uses fixed keys, so this is stable run to run
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    start.to_bits().hash(&mut hasher);
    depth.hash(&mut hasher);
    FrameId(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile() {
        let json = r#"{
            "frames": [
                {"name": "main", "start": 0, "end": 10, "depth": 0, "id": 7},
                {"name": "foo", "start": 0, "end": 4, "depth": 1}
            ],
            "spans": [
                {"text": "GET /index", "start": 1, "end": 3, "depth": 0, "spanId": 42}
            ]
        }"#;

        let snapshot = parse_profile(json).unwrap();
        assert_eq!(snapshot.frames.len(), 2);
        assert_eq!(snapshot.frames[0].identity, FrameId(7));
        assert_eq!(snapshot.frames[1].identity, derive_frame_id("foo", 0.0, 1));
        assert_eq!(snapshot.spans.len(), 1);
        assert_eq!(snapshot.spans[0].span_id, SpanId(42));
        assert_eq!(snapshot.spans[0].text, "GET /index");
    }

    #[test]
    fn test_derived_ids_are_stable() {
        let a = derive_frame_id("render", 12.5, 3);
        let b = derive_frame_id("render", 12.5, 3);
        let c = derive_frame_id("render", 12.5, 4);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let snapshot = parse_profile("{}").unwrap();
        assert!(snapshot.frames.is_empty());
        assert!(snapshot.spans.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let result = parse_profile("{ not json");
        assert!(matches!(result, Err(ProfileError::Json(_))));
    }

    #[test]
    fn test_subject_accessors() {
        let subject = Subject::Span(SpanNode::new("db.query", 2.0, 5.0, 1, SpanId(3)));
        assert_eq!(subject.text(), "db.query");
        assert_eq!(subject.start(), 2.0);
        assert_eq!(subject.end(), 5.0);
        assert_eq!(subject.depth(), 1);
        assert_eq!(subject.kind(), SubjectKind::Span);
    }
}
