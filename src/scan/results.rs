use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::profile::{Frame, FrameId, SpanId, SpanNode, Subject};
use crate::search::TextMatch;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// One matched frame or span and what to highlight in its text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchEntry {
    #[serde(flatten)]
    pub subject: Subject,

    /// Character ranges into `subject.text()`, sorted and non-overlapping
    #[serde(serialize_with = "serialize_ranges")]
    pub ranges: Vec<Range<usize>>,

    pub score: f64,
}

/// Key of an entry in a [`ResultSet`]. Spans order before frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum MatchRef {
    Span(SpanId),
    Frame(FrameId),
}

/// Every match found for one completed query.
///
/// Never modified after it is built; each new set carries a fresh
/// `generation` so consumers can detect replacement by comparing numbers.
#[derive(Debug, Clone)]
pub struct ResultSet {
    generation: u64,
    frame_matches: HashMap<FrameId, MatchEntry>,
    span_matches: HashMap<SpanId, MatchEntry>,
}

impl ResultSet {
    pub fn empty() -> Self {
        ResultSetBuilder::new().build()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn frame_matches(&self) -> &HashMap<FrameId, MatchEntry> {
        &self.frame_matches
    }

    pub fn span_matches(&self) -> &HashMap<SpanId, MatchEntry> {
        &self.span_matches
    }

    pub fn len(&self) -> usize {
        self.frame_matches.len() + self.span_matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_matches.is_empty() && self.span_matches.is_empty()
    }

    pub fn get(&self, key: MatchRef) -> Option<&MatchEntry> {
        match key {
            MatchRef::Frame(id) => self.frame_matches.get(&id),
            MatchRef::Span(id) => self.span_matches.get(&id),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MatchRef, &MatchEntry)> {
        let spans = self
            .span_matches
            .iter()
            .map(|(id, entry)| (MatchRef::Span(*id), entry));
        let frames = self
            .frame_matches
            .iter()
            .map(|(id, entry)| (MatchRef::Frame(*id), entry));
        spans.chain(frames)
    }
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Accumulator owned by a running scan
#[derive(Debug, Default)]
pub(crate) struct ResultSetBuilder {
    frame_matches: HashMap<FrameId, MatchEntry>,
    span_matches: HashMap<SpanId, MatchEntry>,
}

impl ResultSetBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// First frame wins if two share an identity
    pub(crate) fn add_frame(&mut self, frame: &Frame, m: TextMatch) {
        if let Entry::Vacant(slot) = self.frame_matches.entry(frame.identity) {
            slot.insert(MatchEntry {
                subject: Subject::Frame(frame.clone()),
                ranges: m.ranges,
                score: m.score,
            });
        }
    }

    pub(crate) fn add_span(&mut self, span: &SpanNode, m: TextMatch) {
        if let Entry::Vacant(slot) = self.span_matches.entry(span.span_id) {
            slot.insert(MatchEntry {
                subject: Subject::Span(span.clone()),
                ranges: m.ranges,
                score: m.score,
            });
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.frame_matches.len() + self.span_matches.len()
    }

    pub(crate) fn build(self) -> ResultSet {
        ResultSet {
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            frame_matches: self.frame_matches,
            span_matches: self.span_matches,
        }
    }
}

fn serialize_ranges<S: Serializer>(
    ranges: &[Range<usize>],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(ranges.iter().map(|r| [r.start, r.end]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(name: &str, id: u64) -> Frame {
        Frame::new(name, 0.0, 1.0, 0, FrameId(id))
    }

    fn hit(range: Range<usize>) -> TextMatch {
        TextMatch {
            score: 1.0,
            ranges: vec![range],
        }
    }

    #[test]
    fn test_generations_increase() {
        let a = ResultSet::empty();
        let b = ResultSet::empty();
        assert!(b.generation() > a.generation());
    }

    #[test]
    fn test_builder_keeps_first_duplicate() {
        let mut builder = ResultSetBuilder::new();
        builder.add_frame(&frame("first", 1), hit(0..1));
        builder.add_frame(&frame("second", 1), hit(0..2));
        builder.add_span(&SpanNode::new("span", 0.0, 1.0, 0, SpanId(1)), hit(0..1));

        let results = builder.build();
        assert_eq!(results.len(), 2);
        let entry = results.get(MatchRef::Frame(FrameId(1))).unwrap();
        assert_eq!(entry.subject.text(), "first");
        assert!(results.get(MatchRef::Span(SpanId(1))).is_some());
        assert!(results.get(MatchRef::Span(SpanId(2))).is_none());
    }

    #[test]
    fn test_entry_serializes_ranges_as_pairs() {
        let entry = MatchEntry {
            subject: Subject::Frame(frame("foofoo", 3)),
            ranges: vec![0..3],
            score: 3.0,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "frame");
        assert_eq!(json["target"]["name"], "foofoo");
        assert_eq!(json["ranges"], serde_json::json!([[0, 3]]));
    }
}
