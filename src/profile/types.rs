use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a frame, constant across re-renders of the same profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub u64);

/// Identity of a span node as assigned by the trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanId(pub u64);

/// A call-stack sample record laid out on the flame chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Function name, also the display text
    pub name: String,

    /// Start offset on the chart's time/weight axis
    pub start: f64,

    /// End offset on the chart's time/weight axis
    pub end: f64,

    /// Nesting depth (0 = root)
    pub depth: u32,

    /// Stable key for this frame
    pub identity: FrameId,
}

/// A chart node derived from a trace span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanNode {
    /// Display text
    pub text: String,

    /// Start offset on the chart's time axis
    pub start: f64,

    /// End offset on the chart's time axis
    pub end: f64,

    /// Nesting depth (0 = root)
    pub depth: u32,

    /// Trace-assigned span identity
    pub span_id: SpanId,
}

impl Frame {
    pub fn new(
        name: impl Into<String>,
        start: f64,
        end: f64,
        depth: u32,
        identity: FrameId,
    ) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            depth,
            identity,
        }
    }
}

impl SpanNode {
    pub fn new(text: impl Into<String>, start: f64, end: f64, depth: u32, span_id: SpanId) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            depth,
            span_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Frame,
    Span,
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectKind::Frame => write!(f, "frame"),
            SubjectKind::Span => write!(f, "span"),
        }
    }
}

/// Anything the search can match against: either a frame or a span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "lowercase")]
pub enum Subject {
    Frame(Frame),
    Span(SpanNode),
}

impl Subject {
    /// Text the matchers run against and the ranges index into
    pub fn text(&self) -> &str {
        match self {
            Subject::Frame(frame) => &frame.name,
            Subject::Span(span) => &span.text,
        }
    }

    pub fn start(&self) -> f64 {
        match self {
            Subject::Frame(frame) => frame.start,
            Subject::Span(span) => span.start,
        }
    }

    pub fn end(&self) -> f64 {
        match self {
            Subject::Frame(frame) => frame.end,
            Subject::Span(span) => span.end,
        }
    }

    pub fn depth(&self) -> u32 {
        match self {
            Subject::Frame(frame) => frame.depth,
            Subject::Span(span) => span.depth,
        }
    }

    pub fn kind(&self) -> SubjectKind {
        match self {
            Subject::Frame(_) => SubjectKind::Frame,
            Subject::Span(_) => SubjectKind::Span,
        }
    }
}

/// On-disk snapshot of a chart: what the chart-building layer hands over
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    #[serde(default)]
    pub frames: Vec<Frame>,

    #[serde(default)]
    pub spans: Vec<SpanNode>,
}
