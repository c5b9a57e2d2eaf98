use std::ops::Range;

const SCORE_MATCH: f64 = 16.0;
const BONUS_CONSECUTIVE: f64 = 8.0;
const PENALTY_GAP_START: f64 = 3.0;
const PENALTY_GAP_EXTENSION: f64 = 1.0;
// Below SCORE_MATCH, so every complete match keeps a positive score
const MAX_GAP_PENALTY: f64 = 15.0;
// Characters of leading offset that halve the score
const START_DECAY: f64 = 16.0;

/// A fuzzy query, case-folded once so it can be run against many subjects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyPattern {
    chars: Vec<char>,
}

impl FuzzyPattern {
    pub fn new(query: &str) -> Self {
        Self {
            chars: query.chars().map(fold_case).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// Result of a successful fuzzy match
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch {
    /// Higher is better, always > 0
    pub score: f64,
    /// Matched character runs, sorted and non-overlapping
    pub ranges: Vec<Range<usize>>,
}

/// Case-insensitive, in-order subsequence match.
///
/// The first complete occurrence is found greedily, then narrowed by scanning
/// backwards from its last character. If the narrowed window is still
/// scattered while the query also occurs contiguously, the contiguous
/// occurrence wins.
pub fn fuzzy_match(text: &str, pattern: &FuzzyPattern) -> Option<FuzzyMatch> {
    let needle = &pattern.chars;
    if needle.is_empty() {
        return None;
    }

    let hay: Vec<char> = text.chars().map(fold_case).collect();
    if needle.len() > hay.len() {
        return None;
    }

    let end = forward_scan(&hay, needle)?;
    let start = backward_scan(&hay, needle, end);

    let mut positions = Vec::with_capacity(needle.len());
    let mut pidx = 0;
    for (i, &c) in hay.iter().enumerate().take(end + 1).skip(start) {
        if pidx < needle.len() && c == needle[pidx] {
            positions.push(i);
            pidx += 1;
        }
    }

    if !is_contiguous(&positions)
        && let Some(at) = hay.windows(needle.len()).position(|w| w == needle.as_slice())
    {
        positions = (at..at + needle.len()).collect();
    }

    let score = score_positions(&positions);
    if score <= 0.0 {
        return None;
    }

    Some(FuzzyMatch {
        score,
        ranges: positions_to_ranges(&positions),
    })
}

/// Index of the character completing the first greedy occurrence
fn forward_scan(hay: &[char], needle: &[char]) -> Option<usize> {
    let mut pidx = 0;
    for (i, &c) in hay.iter().enumerate() {
        if c == needle[pidx] {
            pidx += 1;
            if pidx == needle.len() {
                return Some(i);
            }
        }
    }
    None
}

/// Latest start from which the needle still fits before `end`
fn backward_scan(hay: &[char], needle: &[char], end: usize) -> usize {
    let mut pidx = needle.len();
    for i in (0..=end).rev() {
        if hay[i] == needle[pidx - 1] {
            pidx -= 1;
            if pidx == 0 {
                return i;
            }
        }
    }
    0
}

fn score_positions(positions: &[usize]) -> f64 {
    let Some(&first) = positions.first() else {
        return 0.0;
    };

    let mut raw = SCORE_MATCH * positions.len() as f64;
    for pair in positions.windows(2) {
        let gap = pair[1] - pair[0] - 1;
        if gap == 0 {
            raw += BONUS_CONSECUTIVE;
        } else {
            let penalty = PENALTY_GAP_START + PENALTY_GAP_EXTENSION * (gap - 1) as f64;
            raw -= penalty.min(MAX_GAP_PENALTY);
        }
    }

    raw / (1.0 + first as f64 / START_DECAY)
}

fn is_contiguous(positions: &[usize]) -> bool {
    positions.windows(2).all(|pair| pair[1] == pair[0] + 1)
}

fn positions_to_ranges(positions: &[usize]) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    for &pos in positions {
        match ranges.last_mut() {
            Some(last) if last.end == pos => last.end = pos + 1,
            _ => ranges.push(pos..pos + 1),
        }
    }
    ranges
}

fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}
