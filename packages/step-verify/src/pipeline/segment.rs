//! Rationale segmentation.
//!
//! Splits free-form chain-of-thought into sentence-like steps. This is a
//! heuristic, not a sentence boundary detector: a boundary is a whitespace
//! character right after `.` or `?`, unless one of two guards fires:
//!
//! - abbreviation guard: the four characters before the whitespace read
//!   word, `.`, word, any (`e.g.`, `i.e.`, `U.S.`);
//! - initials guard: the three characters before the whitespace read
//!   ASCII capital, ASCII lowercase, `.` (`Dr.`, `Mr.`, `St.`).
//!
//! Exactly one whitespace character is consumed per boundary.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::step::Step;

lazy_static! {
    // Candidate boundary: terminal punctuation followed by one whitespace char.
    static ref BOUNDARY_REGEX: Regex = Regex::new(r"[.?](\s)").unwrap();
}

/// A raw piece of the input and the separator consumed after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,

    /// `None` for the last piece
    pub separator: Option<&'a str>,
}

/// Split `text` into raw pieces.
///
/// Concatenating every `text` followed by its `separator` reproduces the
/// input exactly. Empty input yields a single empty piece.
pub fn split_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut start = 0;

    for caps in BOUNDARY_REGEX.captures_iter(text) {
        let Some(ws) = caps.get(1) else { continue };
        if is_guarded(&text[..ws.start()]) {
            continue;
        }

        segments.push(Segment {
            text: &text[start..ws.start()],
            separator: Some(ws.as_str()),
        });
        start = ws.end();
    }

    segments.push(Segment {
        text: &text[start..],
        separator: None,
    });
    segments
}

/// Split a rationale into steps.
///
/// Empty or whitespace-only input yields no steps. Text without any
/// boundary becomes a single step. Pieces that are blank after trimming are
/// dropped and indices stay contiguous.
pub fn rationale_to_steps(rationale: &str) -> Vec<Step> {
    split_segments(rationale)
        .into_iter()
        .map(|segment| segment.text.trim())
        .filter(|text| !text.is_empty())
        .enumerate()
        .map(|(index, text)| Step::new(index, text))
        .collect()
}

/// Whether a boundary right after `prefix` is suppressed by a guard.
fn is_guarded(prefix: &str) -> bool {
    let mut tail = prefix.chars().rev();
    let c1 = tail.next();
    let c2 = tail.next();
    let c3 = tail.next();
    let c4 = tail.next();

    let initials = matches!(
        (c3, c2, c1),
        (Some(a), Some(b), Some('.')) if a.is_ascii_uppercase() && b.is_ascii_lowercase()
    );

    let abbreviation = matches!(
        (c4, c3, c2, c1),
        (Some(a), Some('.'), Some(b), Some(_)) if is_word_char(a) && is_word_char(b)
    );

    initials || abbreviation
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
