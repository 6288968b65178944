//! Parser for the scoring script's human-readable output.
//!
//! The script prints one line per graded question and, usually, a summary:
//!
//! ```text
//! Q1       1/1          Namespaces
//! Q2       0/2          Pods
//! QP1      1/1          Preview: Liveness Probe
//! TOTAL SCORE: 1 / 3 (33%)
//! ```
//!
//! Anything that does not match is ignored, so banners, colours and partial
//! output never stop the rest of the text from being read.
//!
//! Preview questions are listed but never count toward the derived totals.

use serde::{Deserialize, Serialize};

use crate::document::is_item_id;
use crate::model::ScoreItem;

/// Marker that introduces the authoritative summary line.
const TOTAL_MARKER: &str = "TOTAL SCORE:";

/// Everything extracted from one run's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedScores {
    /// Per-question lines in output order.
    pub items: Vec<ScoreItem>,
    pub total_score: u32,
    pub max_score: u32,
    pub percentage: u32,
    /// Whether the totals came from a `TOTAL SCORE:` line.
    pub from_summary: bool,
}

/// The three integers of `TOTAL SCORE: a / b (c%)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotalLine {
    pub score: u32,
    pub max: u32,
    pub percentage: u32,
}

/// Parse the full stdout of a scoring run.
pub fn parse_score_output(output: &str) -> ParsedScores {
    let items: Vec<ScoreItem> = output.lines().filter_map(parse_item_line).collect();

    if let Some(total) = find_total_line(output) {
        return ParsedScores {
            items,
            total_score: total.score,
            max_score: total.max,
            percentage: total.percentage,
            from_summary: true,
        };
    }

    let scored = items.iter().filter(|i| !i.is_preview());
    let total_score = scored.clone().map(|i| u64::from(i.score)).sum::<u64>();
    let max_score = scored.map(|i| u64::from(i.max_score)).sum::<u64>();

    ParsedScores {
        items,
        total_score: saturate(total_score),
        max_score: saturate(max_score),
        percentage: floor_percentage(total_score, max_score),
        from_summary: false,
    }
}

/// `floor(score * 100 / max)`, or 0 when nothing was possible.
pub fn floor_percentage(score: u64, max: u64) -> u32 {
    if max == 0 {
        return 0;
    }
    saturate(score.saturating_mul(100) / max)
}

fn saturate(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Parse `Q<id> <scored>/<possible> <topic>`.
pub fn parse_item_line(line: &str) -> Option<ScoreItem> {
    let rest = line.trim().strip_prefix('Q')?;
    let (id, rest) = split_token(rest)?;
    if !is_item_id(id) {
        return None;
    }

    let (fraction, topic) = split_token(rest)?;
    let (scored, possible) = fraction.split_once('/')?;
    let scored = parse_digits(scored)?;
    let possible = parse_digits(possible)?;
    if topic.is_empty() {
        return None;
    }
    if scored > possible {
        tracing::debug!("skipping score line with more points than possible: {line:?}");
        return None;
    }

    Some(ScoreItem::new(id, scored, possible, topic))
}

/// Split off the token before the first whitespace run. The remainder must exist.
fn split_token(s: &str) -> Option<(&str, &str)> {
    let end = s.find(char::is_whitespace)?;
    Some((&s[..end], s[end..].trim_start()))
}

/// Unsigned decimal with no sign or separators.
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Find the first well-formed `TOTAL SCORE: a / b (c%)` anywhere in the text.
///
/// A summary with `a > b` or `c > 100` is not a valid total and is skipped.
pub fn find_total_line(output: &str) -> Option<TotalLine> {
    output
        .match_indices(TOTAL_MARKER)
        .filter_map(|(idx, _)| parse_total_tail(&output[idx + TOTAL_MARKER.len()..]))
        .find(|total| {
            let consistent = total.score <= total.max && total.percentage <= 100;
            if !consistent {
                tracing::debug!(?total, "skipping inconsistent summary line");
            }
            consistent
        })
}

fn parse_total_tail(tail: &str) -> Option<TotalLine> {
    let mut cursor = Cursor::new(tail);
    let score = cursor.skip_ws().number()?;
    cursor.skip_ws().consume('/')?;
    let max = cursor.skip_ws().number()?;
    cursor.skip_ws().consume('(')?;
    let percentage = cursor.number()?;
    cursor.consume('%')?;
    cursor.consume(')')?;
    Some(TotalLine {
        score,
        max,
        percentage,
    })
}

struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(rest: &'a str) -> Self {
        Self { rest }
    }

    fn skip_ws(&mut self) -> &mut Self {
        self.rest = self.rest.trim_start();
        self
    }

    fn consume(&mut self, ch: char) -> Option<()> {
        self.rest = self.rest.strip_prefix(ch)?;
        Some(())
    }

    fn number(&mut self) -> Option<u32> {
        let end = self
            .rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.rest.len());
        let n = parse_digits(&self.rest[..end])?;
        self.rest = &self.rest[end..];
        Some(n)
    }
}
