//! Incremental literal search over a fetched HTML document.
//!
//! The navigator owns a copy of the source markup. Every query change
//! recomputes the match list from scratch over the decoded text projection and
//! resets the cursor to the first match.

use std::fmt;

use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use crate::html::{self, Projection};

/// Byte range of one occurrence in the plain-text projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
}

/// Where the navigator stands, for status lines like "3 of 7".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// No query entered.
    Idle,
    NoMatches,
    /// `index` is zero-based.
    At { index: usize, total: usize },
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => Ok(()),
            Self::NoMatches => f.write_str("no matches"),
            Self::At { index, total } => write!(f, "{} of {}", index + 1, total),
        }
    }
}

/// Search state over one document.
#[derive(Debug, Clone)]
pub struct SearchState {
    source: String,
    projection: Projection,
    query: String,
    pattern: Option<Regex>,
    matches: Vec<Match>,
    current: usize,
}

impl SearchState {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let projection = Projection::new(&source);
        Self {
            source,
            projection,
            query: String::new(),
            pattern: None,
            matches: Vec::new(),
            current: 0,
        }
    }

    /// Replace the query and recompute all matches.
    ///
    /// The query is matched literally and case-insensitively; regex
    /// metacharacters carry no special meaning. A blank query clears the
    /// results.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.current = 0;
        self.matches.clear();
        self.pattern = None;

        if query.trim().is_empty() {
            return;
        }

        let pattern = match RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
        {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "search query could not be compiled");
                return;
            }
        };

        self.matches = pattern
            .find_iter(self.projection.text())
            .map(|m| Match {
                start: m.start(),
                end: m.end(),
            })
            .collect();
        self.pattern = Some(pattern);
        debug!(query = %self.query, matches = self.matches.len(), "search updated");
    }

    /// Advance to the next match, wrapping to the first after the last.
    pub fn next_match(&mut self) {
        if self.matches.is_empty() {
            return;
        }
        self.current = (self.current + 1) % self.matches.len();
    }

    /// Step back to the previous match, wrapping to the last before the first.
    pub fn previous_match(&mut self) {
        if self.matches.is_empty() {
            return;
        }
        self.current = if self.current == 0 {
            self.matches.len() - 1
        } else {
            self.current - 1
        };
    }

    /// The source markup with every occurrence of the query highlighted.
    ///
    /// Does not change the navigator state; repeated calls return the same
    /// string.
    pub fn render_highlighted(&self) -> String {
        let current = (!self.matches.is_empty()).then_some(self.current);
        html::highlight(&self.source, &self.projection, &self.matches, current)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Zero-based cursor position. Meaningless when there are no matches.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_match(&self) -> Option<Match> {
        self.matches.get(self.current).copied()
    }

    /// Plain-text projection the match offsets refer to.
    pub fn text(&self) -> &str {
        self.projection.text()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn status(&self) -> SearchStatus {
        if self.pattern.is_none() {
            SearchStatus::Idle
        } else if self.matches.is_empty() {
            SearchStatus::NoMatches
        } else {
            SearchStatus::At {
                index: self.current,
                total: self.matches.len(),
            }
        }
    }

    /// Text around a match, with up to `radius` characters either side and
    /// whitespace runs collapsed.
    pub fn snippet(&self, m: Match, radius: usize) -> String {
        let text = self.projection.text();
        let before = &text[..m.start];
        let after = &text[m.end..];

        let start = match radius {
            0 => m.start,
            r => before
                .char_indices()
                .rev()
                .nth(r - 1)
                .map(|(i, _)| i)
                .unwrap_or(0),
        };
        let end = after
            .char_indices()
            .nth(radius)
            .map(|(i, _)| m.end + i)
            .unwrap_or(text.len());

        let mut out = String::new();
        if start > 0 {
            out.push_str("...");
        }
        out.push_str(&collapse_whitespace(&text[start..end]));
        if end < text.len() {
            out.push_str("...");
        }
        out
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
