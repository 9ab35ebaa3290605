//! Plain-text projection and highlight markup for fetched case documents.
//!
//! Documents arrive as HTML blobs. Search runs over the text with all tags
//! removed and character references decoded; offsets reported by the search
//! layer are byte offsets into that projection. Highlighting maps those
//! offsets back onto the original markup, so tags, attributes, and character
//! references are never rewritten or split.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::search::Match;

/// Class applied to every highlighted occurrence.
pub const HIGHLIGHT_CLASS: &str = "search-highlight";
/// Extra class applied to the occurrence the navigator is positioned on.
pub const CURRENT_HIGHLIGHT_CLASS: &str = "search-highlight-current";

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);")
        .expect("valid character reference regex")
});

/// A run of projection text and the source bytes it came from.
///
/// Literal runs map byte for byte. A decoded character reference is atomic:
/// any overlap covers the whole `&...;` in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Piece {
    text_start: usize,
    text_len: usize,
    src_start: usize,
    src_len: usize,
    atomic: bool,
}

impl Piece {
    fn text_end(&self) -> usize {
        self.text_start + self.text_len
    }
}

/// Text content of an HTML document, with a map back to source bytes.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    text: String,
    pieces: Vec<Piece>,
}

impl Projection {
    /// Drop every tag and decode known character references.
    ///
    /// `&nbsp;` becomes a plain space so phrase queries match across it.
    /// Unknown references stay as written.
    pub fn new(html: &str) -> Self {
        let mut projection = Self::default();
        let mut last = 0;
        for tag in TAG.find_iter(html) {
            if tag.start() > last {
                projection.push_text(html, last, tag.start());
            }
            last = tag.end();
        }
        if last < html.len() {
            projection.push_text(html, last, html.len());
        }
        projection
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Source byte ranges covering the projection range `start..end`, one per
    /// contiguous run of source. Ranges are widened to whole character
    /// references and split at tags.
    pub fn source_ranges(&self, start: usize, end: usize) -> Vec<Range<usize>> {
        let mut out: Vec<Range<usize>> = Vec::new();
        let first = self.pieces.partition_point(|p| p.text_end() <= start);
        for piece in &self.pieces[first..] {
            if piece.text_start >= end {
                break;
            }
            let range = if piece.atomic {
                piece.src_start..piece.src_start + piece.src_len
            } else {
                let lo = start.max(piece.text_start) - piece.text_start;
                let hi = end.min(piece.text_end()) - piece.text_start;
                piece.src_start + lo..piece.src_start + hi
            };
            match out.last_mut() {
                Some(prev) if prev.end == range.start => prev.end = range.end,
                _ => out.push(range),
            }
        }
        out
    }

    fn push_text(&mut self, html: &str, start: usize, end: usize) {
        let run = &html[start..end];
        let mut cursor = 0;
        for caps in REFERENCE.captures_iter(run) {
            let Some(whole) = caps.get(0) else { continue };
            let Some(decoded) = decode_reference(&caps[1]) else {
                continue;
            };
            self.push_literal(start + cursor, &run[cursor..whole.start()]);
            self.push_reference(start + whole.start(), whole.len(), decoded);
            cursor = whole.end();
        }
        self.push_literal(start + cursor, &run[cursor..]);
    }

    fn push_literal(&mut self, src_start: usize, s: &str) {
        if s.is_empty() {
            return;
        }
        self.pieces.push(Piece {
            text_start: self.text.len(),
            text_len: s.len(),
            src_start,
            src_len: s.len(),
            atomic: false,
        });
        self.text.push_str(s);
    }

    fn push_reference(&mut self, src_start: usize, src_len: usize, decoded: char) {
        self.pieces.push(Piece {
            text_start: self.text.len(),
            text_len: decoded.len_utf8(),
            src_start,
            src_len,
            atomic: true,
        });
        self.text.push(decoded);
    }
}

/// Decode the body of a character reference (between `&` and `;`).
fn decode_reference(name: &str) -> Option<char> {
    let c = if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        char::from_u32(code)?
    } else {
        match name {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            "nbsp" => '\u{a0}',
            "sect" => '§',
            "para" => '¶',
            "copy" => '©',
            "ndash" => '–',
            "mdash" => '—',
            "lsquo" => '‘',
            "rsquo" => '’',
            "ldquo" => '“',
            "rdquo" => '”',
            "hellip" => '…',
            _ => return None,
        }
    };
    Some(if c == '\u{a0}' { ' ' } else { c })
}

/// Remove every tag from `html` and decode character references.
pub fn strip_tags(html: &str) -> String {
    Projection::new(html).text
}

/// Wrap each match in `<mark>` markup.
///
/// `matches` must be sorted, non-overlapping ranges into `projection`, which
/// must have been built from `html`. A match that straddles a tag boundary is
/// emitted as one `<mark>` per text node it touches. The match at index
/// `current` also gets [`CURRENT_HIGHLIGHT_CLASS`].
pub fn highlight(
    html: &str,
    projection: &Projection,
    matches: &[Match],
    current: Option<usize>,
) -> String {
    let mut out = String::with_capacity(html.len() + matches.len() * 48);
    let mut cursor = 0;
    for (i, m) in matches.iter().enumerate() {
        for range in projection.source_ranges(m.start, m.end) {
            out.push_str(&html[cursor..range.start]);
            push_mark(&mut out, &html[range.clone()], current == Some(i));
            cursor = range.end;
        }
    }
    out.push_str(&html[cursor..]);
    out
}

fn push_mark(out: &mut String, text: &str, is_current: bool) {
    out.push_str("<mark class=\"");
    out.push_str(HIGHLIGHT_CLASS);
    if is_current {
        out.push(' ');
        out.push_str(CURRENT_HIGHLIGHT_CLASS);
    }
    out.push_str("\">");
    out.push_str(text);
    out.push_str("</mark>");
}
