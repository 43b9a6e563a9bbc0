//! Unified-diff hunk grouping and serialization for line-level change spans.
//!
//! This crate consumes an ordered span list produced by an upstream line diff
//! and turns it into renderable hunks:
//! - a span model (`Span`, `SpanKind`)
//! - a hunk generator (`generate_hunks`) that groups nearby changes under a
//!   configurable context window
//! - a serializer (`Hunk::write_to`, `format_hunks`) for the conventional
//!   `@@ -a,b +c,d @@` textual form
//!
//! The diff algorithm itself is not part of this crate: callers hand over an
//! alternating Equal/Insert/Delete span list covering both file versions, and
//! assemble any `diff --git`/`index`/`---`/`+++` header lines themselves.
//!
//! # Example
//!
//! ```rust
//! use hunklog_hunks::{HunkOptions, Span, format_hunks};
//!
//! let spans = vec![
//!     Span::equal("a\nb\n"),
//!     Span::delete("old\n"),
//!     Span::insert("new\n"),
//!     Span::equal("c\n"),
//! ];
//! let body = format_hunks(&spans, HunkOptions::default()).unwrap();
//! assert!(body.starts_with("@@ -1,4 +1,4 @@"));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Context window used when no explicit [`HunkOptions`] value is given.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Classification shared by input spans and rendered hunk operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Equal,
    Insert,
    Delete,
}

/// One maximal run of same-kind lines from the upstream line diff.
///
/// `text` is raw multi-line content; line splitting happens inside the
/// generator. Upstream guarantees that adjacent spans never share a kind and
/// that the span list covers both file versions completely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub kind: SpanKind,
    pub text: String,
}

impl Span {
    pub fn new(kind: SpanKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Unchanged run present in both file versions.
    pub fn equal(text: impl Into<String>) -> Self {
        Self::new(SpanKind::Equal, text)
    }

    /// Run present only in the new file version.
    pub fn insert(text: impl Into<String>) -> Self {
        Self::new(SpanKind::Insert, text)
    }

    /// Run present only in the old file version.
    pub fn delete(text: impl Into<String>) -> Self {
        Self::new(SpanKind::Delete, text)
    }
}

/// One rendered body line inside a hunk, without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub kind: SpanKind,
    pub text: String,
}

/// Options controlling hunk grouping.
///
/// `context_lines` is the number of unchanged lines shown before and after a
/// change; two change regions merge into one hunk when the unchanged run
/// between them is at most `2 * context_lines`. Zero is a valid no-context
/// mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunkOptions {
    pub context_lines: usize,
}

impl HunkOptions {
    pub fn new(context_lines: usize) -> Self {
        Self { context_lines }
    }
}

impl Default for HunkOptions {
    fn default() -> Self {
        Self {
            context_lines: DEFAULT_CONTEXT_LINES,
        }
    }
}

/// Failure while resolving hunk header line numbers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HunkError {
    /// A hunk opened with no leading context and the following span offers no
    /// reference for the opposite side's start line. A 0 or negative line
    /// number in the rendered header is never valid, so this fails instead.
    #[error(
        "cannot resolve the opposite start line at span {span_index}: \
         a {change_kind:?} span is followed by another {next_kind:?} span"
    )]
    UnanchoredStart {
        span_index: usize,
        change_kind: SpanKind,
        next_kind: SpanKind,
    },
}

/// One contiguous diff block with its own header and body.
///
/// `old_count` always equals the number of Delete+Equal operations and
/// `new_count` the number of Insert+Equal operations; both are maintained by
/// the generator as lines are appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hunk {
    pub old_start: usize,
    pub new_start: usize,
    pub old_count: usize,
    pub new_count: usize,
    /// One extra context line beyond the trimmed window, echoed directly
    /// after the header line for readability.
    pub anchor: Option<String>,
    pub operations: Vec<Operation>,
}

impl Hunk {
    fn open(anchor: Option<String>) -> Self {
        Self {
            old_start: 0,
            new_start: 0,
            old_count: 0,
            new_count: 0,
            anchor,
            operations: Vec::new(),
        }
    }

    fn append(&mut self, kind: SpanKind, lines: &[&str]) {
        match kind {
            SpanKind::Insert => self.new_count += lines.len(),
            SpanKind::Delete => self.old_count += lines.len(),
            SpanKind::Equal => {
                self.old_count += lines.len();
                self.new_count += lines.len();
            }
        }

        for line in lines {
            self.operations.push(Operation {
                kind,
                text: (*line).to_string(),
            });
        }
    }

    /// Serialize this hunk into `out` in the conventional textual form.
    ///
    /// The `,count` suffix is omitted exactly when that count equals 1. The
    /// anchor line, when present, is rendered as a single leading-space line
    /// directly after the header.
    pub fn write_to(&self, out: &mut String) {
        out.push_str("@@ -");
        push_range(out, self.old_start, self.old_count);
        out.push_str(" +");
        push_range(out, self.new_start, self.new_count);
        out.push_str(" @@\n");

        if let Some(anchor) = &self.anchor {
            out.push(' ');
            out.push_str(anchor);
            out.push('\n');
        }

        for op in &self.operations {
            out.push(match op.kind {
                SpanKind::Equal => ' ',
                SpanKind::Insert => '+',
                SpanKind::Delete => '-',
            });
            out.push_str(&op.text);
            out.push('\n');
        }
    }
}

impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_to(&mut out);
        f.write_str(&out)
    }
}

fn push_range(out: &mut String, start: usize, count: usize) {
    if count == 1 {
        out.push_str(&start.to_string());
    } else {
        out.push_str(&format!("{start},{count}"));
    }
}

/// Aggregate line counters across a hunk list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HunkStats {
    pub hunks: usize,
    pub inserted_lines: usize,
    pub deleted_lines: usize,
}

/// Count inserted and deleted lines over all hunk bodies.
pub fn build_stats(hunks: &[Hunk]) -> HunkStats {
    let mut stats = HunkStats {
        hunks: hunks.len(),
        ..HunkStats::default()
    };

    for hunk in hunks {
        for op in &hunk.operations {
            match op.kind {
                SpanKind::Insert => stats.inserted_lines += 1,
                SpanKind::Delete => stats.deleted_lines += 1,
                SpanKind::Equal => {}
            }
        }
    }

    stats
}

/// Group a span list into hunks under the given context window.
///
/// One synchronous pass; the only error is an unresolvable opposite-side
/// start line, which indicates a malformed span sequence upstream.
pub fn generate_hunks(spans: &[Span], options: HunkOptions) -> Result<Vec<Hunk>, HunkError> {
    #[cfg(debug_assertions)]
    assert_alternation(spans);

    HunkGenerator::new(spans, options.context_lines).generate()
}

/// Generate hunks and concatenate their serializations into one diff body.
pub fn format_hunks(spans: &[Span], options: HunkOptions) -> Result<String, HunkError> {
    let hunks = generate_hunks(spans, options)?;
    let mut out = String::new();
    for hunk in &hunks {
        hunk.write_to(&mut out);
    }
    Ok(out)
}

/// Split span text on `\n`, dropping the empty trailing element a
/// terminating newline produces. A final unterminated element is kept as-is.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}

/// Adjacent spans sharing a kind violate the upstream contract. Checked in
/// debug builds only; the hot path trusts the collaborator.
#[cfg(debug_assertions)]
fn assert_alternation(spans: &[Span]) {
    for pair in spans.windows(2) {
        assert!(
            pair[0].kind != pair[1].kind,
            "adjacent spans share kind {:?}; the upstream line diff must alternate",
            pair[0].kind
        );
    }
}

/// Single-pass state machine over one span list.
///
/// `old_cursor`/`new_cursor` count consumed lines per side. A change span
/// advances its side's cursor by one before the hunk opens and by the
/// remaining length afterwards, so at opening time the changed side's cursor
/// names the first changed line while the other side's cursor still names its
/// last consumed line.
struct HunkGenerator<'a> {
    spans: &'a [Span],
    context_lines: usize,
    old_cursor: usize,
    new_cursor: usize,
    current: Option<Hunk>,
    pending_before: Vec<&'a str>,
    pending_after: Vec<&'a str>,
    hunks: Vec<Hunk>,
}

impl<'a> HunkGenerator<'a> {
    fn new(spans: &'a [Span], context_lines: usize) -> Self {
        Self {
            spans,
            context_lines,
            old_cursor: 0,
            new_cursor: 0,
            current: None,
            pending_before: Vec::new(),
            pending_after: Vec::new(),
            hunks: Vec::new(),
        }
    }

    fn generate(mut self) -> Result<Vec<Hunk>, HunkError> {
        let spans = self.spans;
        for (index, span) in spans.iter().enumerate() {
            let lines = split_lines(&span.text);

            match span.kind {
                SpanKind::Equal => {
                    self.old_cursor += lines.len();
                    self.new_cursor += lines.len();
                    self.process_equal(lines, index);
                }
                SpanKind::Delete => {
                    // Zero-length change spans carry no lines and open nothing.
                    if lines.is_empty() {
                        continue;
                    }
                    self.old_cursor += 1;
                    self.open_current(index, SpanKind::Delete)?;
                    self.old_cursor += lines.len() - 1;
                    if let Some(current) = self.current.as_mut() {
                        current.append(SpanKind::Delete, &lines);
                    }
                }
                SpanKind::Insert => {
                    if lines.is_empty() {
                        continue;
                    }
                    self.new_cursor += 1;
                    self.open_current(index, SpanKind::Insert)?;
                    self.new_cursor += lines.len() - 1;
                    if let Some(current) = self.current.as_mut() {
                        current.append(SpanKind::Insert, &lines);
                    }
                }
            }
        }

        // A trailing change span leaves the last hunk open; close it without
        // trailing context.
        if let Some(current) = self.current.take() {
            self.hunks.push(current);
        }

        Ok(self.hunks)
    }

    fn process_equal(&mut self, lines: Vec<&'a str>, index: usize) {
        let final_span = index == self.spans.len() - 1;

        let Some(current) = self.current.as_mut() else {
            self.pending_before.extend(lines);
            return;
        };

        self.pending_after.extend(lines);

        // Optimistic merge: a short unchanged run is folded into the open
        // hunk on the assumption that another change follows soon enough to
        // share it as context.
        if self.pending_after.len() <= self.context_lines * 2 && !final_span {
            current.append(SpanKind::Equal, &self.pending_after);
            self.pending_after.clear();
            return;
        }

        // The run is too long to merge (or input is exhausted): keep one
        // trailing window, close the hunk, and let the remainder seed leading
        // context for a possible later hunk.
        let window = self.context_lines.min(self.pending_after.len());
        current.append(SpanKind::Equal, &self.pending_after[..window]);
        if let Some(done) = self.current.take() {
            self.hunks.push(done);
        }

        self.pending_before = self.pending_after.split_off(window);
        self.pending_after.clear();
    }

    /// Open a hunk for a change span unless one is already open, consuming
    /// `pending_before` as leading context and resolving both start lines.
    fn open_current(&mut self, index: usize, kind: SpanKind) -> Result<(), HunkError> {
        if self.current.is_some() {
            return Ok(());
        }

        let mut anchor = None;
        let mut lines_before = self.pending_before.len();
        if lines_before > self.context_lines {
            let cut = lines_before - self.context_lines;
            anchor = Some(self.pending_before[cut - 1].to_string());
            self.pending_before.drain(..cut);
            lines_before = self.context_lines;
        }

        let (old_start, new_start) = if kind == SpanKind::Delete {
            self.start_lines(
                self.old_cursor,
                self.new_cursor,
                lines_before,
                index,
                SpanKind::Insert,
            )?
        } else {
            let (new_start, old_start) = self.start_lines(
                self.new_cursor,
                self.old_cursor,
                lines_before,
                index,
                SpanKind::Delete,
            )?;
            (old_start, new_start)
        };

        let mut hunk = Hunk::open(anchor);
        hunk.old_start = old_start;
        hunk.new_start = new_start;
        hunk.append(SpanKind::Equal, &self.pending_before);
        self.pending_before.clear();
        self.current = Some(hunk);

        Ok(())
    }

    /// Resolve `(changed_side_start, other_side_start)` for a hunk opened by
    /// a change span. `expected_next` is the opposite change kind; a
    /// following span of that kind (or an Equal span) lands in this same hunk
    /// and anchors the other side one past its cursor.
    fn start_lines(
        &self,
        changed_cursor: usize,
        other_cursor: usize,
        lines_before: usize,
        index: usize,
        expected_next: SpanKind,
    ) -> Result<(usize, usize), HunkError> {
        let changed = changed_cursor - lines_before;

        let other = if lines_before != 0 && self.context_lines != 0 {
            if other_cursor > self.context_lines {
                other_cursor - self.context_lines + 1
            } else {
                // Change inside the first context window: the hunk body
                // starts at the top of the file.
                1
            }
        } else if self.context_lines == 0 {
            match self.spans.get(index + 1) {
                Some(next) if next.kind == expected_next => other_cursor + 1,
                _ => other_cursor,
            }
        } else if let Some(next) = self.spans.get(index + 1) {
            if next.kind == expected_next || next.kind == SpanKind::Equal {
                other_cursor + 1
            } else {
                return Err(HunkError::UnanchoredStart {
                    span_index: index,
                    change_kind: if expected_next == SpanKind::Insert {
                        SpanKind::Delete
                    } else {
                        SpanKind::Insert
                    },
                    next_kind: next.kind,
                });
            }
        } else {
            // Final span with no leading context: the other side contributes
            // no lines to this hunk, so its cursor (possibly 0) is the
            // conventional empty-side start.
            other_cursor
        };

        Ok((changed, other))
    }
}
