//! Fuzzy matcher wrapper
//!
//! Thin context over `nucleo-matcher` that reuses its haystack and index
//! buffers across calls, so scoring an entire candidate set per keystroke
//! does not allocate per item. Scoring internals are nucleo's; this crate
//! only relies on the contract "higher score = better match" plus the
//! per-character match positions used for highlighting.

use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};

/// Reusable matcher state for one query alternative.
///
/// Usage:
/// ```ignore
/// let mut ctx = MatchContext::new("blur");
/// for item in &candidates {
///     if let Some((score, positions)) = ctx.indices(&item.selector_text()) {
///         // ranked match with highlight positions
///     }
/// }
/// ```
pub struct MatchContext {
    pattern: Pattern,
    matcher: Matcher,
    haystack_buf: Vec<char>,
    index_buf: Vec<u32>,
}

impl MatchContext {
    /// Create a context for the given query string.
    /// The query is parsed with case-insensitive matching and smart normalization.
    pub fn new(query: &str) -> Self {
        let pattern = Pattern::parse(query, CaseMatching::Ignore, Normalization::Smart);
        MatchContext {
            pattern,
            matcher: Matcher::new(Config::DEFAULT),
            haystack_buf: Vec::with_capacity(64),
            index_buf: Vec::with_capacity(32),
        }
    }

    /// Score a haystack against this context's pattern.
    /// Returns Some(score) if matched, None otherwise.
    #[inline]
    pub fn score(&mut self, haystack: &str) -> Option<u32> {
        self.haystack_buf.clear();
        let utf32 = Utf32Str::new(haystack, &mut self.haystack_buf);
        self.pattern.score(utf32, &mut self.matcher)
    }

    /// Score a haystack and report the matched character positions.
    ///
    /// Positions index characters of the haystack, sorted ascending with
    /// duplicates removed (nucleo reports them unordered).
    #[inline]
    pub fn indices(&mut self, haystack: &str) -> Option<(u32, Vec<u32>)> {
        self.haystack_buf.clear();
        self.index_buf.clear();
        let utf32 = Utf32Str::new(haystack, &mut self.haystack_buf);
        let score = self
            .pattern
            .indices(utf32, &mut self.matcher, &mut self.index_buf)?;
        let mut positions = self.index_buf.clone();
        positions.sort_unstable();
        positions.dedup();
        Some((score, positions))
    }
}
