//! Searchable document built per candidate item
//!
//! A [`SearchDocument`] is the flattened text the fuzzy matcher scores,
//! together with an offset map recording which `[start, end)` character
//! range each structured field (title, item class, subtitle parts, detail
//! parts) occupies in the flattened string. The renderer uses the map to
//! project flat match positions back onto the displayed fragments.
//!
//! Offsets are recorded while the flattened string is appended, never by
//! re-scanning afterwards, so they always reproduce exact substring slices.

/// Character range `[start, end)` into the flattened string.
/// Offsets count characters, matching the matcher's position indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldSpan {
    pub start: usize,
    pub end: usize,
}

impl FieldSpan {
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether a flat character position falls inside this span
    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.start && pos < self.end
    }
}

/// Which structured field a span belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentRegion {
    Title,
    ItemClass,
    /// Index into `subtitle_parts`
    Subtitle(usize),
    /// Index into `detail_parts`
    Detail(usize),
}

/// Offset map for one document
#[derive(Debug, Clone, Default)]
pub struct DocumentOffsets {
    pub title: FieldSpan,
    pub item_class: FieldSpan,
    pub subtitle: Vec<FieldSpan>,
    pub detail: Vec<FieldSpan>,
}

impl DocumentOffsets {
    /// Iterate every (region, span) pair in document order
    pub fn regions(&self) -> impl Iterator<Item = (DocumentRegion, FieldSpan)> + '_ {
        std::iter::once((DocumentRegion::Title, self.title))
            .chain(std::iter::once((DocumentRegion::ItemClass, self.item_class)))
            .chain(
                self.subtitle
                    .iter()
                    .enumerate()
                    .map(|(i, s)| (DocumentRegion::Subtitle(i), *s)),
            )
            .chain(
                self.detail
                    .iter()
                    .enumerate()
                    .map(|(i, s)| (DocumentRegion::Detail(i), *s)),
            )
    }
}

/// Structured search text for one item plus its flattened form
#[derive(Debug, Clone, Default)]
pub struct SearchDocument {
    pub title: String,
    pub item_class: String,
    pub subtitle_parts: Vec<String>,
    pub detail_parts: Vec<String>,
    flattened: String,
    offsets: DocumentOffsets,
}

impl SearchDocument {
    /// The flattened string the matcher scores
    pub fn flattened(&self) -> &str {
        &self.flattened
    }

    pub fn offsets(&self) -> &DocumentOffsets {
        &self.offsets
    }

    /// Character-offset slice of the flattened string.
    /// `slice(offsets.title)` reproduces the title exactly.
    pub fn slice(&self, span: FieldSpan) -> String {
        self.flattened
            .chars()
            .skip(span.start)
            .take(span.end.saturating_sub(span.start))
            .collect()
    }
}

/// Builds a [`SearchDocument`], recording each field's span as it is
/// appended. Fields are separated by a single space; empty fields are
/// skipped and recorded as empty spans at the current position.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    doc: SearchDocument,
    /// Running length of the flattened string in characters
    len: usize,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        DocumentBuilder::default()
    }

    fn append(&mut self, text: &str) -> FieldSpan {
        if text.is_empty() {
            return FieldSpan {
                start: self.len,
                end: self.len,
            };
        }
        if self.len > 0 {
            self.doc.flattened.push(' ');
            self.len += 1;
        }
        let start = self.len;
        self.doc.flattened.push_str(text);
        self.len += text.chars().count();
        FieldSpan {
            start,
            end: self.len,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.doc.offsets.title = self.append(&title);
        self.doc.title = title;
        self
    }

    pub fn item_class(mut self, item_class: impl Into<String>) -> Self {
        let item_class = item_class.into();
        self.doc.offsets.item_class = self.append(&item_class);
        self.doc.item_class = item_class;
        self
    }

    pub fn subtitle_part(mut self, part: impl Into<String>) -> Self {
        let part = part.into();
        let span = self.append(&part);
        self.doc.offsets.subtitle.push(span);
        self.doc.subtitle_parts.push(part);
        self
    }

    pub fn detail_part(mut self, part: impl Into<String>) -> Self {
        let part = part.into();
        let span = self.append(&part);
        self.doc.offsets.detail.push(span);
        self.doc.detail_parts.push(part);
        self
    }

    pub fn build(self) -> SearchDocument {
        self.doc
    }
}
