//! Candidate extraction from document text.
//!
//! Block layout: a line made only of decimal digits is a quantity anchor. The
//! lines right before it (up to the context window) describe the item. Every
//! line, anchors included, enters the window, so back-to-back anchors produce
//! overlapping contexts.
//!
//! Inline layout: `SKU: AB-123 Phone case 3`, one item per line with the
//! quantity as the last token. Repeated inline items in one document are
//! summed.

use std::collections::{HashMap, VecDeque};

use crate::config::{ExtractionMode, MatchSettings};
use crate::model::CandidateRecord;
use crate::normalize::normalize_display;

/// Page separator emitted by `pdftotext`.
pub const PAGE_BREAK: char = '\x0c';

/// One picklist, split into pages of trimmed non-empty lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub source_tag: String,
    pub pages: Vec<Vec<String>>,
}

impl Document {
    pub fn from_text(source_tag: impl Into<String>, text: &str) -> Self {
        let pages = text.split(PAGE_BREAK).map(split_lines).collect();
        Self {
            source_tag: source_tag.into(),
            pages,
        }
    }

    /// Single-page document from already split lines.
    pub fn from_lines<I, S>(source_tag: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let page = lines
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        Self {
            source_tag: source_tag.into(),
            pages: vec![page],
        }
    }

    pub fn line_count(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    pub fn is_blank(&self) -> bool {
        self.line_count() == 0
    }

    /// Fresh block extraction pass; the window restarts on every page.
    pub fn candidates(&self, context_window: usize) -> impl Iterator<Item = CandidateRecord> + '_ {
        self.pages.iter().enumerate().flat_map(move |(i, page)| {
            BlockExtractor::new(page.iter(), context_window)
                .with_source(self.source_tag.clone(), i + 1)
        })
    }

    /// Candidates in page order using `settings.extraction`.
    pub fn extract(&self, settings: &MatchSettings) -> Vec<CandidateRecord> {
        let mut out = Vec::new();
        let mut inline_seen: HashMap<String, usize> = HashMap::new();

        for (i, page) in self.pages.iter().enumerate() {
            let page_no = i + 1;
            let block = || {
                BlockExtractor::new(page.iter(), settings.context_window)
                    .with_source(self.source_tag.clone(), page_no)
            };
            let inline = || {
                InlineExtractor::new(page.iter(), settings.inline_label.as_str())
                    .with_source(self.source_tag.clone(), page_no)
            };

            match settings.extraction {
                ExtractionMode::Block => out.extend(block()),
                ExtractionMode::Inline => sum_inline(&mut out, &mut inline_seen, inline()),
                ExtractionMode::Auto => {
                    let before = out.len();
                    out.extend(block());
                    if out.len() == before {
                        sum_inline(&mut out, &mut inline_seen, inline());
                    }
                }
            }
        }
        out
    }
}

/// Append inline records, adding quantities of a context already seen in
/// this document to its first record. A sum that would overflow starts a
/// new record instead.
fn sum_inline(
    out: &mut Vec<CandidateRecord>,
    seen: &mut HashMap<String, usize>,
    records: impl Iterator<Item = CandidateRecord>,
) {
    for record in records {
        if let Some(&at) = seen.get(&record.context) {
            if let Some(total) = out[at].quantity.checked_add(record.quantity) {
                out[at].quantity = total;
                continue;
            }
        }
        seen.insert(record.context.clone(), out.len());
        out.push(record);
    }
}

/// Trimmed, non-empty lines of one page.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lazy adapter from lines to candidate records.
pub struct BlockExtractor<I> {
    lines: I,
    window: VecDeque<String>,
    capacity: usize,
    source_tag: String,
    page: usize,
}

impl<I> BlockExtractor<I> {
    pub fn new<T>(lines: T, context_window: usize) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            lines: lines.into_iter(),
            window: VecDeque::with_capacity(context_window),
            capacity: context_window,
            source_tag: String::new(),
            page: 0,
        }
    }

    pub fn with_source(mut self, source_tag: impl Into<String>, page: usize) -> Self {
        self.source_tag = source_tag.into();
        self.page = page;
        self
    }

    fn remember(&mut self, line: &str) {
        if self.capacity == 0 {
            return;
        }
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(line.to_string());
    }
}

impl<I, S> Iterator for BlockExtractor<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = CandidateRecord;

    fn next(&mut self) -> Option<CandidateRecord> {
        while let Some(raw) = self.lines.next() {
            let line = raw.as_ref().trim();
            if line.is_empty() {
                continue;
            }

            let record = match parse_quantity(line) {
                Some(quantity) if !self.window.is_empty() => {
                    let joined = self.window.iter().map(String::as_str).collect::<Vec<_>>().join(" ");
                    Some(CandidateRecord {
                        context: normalize_display(&joined),
                        quantity,
                        attribute_guess: String::new(),
                        source_tag: self.source_tag.clone(),
                        page: self.page,
                    })
                }
                _ => None,
            };

            self.remember(line);

            if record.is_some() {
                return record;
            }
        }
        None
    }
}

/// Lazy adapter from `label text quantity` lines to candidate records.
pub struct InlineExtractor<'l, I> {
    lines: I,
    label: &'l str,
    source_tag: String,
    page: usize,
}

impl<'l, I> InlineExtractor<'l, I> {
    pub fn new<T>(lines: T, label: &'l str) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            lines: lines.into_iter(),
            label,
            source_tag: String::new(),
            page: 0,
        }
    }

    pub fn with_source(mut self, source_tag: impl Into<String>, page: usize) -> Self {
        self.source_tag = source_tag.into();
        self.page = page;
        self
    }
}

impl<I, S> Iterator for InlineExtractor<'_, I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = CandidateRecord;

    fn next(&mut self) -> Option<CandidateRecord> {
        for raw in self.lines.by_ref() {
            if let Some((context, quantity)) = parse_inline(raw.as_ref(), self.label) {
                return Some(CandidateRecord {
                    context,
                    quantity,
                    attribute_guess: String::new(),
                    source_tag: self.source_tag.clone(),
                    page: self.page,
                });
            }
        }
        None
    }
}

/// Split an inline item line into (display context, quantity).
///
/// The context is the text after the first `label` (the whole line when the
/// label is empty) minus the last whitespace-separated token, which must be a
/// quantity. Anything else yields `None`.
pub fn parse_inline(line: &str, label: &str) -> Option<(String, i64)> {
    let rest = if label.is_empty() {
        line
    } else {
        let at = line.find(label)?;
        &line[at + label.len()..]
    };
    let (head, last) = rest.trim().rsplit_once(char::is_whitespace)?;
    let quantity = parse_quantity(last)?;
    let context = normalize_display(head);
    if context.is_empty() {
        return None;
    }
    Some((context, quantity))
}

/// Value of a line made only of Unicode decimal digits (`Nd`: ASCII, Thai,
/// fullwidth, Arabic-Indic, ...). Anything else, or a value that overflows,
/// is not a quantity.
pub fn parse_quantity(line: &str) -> Option<i64> {
    if line.is_empty() {
        return None;
    }
    let mut value: i64 = 0;
    for c in line.chars() {
        let digit = decimal_digit(c)?;
        value = match value.checked_mul(10).and_then(|v| v.checked_add(digit)) {
            Some(v) => v,
            None => {
                log::debug!("quantity line {line:?} overflows, not treated as an anchor");
                return None;
            }
        };
    }
    Some(value)
}

/// First code point (digit zero) of every run of ten `Nd` characters,
/// ascending.
const DIGIT_ZEROS: &[u32] = &[
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6,
    0x0C66, 0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0,
    0x1810, 0x1946, 0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620,
    0xA8D0, 0xA900, 0xA9D0, 0xA9F0, 0xAA50, 0xABF0, 0xFF10, 0x104A0, 0x10D30, 0x11066,
    0x110F0, 0x11136, 0x111D0, 0x112F0, 0x11450, 0x114D0, 0x11650, 0x116C0, 0x11730,
    0x118E0, 0x11950, 0x11C50, 0x11D50, 0x11DA0, 0x11F50, 0x16A60, 0x16AC0, 0x16B50,
    0x1D7CE, 0x1D7D8, 0x1D7E2, 0x1D7EC, 0x1D7F6, 0x1E140, 0x1E2F0, 0x1E4F0, 0x1E950,
    0x1FBF0,
];

fn decimal_digit(c: char) -> Option<i64> {
    let cp = c as u32;
    let run = DIGIT_ZEROS.partition_point(|&zero| zero <= cp).checked_sub(1)?;
    let value = cp - DIGIT_ZEROS[run];
    (value < 10).then_some(i64::from(value))
}
