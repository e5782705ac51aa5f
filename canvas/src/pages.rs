//! Page applicability rules for anchors.
//!
//! DESIGN
//! ======
//! A `PageSpec` is stored as a string on the wire: `global`, `last`, or a
//! comma-separated list of 1-based pages and inclusive ranges (`1,3`,
//! `2-4`, `1, 5-7`). The same parsed value is used to validate input, to
//! decide visibility at render time, and to select pages for burn-in, so a
//! spec that validates is always evaluated with the same meaning everywhere.
//! Ranges are expanded by the evaluator.

#[cfg(test)]
#[path = "pages_test.rs"]
mod pages_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors produced while parsing a page specification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageSpecError {
    #[error("page specification is empty")]
    Empty,
    #[error("invalid page token `{0}` (use 1 or 1,2,3 or 1-5)")]
    InvalidToken(String),
    #[error("pages are numbered from 1, got 0")]
    ZeroPage,
    #[error("range {start}-{end} runs backwards")]
    ReversedRange { start: u32, end: u32 },
}

/// An inclusive range of 1-based page numbers. A single page has `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    /// A range covering exactly one page.
    #[must_use]
    pub fn single(page: u32) -> Self {
        Self { start: page, end: page }
    }

    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        (self.start..=self.end).contains(&page)
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Which pages of a document an anchor applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PageSpec {
    /// Every page.
    Global,
    /// The final page of the document currently shown, whatever its length.
    Last,
    /// Explicit pages and ranges, in the order they were written.
    Pages(Vec<PageRange>),
}

impl PageSpec {
    /// Spec selecting a single page.
    #[must_use]
    pub fn page(page: u32) -> Self {
        Self::Pages(vec![PageRange::single(page)])
    }

    /// Whether an anchor with this spec is shown on `current_page` of a
    /// `total_pages`-page document.
    #[must_use]
    pub fn is_visible(&self, current_page: u32, total_pages: u32) -> bool {
        match self {
            Self::Global => true,
            Self::Last => current_page == total_pages,
            Self::Pages(ranges) => ranges.iter().any(|r| r.contains(current_page)),
        }
    }

    /// The sorted, de-duplicated pages this spec selects in a `total_pages`-page
    /// document. Pages past the end are dropped; the result may be empty.
    #[must_use]
    pub fn pages(&self, total_pages: u32) -> Vec<u32> {
        match self {
            Self::Global => (1..=total_pages).collect(),
            Self::Last if total_pages == 0 => Vec::new(),
            Self::Last => vec![total_pages],
            Self::Pages(ranges) => {
                let mut pages: Vec<u32> = ranges
                    .iter()
                    .flat_map(|r| r.start..=r.end.min(total_pages))
                    .collect();
                pages.sort_unstable();
                pages.dedup();
                pages
            }
        }
    }

    /// The page a preview of this anchor should open on.
    #[must_use]
    pub fn preview_page(&self, total_pages: u32) -> u32 {
        let total = total_pages.max(1);
        match self {
            Self::Global => 1,
            Self::Last => total,
            Self::Pages(ranges) => ranges.first().map_or(1, |r| r.start.min(total)),
        }
    }
}

impl fmt::Display for PageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Last => f.write_str("last"),
            Self::Pages(ranges) => {
                for (i, range) in ranges.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{range}")?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for PageSpec {
    type Err = PageSpecError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PageSpecError::Empty);
        }
        if trimmed.eq_ignore_ascii_case("global") {
            return Ok(Self::Global);
        }
        if trimmed.eq_ignore_ascii_case("last") {
            return Ok(Self::Last);
        }

        let ranges = trimmed
            .split(',')
            .map(|token| parse_range(token.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::Pages(ranges))
    }
}

impl TryFrom<String> for PageSpec {
    type Error = PageSpecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PageSpec> for String {
    fn from(value: PageSpec) -> Self {
        value.to_string()
    }
}

fn parse_range(token: &str) -> Result<PageRange, PageSpecError> {
    let (start, end) = match token.split_once('-') {
        Some((start, end)) => (parse_page(start, token)?, parse_page(end, token)?),
        None => {
            let page = parse_page(token, token)?;
            (page, page)
        }
    };
    if start > end {
        return Err(PageSpecError::ReversedRange { start, end });
    }
    Ok(PageRange { start, end })
}

fn parse_page(digits: &str, token: &str) -> Result<u32, PageSpecError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PageSpecError::InvalidToken(token.to_owned()));
    }
    let page: u32 = digits
        .parse()
        .map_err(|_| PageSpecError::InvalidToken(token.to_owned()))?;
    if page == 0 {
        return Err(PageSpecError::ZeroPage);
    }
    Ok(page)
}

/// Decide whether an anchor whose stored page rule is `page_spec` shows on
/// `current_page` of a `total_pages`-page document. Unparseable rules show nowhere.
#[must_use]
pub fn should_show(page_spec: &str, current_page: u32, total_pages: u32) -> bool {
    page_spec
        .parse::<PageSpec>()
        .is_ok_and(|spec| spec.is_visible(current_page, total_pages))
}
