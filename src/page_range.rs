use std::collections::BTreeSet;

use crate::error::ParseError;

/// One token of a page spec: a single page or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRange {
    Single(u64),
    Span { start: u64, end: u64 },
}

impl PageRange {
    /// Parse a token like "5" or "1-3". Reversed ranges ("5-2") are rejected.
    pub fn parse(token: &str) -> Result<Self, ParseError> {
        let token = token.trim();
        let malformed = || ParseError::MalformedToken(token.to_string());

        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_page_number(start).ok_or_else(malformed)?;
                let end = parse_page_number(end).ok_or_else(malformed)?;
                if start > end {
                    return Err(ParseError::InvalidRange {
                        token: token.to_string(),
                        start,
                        end,
                    });
                }
                Ok(PageRange::Span { start, end })
            }
            None => parse_page_number(token)
                .map(PageRange::Single)
                .ok_or_else(malformed),
        }
    }

    /// The 1-based pages of this range that exist in a document of
    /// `total_pages` pages. Out-of-bounds pages are dropped, not reported.
    pub fn clamp(&self, total_pages: u32) -> impl Iterator<Item = u32> {
        let (start, end) = match *self {
            PageRange::Single(n) => (n, n),
            PageRange::Span { start, end } => (start, end),
        };
        let start = start.max(1);
        let end = end.min(u64::from(total_pages));
        // both bounds fit in u32 once clamped to total_pages
        (start..=end).map(|n| n as u32)
    }
}

fn parse_page_number(s: &str) -> Option<u64> {
    // `u64::from_str` accepts a leading '+', page specs don't
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Split a spec like "1-3, 5 7-9" into tokens on commas and whitespace.
pub fn parse_page_ranges(spec: &str) -> Result<Vec<PageRange>, ParseError> {
    spec.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(PageRange::parse)
        .collect()
}

/// A validated, deduplicated, ascending list of 1-based page numbers.
///
/// Only [`PageSpec::parse`] builds one, and it never yields an empty spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSpec(Vec<u32>);

impl PageSpec {
    /// Resolve `spec` against a document of `total_pages` pages.
    ///
    /// Token order does not matter: "5,1-2" gives `[1, 2, 5]`.
    pub fn parse(spec: &str, total_pages: u32) -> Result<Self, ParseError> {
        let mut pages = BTreeSet::new();
        for range in parse_page_ranges(spec)? {
            pages.extend(range.clamp(total_pages));
        }

        if pages.is_empty() {
            return Err(ParseError::NoPagesSelected);
        }
        Ok(PageSpec(pages.into_iter().collect()))
    }

    pub fn pages(&self) -> &[u32] {
        &self.0
    }
}
