// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page range and render quality normalisation.

use serde::{Deserialize, Serialize};

/// Lowest accepted render quality.
pub const MIN_QUALITY: u8 = 1;
/// Highest accepted render quality.
pub const MAX_QUALITY: u8 = 10;
/// Resolution units per quality step.
pub const RESOLUTION_PER_QUALITY: u32 = 56;

/// Requested page selection, before it is checked against a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub use_all: bool,
    pub start: i64,
    pub end: i64,
}

impl PageRange {
    /// Select every page of the document.
    pub fn all() -> Self {
        Self {
            use_all: true,
            start: 1,
            end: 1,
        }
    }

    /// Select pages `start..=end` (1-based, clamped on resolution).
    pub fn span(start: i64, end: i64) -> Self {
        Self {
            use_all: false,
            start,
            end,
        }
    }

    /// Normalise against a document with `page_count` pages.
    ///
    /// Out-of-range bounds are pulled back into the document and reversed
    /// bounds are swapped, so the result always satisfies
    /// `1 <= start <= end <= page_count`. Returns `None` for an empty document.
    pub fn resolve(&self, page_count: u32) -> Option<ResolvedRange> {
        if page_count == 0 {
            return None;
        }
        let last = i64::from(page_count);

        if self.use_all {
            return Some(ResolvedRange {
                start: 1,
                end: page_count,
            });
        }

        let mut start = if self.start <= 0 { 1 } else { self.start };
        let mut end = if self.end > last { last } else { self.end };
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }

        // Both bounds stay within u32 after the clamp.
        Some(ResolvedRange {
            start: start.clamp(1, last) as u32,
            end: end.clamp(1, last) as u32,
        })
    }
}

impl Default for PageRange {
    fn default() -> Self {
        Self::all()
    }
}

impl std::str::FromStr for PageRange {
    type Err = String;

    /// Parses `all`, a single page `N`, or a span `START-END`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }
        let parse = |part: &str| {
            part.trim()
                .parse::<i64>()
                .map_err(|err| format!("invalid page number {part:?}: {err}"))
        };
        match trimmed.split_once('-') {
            Some((start, end)) => Ok(Self::span(parse(start)?, parse(end)?)),
            None => {
                let page = parse(trimmed)?;
                Ok(Self::span(page, page))
            }
        }
    }
}

/// A page range that has been checked against a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub start: u32,
    pub end: u32,
}

impl ResolvedRange {
    /// Number of pages covered.
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    /// A resolved range is never empty; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// 1-based page numbers in ascending order.
    pub fn pages(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }
}

/// Render quality on a 1–10 scale; higher is sharper and slower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct RenderQuality(u8);

impl RenderQuality {
    /// Clamp any requested value into `1..=10`.
    pub fn new(requested: i64) -> Self {
        Self(requested.clamp(i64::from(MIN_QUALITY), i64::from(MAX_QUALITY)) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Render resolution for this quality level (`56 × quality`).
    pub fn resolution(&self) -> u32 {
        RESOLUTION_PER_QUALITY * u32::from(self.0)
    }
}

impl Default for RenderQuality {
    fn default() -> Self {
        Self(3)
    }
}

impl From<i64> for RenderQuality {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<RenderQuality> for u8 {
    fn from(value: RenderQuality) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn use_all_covers_document() {
        let range = PageRange::all().resolve(7).unwrap();
        assert_eq!(range, ResolvedRange { start: 1, end: 7 });
        assert_eq!(range.len(), 7);
    }

    #[test]
    fn reversed_span_is_swapped() {
        let range = PageRange::span(5, 1).resolve(2).unwrap();
        assert_eq!(range, ResolvedRange { start: 1, end: 2 });
    }

    #[test]
    fn non_positive_start_clamps_to_first_page() {
        let range = PageRange::span(-4, 2).resolve(3).unwrap();
        assert_eq!(range, ResolvedRange { start: 1, end: 2 });
    }

    #[test]
    fn empty_document_has_no_range() {
        assert!(PageRange::all().resolve(0).is_none());
        assert!(PageRange::span(1, 1).resolve(0).is_none());
    }

    #[test]
    fn resolution_invariant_holds_everywhere() {
        for page_count in 1..=6u32 {
            for start in -3..=9i64 {
                for end in -3..=9i64 {
                    let resolved = PageRange::span(start, end).resolve(page_count).unwrap();
                    assert!(
                        1 <= resolved.start
                            && resolved.start <= resolved.end
                            && resolved.end <= page_count,
                        "({start}, {end}) against {page_count} pages gave {resolved:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn quality_is_clamped() {
        for requested in -20..=20i64 {
            let quality = RenderQuality::new(requested).value();
            assert!((MIN_QUALITY..=MAX_QUALITY).contains(&quality));
        }
        assert_eq!(RenderQuality::new(11).value(), 10);
        assert_eq!(RenderQuality::new(0).value(), 1);
        assert_eq!(RenderQuality::new(4).value(), 4);
    }

    #[test]
    fn quality_maps_to_resolution() {
        assert_eq!(RenderQuality::new(1).resolution(), 56);
        assert_eq!(RenderQuality::new(10).resolution(), 560);
    }

    #[test]
    fn parse_page_range() {
        assert_eq!("all".parse::<PageRange>().unwrap(), PageRange::all());
        assert_eq!("2-4".parse::<PageRange>().unwrap(), PageRange::span(2, 4));
        assert_eq!("3".parse::<PageRange>().unwrap(), PageRange::span(3, 3));
        assert!("x-2".parse::<PageRange>().is_err());
    }

    #[test]
    fn quality_deserializes_clamped() {
        let quality: RenderQuality = serde_json::from_str("42").unwrap();
        assert_eq!(quality.value(), 10);
    }
}
