//! Year slicing of a station's valid range.

use chrono::{Datelike, NaiveDate};

use crate::dates::ymd;

/// Earliest and latest day any fetch may cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoricalBound {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for HistoricalBound {
    fn default() -> Self {
        Self {
            start: ymd(2002, 1, 1),
            end: ymd(2025, 12, 31),
        }
    }
}

/// One calendar year's worth of a station's range, clipped at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearSlice {
    pub year: i32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Intersects `[mindate, maxdate]` with `bound` and splits the result by
/// calendar year. A missing, inverted or out-of-bound range yields no slices.
pub fn year_slices(
    mindate: Option<NaiveDate>,
    maxdate: Option<NaiveDate>,
    bound: &HistoricalBound,
) -> Vec<YearSlice> {
    let (Some(min), Some(max)) = (mindate, maxdate) else {
        return Vec::new();
    };
    if min > max {
        return Vec::new();
    }

    let start = min.max(bound.start);
    let end = max.min(bound.end);
    if start > end {
        return Vec::new();
    }

    (start.year()..=end.year())
        .map(|year| YearSlice {
            year,
            start: if year == start.year() { start } else { ymd(year, 1, 1) },
            end: if year == end.year() { end } else { ymd(year, 12, 31) },
        })
        .collect()
}
