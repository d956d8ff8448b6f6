//! Per-url bucket shares and weighted visibility.
//!
//! Pure over the labeled rows: no I/O, no state, same input gives the same
//! summaries. Urls come out in ascending order.

use std::collections::BTreeMap;

use crate::label::weight;
use crate::types::{BucketShare, Label, RankResult, UrlSummary};

pub fn aggregate(rows: &[RankResult]) -> Vec<UrlSummary> {
    let mut by_url: BTreeMap<&str, Vec<&RankResult>> = BTreeMap::new();
    for row in rows {
        by_url.entry(row.url.as_str()).or_default().push(row);
    }

    by_url
        .into_iter()
        .map(|(url, rows)| summarize(url, &rows))
        .collect()
}

/// Summarize the rows of a single url.
///
/// Unavailable frequencies count as zero. A url with no impression mass at
/// all gets the fixed `top-1000: 0% fi: 0` summary and zero visibility.
pub fn summarize(url: &str, rows: &[&RankResult]) -> UrlSummary {
    let total = impressions(rows.iter().copied());

    if total == 0 {
        return UrlSummary {
            url: url.to_string(),
            buckets: vec![BucketShare {
                label: Label::Top1000,
                percent: 0,
                frequency: 0,
            }],
            visibility: 0.0,
        };
    }

    let buckets = Label::BUCKETS
        .iter()
        .filter_map(|&label| {
            let mass = impressions(rows.iter().copied().filter(|r| r.label == label));
            (mass > 0).then(|| BucketShare {
                label,
                percent: percent_of(mass, total),
                frequency: mass,
            })
        })
        .collect();

    let visibility = rows
        .iter()
        .map(|r| r.frequency.value() as f64 * weight(r.position) / total as f64)
        .sum();

    UrlSummary {
        url: url.to_string(),
        buckets,
        visibility,
    }
}

/// Impression mass of `rows`, saturating at `u64::MAX` instead of overflowing.
fn impressions<'a>(rows: impl Iterator<Item = &'a RankResult>) -> u64 {
    rows.fold(0u64, |acc, r| acc.saturating_add(r.frequency.value()))
}

/// Share as a percentage rounded to two decimals, then truncated.
fn percent_of(mass: u64, total: u64) -> u64 {
    let share = mass as f64 / total as f64 * 100.0;
    ((share * 100.0).round() / 100.0).trunc() as u64
}
