use std::collections::BTreeMap;

use serde::Serialize;

use crate::country::iso_alpha3;
use crate::dataset::{SalaryRecord, EXPERIENCE_ORDER, REMOTE_ORDER};

pub const TOP_LOCATIONS: usize = 10;

/// Raw salaries for one category of a box plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueGroup {
    pub label: &'static str,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationMean {
    pub location: String,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryAggregate {
    pub location: String,
    pub iso_alpha3: &'static str,
    pub mean: f64,
    pub count: usize,
}

/// The five chart datasets for one filtered record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub distribution: Vec<f64>,
    pub by_experience: Vec<ValueGroup>,
    pub top_locations: Vec<LocationMean>,
    pub by_remote_type: Vec<ValueGroup>,
    pub by_country: Vec<CountryAggregate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Dashboard {
    /// Placeholder shared by every chart when nothing matched.
    Empty,
    Charts(ChartSet),
}

impl Dashboard {
    pub fn is_empty(&self) -> bool {
        matches!(self, Dashboard::Empty)
    }
}

/// Builds all five datasets, or the empty marker when `rows` is empty.
pub fn aggregate(rows: &[&SalaryRecord]) -> Dashboard {
    if rows.is_empty() {
        return Dashboard::Empty;
    }
    let by_location = location_stats(rows);
    Dashboard::Charts(ChartSet {
        distribution: rows.iter().map(|r| r.salary()).collect(),
        by_experience: by_experience(rows),
        top_locations: top_locations(&by_location),
        by_remote_type: by_remote_type(rows),
        by_country: by_country(&by_location),
    })
}

fn by_experience(rows: &[&SalaryRecord]) -> Vec<ValueGroup> {
    EXPERIENCE_ORDER
        .iter()
        .map(|level| ValueGroup {
            label: level.label(),
            values: rows
                .iter()
                .filter(|r| r.experience == Some(*level))
                .map(|r| r.salary())
                .collect(),
        })
        .filter(|group| !group.values.is_empty())
        .collect()
}

fn by_remote_type(rows: &[&SalaryRecord]) -> Vec<ValueGroup> {
    REMOTE_ORDER
        .iter()
        .map(|kind| ValueGroup {
            label: kind.label(),
            values: rows
                .iter()
                .filter(|r| r.remote == Some(*kind))
                .map(|r| r.salary())
                .collect(),
        })
        .filter(|group| !group.values.is_empty())
        .collect()
}

#[derive(Debug, Default)]
struct LocationStats {
    sum: f64,
    count: usize,
}

impl LocationStats {
    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

// Keyed by location code, so iteration is alphabetical. Every entry has count >= 1.
fn location_stats<'a>(rows: &[&'a SalaryRecord]) -> BTreeMap<&'a str, LocationStats> {
    let mut stats = BTreeMap::<&str, LocationStats>::new();
    for row in rows {
        let entry = stats.entry(row.location()).or_default();
        entry.sum += row.salary();
        entry.count += 1;
    }
    stats
}

// Highest means first; equal means keep alphabetical order. The chosen ten are
// then laid out low-to-high, again stable on ties.
fn top_locations(stats: &BTreeMap<&str, LocationStats>) -> Vec<LocationMean> {
    let mut means: Vec<LocationMean> = stats
        .iter()
        .map(|(location, s)| LocationMean {
            location: location.to_string(),
            mean: s.mean(),
        })
        .collect();
    means.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    means.truncate(TOP_LOCATIONS);
    means.sort_by(|a, b| a.mean.total_cmp(&b.mean));
    means
}

fn by_country(stats: &BTreeMap<&str, LocationStats>) -> Vec<CountryAggregate> {
    stats
        .iter()
        .filter_map(|(location, s)| {
            let Some(iso) = iso_alpha3(location) else {
                log::debug!("No ISO3 code for location {location}, leaving it off the map");
                return None;
            };
            Some(CountryAggregate {
                location: location.to_string(),
                iso_alpha3: iso,
                mean: s.mean(),
                count: s.count,
            })
        })
        .collect()
}

/// Five-number summary with Tukey fences, as drawn by a box plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxSummary {
    pub min: f64,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub max: f64,
    pub mean: f64,
    pub outliers: usize,
}

fn quantile(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

impl BoxSummary {
    /// Returns `None` for an empty group. Quartiles use linear interpolation.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let (low_fence, high_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let inside: Vec<f64> = sorted
            .iter()
            .copied()
            .filter(|v| *v >= low_fence && *v <= high_fence)
            .collect();

        Some(BoxSummary {
            min: sorted[0],
            lower_whisker: inside.first().copied().unwrap_or(q1).min(q1),
            q1,
            median,
            q3,
            upper_whisker: inside.last().copied().unwrap_or(q3).max(q3),
            max: sorted[sorted.len() - 1],
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
            outliers: sorted.len() - inside.len(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: u64,
}

/// Equal-width bins spanning the observed range. A single distinct value
/// yields one bin.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return vec![HistogramBin {
            start: min,
            end: max,
            count: values.len() as u64,
        }];
    }
    let width = (max - min) / bins as f64;
    let mut counts = vec![0u64; bins];
    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count,
        })
        .collect()
}
