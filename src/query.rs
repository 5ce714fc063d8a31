use crate::error::{ClimateError, Result};
use crate::structs::{Month, Record};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Which end of an ordered sequence a query keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Extreme {
    Lowest,
    Highest,
}

impl Extreme {
    pub fn label(self) -> &'static str {
        match self {
            Extreme::Lowest => "Lowest",
            Extreme::Highest => "Highest",
        }
    }
}

fn non_empty(records: Vec<Record>, what: impl FnOnce() -> String) -> Result<Vec<Record>> {
    if records.is_empty() {
        return Err(ClimateError::NotFound(what()));
    }
    Ok(records)
}

/// Keeps records observed in the given calendar month.
///
/// # Arguments
///
/// * `records` - Records to filter, in any order
/// * `month` - Calendar month, 1 = Jan .. 12 = Dec
///
/// # Returns
///
/// The matching records in input order.
///
/// # Errors
///
/// `Range` if `month` is outside 1..12, `NotFound` if nothing matches.
pub fn filter_by_month(records: &[Record], month: i32) -> Result<Vec<Record>> {
    let month = Month::from_number(month)?;
    let filtered: Vec<Record> = records
        .iter()
        .filter(|r| r.month() == month)
        .cloned()
        .collect();
    debug!("Month {}: {} of {} records", month, filtered.len(), records.len());
    non_empty(filtered, || {
        format!("No temperature for the given month, '{}', was found", month)
    })
}

/// Keeps records with an exact year match.
///
/// # Errors
///
/// `NotFound` if no record has that year.
pub fn filter_by_year(records: &[Record], year: i32) -> Result<Vec<Record>> {
    let filtered: Vec<Record> = records
        .iter()
        .filter(|r| r.year() == year)
        .cloned()
        .collect();
    debug!("Year {}: {} of {} records", year, filtered.len(), records.len());
    non_empty(filtered, || {
        format!("No temperature in the given year, '{}', was found", year)
    })
}

/// Keeps records whose country matches `country`, ignoring case.
///
/// # Errors
///
/// `NotFound` if no record has that country.
pub fn filter_by_country(records: &[Record], country: &str) -> Result<Vec<Record>> {
    let filtered: Vec<Record> = records
        .iter()
        .filter(|r| r.country().eq_ignore_ascii_case(country))
        .cloned()
        .collect();
    debug!(
        "Country {}: {} of {} records",
        country,
        filtered.len(),
        records.len()
    );
    non_empty(filtered, || {
        format!("No temperature with the given country, '{}', was found", country)
    })
}

/// Keeps records with `low <= celsius <= high`.
///
/// # Arguments
///
/// * `records` - Records to filter, in any order
/// * `low` - Inclusive lower bound in Celsius
/// * `high` - Inclusive upper bound in Celsius
///
/// # Errors
///
/// `NotFound` if nothing falls in the range. An inverted range simply
/// matches nothing.
pub fn filter_by_range(records: &[Record], low: f64, high: f64) -> Result<Vec<Record>> {
    let filtered: Vec<Record> = records
        .iter()
        .filter(|r| r.celsius() >= low && r.celsius() <= high)
        .cloned()
        .collect();
    debug!(
        "Range [{}, {}]: {} of {} records",
        low,
        high,
        filtered.len(),
        records.len()
    );
    non_empty(filtered, || {
        format!("No temperature within the range {} - {} was found", low, high)
    })
}

/// Ascending sort by the record total order.
///
/// Records equal on all five ordering keys collapse to one, so the result
/// behaves as an ordered set.
pub fn sort_ascending(mut records: Vec<Record>) -> Vec<Record> {
    records.sort();
    records.dedup();
    records
}

/// Keeps one record per country from a sequence sorted ascending.
///
/// # Arguments
///
/// * `records` - Records already in ascending order
/// * `keep` - Whether the lowest or highest record per country survives
///
/// `Lowest` scans front to back and `Highest` scans back to front; the first
/// record seen for a country wins. The result is re-sorted ascending, so the
/// highest-per-country values sit at the tail.
pub fn dedup_by_country(records: &[Record], keep: Extreme) -> Vec<Record> {
    let scan: Vec<&Record> = match keep {
        Extreme::Lowest => records.iter().collect(),
        Extreme::Highest => records.iter().rev().collect(),
    };
    let mut seen: HashSet<&str> = HashSet::new();
    let mut unique = Vec::new();
    for record in scan {
        if seen.insert(record.country()) {
            unique.push(record.clone());
        }
    }
    debug!(
        "Dedup by country ({}): {} -> {} records",
        keep.label(),
        records.len(),
        unique.len()
    );
    sort_ascending(unique)
}

/// Elements at indices `[start, end)`.
///
/// Falls back to the whole input when it is empty, `start` is negative or
/// `end` is past the end. `start >= end` inside those bounds yields nothing.
pub fn window_slice(records: Vec<Record>, start: isize, end: isize) -> Vec<Record> {
    if records.is_empty() || start < 0 || end > records.len() as isize {
        return records;
    }
    if start >= end {
        return Vec::new();
    }
    records[start as usize..end as usize].to_vec()
}

/// First `n` records, or all of them if there are fewer.
pub fn take_first(records: Vec<Record>, n: usize) -> Vec<Record> {
    window_slice(records, 0, n as isize)
}

/// Last `n` records, or all of them if there are fewer.
pub fn take_last(records: Vec<Record>, n: usize) -> Vec<Record> {
    let len = records.len() as isize;
    window_slice(records, len - n as isize, len)
}

/// Minimum and maximum record of every country (case-insensitive grouping).
///
/// # Returns
///
/// Both extremes per country in ascending order. A single-record country
/// contributes one record.
pub fn group_min_max_by_country(records: &[Record]) -> Vec<Record> {
    let mut groups: HashMap<String, Vec<&Record>> = HashMap::new();
    for record in records {
        groups
            .entry(record.country().to_lowercase())
            .or_default()
            .push(record);
    }

    let mut extremes = Vec::with_capacity(groups.len() * 2);
    for group in groups.values() {
        // Groups are never empty.
        let (Some(min), Some(max)) = (group.iter().min(), group.iter().max()) else {
            continue;
        };
        extremes.push((*min).clone());
        if min != max {
            extremes.push((*max).clone());
        }
    }
    debug!(
        "Min/max over {} countries: {} records",
        groups.len(),
        extremes.len()
    );
    sort_ascending(extremes)
}
