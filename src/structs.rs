use crate::error::{ClimateError, Result};
use log::{Log, Metadata, Record as LogRecord};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Simple logger implementation
///
/// Writes to stderr so report lines printed on stdout stay clean.
pub struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &LogRecord) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Temperature unit used when reading a record's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn suffix(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
        }
    }
}

/// Output formats a report can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Appending caption + header + record lines (`task<ID>_climate_info.csv`)
    Text,
    Json,
    Parquet,
}

/// Configuration for report output
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub formats: Vec<OutputFormat>,
    pub unit: TemperatureUnit,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            formats: vec![OutputFormat::Text],
            unit: TemperatureUnit::Celsius,
        }
    }
}

/// Lookup table indexed by `number % 12`, so 12 and 0 both land on December.
const MONTHS: [chrono::Month; 12] = [
    chrono::Month::December,
    chrono::Month::January,
    chrono::Month::February,
    chrono::Month::March,
    chrono::Month::April,
    chrono::Month::May,
    chrono::Month::June,
    chrono::Month::July,
    chrono::Month::August,
    chrono::Month::September,
    chrono::Month::October,
    chrono::Month::November,
];

/// Calendar month identified by its three-letter code (`Jan`..`Dec`).
///
/// Ordering is lexicographic on the code, not calendar order, since that is
/// the tie-break the record ordering uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month(chrono::Month);

impl Month {
    /// Validated conversion from a calendar number, 1 = Jan .. 12 = Dec.
    pub fn from_number(number: i32) -> Result<Self> {
        if !(1..=12).contains(&number) {
            return Err(ClimateError::Range(format!(
                "Input for month, '{}', is outside of the range 1-12",
                number
            )));
        }
        Ok(Self::wrapping(number))
    }

    /// Unchecked lookup with modulo-12 wraparound (0 maps to Dec).
    pub fn wrapping(number: i32) -> Self {
        Month(MONTHS[number.rem_euclid(12) as usize])
    }

    pub fn code(&self) -> &'static str {
        &self.0.name()[..3]
    }

    pub fn all() -> impl Iterator<Item = Month> {
        (1..=12).map(Month::wrapping)
    }
}

impl FromStr for Month {
    type Err = ClimateError;

    fn from_str(s: &str) -> Result<Self> {
        Month::all()
            .find(|m| m.code() == s)
            .ok_or_else(|| ClimateError::Ingest(format!("Unknown month code: '{}'", s)))
    }
}

impl Ord for Month {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code().cmp(other.code())
    }
}

impl PartialOrd for Month {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// One monthly temperature observation for a country, or a synthetic delta
/// between two observations.
///
/// Records are immutable once built. Equality and ordering follow the total
/// order: temperature, country, year, month code, country code.
#[derive(Debug, Clone)]
pub struct Record {
    temperature: f64,
    year: i32,
    month: Month,
    country: String,
    country_code: String,
    source_pair: Option<Box<(Record, Record)>>,
}

impl Record {
    /// Builds an observation, rejecting non-finite temperatures and empty
    /// country fields.
    pub fn new(
        temperature: f64,
        year: i32,
        month: Month,
        country: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Result<Self> {
        let country = country.into();
        let country_code = country_code.into();
        if !temperature.is_finite() {
            return Err(ClimateError::Ingest(format!(
                "Temperature '{}' is not a finite number",
                temperature
            )));
        }
        if country.is_empty() || country_code.is_empty() {
            return Err(ClimateError::Ingest(
                "Country and country code must be non-empty".to_string(),
            ));
        }
        Ok(Self {
            temperature,
            year,
            month,
            country,
            country_code,
            source_pair: None,
        })
    }

    /// Absolute change between two observations of the same country, month
    /// and country code (compared case-insensitively).
    ///
    /// The year field holds the year gap, saturating at `i32::MAX`.
    ///
    /// # Panics
    ///
    /// Panics if `a.pairs_with(b)` is false. Callers only pair records that
    /// passed that check.
    pub fn delta(a: &Record, b: &Record) -> Record {
        assert!(
            a.pairs_with(b),
            "delta requires matching country/month/code, got {} and {}",
            a,
            b
        );
        Record {
            temperature: (a.temperature - b.temperature).abs(),
            year: i32::try_from(a.year.abs_diff(b.year)).unwrap_or(i32::MAX),
            month: a.month,
            country: a.country.clone(),
            country_code: a.country_code.clone(),
            source_pair: Some(Box::new((a.clone(), b.clone()))),
        }
    }

    pub fn celsius(&self) -> f64 {
        self.temperature
    }

    /// Derived Fahrenheit view. For a delta this is the difference of the two
    /// source Fahrenheit values, never a conversion of the Celsius delta.
    pub fn fahrenheit(&self) -> f64 {
        match &self.source_pair {
            Some(pair) => (pair.0.fahrenheit() - pair.1.fahrenheit()).abs(),
            None => celsius_to_fahrenheit(self.temperature),
        }
    }

    pub fn temperature(&self, unit: TemperatureUnit) -> f64 {
        match unit {
            TemperatureUnit::Celsius => self.celsius(),
            TemperatureUnit::Fahrenheit => self.fahrenheit(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn is_delta(&self) -> bool {
        self.source_pair.is_some()
    }

    pub fn source_pair(&self) -> Option<(&Record, &Record)> {
        self.source_pair.as_deref().map(|(a, b)| (a, b))
    }

    pub fn same_country(&self, other: &Record) -> bool {
        self.country.eq_ignore_ascii_case(&other.country)
    }

    /// True when `other` shares country, month and country code (ignoring
    /// case), the precondition of [`Record::delta`].
    pub fn pairs_with(&self, other: &Record) -> bool {
        self.same_country(other)
            && self.month == other.month
            && self.country_code.eq_ignore_ascii_case(&other.country_code)
    }
}

impl Ord for Record {
    fn cmp(&self, other: &Self) -> Ordering {
        // Temperatures are finite by construction.
        self.temperature
            .partial_cmp(&other.temperature)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.country.cmp(&other.country))
            .then_with(|| self.year.cmp(&other.year))
            .then_with(|| self.month.cmp(&other.month))
            .then_with(|| self.country_code.cmp(&other.country_code))
    }
}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Record {}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}(C) {:.2}(F), {}, {}, {}, {}",
            self.celsius(),
            self.fahrenheit(),
            self.year,
            self.month,
            self.country,
            self.country_code
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(temp: f64, year: i32, month: &str, country: &str) -> Record {
        Record::new(temp, year, month.parse().unwrap(), country, country).unwrap()
    }

    #[test]
    fn test_month_wraparound() {
        assert_eq!(Month::wrapping(0).code(), "Dec");
        assert_eq!(Month::wrapping(12).code(), "Dec");
        assert_eq!(Month::wrapping(1).code(), "Jan");
        assert_eq!(Month::from_number(9).unwrap().code(), "Sep");
    }

    #[test]
    fn test_month_out_of_range() {
        assert!(matches!(Month::from_number(13), Err(ClimateError::Range(_))));
        assert!(matches!(Month::from_number(0), Err(ClimateError::Range(_))));
    }

    #[test]
    fn test_month_orders_by_code() {
        let apr: Month = "Apr".parse().unwrap();
        let jan: Month = "Jan".parse().unwrap();
        assert!(apr < jan);
        assert!("jan".parse::<Month>().is_err());
        assert_eq!(Month::all().count(), 12);
    }

    #[test]
    fn test_record_rejects_invalid_fields() {
        let jan = Month::wrapping(1);
        assert!(Record::new(f64::NAN, 2000, jan, "USA", "USA").is_err());
        assert!(Record::new(1.0, 2000, jan, "", "USA").is_err());
        assert!(Record::new(1.0, 2000, jan, "USA", "").is_err());
    }

    #[test]
    fn test_record_ordering_tie_breaks() {
        let a = rec(5.0, 2000, "Jan", "Canada");
        let b = rec(5.0, 2000, "Jan", "USA");
        let c = rec(5.0, 2001, "Jan", "USA");
        let d = rec(4.0, 2010, "Feb", "Zimbabwe");
        let mut v = vec![c.clone(), b.clone(), a.clone(), d.clone()];
        v.sort();
        assert_eq!(v, vec![d, a, b, c]);
    }

    #[test]
    fn test_record_equality_uses_raw_celsius() {
        let a = rec(10.001, 2000, "Jan", "USA");
        let b = rec(10.002, 2000, "Jan", "USA");
        assert_eq!(a.to_string(), b.to_string());
        assert_ne!(a, b);
    }

    #[test]
    fn test_fahrenheit_and_display() {
        let r = rec(10.0, 2005, "Mar", "Chad");
        assert!((r.fahrenheit() - 50.0).abs() < 1e-9);
        assert_eq!(r.temperature(TemperatureUnit::Celsius), 10.0);
        assert_eq!(r.to_string(), "10.00(C) 50.00(F), 2005, Mar, Chad, Chad");
    }

    #[test]
    fn test_delta_fields() {
        let a = rec(5.0, 2000, "Jan", "USA");
        let b = rec(15.5, 2016, "Jan", "usa");
        let d = Record::delta(&a, &b);
        assert!(d.is_delta());
        assert_eq!(d.celsius(), 10.5);
        assert_eq!(d.year(), 16);
        assert_eq!(d.country(), "USA");
        assert!((d.fahrenheit() - (a.fahrenheit() - b.fahrenheit()).abs()).abs() < 1e-9);
        assert!((d.fahrenheit() - celsius_to_fahrenheit(d.celsius())).abs() > 1.0);
        let (x, y) = d.source_pair().unwrap();
        assert_eq!((x, y), (&a, &b));
    }

    #[test]
    fn test_pairs_with_requires_matching_code() {
        let jan = Month::wrapping(1);
        let a = Record::new(3.0, 2000, jan, "Georgia", "GEO").unwrap();
        let b = Record::new(4.0, 2016, jan, "georgia", "geo").unwrap();
        let c = Record::new(4.0, 2016, jan, "Georgia", "USA-GA").unwrap();
        let d = Record::new(4.0, 2016, Month::wrapping(2), "Georgia", "GEO").unwrap();
        assert!(a.pairs_with(&b));
        assert!(!a.pairs_with(&c));
        assert!(!a.pairs_with(&d));
    }

    #[test]
    fn test_delta_year_gap_does_not_overflow() {
        let a = rec(1.0, i32::MIN, "Jan", "USA");
        let b = rec(2.0, i32::MAX, "Jan", "USA");
        assert_eq!(Record::delta(&a, &b).year(), i32::MAX);
        let c = rec(2.0, -5, "Jan", "USA");
        assert_eq!(Record::delta(&c, &rec(1.0, 5, "Jan", "USA")).year(), 10);
    }

    #[test]
    #[should_panic]
    fn test_delta_mismatched_country_panics() {
        let a = rec(5.0, 2000, "Jan", "USA");
        let b = rec(6.0, 2001, "Jan", "Canada");
        Record::delta(&a, &b);
    }
}
