use crate::error::{ClimateError, Result};
use crate::load::read_records;
use crate::query::{
    Extreme, dedup_by_country, filter_by_country, filter_by_month, filter_by_range,
    filter_by_year, group_min_max_by_country, sort_ascending, take_first, take_last,
};
use crate::structs::{Month, Record};
use log::{debug, info};
use std::path::Path;

const TOP_N: usize = 10;

/// The analyses the tool can produce. Each one has its own destination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    A1,
    A2,
    A3,
    A4,
    B1,
    B2,
    B3,
    C1,
}

impl ReportKind {
    pub fn id(self) -> &'static str {
        match self {
            ReportKind::A1 => "A1",
            ReportKind::A2 => "A2",
            ReportKind::A3 => "A3",
            ReportKind::A4 => "A4",
            ReportKind::B1 => "B1",
            ReportKind::B2 => "B2",
            ReportKind::B3 => "B3",
            ReportKind::C1 => "C1",
        }
    }

    /// File name without extension, e.g. `taskA1_climate_info`.
    pub fn file_stem(self) -> String {
        format!("task{}_climate_info", self.id())
    }

    pub fn column_header(self) -> &'static str {
        match self {
            ReportKind::C1 => "Temperature Delta,Year Delta,Month,Country,Country_Code",
            _ => "Temperature,Year,Month,Country,Country_Code",
        }
    }
}

/// Parameters of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// A1: lowest/highest reading for a country in a month
    MonthExtreme {
        country: String,
        month: i32,
        extreme: Extreme,
    },
    /// A2: lowest/highest reading for a country in a year
    YearExtreme {
        country: String,
        year: i32,
        extreme: Extreme,
    },
    /// A3
    CountryRange { country: String, low: f64, high: f64 },
    /// A4: the reading (and so the year) with the lowest/highest value for a country
    CountryExtreme { country: String, extreme: Extreme },
    /// B1
    Top10Month { month: i32, extreme: Extreme },
    /// B2
    Top10 { extreme: Extreme },
    /// B3
    Range { low: f64, high: f64 },
    /// C1: greatest change in a month between two years
    Delta { month: i32, year1: i32, year2: i32 },
}

impl Query {
    pub fn kind(&self) -> ReportKind {
        match self {
            Query::MonthExtreme { .. } => ReportKind::A1,
            Query::YearExtreme { .. } => ReportKind::A2,
            Query::CountryRange { .. } => ReportKind::A3,
            Query::CountryExtreme { .. } => ReportKind::A4,
            Query::Top10Month { .. } => ReportKind::B1,
            Query::Top10 { .. } => ReportKind::B2,
            Query::Range { .. } => ReportKind::B3,
            Query::Delta { .. } => ReportKind::C1,
        }
    }

    /// Caption line written above the report data.
    pub fn caption(&self) -> String {
        let id = self.kind().id();
        match self {
            Query::MonthExtreme {
                country,
                month,
                extreme,
            } => format!(
                "Task {} : {} Temperature for {} in {}",
                id,
                extreme.label(),
                country.to_uppercase(),
                Month::wrapping(*month)
            ),
            Query::YearExtreme {
                country,
                year,
                extreme,
            } => format!(
                "Task {} : {} Temperature for {} in {}",
                id,
                extreme.label(),
                country.to_uppercase(),
                year
            ),
            Query::CountryRange { country, low, high } => format!(
                "Task {} : Temperatures for {} between {:?} - {:?}",
                id,
                country.to_uppercase(),
                low,
                high
            ),
            Query::CountryExtreme { country, extreme } => format!(
                "Task {} : The Year with The {} Temperature for {}",
                id,
                extreme.label(),
                country.to_uppercase()
            ),
            Query::Top10Month { month, extreme } => format!(
                "Task {} : Top 10 Countries with the {} Temperatures in {}",
                id,
                extreme.label(),
                Month::wrapping(*month)
            ),
            Query::Top10 { extreme } => format!(
                "Task {} : Top 10 Countries with the {} Temperatures",
                id,
                extreme.label()
            ),
            Query::Range { low, high } => format!(
                "Task {} : all Temperatures Between {:?} - {:?}",
                id, low, high
            ),
            Query::Delta {
                month,
                year1,
                year2,
            } => format!(
                "Task {} : Top 10 Countries with the Greatest Temperature Differences in {} from {}-{}",
                id,
                Month::wrapping(*month),
                year1,
                year2
            ),
        }
    }
}

/// Ordered result of a query, ready to be written.
#[derive(Debug, Clone)]
pub struct Report {
    pub kind: ReportKind,
    pub caption: String,
    pub records: Vec<Record>,
}

/// Answers the analysis catalogue over a base dataset loaded once.
#[derive(Debug, Clone)]
pub struct ClimateAnalyzer {
    base: Vec<Record>,
}

impl ClimateAnalyzer {
    /// # Errors
    ///
    /// `Ingest` if `base` is empty: no query is possible without data.
    pub fn new(base: Vec<Record>) -> Result<Self> {
        if base.is_empty() {
            return Err(ClimateError::Ingest("Dataset contains no records".to_string()));
        }
        info!("Loaded {} base records", base.len());
        Ok(Self { base })
    }

    /// Loads the base dataset from a CSV file.
    ///
    /// # Errors
    ///
    /// `Ingest` if the file is unreadable, malformed or has no rows.
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::new(read_records(path)?)
    }

    pub fn records(&self) -> &[Record] {
        &self.base
    }

    /// Runs `query` and captions the result.
    ///
    /// # Errors
    ///
    /// Propagates `Range` and `NotFound` from the underlying analysis.
    pub fn run(&self, query: &Query) -> Result<Report> {
        debug!("Running {:?}", query);
        let records = match query {
            Query::MonthExtreme {
                country,
                month,
                extreme,
            } => vec![self.temp_by_month(country, *month, *extreme)?],
            Query::YearExtreme {
                country,
                year,
                extreme,
            } => vec![self.temp_by_year(country, *year, *extreme)?],
            Query::CountryRange { country, low, high } => {
                self.temps_within_range(country, *low, *high)?
            }
            Query::CountryExtreme { country, extreme } => {
                vec![self.temp_year_by_country(country, *extreme)?]
            }
            Query::Top10Month { month, extreme } => self.top10_by_month(*month, *extreme)?,
            Query::Top10 { extreme } => self.top10(*extreme),
            Query::Range { low, high } => self.all_within_range(*low, *high)?,
            Query::Delta {
                month,
                year1,
                year2,
            } => self.top10_delta(*month, *year1, *year2)?,
        };
        Ok(Report {
            kind: query.kind(),
            caption: query.caption(),
            records,
        })
    }

    /// A1: lowest or highest reading for a country in a calendar month.
    ///
    /// # Arguments
    ///
    /// * `country` - Country name, matched ignoring case
    /// * `month` - Calendar month, 1 = Jan .. 12 = Dec
    /// * `extreme` - Which end of the ascending order to return
    ///
    /// # Errors
    ///
    /// `Range` if `month` is outside 1..12, `NotFound` if the country has no
    /// reading in that month.
    pub fn temp_by_month(&self, country: &str, month: i32, extreme: Extreme) -> Result<Record> {
        let filtered = filter_by_country(&self.base, country)?;
        let filtered = filter_by_month(&filtered, month)?;
        pick(sort_ascending(filtered), extreme)
    }

    /// A2: lowest or highest reading for a country in a year.
    ///
    /// # Errors
    ///
    /// `NotFound` if the country is unknown or has no reading in `year`.
    pub fn temp_by_year(&self, country: &str, year: i32, extreme: Extreme) -> Result<Record> {
        let filtered = filter_by_country(&self.base, country)?;
        let filtered = filter_by_year(&filtered, year)?;
        pick(sort_ascending(filtered), extreme)
    }

    /// A3: every reading for a country with `low <= celsius <= high`.
    ///
    /// # Arguments
    ///
    /// * `country` - Country name, matched ignoring case
    /// * `low` - Inclusive lower bound in Celsius
    /// * `high` - Inclusive upper bound in Celsius
    ///
    /// # Returns
    ///
    /// Matching records in ascending order, exact duplicates collapsed.
    ///
    /// # Errors
    ///
    /// `NotFound` if the country is unknown or nothing falls in the range.
    pub fn temps_within_range(&self, country: &str, low: f64, high: f64) -> Result<Vec<Record>> {
        let filtered = filter_by_country(&self.base, country)?;
        let filtered = filter_by_range(&filtered, low, high)?;
        Ok(sort_ascending(filtered))
    }

    /// A4: the reading, and so the year, with the lowest or highest value for
    /// a country.
    ///
    /// # Errors
    ///
    /// `NotFound` if the country is unknown.
    pub fn temp_year_by_country(&self, country: &str, extreme: Extreme) -> Result<Record> {
        let filtered = filter_by_country(&self.base, country)?;
        pick(sort_ascending(filtered), extreme)
    }

    /// B1: ten countries with the lowest or highest readings in a month, one
    /// record per country.
    ///
    /// # Returns
    ///
    /// Up to ten records in ascending order. `Lowest` takes the head of the
    /// per-country minima, `Highest` the tail of the per-country maxima.
    ///
    /// # Errors
    ///
    /// `Range` if `month` is outside 1..12, `NotFound` if the month has no
    /// readings.
    pub fn top10_by_month(&self, month: i32, extreme: Extreme) -> Result<Vec<Record>> {
        let filtered = filter_by_month(&self.base, month)?;
        Ok(top_per_country(sort_ascending(filtered), extreme))
    }

    /// B2: same as [`ClimateAnalyzer::top10_by_month`] over the whole dataset.
    pub fn top10(&self, extreme: Extreme) -> Vec<Record> {
        top_per_country(sort_ascending(self.base.clone()), extreme)
    }

    /// B3: every reading in the dataset with `low <= celsius <= high`.
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing falls in the range.
    pub fn all_within_range(&self, low: f64, high: f64) -> Result<Vec<Record>> {
        let filtered = filter_by_range(&self.base, low, high)?;
        Ok(sort_ascending(filtered))
    }

    /// C1: the ten countries with the greatest temperature change in `month`
    /// between `year1` and `year2`.
    ///
    /// Each year contributes the min and max reading per country, and every
    /// pairing across the two years that shares country, month and code
    /// yields a delta. Duplicate countries are removed scanning ascending
    /// (smallest delta kept) before the tail is taken.
    ///
    /// # Arguments
    ///
    /// * `month` - Calendar month, 1 = Jan .. 12 = Dec
    /// * `year1` - First year compared
    /// * `year2` - Second year compared
    ///
    /// # Returns
    ///
    /// Up to ten delta records in ascending order. No overlapping country
    /// gives an empty result.
    ///
    /// # Errors
    ///
    /// `Range` if `month` is outside 1..12, `NotFound` if the month or either
    /// year has no readings.
    pub fn top10_delta(&self, month: i32, year1: i32, year2: i32) -> Result<Vec<Record>> {
        let in_month = filter_by_month(&self.base, month)?;
        let first = group_min_max_by_country(&sort_ascending(filter_by_year(&in_month, year1)?));
        let second = group_min_max_by_country(&sort_ascending(filter_by_year(&in_month, year2)?));

        // Pairwise join, quadratic in the number of grouped records.
        let deltas: Vec<Record> = first
            .iter()
            .flat_map(|a| {
                second
                    .iter()
                    .filter(move |b| a.pairs_with(b))
                    .map(move |b| Record::delta(a, b))
            })
            .collect();
        debug!("Computed {} deltas", deltas.len());

        let unique = dedup_by_country(&sort_ascending(deltas), Extreme::Lowest);
        Ok(take_last(unique, TOP_N))
    }
}

fn pick(sorted: Vec<Record>, extreme: Extreme) -> Result<Record> {
    let picked = match extreme {
        Extreme::Lowest => sorted.into_iter().next(),
        Extreme::Highest => sorted.into_iter().next_back(),
    };
    picked.ok_or_else(|| ClimateError::NotFound("No temperature was found".to_string()))
}

fn top_per_country(sorted: Vec<Record>, extreme: Extreme) -> Vec<Record> {
    let unique = dedup_by_country(&sorted, extreme);
    match extreme {
        Extreme::Lowest => take_first(unique, TOP_N),
        Extreme::Highest => take_last(unique, TOP_N),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(temp: f64, year: i32, month: &str, country: &str) -> Record {
        Record::new(temp, year, month.parse().unwrap(), country, country).unwrap()
    }

    fn analyzer() -> ClimateAnalyzer {
        ClimateAnalyzer::new(vec![
            rec(5.0, 2000, "Jan", "USA"),
            rec(15.0, 2001, "Jan", "USA"),
            rec(-2.0, 2000, "Feb", "USA"),
            rec(1.0, 2000, "Jan", "CAN"),
            rec(-20.0, 2001, "Jan", "CAN"),
            rec(25.0, 2000, "Jan", "MEX"),
            rec(24.0, 2001, "Jan", "MEX"),
        ])
        .unwrap()
    }

    /// Twelve countries with distinct January readings in 2000 and 2016.
    fn many_countries() -> ClimateAnalyzer {
        let mut base = Vec::new();
        for i in 0..12 {
            let country = format!("C{:02}", i);
            base.push(rec(i as f64, 2000, "Jan", &country));
            base.push(rec(i as f64 * 3.0, 2016, "Jan", &country));
        }
        ClimateAnalyzer::new(base).unwrap()
    }

    #[test]
    fn test_empty_dataset_is_ingest_error() {
        assert!(matches!(
            ClimateAnalyzer::new(Vec::new()),
            Err(ClimateError::Ingest(_))
        ));
    }

    #[test]
    fn test_temp_by_month() {
        let a = analyzer();
        assert_eq!(a.temp_by_month("usa", 1, Extreme::Lowest).unwrap().celsius(), 5.0);
        assert_eq!(a.temp_by_month("USA", 1, Extreme::Highest).unwrap().celsius(), 15.0);
        assert!(matches!(
            a.temp_by_month("USA", 13, Extreme::Lowest),
            Err(ClimateError::Range(_))
        ));
        assert!(matches!(
            a.temp_by_month("CAN", 2, Extreme::Lowest),
            Err(ClimateError::NotFound(_))
        ));
    }

    #[test]
    fn test_temp_by_year_and_country() {
        let a = analyzer();
        assert_eq!(a.temp_by_year("USA", 2000, Extreme::Lowest).unwrap().celsius(), -2.0);
        assert_eq!(a.temp_by_year("USA", 2000, Extreme::Highest).unwrap().celsius(), 5.0);
        let coldest = a.temp_year_by_country("CAN", Extreme::Lowest).unwrap();
        assert_eq!(coldest.year(), 2001);
        assert!(matches!(
            a.temp_year_by_country("Narnia", Extreme::Highest),
            Err(ClimateError::NotFound(_))
        ));
    }

    #[test]
    fn test_ranges() {
        let a = analyzer();
        let usa = a.temps_within_range("USA", -5.0, 5.0).unwrap();
        let temps: Vec<f64> = usa.iter().map(|r| r.celsius()).collect();
        assert_eq!(temps, vec![-2.0, 5.0]);
        let all = a.all_within_range(1.0, 24.0).unwrap();
        assert_eq!(all.len(), 4);
        assert!(matches!(a.all_within_range(100.0, 200.0), Err(ClimateError::NotFound(_))));
    }

    #[test]
    fn test_top10_by_month() {
        let a = analyzer();
        let lowest = a.top10_by_month(1, Extreme::Lowest).unwrap();
        let temps: Vec<f64> = lowest.iter().map(|r| r.celsius()).collect();
        assert_eq!(temps, vec![-20.0, 5.0, 24.0]);
        let highest = a.top10_by_month(1, Extreme::Highest).unwrap();
        let temps: Vec<f64> = highest.iter().map(|r| r.celsius()).collect();
        assert_eq!(temps, vec![1.0, 15.0, 25.0]);
    }

    #[test]
    fn test_top10_caps_at_ten() {
        let a = many_countries();
        let lowest = a.top10(Extreme::Lowest);
        assert_eq!(lowest.len(), 10);
        assert_eq!(lowest[0].country(), "C00");
        assert_eq!(lowest[9].country(), "C09");
        let highest = a.top10(Extreme::Highest);
        assert_eq!(highest.len(), 10);
        assert_eq!(highest[0].country(), "C02");
        assert_eq!(highest[9].celsius(), 33.0);
    }

    #[test]
    fn test_top10_delta_single_country() {
        let a = ClimateAnalyzer::new(vec![
            rec(5.0, 2000, "Jan", "USA"),
            rec(8.5, 2016, "Jan", "USA"),
        ])
        .unwrap();
        let deltas = a.top10_delta(1, 2000, 2016).unwrap();
        assert_eq!(deltas.len(), 1);
        assert!(deltas[0].is_delta());
        assert_eq!(deltas[0].celsius(), 3.5);
        assert_eq!(deltas[0].year(), 16);
    }

    #[test]
    fn test_top10_delta_no_overlap_is_empty() {
        let a = ClimateAnalyzer::new(vec![
            rec(5.0, 2000, "Jan", "USA"),
            rec(8.5, 2016, "Jan", "CAN"),
        ])
        .unwrap();
        assert!(a.top10_delta(1, 2000, 2016).unwrap().is_empty());
    }

    #[test]
    fn test_top10_delta_tail() {
        let a = many_countries();
        let deltas = a.top10_delta(1, 2000, 2016).unwrap();
        assert_eq!(deltas.len(), 10);
        // C11 changed most: 11 -> 33
        assert_eq!(deltas[9].country(), "C11");
        assert_eq!(deltas[9].celsius(), 22.0);
        assert!(deltas.windows(2).all(|w| w[0] <= w[1]));
        assert!(matches!(a.top10_delta(1, 2000, 1990), Err(ClimateError::NotFound(_))));
        assert!(matches!(a.top10_delta(0, 2000, 2016), Err(ClimateError::Range(_))));
    }

    #[test]
    fn test_top10_delta_skips_mismatched_codes() {
        let jan = Month::wrapping(1);
        let a = ClimateAnalyzer::new(vec![
            Record::new(3.0, 2000, jan, "Georgia", "GEO").unwrap(),
            Record::new(5.0, 2016, jan, "Georgia", "USA-GA").unwrap(),
            Record::new(1.0, 2000, jan, "Chad", "TCD").unwrap(),
            Record::new(4.0, 2016, jan, "chad", "tcd").unwrap(),
        ])
        .unwrap();
        let deltas = a.top10_delta(1, 2000, 2016).unwrap();
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].country(), "Chad");
        assert_eq!(deltas[0].celsius(), 3.0);
    }

    #[test]
    fn test_top10_delta_keeps_smallest_pair_per_country() {
        // USA: 2000 has min 3.0 and max 10.0, 2016 has 5.0, so the candidate
        // deltas are 2.0 and 5.0.
        let a = ClimateAnalyzer::new(vec![
            rec(3.0, 2000, "Jan", "USA"),
            rec(10.0, 2000, "Jan", "USA"),
            rec(5.0, 2016, "Jan", "USA"),
            rec(1.0, 2000, "Jan", "CAN"),
            rec(1.5, 2016, "Jan", "CAN"),
        ])
        .unwrap();
        let deltas = a.top10_delta(1, 2000, 2016).unwrap();
        let summary: Vec<(&str, f64)> = deltas.iter().map(|r| (r.country(), r.celsius())).collect();
        assert_eq!(summary, vec![("CAN", 0.5), ("USA", 2.0)]);
        let (x, y) = deltas[1].source_pair().unwrap();
        assert_eq!((x.celsius(), y.celsius()), (3.0, 5.0));
    }

    #[test]
    fn test_range_reports_collapse_exact_duplicates() {
        let a = ClimateAnalyzer::new(vec![
            Record::new(10.0, 2000, Month::wrapping(1), "Chad", "TCD").unwrap(),
            Record::new(10.0, 2000, Month::wrapping(1), "Chad", "TCD").unwrap(),
            Record::new(12.0, 2001, Month::wrapping(1), "Chad", "TCD").unwrap(),
        ])
        .unwrap();
        assert_eq!(a.all_within_range(0.0, 20.0).unwrap().len(), 2);
        assert_eq!(a.temps_within_range("Chad", 0.0, 11.0).unwrap().len(), 1);
    }

    #[test]
    fn test_run_captions() {
        let a = analyzer();
        let report = a
            .run(&Query::MonthExtreme {
                country: "usa".to_string(),
                month: 1,
                extreme: Extreme::Lowest,
            })
            .unwrap();
        assert_eq!(report.kind, ReportKind::A1);
        assert_eq!(report.caption, "Task A1 : Lowest Temperature for USA in Jan");
        assert_eq!(report.records.len(), 1);

        let delta = Query::Delta {
            month: 12,
            year1: 2000,
            year2: 2016,
        };
        assert_eq!(
            delta.caption(),
            "Task C1 : Top 10 Countries with the Greatest Temperature Differences in Dec from 2000-2016"
        );
        assert_eq!(delta.kind().file_stem(), "taskC1_climate_info");
        assert_eq!(
            Query::Range { low: 1.0, high: 2.5 }.caption(),
            "Task B3 : all Temperatures Between 1.0 - 2.5"
        );
    }
}
