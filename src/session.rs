use crate::error::{ClimateError, Result};
use crate::load::{print_report, write_report};
use crate::query::Extreme;
use crate::report::{ClimateAnalyzer, Query, Report};
use crate::structs::ReportConfig;
use log::{debug, warn};
use std::io::{BufRead, Write};
use std::str::FromStr;

const MONTH_PROMPT: &str = "Please enter a [Month] in numeric form (1 = Jan, 12 = Dec) : ";
const COUNTRY_PROMPT: &str = "Please enter a [Country] : ";

/// One prompted analysis in the guided run.
#[derive(Debug, Clone, Copy)]
enum Task {
    A1(Extreme),
    A2(Extreme),
    A3,
    A4(Extreme),
    B1(Extreme),
    B2(Extreme),
    B3,
    C1,
}

const TASKS: [Task; 13] = [
    Task::A1(Extreme::Lowest),
    Task::A1(Extreme::Highest),
    Task::A2(Extreme::Lowest),
    Task::A2(Extreme::Highest),
    Task::A3,
    Task::A4(Extreme::Lowest),
    Task::A4(Extreme::Highest),
    Task::B1(Extreme::Lowest),
    Task::B1(Extreme::Highest),
    Task::B2(Extreme::Lowest),
    Task::B2(Extreme::Highest),
    Task::B3,
    Task::C1,
];

impl Task {
    fn title(self) -> String {
        match self {
            Task::A1(e) => format!("A-1 ) {} Temperature in a given Country and Month", e.label()),
            Task::A2(e) => format!("A-2 ) {} Temperature in a given Country and Year", e.label()),
            Task::A3 => "A-3 ) Temperatures in a Given Country and Temperature Range".to_string(),
            Task::A4(e) => format!("A-4 ) Year with the {} Temperature in a Given Country", e.label()),
            Task::B1(e) => format!(
                "B-1 ) Top 10 Countries with the {} Temperatures in Given Month",
                e.label()
            ),
            Task::B2(e) => format!("B-2 ) Top 10 Countries with the {} Temperatures...", e.label()),
            Task::B3 => "B-3 ) All Temperatures Within a Given Temperature Range".to_string(),
            Task::C1 => {
                "C-1 ) Top 10 Countries with The Greatest Change in Temperatures Between 2 Years"
                    .to_string()
            }
        }
    }
}

/// Why an attempt at a task stopped short of a report.
enum Interrupt {
    /// Bad input or an empty/out-of-range query; the task is asked again.
    Retry(String),
    /// Input closed.
    Eof,
    Fatal(ClimateError),
}

impl From<ClimateError> for Interrupt {
    fn from(err: ClimateError) -> Self {
        match err {
            ClimateError::Range(_) | ClimateError::NotFound(_) => Interrupt::Retry(err.to_string()),
            other => Interrupt::Fatal(other),
        }
    }
}

impl From<std::io::Error> for Interrupt {
    fn from(err: std::io::Error) -> Self {
        Interrupt::Fatal(ClimateError::Io(err))
    }
}

type Attempt<T> = std::result::Result<T, Interrupt>;

/// Guided run through every analysis, prompting for parameters on `input`.
///
/// A task is asked again until it produces a report. Each report is written
/// with `config` and echoed to `output`.
pub struct Session<'a, R, W> {
    analyzer: &'a ClimateAnalyzer,
    config: &'a ReportConfig,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(analyzer: &'a ClimateAnalyzer, config: &'a ReportConfig, input: R, output: W) -> Self {
        Self {
            analyzer,
            config,
            input,
            output,
        }
    }

    /// Runs all tasks in order and returns how many reports were written.
    /// Closing the input ends the session early without an error.
    pub fn run(mut self) -> Result<usize> {
        let mut written = 0;
        for task in TASKS {
            writeln!(self.output, "{}", task.title())?;
            loop {
                match self.attempt(task) {
                    Ok(report) => {
                        print_report(&report, self.config.unit, &mut self.output)?;
                        written += 1;
                        writeln!(self.output)?;
                        break;
                    }
                    Err(Interrupt::Retry(message)) => {
                        debug!("{:?} rejected: {}", task, message);
                        writeln!(self.output, "{}, try again", message)?;
                        writeln!(self.output)?;
                    }
                    Err(Interrupt::Eof) => {
                        warn!("Input closed after {} reports", written);
                        return Ok(written);
                    }
                    Err(Interrupt::Fatal(err)) => return Err(err),
                }
            }
        }
        writeln!(self.output, "Done!")?;
        Ok(written)
    }

    fn attempt(&mut self, task: Task) -> Attempt<Report> {
        let query = self.query_for(task)?;
        let report = self.analyzer.run(&query)?;
        write_report(&report, self.config)?;
        Ok(report)
    }

    fn query_for(&mut self, task: Task) -> Attempt<Query> {
        let query = match task {
            Task::A1(extreme) => Query::MonthExtreme {
                country: self.ask_line(&format!("1 ) {}", COUNTRY_PROMPT))?,
                month: self.ask_number(&format!("2 ) {}", MONTH_PROMPT), "Month")?,
                extreme,
            },
            Task::A2(extreme) => Query::YearExtreme {
                country: self.ask_line(&format!("1 ) {}", COUNTRY_PROMPT))?,
                year: self.ask_number("2 ) Please enter a [Year] : ", "Year")?,
                extreme,
            },
            Task::A3 => Query::CountryRange {
                country: self.ask_line(&format!("1 ) {}", COUNTRY_PROMPT))?,
                low: self.ask_number("2 ) Please enter a [Lower Temperature] : ", "Temperature")?,
                high: self.ask_number("3 ) Please enter a [Higher Temperature] : ", "Temperature")?,
            },
            Task::A4(extreme) => Query::CountryExtreme {
                country: self.ask_line(&format!("1 ) {}", COUNTRY_PROMPT))?,
                extreme,
            },
            Task::B1(extreme) => Query::Top10Month {
                month: self.ask_number(&format!("1 ) {}", MONTH_PROMPT), "Month")?,
                extreme,
            },
            Task::B2(extreme) => Query::Top10 { extreme },
            Task::B3 => Query::Range {
                low: self.ask_number("1 ) Please enter a [Lower Temperature] : ", "Temperature")?,
                high: self.ask_number("2 ) Please enter a [Higher Temperature] : ", "Temperature")?,
            },
            Task::C1 => Query::Delta {
                month: self.ask_number(&format!("1 ) {}", MONTH_PROMPT), "Month")?,
                year1: self.ask_number("2 ) Please enter a [First Year] : ", "Year")?,
                year2: self.ask_number("3 ) Please enter a [Second Year] : ", "Year")?,
            },
        };
        Ok(query)
    }

    fn ask_line(&mut self, prompt: &str) -> Attempt<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Interrupt::Eof);
        }
        Ok(line.trim().to_string())
    }

    fn ask_number<T: FromStr>(&mut self, prompt: &str, field: &str) -> Attempt<T> {
        let line = self.ask_line(prompt)?;
        line.parse().map_err(|_| {
            Interrupt::Retry(format!("Invalid input for {}, '{}', must be a number", field, line))
        })
    }
}
