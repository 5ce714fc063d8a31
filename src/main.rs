use clap::{Parser, Subcommand};
use lib::{
    ClimateAnalyzer, ClimateError, Extreme, OutputFormat, Query, ReportConfig, Session,
    SimpleLogger, TemperatureUnit, print_report, write_report,
};
use log::{debug, error};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

static LOGGER: SimpleLogger = SimpleLogger;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input CSV file: temperature,year,month,country,country_code
    #[arg(short, long, default_value = "data/world_temp_2000-2016.csv")]
    input_file: PathBuf,

    /// Directory receiving task<ID>_climate_info.* files
    #[arg(short, long, default_value = "data")]
    output_dir: PathBuf,

    /// Output formats (e.g., text,json,parquet)
    #[arg(short, long, value_delimiter = ',', default_value = "text")]
    format: Vec<OutputFormat>,

    /// Temperature unit for console output
    #[arg(long, default_value = "celsius")]
    unit: TemperatureUnit,

    /// Log level for output
    #[arg(long, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// A1: lowest/highest temperature for a country in a month
    MonthExtreme {
        country: String,
        /// 1 = Jan .. 12 = Dec
        month: i32,
        #[arg(long, default_value = "lowest")]
        extreme: Extreme,
    },
    /// A2: lowest/highest temperature for a country in a year
    YearExtreme {
        country: String,
        year: i32,
        #[arg(long, default_value = "lowest")]
        extreme: Extreme,
    },
    /// A3: temperatures for a country within a range (inclusive, Celsius)
    CountryRange {
        country: String,
        #[arg(allow_negative_numbers = true)]
        low: f64,
        #[arg(allow_negative_numbers = true)]
        high: f64,
    },
    /// A4: year with the lowest/highest temperature for a country
    CountryExtreme {
        country: String,
        #[arg(long, default_value = "lowest")]
        extreme: Extreme,
    },
    /// B1: top 10 countries with the lowest/highest temperatures in a month
    Top10Month {
        month: i32,
        #[arg(long, default_value = "lowest")]
        extreme: Extreme,
    },
    /// B2: top 10 countries with the lowest/highest temperatures overall
    Top10 {
        #[arg(long, default_value = "lowest")]
        extreme: Extreme,
    },
    /// B3: every reading within a range (inclusive, Celsius)
    Range {
        #[arg(allow_negative_numbers = true)]
        low: f64,
        #[arg(allow_negative_numbers = true)]
        high: f64,
    },
    /// C1: top 10 countries with the greatest change in a month between two years
    Delta { month: i32, year1: i32, year2: i32 },
    /// Prompt for every analysis in turn on stdin
    Interactive,
}

impl Command {
    fn into_query(self) -> Option<Query> {
        let query = match self {
            Command::MonthExtreme {
                country,
                month,
                extreme,
            } => Query::MonthExtreme {
                country,
                month,
                extreme,
            },
            Command::YearExtreme {
                country,
                year,
                extreme,
            } => Query::YearExtreme {
                country,
                year,
                extreme,
            },
            Command::CountryRange { country, low, high } => {
                Query::CountryRange { country, low, high }
            }
            Command::CountryExtreme { country, extreme } => {
                Query::CountryExtreme { country, extreme }
            }
            Command::Top10Month { month, extreme } => Query::Top10Month { month, extreme },
            Command::Top10 { extreme } => Query::Top10 { extreme },
            Command::Range { low, high } => Query::Range { low, high },
            Command::Delta {
                month,
                year1,
                year2,
            } => Query::Delta {
                month,
                year1,
                year2,
            },
            Command::Interactive => return None,
        };
        Some(query)
    }
}

fn run(args: Args) -> Result<(), ClimateError> {
    let config = ReportConfig {
        output_dir: args.output_dir,
        formats: args.format,
        unit: args.unit,
    };
    debug!(
        "Input file: {} | Output dir: {} | Formats: {:?} | Unit: {:?}",
        args.input_file.display(),
        config.output_dir.display(),
        config.formats,
        config.unit
    );

    let load_start = Instant::now();
    let analyzer = ClimateAnalyzer::from_path(&args.input_file)?;
    debug!("Load took {:.2?}", load_start.elapsed());

    match args.command.into_query() {
        Some(query) => {
            let report = analyzer.run(&query)?;
            print_report(&report, config.unit, &mut io::stdout().lock())?;
            let written = write_report(&report, &config)?;
            println!(
                "\nWrote {} records to {} file(s) in {}",
                report.records.len(),
                written.len(),
                config.output_dir.display()
            );
        }
        None => {
            let stdin = io::stdin();
            let written = Session::new(&analyzer, &config, stdin.lock(), io::stdout()).run()?;
            debug!("Interactive session wrote {} reports", written);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let total_start = Instant::now();
    let args = Args::parse();

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if args.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        });
    }

    let outcome = run(args);
    debug!("Total runtime: {:.2?}", total_start.elapsed());
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            match err {
                ClimateError::Range(_) | ClimateError::NotFound(_) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
