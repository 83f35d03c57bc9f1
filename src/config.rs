use clap::Parser;

use crate::dataset::ExperienceLevel;
use crate::filter::Selection;

pub const DEFAULT_SOURCE: &str = "data/salaries.csv";

#[derive(Debug, Parser)]
#[command(
    name = "salary_board",
    about = "Interactive dashboard over data-science job salaries",
    after_help = "Set RUST_LOG (e.g. RUST_LOG=debug) for diagnostics; redirect stderr while the dashboard is open."
)]
pub struct Config {
    #[arg(
        long,
        value_name = "PATH|URL",
        default_value = DEFAULT_SOURCE,
        help = "CSV file or http(s) URL holding the salary table"
    )]
    pub source: String,
    #[arg(long = "tick-rate", value_name = "MS", default_value_t = 200, help = "Input polling interval")]
    pub tick_rate_ms: u64,
    #[arg(
        long,
        default_value_t = 20,
        value_parser = clap::value_parser!(u16).range(1..),
        help = "Number of histogram bins"
    )]
    pub bins: u16,
    #[arg(long, help = "Print location options and chart data as JSON, then exit")]
    pub snapshot: bool,
    #[arg(long = "year", value_name = "YEAR", help = "Initial year filter, repeat as needed")]
    pub years: Vec<i32>,
    #[arg(
        long = "experience",
        value_name = "LABEL",
        value_parser = parse_experience_arg,
        help = "Initial experience filter, repeat as needed"
    )]
    pub experience: Vec<String>,
    #[arg(long = "location", value_name = "CODE", help = "Initial location filter, repeat as needed")]
    pub locations: Vec<String>,
}

fn parse_experience_arg(raw: &str) -> Result<String, String> {
    ExperienceLevel::from_label(raw)
        .map(|level| level.label().to_string())
        .ok_or_else(|| "expected Entry-level, Mid-level, Senior-level or Executive-level".to_string())
}

impl Config {
    pub fn initial_selection(&self) -> Selection {
        Selection {
            years: self.years.iter().copied().collect(),
            experience: self.experience.iter().cloned().collect(),
            locations: self.locations.iter().map(|l| l.to_ascii_uppercase()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["salary_board"]).unwrap();
        assert_eq!(config.source, DEFAULT_SOURCE);
        assert_eq!(config.tick_rate_ms, 200);
        assert_eq!(config.bins, 20);
        assert!(!config.snapshot);
        assert_eq!(config.initial_selection(), Selection::default());
    }

    #[test]
    fn repeated_filters_build_selection() {
        let config = Config::try_parse_from([
            "salary_board",
            "--snapshot",
            "--year",
            "2024",
            "--year",
            "2023",
            "--experience",
            "Senior-level",
            "--location",
            "us",
        ])
        .unwrap();
        let selection = config.initial_selection();
        assert!(config.snapshot);
        assert_eq!(selection.years.into_iter().collect::<Vec<_>>(), vec![2023, 2024]);
        assert!(selection.experience.contains("Senior-level"));
        assert!(selection.locations.contains("US"));
    }

    #[test]
    fn rejects_unknown_experience_label() {
        assert!(Config::try_parse_from(["salary_board", "--experience", "Junior"]).is_err());
        assert!(Config::try_parse_from(["salary_board", "--bins", "0"]).is_err());
    }
}
