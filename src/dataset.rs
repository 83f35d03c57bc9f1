use std::collections::BTreeSet;

use serde::Serialize;

use crate::csv_reader::Record;

/// Seniority code as published in the salary survey. Declaration order is the
/// canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    Executive,
}

pub const EXPERIENCE_ORDER: [ExperienceLevel; 4] = [
    ExperienceLevel::Entry,
    ExperienceLevel::Mid,
    ExperienceLevel::Senior,
    ExperienceLevel::Executive,
];

impl ExperienceLevel {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "EN" => Some(ExperienceLevel::Entry),
            "MI" => Some(ExperienceLevel::Mid),
            "SE" => Some(ExperienceLevel::Senior),
            "EX" => Some(ExperienceLevel::Executive),
            _ => None,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        EXPERIENCE_ORDER.into_iter().find(|level| level.label() == label)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "Entry-level",
            ExperienceLevel::Mid => "Mid-level",
            ExperienceLevel::Senior => "Senior-level",
            ExperienceLevel::Executive => "Executive-level",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RemoteType {
    OnSite,
    Hybrid,
    FullyRemote,
}

pub const REMOTE_ORDER: [RemoteType; 3] = [RemoteType::OnSite, RemoteType::Hybrid, RemoteType::FullyRemote];

impl RemoteType {
    pub fn from_ratio(ratio: i64) -> Option<Self> {
        match ratio {
            0 => Some(RemoteType::OnSite),
            50 => Some(RemoteType::Hybrid),
            100 => Some(RemoteType::FullyRemote),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RemoteType::OnSite => "Presencial",
            RemoteType::Hybrid => "Híbrido",
            RemoteType::FullyRemote => "Remoto Total",
        }
    }
}

/// A loaded row together with its derived labels.
#[derive(Debug, Clone, PartialEq)]
pub struct SalaryRecord {
    pub record: Record,
    pub experience: Option<ExperienceLevel>,
    pub remote: Option<RemoteType>,
}

impl SalaryRecord {
    pub fn enrich(record: Record) -> Self {
        let experience = ExperienceLevel::from_code(&record.experience_level);
        let remote = RemoteType::from_ratio(record.remote_ratio);
        SalaryRecord { record, experience, remote }
    }

    pub fn experience_label(&self) -> Option<&'static str> {
        self.experience.map(|level| level.label())
    }

    pub fn salary(&self) -> f64 {
        self.record.salary_in_usd
    }

    pub fn location(&self) -> &str {
        &self.record.company_location
    }

    pub fn year(&self) -> i32 {
        self.record.work_year
    }
}

/// The full, enriched record set. Built once and only ever read afterwards.
#[derive(Debug)]
pub struct SalaryDataSet {
    records: Vec<SalaryRecord>,
    loaded_at: chrono::DateTime<chrono::Local>,
}

impl SalaryDataSet {
    pub fn new(raw: Vec<Record>) -> Self {
        let records: Vec<SalaryRecord> = raw.into_iter().map(SalaryRecord::enrich).collect();

        let unmapped_experience = records.iter().filter(|r| r.experience.is_none()).count();
        if unmapped_experience > 0 {
            log::warn!("{unmapped_experience} rows carry an unknown experience code and will be left unlabeled");
        }
        let unmapped_remote = records.iter().filter(|r| r.remote.is_none()).count();
        if unmapped_remote > 0 {
            log::warn!("{unmapped_remote} rows carry an unknown remote ratio and will be left unlabeled");
        }

        SalaryDataSet {
            records,
            loaded_at: chrono::Local::now(),
        }
    }

    pub fn records(&self) -> &[SalaryRecord] {
        &self.records
    }

    pub fn loaded_at(&self) -> chrono::DateTime<chrono::Local> {
        self.loaded_at
    }

    pub fn year_options(&self) -> Vec<i32> {
        self.records
            .iter()
            .map(|r| r.year())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn experience_options(&self) -> Vec<&'static str> {
        EXPERIENCE_ORDER.iter().map(|level| level.label()).collect()
    }
}

#[cfg(test)]
pub(crate) fn record(year: i32, level: &str, remote: i64, location: &str, salary: f64) -> Record {
    Record {
        work_year: year,
        experience_level: level.to_string(),
        remote_ratio: remote,
        company_location: location.to_string(),
        salary_in_usd: salary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_codes_to_labels() {
        let enriched = SalaryRecord::enrich(record(2024, "MI", 50, "US", 1.0));
        assert_eq!(enriched.experience_label(), Some("Mid-level"));
        assert_eq!(enriched.remote.map(|r| r.label()), Some("Híbrido"));

        assert_eq!(ExperienceLevel::from_code("EN").unwrap().label(), "Entry-level");
        assert_eq!(ExperienceLevel::from_code("SE").unwrap().label(), "Senior-level");
        assert_eq!(ExperienceLevel::from_code("EX").unwrap().label(), "Executive-level");
        assert_eq!(RemoteType::from_ratio(0).unwrap().label(), "Presencial");
        assert_eq!(RemoteType::from_ratio(100).unwrap().label(), "Remoto Total");
    }

    #[test]
    fn unknown_codes_map_to_none() {
        let enriched = SalaryRecord::enrich(record(2024, "XX", 25, "US", 1.0));
        assert_eq!(enriched.experience, None);
        assert_eq!(enriched.remote, None);
        assert_eq!(enriched.experience_label(), None);
    }

    #[test]
    fn label_lookup_round_trips_canonical_order() {
        for level in EXPERIENCE_ORDER {
            assert_eq!(ExperienceLevel::from_label(level.label()), Some(level));
        }
        assert_eq!(ExperienceLevel::from_label("Junior"), None);
        assert!(ExperienceLevel::Entry < ExperienceLevel::Executive);
    }

    #[test]
    fn year_options_are_sorted_and_distinct() {
        let data = SalaryDataSet::new(vec![
            record(2024, "SE", 0, "US", 1.0),
            record(2021, "SE", 0, "US", 1.0),
            record(2024, "EN", 0, "CA", 1.0),
        ]);
        assert_eq!(data.year_options(), vec![2021, 2024]);
        assert_eq!(
            data.experience_options(),
            vec!["Entry-level", "Mid-level", "Senior-level", "Executive-level"]
        );
        assert_eq!(data.records().len(), 3);
    }
}
