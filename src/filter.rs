use std::collections::BTreeSet;

use serde::Serialize;

use crate::dataset::SalaryRecord;

/// Chosen values per dimension. An empty set places no constraint on its
/// dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub years: BTreeSet<i32>,
    pub experience: BTreeSet<String>,
    pub locations: BTreeSet<String>,
}

fn passes<T: Ord + ?Sized>(selected: &BTreeSet<T::Owned>, value: &T) -> bool
where
    T: ToOwned,
    T::Owned: Ord + std::borrow::Borrow<T>,
{
    selected.is_empty() || selected.contains(value)
}

fn matches_year_and_experience(record: &SalaryRecord, selection: &Selection) -> bool {
    if !passes(&selection.years, &record.year()) {
        return false;
    }
    if selection.experience.is_empty() {
        return true;
    }
    match record.experience_label() {
        Some(label) => selection.experience.contains(label),
        None => false,
    }
}

/// Rows passing every non-empty dimension of `selection`.
pub fn filter_records<'a>(records: &'a [SalaryRecord], selection: &Selection) -> Vec<&'a SalaryRecord> {
    records
        .iter()
        .filter(|r| matches_year_and_experience(r, selection) && passes(&selection.locations, r.location()))
        .collect()
}

/// Locations still pickable under the year and experience choices. The
/// location choice itself never feeds back into this list.
pub fn available_locations(records: &[SalaryRecord], selection: &Selection) -> Vec<String> {
    records
        .iter()
        .filter(|r| matches_year_and_experience(r, selection))
        .map(|r| r.location())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{record, SalaryDataSet};

    fn sample() -> SalaryDataSet {
        SalaryDataSet::new(vec![
            record(2023, "EN", 0, "US", 60000.0),
            record(2023, "SE", 100, "DE", 90000.0),
            record(2024, "SE", 50, "US", 150000.0),
            record(2024, "MI", 0, "CA", 80000.0),
            record(2024, "EX", 100, "GB", 200000.0),
            record(2022, "XX", 0, "FR", 70000.0),
        ])
    }

    fn selection(years: &[i32], exp: &[&str], locs: &[&str]) -> Selection {
        Selection {
            years: years.iter().copied().collect(),
            experience: exp.iter().map(|s| s.to_string()).collect(),
            locations: locs.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn salaries(rows: &[&SalaryRecord]) -> Vec<f64> {
        rows.iter().map(|r| r.salary()).collect()
    }

    #[test]
    fn empty_selection_returns_everything() {
        let data = sample();
        let rows = filter_records(data.records(), &Selection::default());
        assert_eq!(rows.len(), data.records().len());
    }

    #[test]
    fn all_eight_dimension_combinations() {
        let data = sample();
        let years: &[i32] = &[2024];
        let exp: &[&str] = &["Senior-level", "Executive-level"];
        let locs: &[&str] = &["US", "GB", "DE"];
        for mask in 0..8u8 {
            let sel = selection(
                if mask & 1 != 0 { years } else { &[] },
                if mask & 2 != 0 { exp } else { &[] },
                if mask & 4 != 0 { locs } else { &[] },
            );
            let expected: Vec<f64> = data
                .records()
                .iter()
                .filter(|r| mask & 1 == 0 || r.year() == 2024)
                .filter(|r| mask & 2 == 0 || matches!(r.experience_label(), Some(l) if exp.contains(&l)))
                .filter(|r| mask & 4 == 0 || locs.contains(&r.location()))
                .map(|r| r.salary())
                .collect();
            let got = salaries(&filter_records(data.records(), &sel));
            assert_eq!(got, expected, "mask {mask:03b}");
        }

        let all = selection(years, exp, locs);
        assert_eq!(salaries(&filter_records(data.records(), &all)), vec![150000.0, 200000.0]);
    }

    #[test]
    fn values_within_a_dimension_are_or_ed() {
        let data = sample();
        let rows = filter_records(data.records(), &selection(&[2022, 2023], &[], &[]));
        assert_eq!(salaries(&rows), vec![60000.0, 90000.0, 70000.0]);
    }

    #[test]
    fn unlabeled_rows_never_match_experience_filter() {
        let data = sample();
        let all_labels = data.experience_options();
        let rows = filter_records(data.records(), &selection(&[], &all_labels, &[]));
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.experience.is_some()));
    }

    #[test]
    fn filtering_is_idempotent_and_a_subset() {
        let data = sample();
        let sel = selection(&[2024], &[], &["US", "CA"]);
        let once = filter_records(data.records(), &sel);
        let owned: Vec<SalaryRecord> = once.iter().map(|r| (*r).clone()).collect();
        let twice = filter_records(&owned, &sel);
        assert_eq!(salaries(&once), salaries(&twice));
        assert!(once.iter().all(|r| data.records().contains(r)));
    }

    #[test]
    fn location_options_ignore_location_choice() {
        let data = sample();
        let base = selection(&[2024], &[], &[]);
        let with_locs = selection(&[2024], &[], &["CA"]);
        assert_eq!(available_locations(data.records(), &base), vec!["CA", "GB", "US"]);
        assert_eq!(
            available_locations(data.records(), &base),
            available_locations(data.records(), &with_locs)
        );
    }

    #[test]
    fn location_options_follow_year_and_experience() {
        let data = sample();
        assert_eq!(
            available_locations(data.records(), &Selection::default()),
            vec!["CA", "DE", "FR", "GB", "US"]
        );
        assert_eq!(
            available_locations(data.records(), &selection(&[], &["Senior-level"], &[])),
            vec!["DE", "US"]
        );
        assert_eq!(
            available_locations(data.records(), &selection(&[2023], &["Senior-level"], &[])),
            vec!["DE"]
        );
        assert!(available_locations(data.records(), &selection(&[1999], &[], &[])).is_empty());
    }
}
