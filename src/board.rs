use std::collections::BTreeSet;

use serde::Serialize;

use crate::aggregate::{aggregate, Dashboard};
use crate::dataset::SalaryDataSet;
use crate::filter::{available_locations, filter_records, Selection};

/// Current selection plus everything derived from it.
#[derive(Debug, Clone)]
pub struct Board<'a> {
    dataset: &'a SalaryDataSet,
    pub selection: Selection,
    pub location_options: Vec<String>,
    pub matched: usize,
    pub dashboard: Dashboard,
}

/// Everything the presentation side needs after one recomputation.
#[derive(Debug, Serialize)]
pub struct Snapshot<'b> {
    pub selection: &'b Selection,
    pub location_options: &'b [String],
    pub matched: usize,
    pub dashboard: &'b Dashboard,
}

pub trait SelectionHandler<'a> {
    fn new(dataset: &'a SalaryDataSet, selection: Selection) -> Self;
    fn toggle_year(&mut self, year: i32);
    fn toggle_experience(&mut self, label: &str);
    fn toggle_location(&mut self, location: &str);
    fn clear(&mut self);
    fn refresh_data(&mut self);
}

fn toggle<T: Ord + Clone>(set: &mut BTreeSet<T>, value: &T) {
    if !set.remove(value) {
        set.insert(value.clone());
    }
}

impl<'a> Board<'a> {
    pub fn dataset(&self) -> &'a SalaryDataSet {
        self.dataset
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            selection: &self.selection,
            location_options: &self.location_options,
            matched: self.matched,
            dashboard: &self.dashboard,
        }
    }

    // Options only read years and experience; any picked location that is no
    // longer offered is dropped before filtering. Returns the dropped codes.
    fn resolve_locations(&mut self) -> Vec<String> {
        self.location_options = available_locations(self.dataset.records(), &self.selection);
        let options = &self.location_options;
        let (kept, dropped): (BTreeSet<String>, BTreeSet<String>) = std::mem::take(&mut self.selection.locations)
            .into_iter()
            .partition(|loc| options.binary_search(loc).is_ok());
        self.selection.locations = kept;
        dropped.into_iter().collect()
    }
}

impl<'a> SelectionHandler<'a> for Board<'a> {
    fn new(dataset: &'a SalaryDataSet, selection: Selection) -> Self {
        let mut board = Board {
            dataset,
            selection,
            location_options: Vec::new(),
            matched: 0,
            dashboard: Dashboard::Empty,
        };
        board.refresh_data();
        board
    }

    fn toggle_year(&mut self, year: i32) {
        toggle(&mut self.selection.years, &year);
        self.refresh_data()
    }

    fn toggle_experience(&mut self, label: &str) {
        toggle(&mut self.selection.experience, &label.to_string());
        self.refresh_data()
    }

    fn toggle_location(&mut self, location: &str) {
        toggle(&mut self.selection.locations, &location.to_string());
        self.refresh_data()
    }

    fn clear(&mut self) {
        self.selection = Selection::default();
        self.refresh_data()
    }

    fn refresh_data(&mut self) {
        let dropped = self.resolve_locations();
        if !dropped.is_empty() {
            log::warn!("Ignoring locations not offered for this selection: {}", dropped.join(", "));
        }
        let rows = filter_records(self.dataset.records(), &self.selection);
        self.matched = rows.len();
        self.dashboard = aggregate(&rows);
        if self.dashboard.is_empty() {
            log::info!("Selection {:?} matches no rows", self.selection);
        }
        log::debug!(
            "Recomputed board: {} rows match {:?}, {} locations offered",
            self.matched,
            self.selection,
            self.location_options.len()
        );
    }
}
