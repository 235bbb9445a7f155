use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::CalendarSystem;
use crate::color::ColorRamp;
use crate::error::HeatmapResult;
use crate::grid::{self, GridGeometry, ValueRange, YearGrid};
use crate::journal::{self, JournalEntry};

/// Validated rendering options.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HeatmapConfig {
    /// Calendar the journal file names are written in.
    pub notes_calendar: CalendarSystem,
    /// Calendar the grid groups and labels years by.
    pub display_calendar: CalendarSystem,
    pub ramp: ColorRamp,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            notes_calendar: CalendarSystem::Persian,
            display_calendar: CalendarSystem::Persian,
            ramp: ColorRamp::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Heatmap {
    /// Newest year first.
    pub years: Vec<YearGrid>,
    pub range: ValueRange,
}

impl Heatmap {
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

/// Recomputes every year grid from scratch.
pub fn render_heatmap(
    entries: &[JournalEntry],
    config: &HeatmapConfig,
    geometry: &GridGeometry,
) -> HeatmapResult<Heatmap> {
    let buckets =
        journal::build_year_buckets(entries, config.notes_calendar, config.display_calendar)?;
    let years = buckets
        .years
        .iter()
        .map(|bucket| grid::layout_year(bucket, buckets.range, &config.ramp, geometry))
        .collect::<HeatmapResult<Vec<_>>>()?;
    debug!(
        entries = entries.len(),
        years = years.len(),
        max = buckets.range.max,
        "rendered heatmap"
    );
    Ok(Heatmap {
        years,
        range: buckets.range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CivilDate;
    use crate::error::HeatmapError;

    fn config(notes: CalendarSystem, display: CalendarSystem) -> HeatmapConfig {
        HeatmapConfig {
            notes_calendar: notes,
            display_calendar: display,
            ramp: ColorRamp::default(),
        }
    }

    #[test]
    fn supports_every_calendar_pairing() {
        let gregorian_entry = JournalEntry::new("2024-03-20", 80);
        let persian_entry = JournalEntry::new("1403-01-01", 80);
        let nowruz = CivilDate::first_of_year(CalendarSystem::Persian, 1403);
        let march = CivilDate::new(CalendarSystem::Gregorian, 2024, 3, 20).unwrap();

        let cases = [
            (CalendarSystem::Gregorian, &gregorian_entry, CalendarSystem::Gregorian, march, 2024),
            (CalendarSystem::Gregorian, &gregorian_entry, CalendarSystem::Persian, nowruz, 1403),
            (CalendarSystem::Persian, &persian_entry, CalendarSystem::Gregorian, march, 2024),
            (CalendarSystem::Persian, &persian_entry, CalendarSystem::Persian, nowruz, 1403),
        ];

        for (notes, entry, display, expected, year) in cases {
            let heatmap = render_heatmap(
                std::slice::from_ref(entry),
                &config(notes, display),
                &GridGeometry::from_view_width(550.0),
            )
            .unwrap();
            assert_eq!(heatmap.years.len(), 1);
            let grid = &heatmap.years[0];
            assert_eq!(grid.year_label, year, "{notes} -> {display}");
            let colored: Vec<_> = grid.cells.iter().filter(|cell| cell.color.is_some()).collect();
            assert_eq!(colored.len(), 1, "{notes} -> {display}");
            assert_eq!(colored[0].date, expected);
            assert_eq!(colored[0].color, Some(ColorRamp::DEFAULT_MAX));
        }
    }

    #[test]
    fn years_share_one_value_range() {
        let entries = vec![
            JournalEntry::new("2022-05-01", 100),
            JournalEntry::new("2023-05-01", 50),
        ];
        let heatmap = render_heatmap(
            &entries,
            &config(CalendarSystem::Gregorian, CalendarSystem::Gregorian),
            &GridGeometry::from_view_width(550.0),
        )
        .unwrap();
        let labels: Vec<i32> = heatmap.years.iter().map(|grid| grid.year_label).collect();
        assert_eq!(labels, vec![2023, 2022]);
        assert_eq!(heatmap.range, ValueRange { min: 0, max: 100 });

        let half = heatmap.years[0]
            .cells
            .iter()
            .find_map(|cell| cell.color)
            .unwrap();
        assert!((half.lightness - 60.0).abs() < 1e-4);
    }

    #[test]
    fn bad_label_fails_the_whole_pass() {
        let entries = vec![
            JournalEntry::new("2023-05-01", 10),
            JournalEntry::new("2023-02-29", 10),
        ];
        let err = render_heatmap(
            &entries,
            &config(CalendarSystem::Gregorian, CalendarSystem::Gregorian),
            &GridGeometry::from_view_width(550.0),
        )
        .unwrap_err();
        assert!(matches!(err, HeatmapError::InvalidDate { .. }));
    }

    #[test]
    fn no_entries_no_years() {
        let heatmap = render_heatmap(
            &[],
            &HeatmapConfig::default(),
            &GridGeometry::from_view_width(550.0),
        )
        .unwrap();
        assert!(heatmap.is_empty());
    }
}
