use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::calendar::CivilDate;
use crate::color::{ColorRamp, Hsl};
use crate::error::HeatmapResult;
use crate::journal::YearBucket;

pub const ROWS: u8 = 7;
/// The view width is divided into this many week columns.
pub const MAX_COLUMNS: u8 = 55;

const CELL_FILL: f32 = 0.8;

/// Running minimum and maximum of the sample values. Both start at zero and
/// only widen, so with word counts the floor stays at zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValueRange {
    pub min: u64,
    pub max: u64,
}

impl ValueRange {
    pub fn observe(&mut self, value: u64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    /// Position of `value` within the range, 0 when the range is empty.
    pub fn fraction(&self, value: u64) -> f32 {
        if self.max == self.min {
            return 0.0;
        }
        ((value as f64 - self.min as f64) / (self.max - self.min) as f64) as f32
    }
}

/// Pixel geometry of a year block for a given view width.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GridGeometry {
    pub pitch: f32,
    pub cell_size: f32,
}

impl GridGeometry {
    pub fn from_view_width(width: f32) -> Self {
        let pitch = width.max(0.0) / f32::from(MAX_COLUMNS);
        Self {
            pitch,
            cell_size: CELL_FILL * pitch,
        }
    }

    pub fn block_height(&self) -> f32 {
        f32::from(ROWS) * self.cell_size * 10.0 / 8.0
    }

    /// Top-left corner of the cell at `(row, column)`, relative to the block.
    pub fn origin(&self, row: u8, column: u8) -> (f32, f32) {
        (
            f32::from(column) * self.pitch,
            f32::from(row) * self.pitch,
        )
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GridCell {
    pub row: u8,
    pub column: u8,
    pub size: f32,
    pub date: CivilDate,
    pub value: Option<u64>,
    /// `None` renders as the background.
    pub color: Option<Hsl>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct YearGrid {
    pub year_label: i32,
    pub cells: Vec<GridCell>,
    /// Highest column index holding a cell.
    pub columns: u8,
}

/// Row 0 is Saturday, row 6 is Friday.
pub fn weekday_row(weekday: Weekday) -> u8 {
    ((weekday.num_days_from_sunday() + 1) % u32::from(ROWS)) as u8
}

/// Lays out every day of `bucket`'s year in its display calendar.
///
/// Samples with a value of zero get no color, exactly like days without a
/// journal entry.
pub fn layout_year(
    bucket: &YearBucket,
    range: ValueRange,
    ramp: &ColorRamp,
    geometry: &GridGeometry,
) -> HeatmapResult<YearGrid> {
    let year_label = bucket.year();
    let mut date = CivilDate::first_of_year(bucket.calendar(), year_label);
    let mut row = weekday_row(date.weekday()?);
    let mut column: u8 = 0;
    let mut cells = Vec::with_capacity(366);

    while date.year() == year_label {
        let value = bucket.get(&date);
        let color = value
            .filter(|value| *value > 0)
            .map(|value| ramp.color_at(range.fraction(value)));
        cells.push(GridCell {
            row,
            column,
            size: geometry.cell_size,
            date,
            value,
            color,
        });

        row += 1;
        if row == ROWS {
            row = 0;
            column += 1;
        }
        date = date.succ()?;
    }

    let columns = cells.last().map(|cell| cell.column).unwrap_or(0);
    Ok(YearGrid {
        year_label,
        cells,
        columns,
    })
}
