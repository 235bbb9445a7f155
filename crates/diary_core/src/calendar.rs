use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{HeatmapError, HeatmapResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CalendarSystem {
    Gregorian,
    Persian,
}

impl CalendarSystem {
    pub const ALL: [CalendarSystem; 2] = [CalendarSystem::Persian, CalendarSystem::Gregorian];

    pub fn as_str(self) -> &'static str {
        match self {
            CalendarSystem::Gregorian => "gregorian",
            CalendarSystem::Persian => "persian",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CalendarSystem::Gregorian => "Gregorian",
            CalendarSystem::Persian => "Persian",
        }
    }

    /// Parses a persisted setting value, naming `key` in the error.
    pub fn from_setting(key: &str, value: &str) -> HeatmapResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gregorian" => Ok(CalendarSystem::Gregorian),
            "persian" => Ok(CalendarSystem::Persian),
            _ => Err(HeatmapError::invalid_configuration(key, value)),
        }
    }
}

impl FromStr for CalendarSystem {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_setting("calendar", s)
    }
}

impl fmt::Display for CalendarSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const GREGORIAN_MONTH_DAYS: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

// Persian years are counted from an anchor 1595 years before year 0 so that
// 33-year cycles start at shifted year 0. Leap years sit at cycle positions
// 0, 4, ..., 28.
const PERSIAN_ANCHOR: i64 = 1595;
const PERSIAN_CYCLE_YEARS: i64 = 33;
const PERSIAN_CYCLE_DAYS: i64 = 33 * 365 + 8;
const PERSIAN_QUAD_DAYS: i64 = 4 * 365 + 1;
const PERSIAN_FIRST_HALF_DAYS: i64 = 6 * 31;
// Day number of Farvardin 1 of shifted year 0.
const PERSIAN_EPOCH: i64 = -1_075_195;

// Shift between day numbers and days since 0000-03-01 (proleptic Gregorian).
const GREGORIAN_EPOCH_SHIFT: i64 = 719_468;
const GREGORIAN_ERA_DAYS: i64 = 146_097;

pub fn is_leap_year(calendar: CalendarSystem, year: i32) -> bool {
    let year = i64::from(year);
    match calendar {
        CalendarSystem::Gregorian => {
            (year.rem_euclid(4) == 0 && year.rem_euclid(100) != 0) || year.rem_euclid(400) == 0
        }
        CalendarSystem::Persian => {
            let position = (year + PERSIAN_ANCHOR).rem_euclid(PERSIAN_CYCLE_YEARS);
            position != 32 && position % 4 == 0
        }
    }
}

/// Length of `month` in `year`, or `None` when the month is not 1..=12.
pub fn days_in_month(calendar: CalendarSystem, year: i32, month: u8) -> Option<u8> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let days = match calendar {
        CalendarSystem::Gregorian => {
            if month == 2 && is_leap_year(calendar, year) {
                29
            } else {
                GREGORIAN_MONTH_DAYS[usize::from(month - 1)]
            }
        }
        CalendarSystem::Persian => match month {
            1..=6 => 31,
            7..=11 => 30,
            _ if is_leap_year(calendar, year) => 30,
            _ => 29,
        },
    };
    Some(days)
}

/// Absolute day count shared by both calendars. Day 0 is Gregorian 1970-01-01.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayNumber(pub i64);

impl DayNumber {
    pub fn succ(self) -> Self {
        DayNumber(self.0 + 1)
    }

    pub fn to_civil(self, calendar: CalendarSystem) -> HeatmapResult<CivilDate> {
        let (year, month, day) = match calendar {
            CalendarSystem::Gregorian => gregorian_from_day_number(self.0),
            CalendarSystem::Persian => persian_from_day_number(self.0),
        };
        let year = i32::try_from(year).map_err(|_| {
            HeatmapError::invalid_date(
                format!("day {}", self.0),
                format!("year {year} is outside the representable range"),
            )
        })?;
        Ok(CivilDate {
            calendar,
            year,
            month,
            day,
        })
    }
}

fn gregorian_day_number(year: i64, month: i64, day: i64) -> i64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = year.div_euclid(400);
    let year_of_era = year - era * 400;
    let month_from_march = (month + 9) % 12;
    let day_of_year = (153 * month_from_march + 2) / 5 + day - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    era * GREGORIAN_ERA_DAYS + day_of_era - GREGORIAN_EPOCH_SHIFT
}

fn gregorian_from_day_number(days: i64) -> (i64, u8, u8) {
    let shifted = days + GREGORIAN_EPOCH_SHIFT;
    let era = shifted.div_euclid(GREGORIAN_ERA_DAYS);
    let day_of_era = shifted - era * GREGORIAN_ERA_DAYS;
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let month_from_march = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * month_from_march + 2) / 5 + 1;
    let month = if month_from_march < 10 {
        month_from_march + 3
    } else {
        month_from_march - 9
    };
    let year = year_of_era + era * 400 + i64::from(month <= 2);
    (year, month as u8, day as u8)
}

fn persian_day_number(year: i64, month: i64, day: i64) -> i64 {
    let shifted = year + PERSIAN_ANCHOR;
    let leap_days = 8 * shifted.div_euclid(PERSIAN_CYCLE_YEARS)
        + (shifted.rem_euclid(PERSIAN_CYCLE_YEARS) + 3) / 4;
    let month_start = if month <= 6 {
        (month - 1) * 31
    } else {
        PERSIAN_FIRST_HALF_DAYS + (month - 7) * 30
    };
    PERSIAN_EPOCH + 365 * shifted + leap_days + month_start + day - 1
}

fn persian_from_day_number(days: i64) -> (i64, u8, u8) {
    let days = days - PERSIAN_EPOCH;
    let mut shifted = PERSIAN_CYCLE_YEARS * days.div_euclid(PERSIAN_CYCLE_DAYS);
    let mut remainder = days.rem_euclid(PERSIAN_CYCLE_DAYS);
    shifted += 4 * (remainder / PERSIAN_QUAD_DAYS);
    remainder %= PERSIAN_QUAD_DAYS;
    // The first year of every four-year group carries the leap day.
    if remainder > 365 {
        shifted += (remainder - 1) / 365;
        remainder = (remainder - 1) % 365;
    }
    let (month, day) = if remainder < PERSIAN_FIRST_HALF_DAYS {
        (1 + remainder / 31, 1 + remainder % 31)
    } else {
        let rest = remainder - PERSIAN_FIRST_HALF_DAYS;
        (7 + rest / 30, 1 + rest % 30)
    };
    (shifted - PERSIAN_ANCHOR, month as u8, day as u8)
}

/// A validated calendar date. Construction goes through [`CivilDate::new`] so
/// every instance names a day that exists in its calendar.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CivilDate {
    calendar: CalendarSystem,
    year: i32,
    month: u8,
    day: u8,
}

impl CivilDate {
    pub fn new(calendar: CalendarSystem, year: i32, month: u8, day: u8) -> HeatmapResult<Self> {
        let input = || format!("{calendar} {year}-{month:02}-{day:02}");
        let max_day = days_in_month(calendar, year, month)
            .ok_or_else(|| HeatmapError::invalid_date(input(), "month must be 1..=12"))?;
        if day == 0 || day > max_day {
            return Err(HeatmapError::invalid_date(
                input(),
                format!("day must be 1..={max_day}"),
            ));
        }
        Ok(Self {
            calendar,
            year,
            month,
            day,
        })
    }

    pub fn first_of_year(calendar: CalendarSystem, year: i32) -> Self {
        Self {
            calendar,
            year,
            month: 1,
            day: 1,
        }
    }

    /// Parses the leading `YYYY-MM-DD` of `text` as a date in `calendar`.
    pub fn parse(calendar: CalendarSystem, text: &str) -> HeatmapResult<Self> {
        let prefix = text
            .get(..10)
            .filter(|prefix| has_date_shape(prefix))
            .ok_or_else(|| HeatmapError::invalid_date(text, "expected YYYY-MM-DD"))?;
        let field = |range: std::ops::Range<usize>| {
            prefix[range]
                .parse::<u32>()
                .map_err(|err| HeatmapError::invalid_date(text, err.to_string()))
        };
        let year = field(0..4)? as i32;
        let month = field(5..7)? as u8;
        let day = field(8..10)? as u8;
        Self::new(calendar, year, month, day)
    }

    pub fn calendar(&self) -> CalendarSystem {
        self.calendar
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn day_number(&self) -> DayNumber {
        let (year, month, day) = (
            i64::from(self.year),
            i64::from(self.month),
            i64::from(self.day),
        );
        DayNumber(match self.calendar {
            CalendarSystem::Gregorian => gregorian_day_number(year, month, day),
            CalendarSystem::Persian => persian_day_number(year, month, day),
        })
    }

    pub fn convert_to(&self, calendar: CalendarSystem) -> HeatmapResult<Self> {
        if calendar == self.calendar {
            return Ok(*self);
        }
        self.day_number().to_civil(calendar)
    }

    pub fn succ(&self) -> HeatmapResult<Self> {
        self.day_number().succ().to_civil(self.calendar)
    }

    /// Weekday of this date, computed by chrono on the Gregorian equivalent.
    pub fn weekday(&self) -> HeatmapResult<Weekday> {
        let gregorian = self.convert_to(CalendarSystem::Gregorian)?;
        NaiveDate::from_ymd_opt(
            gregorian.year,
            u32::from(gregorian.month),
            u32::from(gregorian.day),
        )
        .map(|date| date.weekday())
        .ok_or_else(|| HeatmapError::invalid_date(self.to_string(), "outside chrono's range"))
    }
}

impl fmt::Display for CivilDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// True when `text` starts with `DDDD-DD-DD`.
pub fn has_date_shape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 10
        && bytes[..10].iter().enumerate().all(|(index, byte)| match index {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}

pub fn gregorian_to_persian(year: i32, month: u8, day: u8) -> HeatmapResult<(i32, u8, u8)> {
    let date = CivilDate::new(CalendarSystem::Gregorian, year, month, day)?
        .convert_to(CalendarSystem::Persian)?;
    Ok((date.year, date.month, date.day))
}

pub fn persian_to_gregorian(year: i32, month: u8, day: u8) -> HeatmapResult<(i32, u8, u8)> {
    let date = CivilDate::new(CalendarSystem::Persian, year, month, day)?
        .convert_to(CalendarSystem::Gregorian)?;
    Ok((date.year, date.month, date.day))
}
