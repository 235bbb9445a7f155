use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calendar::{has_date_shape, CalendarSystem, CivilDate};
use crate::error::HeatmapResult;
use crate::grid::ValueRange;

/// A daily note on disk. The body is derived on demand.
#[derive(Debug, Clone)]
pub struct JournalDocument {
    path: PathBuf,
    raw: String,
}

impl JournalDocument {
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let bytes = fs::read(&path)?;
        let raw = match String::from_utf8(bytes) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %path.display(), "journal file is not valid UTF-8");
                String::from_utf8_lossy(err.as_bytes()).into_owned()
            }
        };
        Ok(Self { path, raw })
    }

    pub fn from_string(path: impl AsRef<Path>, raw: String) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            raw,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
    }

    pub fn body(&self) -> &str {
        strip_front_matter(&self.raw)
    }

    /// `None` when the file name does not start with a date.
    pub fn entry(&self) -> Option<JournalEntry> {
        let stem = self.stem();
        if !has_date_shape(stem) {
            return None;
        }
        Some(JournalEntry {
            date_label: stem[..10].to_string(),
            words: count_words(self.body()),
        })
    }
}

/// Drops a leading `---` fenced front-matter block and any newlines after it.
pub fn strip_front_matter(text: &str) -> &str {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut body = text;
    if let Some(first_line_end) = text.find('\n') {
        if text[..first_line_end].trim_end() == "---" {
            let mut offset = first_line_end + 1;
            for line in text[offset..].split_inclusive('\n') {
                offset += line.len();
                if line.trim_end() == "---" {
                    body = &text[offset..];
                    break;
                }
            }
        }
    }
    body.trim_start_matches(|c: char| c == '\n' || c == '\r')
}

pub fn count_words(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

/// A journal file reduced to its filename date label and word count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalEntry {
    pub date_label: String,
    pub words: u64,
}

impl JournalEntry {
    pub fn new(date_label: impl Into<String>, words: u64) -> Self {
        Self {
            date_label: date_label.into(),
            words,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DaySample {
    pub date: CivilDate,
    pub value: u64,
}

/// All samples falling in one display-calendar year, at most one per date.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct YearBucket {
    calendar: CalendarSystem,
    year: i32,
    samples: BTreeMap<CivilDate, u64>,
}

impl YearBucket {
    pub fn new(calendar: CalendarSystem, year: i32) -> Self {
        Self {
            calendar,
            year,
            samples: BTreeMap::new(),
        }
    }

    pub fn calendar(&self) -> CalendarSystem {
        self.calendar
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn label(&self) -> String {
        self.year.to_string()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, date: &CivilDate) -> Option<u64> {
        self.samples.get(date).copied()
    }

    /// Returns false, leaving the bucket untouched, if the date already has a sample.
    pub fn insert(&mut self, sample: DaySample) -> bool {
        debug_assert_eq!(sample.date.calendar(), self.calendar);
        if self.samples.contains_key(&sample.date) {
            return false;
        }
        self.samples.insert(sample.date, sample.value);
        true
    }

    pub fn samples(&self) -> impl Iterator<Item = DaySample> + '_ {
        self.samples
            .iter()
            .map(|(date, value)| DaySample {
                date: *date,
                value: *value,
            })
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BucketedSamples {
    /// Newest year first.
    pub years: Vec<YearBucket>,
    pub range: ValueRange,
}

/// Parses entry labels in `notes`, re-expresses them in `display` and groups
/// them by display year.
pub fn build_year_buckets(
    entries: &[JournalEntry],
    notes: CalendarSystem,
    display: CalendarSystem,
) -> HeatmapResult<BucketedSamples> {
    let mut years: BTreeMap<i32, YearBucket> = BTreeMap::new();
    let mut range = ValueRange::default();

    for entry in entries {
        let date = CivilDate::parse(notes, &entry.date_label)?.convert_to(display)?;
        let bucket = years
            .entry(date.year())
            .or_insert_with(|| YearBucket::new(display, date.year()));
        if bucket.insert(DaySample {
            date,
            value: entry.words,
        }) {
            range.observe(entry.words);
        } else {
            debug!(label = %entry.date_label, %date, "dropping duplicate journal entry");
        }
    }

    Ok(BucketedSamples {
        years: years.into_values().rev().collect(),
        range,
    })
}
