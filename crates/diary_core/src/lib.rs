pub mod calendar;
pub mod color;
pub mod error;
pub mod grid;
pub mod heatmap;
pub mod journal;
pub mod service;
pub mod settings;

pub use crate::calendar::{gregorian_to_persian, persian_to_gregorian, CalendarSystem, CivilDate};
pub use crate::error::{HeatmapError, HeatmapResult};
pub use crate::heatmap::{render_heatmap, Heatmap, HeatmapConfig};
pub use crate::service::{DiaryService, DiaryServiceBuilder};
