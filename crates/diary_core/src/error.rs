use thiserror::Error;

/// Failures surfaced by the calendar and layout code. Neither is fatal to the
/// caller: a render pass is abandoned and the previous output kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeatmapError {
    #[error("invalid date `{input}`: {reason}")]
    InvalidDate { input: String, reason: String },

    #[error("invalid configuration for `{key}`: `{value}` is not accepted")]
    InvalidConfiguration { key: String, value: String },
}

impl HeatmapError {
    pub(crate) fn invalid_date(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDate {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_configuration(key: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidConfiguration {
            key: key.into(),
            value: value.to_string(),
        }
    }
}

pub type HeatmapResult<T> = std::result::Result<T, HeatmapError>;
