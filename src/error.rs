use thiserror::Error;

/// Rejected song input. `location` names the offending record, e.g.
/// `sequence 1 note 4` or `sequence 0 instrument`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{location}: {field} must be a finite number")]
    NotFinite {
        location: String,
        field: &'static str,
    },

    #[error("{location}: {field} must not be negative, got {value}")]
    Negative {
        location: String,
        field: &'static str,
        value: f64,
    },

    #[error("{location}: duration must be greater than zero, got {value}")]
    NonPositiveDuration { location: String, value: f64 },

    #[error("{location}: sustain must be within [0, 1], got {value}")]
    SustainOutOfRange { location: String, value: f64 },

    #[error("unknown filter code {0}, expected 0..=4")]
    UnknownFilter(u8),

    #[error("unknown filter {0:?}, expected none, hipass, lopass, bandpass or notch")]
    UnknownFilterName(String),

    #[error("{location}: {field} must be at most {max}, got {value}")]
    TooLarge {
        location: String,
        field: &'static str,
        value: f64,
        max: f64,
    },
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum MinitoneError {
    #[error("invalid song: {0}")]
    Validation(#[from] ValidationError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("playback sink error: {0}")]
    Sink(String),
}
