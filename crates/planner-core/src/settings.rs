//! Focus/rest lengths shared by every session.
//!
//! Persisted as the `settings` entry of the pending-jobs document, using the
//! upper-case key names that document has always used.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_FOCUSED_TIME: u32 = 30;
pub const DEFAULT_REST_TIME: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Focus span length in minutes.
    #[serde(rename = "FOCUSED_TIME", default = "default_focused_time")]
    pub focused_time: u32,
    /// Rest span length in minutes.
    #[serde(rename = "REST_TIME", default = "default_rest_time")]
    pub rest_time: u32,
}

fn default_focused_time() -> u32 {
    DEFAULT_FOCUSED_TIME
}
fn default_rest_time() -> u32 {
    DEFAULT_REST_TIME
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            focused_time: DEFAULT_FOCUSED_TIME,
            rest_time: DEFAULT_REST_TIME,
        }
    }
}

impl Settings {
    pub fn new(focused_time: u32, rest_time: u32) -> Result<Self, ValidationError> {
        if focused_time == 0 {
            return Err(ValidationError::InvalidValue {
                field: "FOCUSED_TIME".into(),
                message: "focus length must be at least one minute".into(),
            });
        }
        Ok(Self {
            focused_time,
            rest_time,
        })
    }

    /// Parse both lengths from user text, as typed into a settings form.
    pub fn parse(focused_time: &str, rest_time: &str) -> Result<Self, ValidationError> {
        let focus = parse_minutes("FOCUSED_TIME", focused_time)?;
        let rest = parse_minutes("REST_TIME", rest_time)?;
        Self::new(focus, rest)
    }
}

fn parse_minutes(field: &str, raw: &str) -> Result<u32, ValidationError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|e| ValidationError::InvalidValue {
            field: field.into(),
            message: format!("'{raw}' is not a whole number of minutes ({e})"),
        })
}
