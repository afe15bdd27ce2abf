//! Profile record - per-user household preferences.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::foundation::{Timestamp, ValidationError};
use crate::domain::planning::DisplayPrecision;

/// Smallest household a plan can be scaled to.
pub const MIN_HOUSEHOLD_SIZE: u32 = 1;
/// Largest household a plan can be scaled to.
pub const MAX_HOUSEHOLD_SIZE: u32 = 20;
/// Longest display name accepted during profile creation.
pub const MAX_NAME_LENGTH: usize = 40;

/// How scaled quantities are shown to this user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScalingPreference {
    /// One decimal place.
    Exact,
    /// Whole numbers.
    #[default]
    Rounded,
}

impl ScalingPreference {
    pub fn precision(&self) -> DisplayPrecision {
        match self {
            ScalingPreference::Exact => DisplayPrecision::Tenths,
            ScalingPreference::Rounded => DisplayPrecision::Whole,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalingPreference::Exact => "exact",
            ScalingPreference::Rounded => "rounded",
        }
    }
}

impl FromStr for ScalingPreference {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(ScalingPreference::Exact),
            "rounded" | "round" => Ok(ScalingPreference::Rounded),
            other => Err(ValidationError::invalid_format(
                "scaling",
                format!("unknown preference '{}'", other),
            )),
        }
    }
}

/// Stored per user under `u:<id>`.
///
/// Timestamps are owned by the store: `created_at` is set on first save and
/// never changes, `updated_at` moves on every save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub household_size: u32,
    #[serde(default)]
    pub scaling: ScalingPreference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Profile {
    /// # Errors
    ///
    /// - `OutOfRange` if `household_size` is outside 1..=20
    pub fn new(household_size: u32, scaling: ScalingPreference) -> Result<Self, ValidationError> {
        validate_household_size(household_size)?;
        Ok(Self {
            display_name: None,
            household_size,
            scaling,
            created_at: None,
            updated_at: None,
        })
    }

    /// # Errors
    ///
    /// - `EmptyField` for a blank name
    /// - `OutOfRange` for names longer than 40 characters
    pub fn with_display_name(mut self, name: impl Into<String>) -> Result<Self, ValidationError> {
        self.display_name = Some(validate_display_name(&name.into())?);
        Ok(self)
    }

    /// Label used on buttons: `Home (4 persons)`.
    pub fn label(&self) -> String {
        let persons = crate::domain::planning::plural_persons(self.household_size);
        match &self.display_name {
            Some(name) => format!("{} ({})", name, persons),
            None => persons,
        }
    }
}

pub fn validate_household_size(size: u32) -> Result<u32, ValidationError> {
    if !(MIN_HOUSEHOLD_SIZE..=MAX_HOUSEHOLD_SIZE).contains(&size) {
        return Err(ValidationError::out_of_range(
            "household_size",
            i64::from(MIN_HOUSEHOLD_SIZE),
            i64::from(MAX_HOUSEHOLD_SIZE),
            i64::from(size),
        ));
    }
    Ok(size)
}

pub fn validate_display_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::empty_field("display_name"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::too_long("display_name", MAX_NAME_LENGTH));
    }
    Ok(name.to_string())
}
