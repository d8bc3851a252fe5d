// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Body measurements and their normalisation into shape-key weights
//!
//! Every measurement has a closed `[min, max]` range in centimetres. Raw
//! values are clamped into that range and linearly interpolated to `[0, 1]`.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Weight returned for parameter names that are not recognised.
pub const NEUTRAL_WEIGHT: f64 = 0.5;

/// One of the five body measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum BodyField {
    Height,
    Chest,
    Waist,
    Hips,
    ShoulderWidth,
}

impl BodyField {
    pub const ALL: [BodyField; 5] = [
        BodyField::Height,
        BodyField::Chest,
        BodyField::Waist,
        BodyField::Hips,
        BodyField::ShoulderWidth,
    ];

    /// Canonical camelCase name, as used on the wire.
    pub fn name(self) -> &'static str {
        match self {
            BodyField::Height => "height",
            BodyField::Chest => "chest",
            BodyField::Waist => "waist",
            BodyField::Hips => "hips",
            BodyField::ShoulderWidth => "shoulderWidth",
        }
    }

    /// Resolve a parameter or shape-key name, case-insensitively.
    ///
    /// Accepts the camelCase field names, their snake_case spelling and the
    /// shape-key names (`"Shoulders"` resolves to [`BodyField::ShoulderWidth`]).
    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "height" => Some(BodyField::Height),
            "chest" => Some(BodyField::Chest),
            "waist" => Some(BodyField::Waist),
            "hips" | "hip" => Some(BodyField::Hips),
            "shoulderwidth" | "shoulder_width" | "shoulders" => Some(BodyField::ShoulderWidth),
            _ => None,
        }
    }
}

impl fmt::Display for BodyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BodyField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BodyField::from_name(s).ok_or_else(|| Error::UnknownParameter(s.to_string()))
    }
}

/// Closed measurement range in centimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
}

impl ParameterRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Midpoint of the range, used as the default measurement.
    #[inline]
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// `min < max`; an empty or inverted range maps everything to `min`.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min < self.max
    }

    /// Clamp a raw value into the range. NaN collapses to `min`.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() || !self.is_valid() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    /// Normalised position of `value` inside the range.
    #[inline]
    pub fn weight(&self, value: f64) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }
        let clamped = self.clamp(value);
        if clamped <= self.min {
            return 0.0;
        }
        if clamped >= self.max {
            return 1.0;
        }
        (clamped - self.min) / (self.max - self.min)
    }
}

/// Range table for all five measurements.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ParameterRanges {
    pub height: ParameterRange,
    pub chest: ParameterRange,
    pub waist: ParameterRange,
    pub hips: ParameterRange,
    pub shoulder_width: ParameterRange,
}

impl Default for ParameterRanges {
    fn default() -> Self {
        Self {
            height: ParameterRange::new(160.0, 200.0),
            chest: ParameterRange::new(80.0, 120.0),
            waist: ParameterRange::new(60.0, 100.0),
            hips: ParameterRange::new(80.0, 120.0),
            shoulder_width: ParameterRange::new(40.0, 60.0),
        }
    }
}

impl ParameterRanges {
    /// Build a table, rejecting empty or inverted ranges.
    pub fn new(
        height: ParameterRange,
        chest: ParameterRange,
        waist: ParameterRange,
        hips: ParameterRange,
        shoulder_width: ParameterRange,
    ) -> Result<Self> {
        let ranges = Self {
            height,
            chest,
            waist,
            hips,
            shoulder_width,
        };
        for field in BodyField::ALL {
            let range = ranges.range(field);
            if !range.is_valid() {
                return Err(Error::InvalidRange {
                    name: field.name(),
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(ranges)
    }

    #[inline]
    pub fn range(&self, field: BodyField) -> ParameterRange {
        match field {
            BodyField::Height => self.height,
            BodyField::Chest => self.chest,
            BodyField::Waist => self.waist,
            BodyField::Hips => self.hips,
            BodyField::ShoulderWidth => self.shoulder_width,
        }
    }

    /// Typed weight lookup.
    #[inline]
    pub fn weight(&self, field: BodyField, raw: f64) -> f64 {
        self.range(field).weight(raw)
    }

    /// Weight lookup by name. Unrecognised names yield [`NEUTRAL_WEIGHT`].
    pub fn map_to_weight(&self, name: &str, raw: f64) -> f64 {
        match BodyField::from_name(name) {
            Some(field) => self.weight(field, raw),
            None => NEUTRAL_WEIGHT,
        }
    }

    /// Snapshot with every field at its range midpoint.
    pub fn midpoints(&self) -> BodyParameters {
        BodyParameters {
            height: self.height.midpoint(),
            chest: self.chest.midpoint(),
            waist: self.waist.midpoint(),
            hips: self.hips.midpoint(),
            shoulder_width: self.shoulder_width.midpoint(),
        }
    }

    /// Copy of `params` with every field clamped into its range.
    pub fn clamp(&self, params: &BodyParameters) -> BodyParameters {
        let mut clamped = *params;
        for field in BodyField::ALL {
            clamped.set(field, self.range(field).clamp(params.get(field)));
        }
        clamped
    }
}

/// Map a named measurement to its weight using the default ranges.
pub fn map_to_weight(name: &str, raw: f64) -> f64 {
    ParameterRanges::default().map_to_weight(name, raw)
}

/// Body measurements in centimetres, supplied by the caller every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct BodyParameters {
    pub height: f64,
    pub chest: f64,
    pub waist: f64,
    pub hips: f64,
    pub shoulder_width: f64,
}

impl Default for BodyParameters {
    fn default() -> Self {
        ParameterRanges::default().midpoints()
    }
}

impl BodyParameters {
    #[inline]
    pub fn get(&self, field: BodyField) -> f64 {
        match field {
            BodyField::Height => self.height,
            BodyField::Chest => self.chest,
            BodyField::Waist => self.waist,
            BodyField::Hips => self.hips,
            BodyField::ShoulderWidth => self.shoulder_width,
        }
    }

    #[inline]
    pub fn set(&mut self, field: BodyField, value: f64) {
        match field {
            BodyField::Height => self.height = value,
            BodyField::Chest => self.chest = value,
            BodyField::Waist => self.waist = value,
            BodyField::Hips => self.hips = value,
            BodyField::ShoulderWidth => self.shoulder_width = value,
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, field: BodyField, value: f64) -> Self {
        self.set(field, value);
        self
    }

    /// Per-field comparison against a previously applied snapshot.
    ///
    /// Uses plain `!=`, so a NaN field always reports a change.
    pub fn differs_from(&self, other: &BodyParameters) -> bool {
        BodyField::ALL
            .iter()
            .any(|&field| self.get(field) != other.get(field))
    }
}
