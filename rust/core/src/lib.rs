// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Mannequin Core
//!
//! Pure data layer of the mannequin preview: body measurements, their
//! normalisation into shape-key weights, and the selected-product model that
//! drives the garment slot.
//!
//! ## Overview
//!
//! - **Parameters**: five measurements in centimetres, each with a closed range;
//!   out-of-range values are clamped, never rejected
//! - **Shape keys**: `Height`, `Shoulders`, `Chest`, `Waist`, `Hips`, found on a
//!   mesh through a case-sensitive alias table
//! - **Products**: garment colour resolution and order-insensitive selection
//!   signatures
//!
//! ## Quick Start
//!
//! ```rust
//! use mannequin_core::{map_to_weight, BodyParameters, MannequinConfig, ShapeKey};
//!
//! assert_eq!(map_to_weight("height", 180.0), 0.5);
//!
//! let config = MannequinConfig::default();
//! let weights = config.weights(&BodyParameters::default());
//! assert_eq!(weights.get(ShapeKey::Chest), 0.5);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): wire (de)serialisation of parameters and products

pub mod config;
pub mod error;
pub mod params;
pub mod products;
pub mod shape_keys;

pub use config::MannequinConfig;
pub use error::{Error, Result};
pub use params::{
    map_to_weight, BodyField, BodyParameters, ParameterRange, ParameterRanges, NEUTRAL_WEIGHT,
};
pub use products::{
    parse_hex_color, ColorTable, Product, ProductColor, ProductSignature, DEFAULT_GARMENT_COLOR,
};
pub use shape_keys::{AliasTable, ShapeKey, ShapeKeyWeights};
