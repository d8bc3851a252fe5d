// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the parameter and product layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Unknown body parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid color literal: {0}")]
    InvalidColor(String),

    #[error("Invalid parameter range for {name}: min {min} must be below max {max}")]
    InvalidRange { name: &'static str, min: f64, max: f64 },
}
