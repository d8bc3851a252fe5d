// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for the API.

use mannequin_core::{BodyField, BodyParameters, Product};
use serde::Deserialize;
use std::collections::HashMap;

/// Measurements plus the current product selection.
///
/// As a JSON body, fields are camelCase and all optional; missing
/// measurements default to the middle of their range.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MannequinRequest {
    #[serde(flatten)]
    pub params: BodyParameters,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl MannequinRequest {
    /// Build a request from raw query pairs.
    ///
    /// Never fails: unknown keys are ignored, non-numeric measurements keep
    /// their default and a malformed `products` value yields no selection.
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        let mut request = Self::default();

        for (key, value) in query {
            if key == "products" {
                request.products = parse_products(value);
                continue;
            }
            let Some(field) = BodyField::from_name(key) else {
                continue;
            };
            match value.trim().parse::<f64>() {
                Ok(raw) if raw.is_finite() => request.params.set(field, raw),
                _ => tracing::debug!(field = %field, value = %value, "Ignoring non-numeric measurement"),
            }
        }
        request
    }
}

fn parse_products(raw: &str) -> Vec<Product> {
    match serde_json::from_str(raw) {
        Ok(products) => products,
        Err(e) => {
            tracing::debug!(error = %e, "Malformed products parameter, using empty selection");
            Vec::new()
        }
    }
}
