// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types for the API.

use mannequin_core::{BodyParameters, MannequinConfig, Product, ProductSignature, ShapeKey};
use mannequin_geometry::{CameraConfig, NameHeuristic, EYE_LINE_FRACTION};
use serde::Serialize;
use std::collections::BTreeMap;

/// Garment slot binding for a selection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GarmentInfo {
    /// Product rendered in the slot (the first selected).
    pub product_id: String,
    /// `#rrggbb`
    pub color: String,
    pub color_value: u32,
}

/// Normalised weights for a set of measurements.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightsResponse {
    /// Measurements after clamping to their ranges.
    pub params: BodyParameters,
    /// Canonical shape-key name to weight in `[0, 1]`.
    pub weights: BTreeMap<&'static str, f64>,
    /// `None` when the selection is empty (garment hidden).
    pub garment: Option<GarmentInfo>,
    pub signature: String,
}

impl WeightsResponse {
    pub fn compute(params: &BodyParameters, products: &[Product], config: &MannequinConfig) -> Self {
        let weights = config
            .weights(params)
            .iter()
            .map(|(key, weight)| (key.name(), weight))
            .collect();

        let garment = products.first().map(|product| {
            let color = config.colors.resolve(product);
            GarmentInfo {
                product_id: product.id.clone(),
                color: format!("#{:06x}", color),
                color_value: color,
            }
        });

        Self {
            params: config.ranges.clamp(params),
            weights,
            garment,
            signature: ProductSignature::of(products).as_str().to_string(),
        }
    }
}

/// Orbit camera constants handed to the page script.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraInfo {
    pub fov_degrees: f32,
    pub rotate_speed: f32,
    pub min_phi: f32,
    pub max_phi: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub default_distance: f32,
    pub default_theta: f32,
    pub default_phi: f32,
    pub zoom_smoothing: f32,
    pub zoom_epsilon: f32,
    pub wheel_sensitivity: f32,
    pub pinch_sensitivity: f32,
}

impl From<&CameraConfig> for CameraInfo {
    fn from(camera: &CameraConfig) -> Self {
        Self {
            fov_degrees: camera.fov_degrees,
            rotate_speed: camera.rotate_speed,
            min_phi: camera.min_phi,
            max_phi: camera.max_phi,
            min_distance: camera.min_distance,
            max_distance: camera.max_distance,
            default_distance: camera.default_distance,
            default_theta: camera.default_theta,
            default_phi: camera.default_phi,
            zoom_smoothing: camera.zoom_smoothing,
            zoom_epsilon: camera.zoom_epsilon,
            wheel_sensitivity: camera.wheel_sensitivity,
            pinch_sensitivity: camera.pinch_sensitivity,
        }
    }
}

/// Mesh-name keywords the page uses to find body and garment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleKeywords {
    pub body: Vec<String>,
    pub garment: Vec<String>,
    pub generic_body: Vec<String>,
}

impl From<&NameHeuristic> for RoleKeywords {
    fn from(heuristic: &NameHeuristic) -> Self {
        Self {
            body: heuristic.body_keywords.clone(),
            garment: heuristic.garment_keywords.clone(),
            generic_body: heuristic.generic_body_keywords.clone(),
        }
    }
}

/// Everything the preview page needs, embedded as JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
    pub model_url: String,
    #[serde(flatten)]
    pub state: WeightsResponse,
    /// Canonical shape-key name to the morph-target names tried, in order.
    pub aliases: BTreeMap<&'static str, Vec<String>>,
    pub roles: RoleKeywords,
    pub camera: CameraInfo,
    pub eye_line_fraction: f32,
}

impl PageConfig {
    pub fn new(model_url: &str, state: WeightsResponse, config: &MannequinConfig) -> Self {
        let aliases = ShapeKey::ALL
            .into_iter()
            .map(|key| (key.name(), config.aliases.aliases(key).to_vec()))
            .collect();

        Self {
            model_url: model_url.to_string(),
            state,
            aliases,
            roles: RoleKeywords::from(&NameHeuristic::default()),
            camera: CameraInfo::from(&CameraConfig::default()),
            eye_line_fraction: EYE_LINE_FRACTION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mannequin_core::{BodyField, ProductColor};

    #[test]
    fn test_weights_response() {
        let config = MannequinConfig::default();
        let params = BodyParameters::default()
            .with(BodyField::Height, 250.0)
            .with(BodyField::Waist, 70.0);
        let products = [
            Product::new("b", "shirt").with_color(ProductColor::Text("#00ff00".into())),
            Product::new("a", "shirt"),
        ];
        let response = WeightsResponse::compute(&params, &products, &config);

        assert_eq!(response.params.height, 200.0);
        assert_eq!(response.weights["Height"], 1.0);
        assert_eq!(response.weights["Waist"], 0.25);
        assert_eq!(response.weights["Chest"], 0.5);

        let garment = response.garment.unwrap();
        assert_eq!(garment.product_id, "b");
        assert_eq!(garment.color, "#00ff00");
        assert_eq!(response.signature, "a,b");
    }

    #[test]
    fn test_page_config_shape() {
        let config = MannequinConfig::default();
        let state = WeightsResponse::compute(&BodyParameters::default(), &[], &config);
        let page = PageConfig::new("/m.glb", state, &config);
        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(json["modelUrl"], "/m.glb");
        assert!(json["garment"].is_null());
        assert_eq!(json["weights"]["Hips"], 0.5);
        assert_eq!(json["aliases"]["Shoulders"][0], "Shoulders");
        assert_eq!(json["camera"]["defaultDistance"], 3.5);
        assert_eq!(json["params"]["shoulderWidth"], 50.0);
    }
}
