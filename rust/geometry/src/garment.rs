// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Garment slot visibility and colour

use crate::morph::apply_weights;
use crate::rig::ModelRig;
use mannequin_core::{BodyParameters, MannequinConfig, Product};

/// What the garment slot ended up showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GarmentState {
    /// Selection empty, garment hidden
    Hidden,
    /// Garment visible in the given colour
    Shown { color: u32, channels: usize },
    /// The rig has no garment mesh to bind to
    NoGarmentMesh,
}

/// Show, colour and deform the garment for the current selection.
///
/// Only the first product is rendered. Becoming visible re-applies the body
/// weights so a garment sharing the body's morph rig deforms in sync.
pub fn apply_garment(
    rig: &mut ModelRig,
    products: &[Product],
    params: &BodyParameters,
    config: &MannequinConfig,
) -> GarmentState {
    let Some(garment) = rig.garment_mut() else {
        return GarmentState::NoGarmentMesh;
    };

    let Some(product) = products.first() else {
        garment.visible = false;
        tracing::debug!("Selection empty, garment hidden");
        return GarmentState::Hidden;
    };

    garment.visible = true;
    let color = config.colors.resolve(product);
    garment.material.set_color(color);
    let channels = apply_weights(garment, params, config);

    tracing::debug!(
        product = %product.id,
        color = %format!("{:#08x}", color),
        channels,
        "Bound garment"
    );
    GarmentState::Shown { color, channels }
}
