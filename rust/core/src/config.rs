// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lookup tables injected into the deformation pipeline.

use crate::params::{BodyParameters, ParameterRanges};
use crate::products::{ColorTable, Product};
use crate::shape_keys::{AliasTable, ShapeKeyWeights};

/// Measurement ranges, shape-key aliases and garment colours.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MannequinConfig {
    pub ranges: ParameterRanges,
    pub aliases: AliasTable,
    pub colors: ColorTable,
}

impl MannequinConfig {
    pub fn new(ranges: ParameterRanges, aliases: AliasTable, colors: ColorTable) -> Self {
        Self {
            ranges,
            aliases,
            colors,
        }
    }

    #[inline]
    pub fn weights(&self, params: &BodyParameters) -> ShapeKeyWeights {
        ShapeKeyWeights::from_parameters(params, &self.ranges)
    }

    /// Colour of the garment slot for a selection, `None` when it is empty.
    pub fn garment_color(&self, products: &[Product]) -> Option<u32> {
        products.first().map(|product| self.colors.resolve(product))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::ProductColor;
    use crate::shape_keys::ShapeKey;

    #[test]
    fn test_only_first_product_colours_the_garment() {
        let config = MannequinConfig::default();
        let products = [
            Product::new("p1", "shirt").with_color(ProductColor::Text("#112233".into())),
            Product::new("p2", "shirt").with_color(ProductColor::Text("#445566".into())),
        ];
        assert_eq!(config.garment_color(&products), Some(0x112233));
        assert_eq!(config.garment_color(&[]), None);
    }

    #[test]
    fn test_weights_use_injected_ranges() {
        let mut config = MannequinConfig::default();
        config.ranges.height.max = 240.0;
        let weights = config.weights(&BodyParameters::default().with(crate::BodyField::Height, 200.0));
        assert_eq!(weights.get(ShapeKey::Height), 0.5);
    }
}
