// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Selected products, garment colour resolution and selection signatures

use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use std::fmt;

/// Colour used when nothing else resolves.
pub const DEFAULT_GARMENT_COLOR: u32 = 0xFF_FFFF;

/// Colour attached to a product, either a hex literal or a packed integer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ProductColor {
    Text(String),
    Numeric(f64),
}

impl ProductColor {
    /// Packed `0xRRGGBB` value, if this colour can be interpreted.
    pub fn to_rgb(&self) -> Result<u32> {
        match self {
            ProductColor::Text(text) => parse_hex_color(text),
            ProductColor::Numeric(value) if value.is_finite() => {
                Ok((value.floor() as i64 as u32) & 0xFF_FFFF)
            }
            ProductColor::Numeric(value) => Err(Error::InvalidColor(value.to_string())),
        }
    }
}

/// Parse `#RRGGBB` or `0xRRGGBB` into a packed integer.
pub fn parse_hex_color(text: &str) -> Result<u32> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| Error::InvalidColor(text.to_string()))?;

    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidColor(text.to_string()));
    }

    u32::from_str_radix(digits, 16).map_err(|_| Error::InvalidColor(text.to_string()))
}

/// A product the shopper has selected for the preview.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Product {
    /// Missing or `null` ids deserialize as the empty string.
    #[cfg_attr(feature = "serde", serde(default, deserialize_with = "de::product_id"))]
    pub id: String,
    #[cfg_attr(feature = "serde", serde(rename = "type", default))]
    pub kind: String,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub color: Option<ProductColor>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub model_url: Option<String>,
}

impl Product {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            color: None,
            model_url: None,
        }
    }

    pub fn with_color(mut self, color: ProductColor) -> Self {
        self.color = Some(color);
        self
    }
}

#[cfg(feature = "serde")]
mod de {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    /// Storefront ids arrive as strings, numbers or `null`; keep them as strings.
    pub(super) fn product_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Option::<RawId>::deserialize(deserializer)? {
            Some(RawId::Text(text)) => text,
            Some(RawId::Integer(n)) => n.to_string(),
            Some(RawId::Float(f)) => f.to_string(),
            None => String::new(),
        })
    }
}

/// Identity of a selection: ids sorted and comma-joined.
///
/// Reordering a selection without changing its membership yields the same
/// signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ProductSignature(String);

impl ProductSignature {
    pub fn of(products: &[Product]) -> Self {
        let mut ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        Self(ids.join(","))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed product-id to colour lookup used when a product carries no colour.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorTable {
    colors: FxHashMap<String, u32>,
    fallback: u32,
}

impl Default for ColorTable {
    fn default() -> Self {
        let colors = [
            ("1", 0x1E_3A8A),
            ("2", 0xDC_2626),
            ("3", 0x16_A34A),
            ("4", 0x11_1827),
            ("5", 0xF5_F5F5),
            ("6", 0xF5_9E0B),
        ]
        .into_iter()
        .map(|(id, color)| (id.to_string(), color))
        .collect();

        Self {
            colors,
            fallback: DEFAULT_GARMENT_COLOR,
        }
    }
}

impl ColorTable {
    pub fn empty() -> Self {
        Self {
            colors: FxHashMap::default(),
            fallback: DEFAULT_GARMENT_COLOR,
        }
    }

    pub fn insert(&mut self, id: impl Into<String>, color: u32) {
        self.colors.insert(id.into(), color & 0xFF_FFFF);
    }

    pub fn get(&self, id: &str) -> Option<u32> {
        self.colors.get(id).copied()
    }

    /// Resolve the display colour of a product.
    ///
    /// Priority: explicit colour, then the id table, then the fallback.
    /// A colour literal that does not parse falls through to the table.
    pub fn resolve(&self, product: &Product) -> u32 {
        product
            .color
            .as_ref()
            .and_then(|color| color.to_rgb().ok())
            .or_else(|| self.get(&product.id))
            .unwrap_or(self.fallback)
    }
}
