// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named shape keys and the alias table that finds them on a mesh

use crate::params::{BodyField, BodyParameters, ParameterRanges};
use smallvec::{smallvec, SmallVec};
use std::fmt;

/// The five body shape keys a mannequin rig may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShapeKey {
    Height,
    Shoulders,
    Chest,
    Waist,
    Hips,
}

impl ShapeKey {
    pub const ALL: [ShapeKey; 5] = [
        ShapeKey::Height,
        ShapeKey::Shoulders,
        ShapeKey::Chest,
        ShapeKey::Waist,
        ShapeKey::Hips,
    ];

    /// Measurement that drives this key.
    #[inline]
    pub fn field(self) -> BodyField {
        match self {
            ShapeKey::Height => BodyField::Height,
            ShapeKey::Shoulders => BodyField::ShoulderWidth,
            ShapeKey::Chest => BodyField::Chest,
            ShapeKey::Waist => BodyField::Waist,
            ShapeKey::Hips => BodyField::Hips,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShapeKey::Height => "Height",
            ShapeKey::Shoulders => "Shoulders",
            ShapeKey::Chest => "Chest",
            ShapeKey::Waist => "Waist",
            ShapeKey::Hips => "Hips",
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalised weights for all five keys, recomputed whenever parameters change.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShapeKeyWeights([f64; 5]);

impl ShapeKeyWeights {
    pub fn from_parameters(params: &BodyParameters, ranges: &ParameterRanges) -> Self {
        let mut weights = [0.0; 5];
        for key in ShapeKey::ALL {
            let field = key.field();
            weights[key.index()] = ranges.weight(field, params.get(field));
        }
        Self(weights)
    }

    #[inline]
    pub fn get(&self, key: ShapeKey) -> f64 {
        self.0[key.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShapeKey, f64)> + '_ {
        ShapeKey::ALL.iter().map(move |&key| (key, self.get(key)))
    }
}

/// Candidate morph-channel names per shape key. First match wins.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasTable {
    aliases: [SmallVec<[String; 4]>; 5],
}

impl Default for AliasTable {
    fn default() -> Self {
        fn names(list: &[&str]) -> SmallVec<[String; 4]> {
            list.iter().map(|s| s.to_string()).collect()
        }
        Self {
            aliases: [
                names(&["Height", "height", "HEIGHT"]),
                names(&["Shoulders", "shoulders", "ShoulderWidth", "shoulder_width"]),
                names(&["Chest", "chest", "CHEST"]),
                names(&["Waist", "waist", "WAIST"]),
                names(&["Hips", "hips", "HIPS", "Hip"]),
            ],
        }
    }
}

impl AliasTable {
    /// Table where every key only matches its canonical name.
    pub fn canonical() -> Self {
        Self {
            aliases: ShapeKey::ALL.map(|key| smallvec![key.name().to_string()]),
        }
    }

    pub fn aliases(&self, key: ShapeKey) -> &[String] {
        &self.aliases[key.index()]
    }

    /// Append an extra alias for `key`, tried after the existing ones.
    pub fn push_alias(&mut self, key: ShapeKey, alias: impl Into<String>) {
        self.aliases[key.index()].push(alias.into());
    }

    /// Find the first alias accepted by `lookup` (exact, case-sensitive).
    pub fn resolve<T>(&self, key: ShapeKey, mut lookup: impl FnMut(&str) -> Option<T>) -> Option<T> {
        self.aliases(key).iter().find_map(|alias| lookup(alias.as_str()))
    }
}
