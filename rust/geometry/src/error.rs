// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or preparing a mannequin rig
#[derive(Error, Debug)]
pub enum Error {
    #[error("Asset load failed: {0}")]
    AssetLoad(#[from] gltf::Error),

    #[error("Asset contains no scene")]
    NoScene,

    #[error("Asset contains no renderable meshes")]
    EmptyAsset,

    #[error("Morph channel {channel} has {actual} displacement values, expected {expected}")]
    MorphLength {
        channel: String,
        expected: usize,
        actual: usize,
    },

    #[error("Loader disconnected before delivering a result")]
    LoaderDisconnected,

    #[error("Loader panicked: {0}")]
    LoaderPanicked(String),

    #[error("Core error: {0}")]
    CoreError(#[from] mannequin_core::Error),
}
