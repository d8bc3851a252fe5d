// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

use std::str::FromStr;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// URL of the mannequin glTF/GLB asset the preview page loads.
    pub model_url: String,
    /// ES module URL of three.js, used by the page's import map.
    pub three_module_url: String,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Maximum request body size in KB.
    pub max_body_kb: usize,
    /// Allowed CORS origins (comma-separated, or "*" for all).
    pub cors_origins: Vec<String>,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            port: env_or("PORT", 8080),
            model_url: std::env::var("MODEL_URL").unwrap_or_else(|_| "/models/mannequin.glb".into()),
            three_module_url: std::env::var("THREE_MODULE_URL")
                .unwrap_or_else(|_| "https://unpkg.com/three@0.160.0/build/three.module.js".into()),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            max_body_kb: env_or("MAX_BODY_KB", 64),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Whether CORS should allow any origin.
    pub fn cors_is_permissive(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            model_url: "/models/mannequin.glb".into(),
            three_module_url: "https://unpkg.com/three@0.160.0/build/three.module.js".into(),
            request_timeout_secs: 30,
            max_body_kb: 64,
            cors_origins: vec!["*".into()],
        }
    }
}
