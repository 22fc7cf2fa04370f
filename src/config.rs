//! Renderer configuration (SPEC_FULL.md "Configuration"): the null
//! sentinel, locale names for datetime attributes, and the per-provider
//! policy table, sourced from an embedded default TOML document and
//! exposed behind a process-wide [`RwLock`], mirroring the teacher
//! crate's `LIB_CFG` (`config.rs`).
//!
//! ```
//! use mtl::config::RENDER_CFG;
//!
//! let cfg = RENDER_CFG.read();
//! assert_eq!(cfg.null_sentinel, "_");
//! ```

use crate::provider::ProviderPolicy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Default configuration as TOML, parsed once into [`RENDER_CFG`].
pub const RENDER_CONFIG_DEFAULT_TOML: &str = include_str!("render_config_default.toml");

/// Process-wide, runtime-mutable configuration, analogous to the
/// teacher's `LIB_CFG`. A render reads its policy/sentinel/locale
/// choices from here at the start of `Renderer::render`, so host
/// applications may tune them once at startup.
pub static RENDER_CFG: LazyLock<RwLock<RenderConfig>> =
    LazyLock::new(|| RwLock::new(RenderConfig::from_default_toml()));

/// The string substituted for a field whose value is empty and has no
/// `default_branch` (§3 invariant, §8 property 6).
fn default_null_sentinel() -> String {
    "_".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_null_sentinel")]
    pub null_sentinel: String,
    #[serde(default)]
    pub locale: LocaleNames,
    /// Declares each host-registered provider's failure policy (§4.2,
    /// §7). Built-in providers are always `Soft` and are not listed
    /// here; this table only needs entries for providers a host adds
    /// with a non-default policy.
    #[serde(default)]
    pub provider_policy: HashMap<String, ProviderPolicy>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            null_sentinel: default_null_sentinel(),
            locale: LocaleNames::default(),
            provider_policy: HashMap::new(),
        }
    }
}

impl RenderConfig {
    fn from_default_toml() -> Self {
        toml::from_str(RENDER_CONFIG_DEFAULT_TOML)
            .expect("render_config_default.toml must deserialize into RenderConfig")
    }
}

/// Month/weekday names used by [`crate::datetime::resolve_attr`].
/// Defaults to English; a host wanting another locale overwrites these
/// via `RENDER_CFG.write()`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocaleNames {
    pub month_names: [String; 12],
    pub month_abbrev: [String; 12],
    pub weekday_names: [String; 7],
}

impl Default for LocaleNames {
    fn default() -> Self {
        Self {
            month_names: [
                "January", "February", "March", "April", "May", "June", "July", "August",
                "September", "October", "November", "December",
            ]
            .map(String::from),
            month_abbrev: [
                "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
            ]
            .map(String::from),
            weekday_names: [
                "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
            ]
            .map(String::from),
        }
    }
}
