//! Configuration types
//!
//! Every field has a default matching the behavior of a stock deployment, so
//! an empty TOML file is a valid configuration. Environment variables override
//! individual values after the file is read.

use crate::error::ConfigError;
use crate::style::Rgb;
use crate::SyncResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ticks between activation and the bulk import when no ready signal is used.
pub const DEFAULT_IMPORT_DELAY_TICKS: u32 = 20;

/// Avatar image shown in the info window of non-admin claims.
pub const DEFAULT_AVATAR_URL_TEMPLATE: &str = "https://minotar.net/helm/{owner}/20";

// ============================================================================
// MARKER SET
// ============================================================================

/// The marker set owned by this system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerSetSpec {
    pub key: String,
    pub label: String,
    pub layer_priority: i32,
    pub hide_by_default: bool,
}

impl Default for MarkerSetSpec {
    fn default() -> Self {
        Self {
            key: "griefprevention.markerset".to_string(),
            label: "Claims".to_string(),
            layer_priority: 10,
            hide_by_default: false,
        }
    }
}

// ============================================================================
// STYLE
// ============================================================================

/// Line and fill color used for one kind of claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Palette {
    pub line: Rgb,
    pub fill: Rgb,
}

impl Palette {
    pub const fn uniform(color: Rgb) -> Self {
        Self {
            line: color,
            fill: color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    pub admin: Palette,
    pub regular: Palette,
    pub line_weight: u32,
    pub line_opacity: f64,
    pub fill_opacity: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            admin: Palette::uniform(Rgb::RED),
            regular: Palette::uniform(Rgb::TEAL),
            line_weight: 2,
            line_opacity: 0.8,
            fill_opacity: 0.35,
        }
    }
}

// ============================================================================
// INFO WINDOW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InfoWindowConfig {
    /// URL of the owner's avatar; `{owner}` is replaced by the owner name.
    pub avatar_url_template: String,
    /// Escape owner names before embedding them in markup and URLs.
    /// Disabling reproduces the raw markup older deployments emitted.
    pub escape_owner: bool,
}

impl Default for InfoWindowConfig {
    fn default() -> Self {
        Self {
            avatar_url_template: DEFAULT_AVATAR_URL_TEMPLATE.to_string(),
            escape_owner: true,
        }
    }
}

// ============================================================================
// STARTUP
// ============================================================================

/// When the bulk import of existing claims runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case", deny_unknown_fields)]
pub enum StartupPolicy {
    /// Import when the host reports that the claim store finished loading.
    OnReady,
    /// Import once the given number of ticks elapsed after activation.
    AfterTicks { ticks: u32 },
}

impl Default for StartupPolicy {
    fn default() -> Self {
        StartupPolicy::AfterTicks {
            ticks: DEFAULT_IMPORT_DELAY_TICKS,
        }
    }
}

/// Names under which the collaborators are registered on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PluginNames {
    pub marker_service: String,
    pub claim_store: String,
}

impl Default for PluginNames {
    fn default() -> Self {
        Self {
            marker_service: "dynmap".to_string(),
            claim_store: "GriefPrevention".to_string(),
        }
    }
}

// ============================================================================
// MASTER CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClaimMapConfig {
    pub marker_set: MarkerSetSpec,
    pub style: StyleConfig,
    pub info_window: InfoWindowConfig,
    pub startup: StartupPolicy,
    pub plugins: PluginNames,
}

impl ClaimMapConfig {
    /// Read the config file, apply environment overrides and validate.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let config = Self::from_path(path)?.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Apply overrides from environment variables.
    ///
    /// Environment variables:
    /// - `CLAIMMAP_LAYER_LABEL`: Label of the marker set
    /// - `CLAIMMAP_LAYER_PRIORITY`: Layer priority of the marker set
    /// - `CLAIMMAP_HIDE_BY_DEFAULT`: "true" or "false"
    /// - `CLAIMMAP_IMPORT_DELAY_TICKS`: Ticks before bulk import ("ready" waits for the claim store)
    /// - `CLAIMMAP_ESCAPE_OWNER`: "true" or "false"
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Unparseable values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(label) = lookup("CLAIMMAP_LAYER_LABEL") {
            self.marker_set.label = label;
        }
        if let Some(priority) = lookup("CLAIMMAP_LAYER_PRIORITY").and_then(|s| s.parse().ok()) {
            self.marker_set.layer_priority = priority;
        }
        if let Some(hide) = lookup("CLAIMMAP_HIDE_BY_DEFAULT").and_then(|s| parse_bool(&s)) {
            self.marker_set.hide_by_default = hide;
        }
        if let Some(delay) = lookup("CLAIMMAP_IMPORT_DELAY_TICKS") {
            if delay.trim().eq_ignore_ascii_case("ready") {
                self.startup = StartupPolicy::OnReady;
            } else if let Ok(ticks) = delay.trim().parse() {
                self.startup = StartupPolicy::AfterTicks { ticks };
            }
        }
        if let Some(escape) = lookup("CLAIMMAP_ESCAPE_OWNER").and_then(|s| parse_bool(&s)) {
            self.info_window.escape_owner = escape;
        }
        self
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - marker set key and label are not blank
    /// - opacities are within [0.0, 1.0]
    /// - line weight is positive
    /// - the avatar template contains `{owner}`
    /// - plugin names are not blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marker_set.key.trim().is_empty() {
            return Err(ConfigError::invalid(
                "marker_set.key",
                &self.marker_set.key,
                "must not be empty",
            ));
        }
        if self.marker_set.label.trim().is_empty() {
            return Err(ConfigError::invalid(
                "marker_set.label",
                &self.marker_set.label,
                "must not be empty",
            ));
        }
        if !(0.0..=1.0).contains(&self.style.line_opacity) {
            return Err(ConfigError::invalid(
                "style.line_opacity",
                self.style.line_opacity,
                "must be between 0.0 and 1.0",
            ));
        }
        if !(0.0..=1.0).contains(&self.style.fill_opacity) {
            return Err(ConfigError::invalid(
                "style.fill_opacity",
                self.style.fill_opacity,
                "must be between 0.0 and 1.0",
            ));
        }
        if self.style.line_weight == 0 {
            return Err(ConfigError::invalid(
                "style.line_weight",
                self.style.line_weight,
                "must be greater than 0",
            ));
        }
        if !self.info_window.avatar_url_template.contains("{owner}") {
            return Err(ConfigError::invalid(
                "info_window.avatar_url_template",
                &self.info_window.avatar_url_template,
                "must contain {owner}",
            ));
        }
        if self.plugins.marker_service.trim().is_empty() {
            return Err(ConfigError::invalid(
                "plugins.marker_service",
                &self.plugins.marker_service,
                "must not be empty",
            ));
        }
        if self.plugins.claim_store.trim().is_empty() {
            return Err(ConfigError::invalid(
                "plugins.claim_store",
                &self.plugins.claim_store,
                "must not be empty",
            ));
        }
        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_is_valid() {
        assert!(ClaimMapConfig::default().validate().is_ok());
    }

    #[test]
    fn test_defaults_match_stock_deployment() {
        let config = ClaimMapConfig::default();
        assert_eq!(config.marker_set.key, "griefprevention.markerset");
        assert_eq!(config.marker_set.label, "Claims");
        assert_eq!(config.marker_set.layer_priority, 10);
        assert!(!config.marker_set.hide_by_default);
        assert_eq!(config.startup, StartupPolicy::AfterTicks { ticks: 20 });
        assert_eq!(config.plugins.marker_service, "dynmap");
        assert_eq!(config.plugins.claim_store, "GriefPrevention");
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = ClaimMapConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClaimMapConfig::default());
    }

    #[test]
    fn test_toml_partial_override() {
        let config = ClaimMapConfig::from_toml_str(
            r##"
            [marker_set]
            label = "Land"

            [style]
            admin = { line = "#000000", fill = 255 }

            [startup]
            mode = "on_ready"
            "##,
        )
        .unwrap();
        assert_eq!(config.marker_set.label, "Land");
        assert_eq!(config.marker_set.key, "griefprevention.markerset");
        assert_eq!(config.style.admin.line.value(), 0);
        assert_eq!(config.style.admin.fill.value(), 255);
        assert_eq!(config.style.regular, Palette::uniform(Rgb::TEAL));
        assert_eq!(config.startup, StartupPolicy::OnReady);
    }

    #[test]
    fn test_toml_rejects_unknown_fields() {
        let result = ClaimMapConfig::from_toml_str("[marker_set]\ncolour = 1\n");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_toml_rejects_bad_color() {
        let result = ClaimMapConfig::from_toml_str("[style]\nadmin = { line = \"red\", fill = 1 }\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_apply() {
        let config = ClaimMapConfig::default().with_overrides(lookup_from(&[
            ("CLAIMMAP_LAYER_LABEL", "Regions"),
            ("CLAIMMAP_LAYER_PRIORITY", "3"),
            ("CLAIMMAP_HIDE_BY_DEFAULT", "true"),
            ("CLAIMMAP_IMPORT_DELAY_TICKS", "40"),
            ("CLAIMMAP_ESCAPE_OWNER", "false"),
        ]));
        assert_eq!(config.marker_set.label, "Regions");
        assert_eq!(config.marker_set.layer_priority, 3);
        assert!(config.marker_set.hide_by_default);
        assert_eq!(config.startup, StartupPolicy::AfterTicks { ticks: 40 });
        assert!(!config.info_window.escape_owner);
    }

    #[test]
    fn test_override_ready_selects_on_ready() {
        let config = ClaimMapConfig::default()
            .with_overrides(lookup_from(&[("CLAIMMAP_IMPORT_DELAY_TICKS", "ready")]));
        assert_eq!(config.startup, StartupPolicy::OnReady);
    }

    #[test]
    fn test_unparseable_overrides_are_ignored() {
        let config = ClaimMapConfig::default().with_overrides(lookup_from(&[
            ("CLAIMMAP_LAYER_PRIORITY", "high"),
            ("CLAIMMAP_HIDE_BY_DEFAULT", "maybe"),
        ]));
        assert_eq!(config, ClaimMapConfig::default());
    }

    #[test]
    fn test_validate_rejects_opacity_out_of_range() {
        let mut config = ClaimMapConfig::default();
        config.style.fill_opacity = 1.5;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "style.fill_opacity"));
    }

    #[test]
    fn test_validate_rejects_blank_key() {
        let mut config = ClaimMapConfig::default();
        config.marker_set.key = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_template_without_owner() {
        let mut config = ClaimMapConfig::default();
        config.info_window.avatar_url_template = "https://example.invalid/avatar.png".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_line_weight() {
        let mut config = ClaimMapConfig::default();
        config.style.line_weight = 0;
        assert!(config.validate().is_err());
    }
}
