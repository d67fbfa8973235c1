//! Layered configuration loading with figment.

use crate::config::RiskCalcConfig;
use crate::errors::{RiskError, RiskResult};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

/// Config file read when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "riskcalc.toml";

/// Prefix for environment overrides; nested keys use `__`,
/// e.g. `RISKCALC_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "RISKCALC_";

/// Names an alternative config file
pub const CONFIG_PATH_VAR: &str = "RISKCALC_CONFIG";

/// Defaults, then the TOML file, then `RISKCALC_*` environment variables.
pub fn figment(config_path: &Path) -> Figment {
    Figment::from(Serialized::defaults(RiskCalcConfig::default()))
        .merge(Toml::file(config_path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"))
}

/// Extract and validate a config from any figment
pub fn extract_config(figment: &Figment) -> RiskResult<RiskCalcConfig> {
    let config: RiskCalcConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Load the layered configuration.
///
/// An explicitly named file (argument or `RISKCALC_CONFIG`) must exist;
/// the default `riskcalc.toml` is optional.
pub fn load_config(explicit_path: Option<&Path>) -> RiskResult<RiskCalcConfig> {
    let named = explicit_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from));

    let path = match named {
        Some(path) => {
            if !path.is_file() {
                return Err(RiskError::config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            path
        }
        None => PathBuf::from(DEFAULT_CONFIG_FILE),
    };

    extract_config(&figment(&path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(RiskCalcConfig::default())).merge(Toml::string(
            r#"
            cutoff = 0.6
            model_path = "artifacts/model.json"

            [recommendations]
            include_normal_findings = false

            [recommendations.ranges.hb]
            low = 110.0
            high = 160.0
            "#,
        ));

        let config = extract_config(&figment).unwrap();
        assert_eq!(config.cutoff, 0.6);
        assert_eq!(config.model_path, PathBuf::from("artifacts/model.json"));
        assert_eq!(config.scaler_path, PathBuf::from("models/scaler.json"));
        assert!(!config.recommendations.include_normal_findings);
        assert_eq!(config.recommendations.ranges.hb.low, 110.0);
        assert_eq!(config.recommendations.ranges.lym.high, 4.0);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let figment = Figment::from(Serialized::defaults(RiskCalcConfig::default()))
            .merge(Toml::string("cutoff = -0.5"));
        assert!(matches!(extract_config(&figment), Err(RiskError::Config { .. })));

        let figment = Figment::from(Serialized::defaults(RiskCalcConfig::default()))
            .merge(Toml::string("cutoff = \"high\""));
        assert!(matches!(extract_config(&figment), Err(RiskError::Config { .. })));
    }

    #[test]
    fn missing_explicit_file_fails_fast() {
        let err = load_config(Some(Path::new("no/such/riskcalc.toml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
