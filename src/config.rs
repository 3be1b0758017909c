use crate::classes::{ClassCode, ClassScheme};
use crate::error::{Result, TransitionError};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Web Mercator, the projected system every snapshot is compared in by default.
pub const DEFAULT_REFERENCE_EPSG: u32 = 3857;

/// How the no-data sentinel of a loaded raster is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDataPolicy {
    /// Use the value declared by the raster, or `fallback` when it declares none.
    FromRaster { fallback: ClassCode },
    /// Ignore the declared value and always use this one.
    Override(ClassCode),
}

impl Default for NoDataPolicy {
    fn default() -> Self {
        NoDataPolicy::FromRaster { fallback: 0 }
    }
}

impl NoDataPolicy {
    pub fn resolve(&self, declared: Option<f64>) -> ClassCode {
        match *self {
            NoDataPolicy::Override(value) => value,
            NoDataPolicy::FromRaster { fallback } => match declared {
                Some(nd) if nd.is_finite() => nd as ClassCode,
                _ => fallback,
            },
        }
    }
}

/// Everything the pipeline needs that used to be a process-wide constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub reference_epsg: u32,
    pub scheme: ClassScheme,
    pub nodata: NoDataPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reference_epsg: DEFAULT_REFERENCE_EPSG,
            scheme: ClassScheme::lcz(),
            nodata: NoDataPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file; missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading configuration: {}", path.display());
        let text = std::fs::read_to_string(path)
            .map_err(|e| TransitionError::input(path.display().to_string(), e))?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.reference_epsg == 0 {
            return Err(TransitionError::Config(
                "reference EPSG code must be non-zero".to_string(),
            ));
        }
        self.scheme.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.reference_epsg, 3857);
        assert_eq!(config.scheme.len(), 17);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nodata_policy_resolution() {
        let policy = NoDataPolicy::FromRaster { fallback: 0 };
        assert_eq!(policy.resolve(Some(255.0)), 255);
        assert_eq!(policy.resolve(None), 0);
        assert_eq!(policy.resolve(Some(f64::NAN)), 0);
        assert_eq!(NoDataPolicy::Override(-1).resolve(Some(255.0)), -1);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "reference_epsg": 32756 }"#).unwrap();
        assert_eq!(config.reference_epsg, 32756);
        assert_eq!(config.scheme, ClassScheme::lcz());
        assert_eq!(config.nodata, NoDataPolicy::default());
    }

    #[test]
    fn test_json_nodata_override() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "nodata": { "override": 255 } }"#).unwrap();
        assert_eq!(config.nodata, NoDataPolicy::Override(255));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r##"{ "scheme": { "classes": [
                { "code": 1, "label": "Urban", "color": "#FF0000" },
                { "code": 2, "label": "Forest", "color": "#00AA00" }
            ], "excluded": [2] } }"##,
        )
        .unwrap();
        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.scheme.len(), 2);
        assert!(config.scheme.is_excluded(2));
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let err = PipelineConfig::from_json_file("/nonexistent/config.json").unwrap_err();
        assert!(matches!(err, TransitionError::Input { .. }));
    }
}
