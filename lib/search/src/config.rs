//! Engine configuration
//!
//! Every field has a default, so a JSON config file only needs to name the
//! settings it overrides.

use crate::{Result, SearchError};
use serde::{Deserialize, Serialize};
use shopmatch_vision::{MatcherConfig, OrbConfig};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Descriptor extraction settings
    pub extractor: OrbConfig,
    /// Ratio test and ANN index settings
    pub matcher: MatcherConfig,
    /// An image counts as a match only if its score is strictly greater
    pub acceptance_threshold: u32,
    /// Maximum number of search results returned
    pub max_results: usize,
    /// Maximum number of category recommendations returned
    pub max_recommendations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            extractor: OrbConfig::default(),
            matcher: MatcherConfig::default(),
            acceptance_threshold: 50,
            max_results: 5,
            max_recommendations: 5,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file and validate
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SearchError::InvalidConfig(format!("cannot read {:?}: {}", path.as_ref(), e))
        })?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(data)
            .map_err(|e| SearchError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.extractor.validate()?;
        self.matcher.validate()?;
        if self.max_results == 0 {
            return Err(SearchError::InvalidConfig("max_results must be positive".to_string()));
        }
        if self.max_recommendations == 0 {
            return Err(SearchError::InvalidConfig(
                "max_recommendations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.acceptance_threshold, 50);
        assert_eq!(config.max_results, 5);
        assert_eq!(config.matcher.ratio, 0.7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(r#"{"acceptance_threshold": 30, "matcher": {"ratio": 0.75}}"#).unwrap();
        assert_eq!(config.acceptance_threshold, 30);
        assert_eq!(config.matcher.ratio, 0.75);
        assert_eq!(config.max_recommendations, 5);
        assert_eq!(config.extractor.n_features, 500);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"max_results": 0}"#),
            Err(SearchError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"matcher": {"ratio": 0.0}}"#),
            Err(SearchError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"extractor": {"scale_factor": 0.5}}"#),
            Err(SearchError::InvalidConfig(_))
        ));
        assert!(matches!(EngineConfig::from_json("not json"), Err(SearchError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"max_results": 3}"#).unwrap();
        assert_eq!(EngineConfig::from_file(&path).unwrap().max_results, 3);
        assert!(EngineConfig::from_file(dir.path().join("missing.json")).is_err());
    }
}
