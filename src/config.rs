use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::reachability::StateGraphConfig;
use crate::analysis::symbolic::SymbolicConfig;
use crate::lp::SolverConfig;
use crate::optimize::OptimizeConfig;

/// Resource bounds and solver settings of one analysis run.
///
/// ```toml
/// [explicit]
/// state_limit = 1000000
///
/// [symbolic]
/// max_iterations = 500
/// extraction_ceiling = 1000
/// image = "relational"
///
/// [solver]
/// time_limit_secs = 60
///
/// [optimize]
/// max_cuts = 50
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub explicit: StateGraphConfig,
    #[serde(default)]
    pub symbolic: SymbolicConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub optimize: OptimizeConfig,
}

impl AnalysisConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::symbolic::ImageStrategy;

    #[test]
    fn missing_sections_take_defaults() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            [symbolic]
            image = "relational"
            max_iterations = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.symbolic.image, ImageStrategy::Relational);
        assert_eq!(config.symbolic.max_iterations, Some(10));
        assert_eq!(config.symbolic.extraction_ceiling, 1000);
        assert_eq!(config.explicit.state_limit, Some(1_000_000));
        assert_eq!(config.solver.time_limit_secs, Some(60));
        assert_eq!(config.optimize.max_cuts, 50);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = AnalysisConfig::load_from_file("does/not/exist.toml").unwrap();
        assert_eq!(config.optimize.max_cuts, 50);
    }

    #[test]
    fn unknown_image_is_rejected() {
        assert!(AnalysisConfig::from_toml_str("[symbolic]\nimage = \"magic\"\n").is_err());
    }
}
