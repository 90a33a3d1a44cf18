//! Assumption config files (`--config`), JSON or YAML by extension.

use serde::{Deserialize, Serialize};

use alphastack_core::valuation::ValuationMethod;
use alphastack_core::{AssumptionOverrides, Percent};

use super::file;

/// Settings a config file may carry. Every field is optional; flags on the
/// command line override whatever is set here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub assumptions: AssumptionOverrides,
    pub method: Option<ValuationMethod>,
    pub fair_value_band: Option<Percent>,
    pub cache_ttl_secs: Option<i64>,
}

pub fn read_config(path: &str) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let (canonical, contents) = file::read_text(path)?;
    let yaml = matches!(
        file::extension(&canonical).as_deref(),
        Some("yaml") | Some("yml")
    );
    parse_config(&contents, yaml)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e).into())
}

pub fn parse_config(contents: &str, yaml: bool) -> Result<CliConfig, Box<dyn std::error::Error>> {
    if yaml {
        Ok(serde_yaml::from_str(contents)?)
    } else {
        Ok(serde_json::from_str(contents)?)
    }
}
