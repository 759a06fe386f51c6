use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::costs::RateTable;
use crate::error::{Error, Result};
use crate::matrix::IndexBase;
use crate::models::solver::SolveOptions;
use crate::models::vrp::VrpSettings;

/// Settings of a run, read from a JSON file. Every field is optional.
///
/// ```json
/// {
///     "vrp": { "variant": "detailed", "range": false },
///     "solver": { "time_limit": 3600, "mip_gap": 0.01 },
///     "index_base": "one",
///     "rates": { "EV": { "per_km": 4000, "per_minute": 500, "maintenance": 21000 } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub vrp: VrpSettings,
    pub solver: SolveOptions,
    /// Index convention of the matrix, cost and route tables
    pub index_base: IndexBase,
    /// Unit-cost rates per vehicle type, the built-in table when absent
    pub rates: Option<RateTable>,
}

impl RunConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<RunConfig> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("cannot read {}: {}", path.display(), e)))?;
        let config: RunConfig = serde_json::from_str(&text)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn rates(&self) -> RateTable {
        self.rates.clone().unwrap_or_else(RateTable::builtin)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;
    use crate::models::vrp::{FixedCostCharge, VrpConfig};

    #[test]
    fn empty_file_gives_the_defaults() {
        let config: RunConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.vrp.config(), VrpConfig::detailed());
        assert_eq!(config.index_base, IndexBase::Zero);
        assert!(config.rates().get("Gas Car").is_some());
    }

    #[test]
    fn loads_from_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "vrp": {{"variant": "simplified", "fixed_costs": "all_vehicles"}},
                "solver": {{"time_limit": 60, "threads": 4}},
                "index_base": "one",
                "rates": {{"bike": {{"per_km": 10, "per_minute": 1}}}}
            }}"#
        )
        .unwrap();

        let config = RunConfig::load(file.path()).unwrap();
        assert_eq!(config.vrp.config().fixed_costs, FixedCostCharge::AllVehicles);
        assert_eq!(config.solver.time_limit, Some(Duration::from_secs(60)));
        assert_eq!(config.solver.threads, Some(4));
        assert_eq!(config.index_base, IndexBase::One);
        let rates = config.rates();
        assert!(rates.get("Gas Car").is_none());
        assert_eq!(rates.get("bike").unwrap().per_km, 10.0);
    }

    #[test]
    fn unreadable_file_is_a_config_error() {
        assert!(matches!(
            RunConfig::load("/nonexistent/run.json"),
            Err(Error::InvalidConfig(_))
        ));
    }
}
