use rand::{rngs::SmallRng, SeedableRng};
use serde::Deserialize;

fn default_log_level() -> String {
    "info".to_string()
}

/// Options the page passes to `start_round`. Every field is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            seed: None,
            log_level: default_log_level(),
        }
    }
}

impl TableConfig {
    pub fn rng(&self) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        }
    }
}
