use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

/// Runtime settings for the fabric process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FabricConfig {
    /// Host part of every router address this process creates.
    pub host: String,
    /// TCP port the control server listens on.
    pub control_port: u16,
    /// Seconds between periodic refresh broadcasts.
    pub tick_interval_secs: u64,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            control_port: 8080,
            tick_interval_secs: 5,
        }
    }
}

impl FabricConfig {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: FabricConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FabricConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.control_port, 8080);
        assert_eq!(config.tick_interval_secs, 5);
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = std::env::temp_dir().join("dvrouted-config-test.json");
        let path = path.to_str().unwrap();

        let config = FabricConfig {
            host: "127.0.0.1".into(),
            control_port: 9100,
            tick_interval_secs: 2,
        };
        config.save(path).unwrap();
        let loaded = FabricConfig::load(path).unwrap();
        assert_eq!(loaded.host, "127.0.0.1");
        assert_eq!(loaded.control_port, 9100);
        assert_eq!(loaded.tick_interval_secs, 2);

        let _ = std::fs::remove_file(path);
    }
}
