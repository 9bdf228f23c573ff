use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use crate::{MetanetError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub generator: GeneratorConfig,
    pub classifier: ClassifierConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub hostname: String,
    pub ip: IpAddr,
}

impl CatalogEntry {
    pub fn new(hostname: &str, ip: IpAddr) -> Self {
        Self {
            hostname: hostname.to_lowercase(),
            ip,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Shortest batch length in seconds (inclusive).
    pub min_interval: u32,
    /// Longest batch length in seconds (exclusive unless equal to `min_interval`).
    pub max_interval: u32,
    /// Per-batch density coefficients are drawn from `[0, density_upper_bound)`.
    pub density_upper_bound: f64,
    pub max_batches: usize,
    pub catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub asset_hosts_path: String,
    pub ads_hosts_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            classifier: ClassifierConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_interval: 60,
            max_interval: 600,
            density_upper_bound: 1.0 / 25.0,
            max_batches: 100_000,
            catalog: default_catalog(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            asset_hosts_path: "resources/domain-lists/assets/_all.txt".to_string(),
            ads_hosts_path: "resources/domain-lists/ads/_all.txt".to_string(),
        }
    }
}

pub fn default_catalog() -> Vec<CatalogEntry> {
    let entries: [(&str, [u8; 4]); 17] = [
        ("google.com", [142, 250, 185, 78]),
        ("youtube.com", [142, 250, 186, 46]),
        ("facebook.com", [157, 240, 221, 35]),
        ("wikipedia.com", [185, 15, 59, 224]),
        ("yahoo.com", [74, 6, 143, 26]),
        ("reddit.com", [151, 101, 1, 140]),
        ("netflix.com", [54, 155, 178, 5]),
        ("vk.com", [87, 240, 132, 72]),
        ("instagram.com", [157, 240, 221, 174]),
        ("linkedin.com", [13, 107, 42, 14]),
        ("microsoft.com", [20, 112, 52, 29]),
        ("twitter.com", [104, 244, 42, 1]),
        ("twitch.tv", [151, 101, 66, 167]),
        ("stackoverflow.com", [151, 101, 65, 69]),
        ("imdb.com", [52, 94, 225, 248]),
        ("github.com", [140, 82, 121, 4]),
        ("accuweather.com", [23, 33, 184, 229]),
    ];

    entries
        .iter()
        .map(|(hostname, octets)| CatalogEntry::new(hostname, IpAddr::V4(Ipv4Addr::from(*octets))))
        .collect()
}

impl GeneratorConfig {
    pub fn with_interval_range(mut self, min_interval: u32, max_interval: u32) -> Self {
        self.min_interval = min_interval;
        self.max_interval = max_interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_interval == 0 {
            return Err(MetanetError::InvalidConfig("min_interval must be at least 1 second".to_string()));
        }
        if self.max_interval < self.min_interval {
            return Err(MetanetError::InvalidConfig(format!(
                "max_interval ({}) is smaller than min_interval ({})",
                self.max_interval, self.min_interval
            )));
        }
        if !self.density_upper_bound.is_finite() || self.density_upper_bound <= 0.0 {
            return Err(MetanetError::InvalidConfig(format!(
                "density_upper_bound must be a positive number, got {}",
                self.density_upper_bound
            )));
        }
        if self.max_batches == 0 {
            return Err(MetanetError::InvalidConfig("max_batches must be at least 1".to_string()));
        }
        if self.catalog.is_empty() {
            return Err(MetanetError::InvalidConfig("domain catalog is empty".to_string()));
        }
        Ok(())
    }

    /// Longest interval the generator can ever draw.
    pub fn largest_interval(&self) -> u32 {
        if self.max_interval > self.min_interval {
            self.max_interval - 1
        } else {
            self.min_interval
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.generator.validate().is_ok());
        assert_eq!(config.generator.catalog.len(), 17);
        assert_eq!(config.generator.largest_interval(), 599);
    }

    #[test]
    fn test_invalid_generator_config() {
        let config = GeneratorConfig::default().with_interval_range(600, 60);
        assert!(matches!(config.validate(), Err(MetanetError::InvalidConfig(_))));

        let config = GeneratorConfig::default().with_interval_range(0, 60);
        assert!(config.validate().is_err());

        let mut config = GeneratorConfig::default();
        config.catalog.clear();
        assert!(config.validate().is_err());

        let mut config = GeneratorConfig::default();
        config.density_upper_bound = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fixed_interval_range() {
        let config = GeneratorConfig::default().with_interval_range(120, 120);
        assert!(config.validate().is_ok());
        assert_eq!(config.largest_interval(), 120);
    }

    #[test]
    fn test_config_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("metanet-config-{}.json", uuid::Uuid::new_v4()));
        let path = path.to_string_lossy().to_string();

        let config = Config::default();
        config.to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.generator.catalog, config.generator.catalog);
        assert_eq!(loaded.classifier.ads_hosts_path, config.classifier.ads_hosts_path);
    }
}
