use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::calendar::Calendar;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub stats: StatsConfig,
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// IANA time zone whose calendar is used to bucket hits
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Extra crawler signatures checked before the built-in database
    #[serde(default)]
    pub signatures: Vec<String>,
    #[serde(default = "ClassifierConfig::default_cache_capacity")]
    pub cache_capacity: u64,
}

impl ClassifierConfig {
    const fn default_cache_capacity() -> u64 {
        10_000
    }
}

impl DatabaseConfig {
    const fn default_max_connections() -> u32 {
        5
    }
}

impl StatsConfig {
    /// Falls back to UTC when the configured zone is unknown
    pub fn calendar(&self) -> Calendar {
        match self.timezone.parse::<Tz>() {
            Ok(tz) => Calendar::new(tz),
            Err(_) => {
                tracing::warn!(
                    "Unknown STATS_TIMEZONE '{}', falling back to UTC",
                    self.timezone
                );
                Calendar::utc()
            }
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            _ => DatabaseBackend::Sqlite,
        };

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./redirect-hits.db".to_string());

        let max_connections = match std::env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(value) => value.parse::<u32>()?,
            Err(_) => DatabaseConfig::default_max_connections(),
        };

        let timezone = std::env::var("STATS_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());

        let signatures = std::env::var("CRAWLER_SIGNATURES")
            .map(|v| parse_signatures(&v))
            .unwrap_or_default();

        let cache_capacity = std::env::var("CLASSIFIER_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(ClassifierConfig::default_cache_capacity);

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            stats: StatsConfig { timezone },
            classifier: ClassifierConfig {
                signatures,
                cache_capacity,
            },
        })
    }
}

fn parse_signatures(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_signatures() {
        assert_eq!(
            parse_signatures(" LinkChecker, ,UptimeProbe,"),
            vec!["LinkChecker".to_string(), "UptimeProbe".to_string()]
        );
        assert!(parse_signatures("").is_empty());
    }

    #[test]
    fn test_calendar_from_timezone() {
        let stats = StatsConfig {
            timezone: "Europe/Amsterdam".to_string(),
        };
        assert_eq!(stats.calendar().timezone(), Tz::Europe__Amsterdam);

        let stats = StatsConfig {
            timezone: "Mars/Olympus_Mons".to_string(),
        };
        assert_eq!(stats.calendar().timezone(), Tz::UTC);
    }
}
