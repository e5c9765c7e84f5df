//! Engine configuration.
//!
//! Consolidates the environment variables the engine reads and validates them
//! once, up front.

use crate::points::PlacementPoints;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable present but unusable
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },

    /// Required variable absent
    #[error("Missing required variable {var}")]
    MissingRequired { var: String },
}

/// Upper bound for card and ban durations
pub const MAX_SANCTION_DAYS: i64 = 3650;

/// Tunables for tournament progression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Placement to points table shared by both circuit phases
    pub placement_points: PlacementPoints,
    /// Length of gauntlet series
    pub series_best_of: u32,
    /// How many times a conflicting commit is retried before giving up
    pub max_commit_attempts: u32,
    /// How long a yellow card stays active
    pub yellow_card_days: i64,
    /// Ban length for red cards and double yellows
    pub ban_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            placement_points: PlacementPoints::default(),
            series_best_of: 3,
            max_commit_attempts: 3,
            yellow_card_days: 7,
            ban_days: 2,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// - `TOURNEY_PLACEMENT_POINTS`: comma separated table (default: `4,3,2,1`)
    /// - `TOURNEY_SERIES_BEST_OF`: odd series length (default: 3)
    /// - `TOURNEY_COMMIT_ATTEMPTS`: optimistic retry budget (default: 3)
    /// - `TOURNEY_YELLOW_CARD_DAYS`: yellow card lifetime (default: 7)
    /// - `TOURNEY_BAN_DAYS`: ban length (default: 2)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if any variable fails to parse or
    /// validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let placement_points = match lookup("TOURNEY_PLACEMENT_POINTS") {
            Some(raw) => parse_points_table(&raw)?,
            None => defaults.placement_points,
        };

        let series_best_of = parse_or(&lookup, "TOURNEY_SERIES_BEST_OF", defaults.series_best_of)?;
        if series_best_of == 0 || series_best_of % 2 == 0 {
            return Err(ConfigError::Invalid {
                var: "TOURNEY_SERIES_BEST_OF".to_string(),
                reason: "Must be an odd number of games".to_string(),
            });
        }

        let max_commit_attempts =
            parse_or(&lookup, "TOURNEY_COMMIT_ATTEMPTS", defaults.max_commit_attempts)?;
        if max_commit_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "TOURNEY_COMMIT_ATTEMPTS".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        let yellow_card_days =
            parse_or(&lookup, "TOURNEY_YELLOW_CARD_DAYS", defaults.yellow_card_days)?;
        let ban_days = parse_or(&lookup, "TOURNEY_BAN_DAYS", defaults.ban_days)?;
        for (var, value) in [
            ("TOURNEY_YELLOW_CARD_DAYS", yellow_card_days),
            ("TOURNEY_BAN_DAYS", ban_days),
        ] {
            if !(1..=MAX_SANCTION_DAYS).contains(&value) {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: format!("Must be between 1 and {MAX_SANCTION_DAYS} days"),
                });
            }
        }

        Ok(Self {
            placement_points,
            series_best_of,
            max_commit_attempts,
            yellow_card_days,
            ban_days,
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: var.to_string(),
            reason: format!("Could not parse {raw:?}"),
        }),
        None => Ok(default),
    }
}

fn parse_points_table(raw: &str) -> Result<PlacementPoints, ConfigError> {
    let points = raw
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ConfigError::Invalid {
            var: "TOURNEY_PLACEMENT_POINTS".to_string(),
            reason: format!("Expected comma separated integers, got {raw:?}"),
        })?;

    if points.is_empty() || points.windows(2).any(|w| w[0] < w[1]) {
        return Err(ConfigError::Invalid {
            var: "TOURNEY_PLACEMENT_POINTS".to_string(),
            reason: "Points must be non-increasing by placement".to_string(),
        });
    }

    Ok(PlacementPoints::new(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = EngineConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.placement_points.as_slice(), &[4, 3, 2, 1]);
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("TOURNEY_PLACEMENT_POINTS", "10, 6, 3"),
            ("TOURNEY_SERIES_BEST_OF", "5"),
            ("TOURNEY_COMMIT_ATTEMPTS", "8"),
            ("TOURNEY_BAN_DAYS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.placement_points.as_slice(), &[10, 6, 3]);
        assert_eq!(config.series_best_of, 5);
        assert_eq!(config.max_commit_attempts, 8);
        assert_eq!(config.ban_days, 3);
        assert_eq!(config.yellow_card_days, 7);
    }

    #[test]
    fn test_even_best_of_rejected() {
        let err = EngineConfig::from_lookup(lookup_from(&[("TOURNEY_SERIES_BEST_OF", "4")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "TOURNEY_SERIES_BEST_OF"));
    }

    #[test]
    fn test_increasing_points_table_rejected() {
        let err = EngineConfig::from_lookup(lookup_from(&[("TOURNEY_PLACEMENT_POINTS", "1,2")]))
            .unwrap_err();
        assert!(err.to_string().contains("non-increasing"));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(
            EngineConfig::from_lookup(lookup_from(&[("TOURNEY_COMMIT_ATTEMPTS", "many")])).is_err()
        );
        assert!(EngineConfig::from_lookup(lookup_from(&[("TOURNEY_COMMIT_ATTEMPTS", "0")])).is_err());
        assert!(EngineConfig::from_lookup(lookup_from(&[("TOURNEY_BAN_DAYS", "-1")])).is_err());
        assert!(
            EngineConfig::from_lookup(lookup_from(&[("TOURNEY_YELLOW_CARD_DAYS", "99999")]))
                .is_err()
        );
    }
}
