//! Light configuration.
//!
//! A light draws every cycle uniformly from `{cycle_min, cycle_min + cycle_step, ..., cycle_max}` and checks
//! the elapsed time once per `poll_interval`. The defaults reproduce a light that switches every 4, 5 or 6
//! seconds, polled every millisecond.

use std::fs;
use std::path::Path;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration of a `TrafficLight`.
///
/// Durations are stored in milliseconds so that the JSON form stays flat:
///
/// ```json
/// { "cycle_min_ms": 4000, "cycle_max_ms": 6000, "cycle_step_ms": 1000, "poll_interval_ms": 1, "seed": 7 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightConfig {
    /// Shortest possible cycle
    pub cycle_min_ms: u64,
    /// Longest possible cycle
    pub cycle_max_ms: u64,
    /// Distance between two possible cycle lengths
    pub cycle_step_ms: u64,
    /// How often the cycle loop checks the elapsed time
    pub poll_interval_ms: u64,
    /// Seed for the cycle length generator. `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for LightConfig {
    fn default() -> Self {
        LightConfig {
            cycle_min_ms: 4_000,
            cycle_max_ms: 6_000,
            cycle_step_ms: 1_000,
            poll_interval_ms: 1,
            seed: None,
        }
    }
}

impl LightConfig {
    /// Creates a `LightConfigBuilder` starting from the defaults.
    pub fn builder() -> LightConfigBuilder {
        LightConfigBuilder {
            config: LightConfig::default(),
        }
    }

    /// Parses and validates a JSON configuration. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: LightConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Checks that the cycle range can be drawn from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("cycle_min_ms", self.cycle_min_ms),
            ("cycle_step_ms", self.cycle_step_ms),
            ("poll_interval_ms", self.poll_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDuration { field });
            }
        }
        if self.cycle_min_ms > self.cycle_max_ms {
            return Err(ConfigError::InvalidRange {
                min_ms: self.cycle_min_ms,
                max_ms: self.cycle_max_ms,
            });
        }
        if (self.cycle_max_ms - self.cycle_min_ms) % self.cycle_step_ms != 0 {
            return Err(ConfigError::MisalignedStep {
                min_ms: self.cycle_min_ms,
                max_ms: self.cycle_max_ms,
                step_ms: self.cycle_step_ms,
            });
        }
        Ok(())
    }

    /// Returns the poll interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the cycle distribution described by this configuration.
    pub fn timing(&self) -> CycleTiming {
        CycleTiming {
            min_ms: self.cycle_min_ms,
            steps: (self.cycle_max_ms - self.cycle_min_ms) / self.cycle_step_ms,
            step_ms: self.cycle_step_ms,
        }
    }

    /// Creates the generator a light draws its cycles from.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// A builder for `LightConfig`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use trafficlight_lib::config::LightConfig;
///
/// let config = LightConfig::builder()
///     .cycle_range(Duration::from_millis(20), Duration::from_millis(40))
///     .cycle_step(Duration::from_millis(10))
///     .seed(42)
///     .build()
///     .unwrap();
/// assert_eq!(config.cycle_max_ms, 40);
/// ```
pub struct LightConfigBuilder {
    config: LightConfig,
}

impl LightConfigBuilder {
    /// Sets the shortest and longest cycle.
    pub fn cycle_range(mut self, min: Duration, max: Duration) -> Self {
        self.config.cycle_min_ms = as_millis(min);
        self.config.cycle_max_ms = as_millis(max);
        self
    }

    /// Sets the distance between two possible cycle lengths.
    pub fn cycle_step(mut self, step: Duration) -> Self {
        self.config.cycle_step_ms = as_millis(step);
        self
    }

    /// Sets how often the cycle loop checks the elapsed time.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval_ms = as_millis(interval);
        self
    }

    /// Makes the cycle lengths reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<LightConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// A uniform distribution over evenly spaced cycle lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTiming {
    min_ms: u64,
    steps: u64,
    step_ms: u64,
}

impl CycleTiming {
    /// Draws the length of the next cycle.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let step = rng.gen_range(0..=self.steps);
        Duration::from_millis(self.min_ms + step * self.step_ms)
    }

    /// Returns the shortest cycle that can be drawn.
    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    /// Returns the longest cycle that can be drawn.
    pub fn max(&self) -> Duration {
        Duration::from_millis(self.min_ms + self.steps * self.step_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::Write;

    #[test]
    fn test_default_draws_four_to_six_seconds() {
        let config = LightConfig::default();
        config.validate().unwrap();
        let timing = config.timing();
        let mut rng = StdRng::seed_from_u64(1);
        let drawn: HashSet<_> = (0..300).map(|_| timing.draw(&mut rng)).collect();
        let expected: HashSet<_> = [4, 5, 6].into_iter().map(Duration::from_secs).collect();
        assert_eq!(drawn, expected);
        assert_eq!(timing.min(), Duration::from_secs(4));
        assert_eq!(timing.max(), Duration::from_secs(6));
    }

    #[test]
    fn test_seeded_draws_are_reproducible() {
        let config = LightConfig::builder().seed(99).build().unwrap();
        let timing = config.timing();
        let (mut a, mut b) = (config.rng(), config.rng());
        let first: Vec<_> = (0..20).map(|_| timing.draw(&mut a)).collect();
        let second: Vec<_> = (0..20).map(|_| timing.draw(&mut b)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fixed_cycle() {
        let config = LightConfig::builder()
            .cycle_range(Duration::from_millis(30), Duration::from_millis(30))
            .build()
            .unwrap();
        let mut rng = config.rng();
        assert_eq!(config.timing().draw(&mut rng), Duration::from_millis(30));
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = LightConfig::from_json(r#"{ "seed": 3, "poll_interval_ms": 5 }"#).unwrap();
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.poll_interval(), Duration::from_millis(5));
        assert_eq!(config.cycle_min_ms, 4_000);
        assert_eq!(config.cycle_max_ms, 6_000);
    }

    #[test]
    fn test_from_json_rejects_unknown_fields() {
        let err = LightConfig::from_json(r#"{ "cycle_seconds": 5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let err = LightConfig::builder()
            .cycle_range(Duration::from_secs(6), Duration::from_secs(4))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidRange {
                min_ms: 6_000,
                max_ms: 4_000
            }
        ));

        let err = LightConfig::builder()
            .poll_interval(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ZeroDuration {
                field: "poll_interval_ms"
            }
        ));

        let err = LightConfig::builder()
            .cycle_step(Duration::from_millis(700))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MisalignedStep { step_ms: 700, .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "cycle_min_ms": 100, "cycle_max_ms": 300, "cycle_step_ms": 100 }}"#)
            .unwrap();
        let config = LightConfig::load(file.path()).unwrap();
        assert_eq!(config.timing().max(), Duration::from_millis(300));

        let err = LightConfig::load(file.path().with_extension("missing")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
