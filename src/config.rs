use std::num::NonZeroUsize;

use crate::error::{ProfileError, Result};

pub const DEFAULT_MAX_DETAIL_VALUES: usize = 35;

/// Settings consumed by the profiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileConfig {
    skip_rows: usize,
    max_detail_values: NonZeroUsize,
    sample_percent: Option<u8>,
    seed: Option<u64>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            skip_rows: 0,
            max_detail_values: NonZeroUsize::new(DEFAULT_MAX_DETAIL_VALUES)
                .unwrap_or(NonZeroUsize::MIN),
            sample_percent: None,
            seed: None,
        }
    }
}

impl ProfileConfig {
    /// Rows preceding the header row.
    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = skip_rows;
        self
    }

    /// Longest detail table to produce; must be at least 1.
    pub fn with_max_detail_values(mut self, max_detail_values: usize) -> Result<Self> {
        self.max_detail_values = NonZeroUsize::new(max_detail_values).ok_or_else(|| {
            ProfileError::invalid_input("max detail values must be at least 1")
        })?;
        Ok(self)
    }

    /// Keep only this percentage of rows, chosen at random; 1 through 99.
    pub fn with_sample_percent(mut self, sample_percent: Option<u8>) -> Result<Self> {
        if let Some(percent) = sample_percent {
            if !(1..=99).contains(&percent) {
                return Err(ProfileError::invalid_input(format!(
                    "sample percent must be between 1 and 99, got {percent}"
                )));
            }
        }
        self.sample_percent = sample_percent;
        Ok(self)
    }

    /// Seed the row sampler for repeatable runs.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn skip_rows(&self) -> usize {
        self.skip_rows
    }

    pub fn max_detail_values(&self) -> usize {
        self.max_detail_values.get()
    }

    pub fn sample_percent(&self) -> Option<u8> {
        self.sample_percent
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProfileConfig::default();
        assert_eq!(config.skip_rows(), 0);
        assert_eq!(config.max_detail_values(), DEFAULT_MAX_DETAIL_VALUES);
        assert_eq!(config.sample_percent(), None);
        assert_eq!(config.seed(), None);
    }

    #[test]
    fn test_zero_detail_values_rejected() {
        let err = ProfileConfig::default().with_max_detail_values(0).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_sample_percent_range() {
        assert!(ProfileConfig::default().with_sample_percent(Some(0)).is_err());
        assert!(ProfileConfig::default().with_sample_percent(Some(100)).is_err());
        let config = ProfileConfig::default()
            .with_sample_percent(Some(99))
            .unwrap();
        assert_eq!(config.sample_percent(), Some(99));
        assert!(ProfileConfig::default().with_sample_percent(None).is_ok());
    }
}
