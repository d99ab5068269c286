//! Analyzer configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// How surname variants that reduce to the same stem are consolidated.
///
/// Two slots such as `IVANOV` and `IVANOVA` collapse into one. Which form
/// survives depends on the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurnamePolicy {
    /// Male persons keep the stem (shortest form), female persons keep the
    /// longest form; nothing collapses while the sex is unknown.
    #[default]
    Gendered,
    /// Always keep the stem.
    PreferShortest,
    /// Always keep the longest form.
    PreferLongest,
}

/// Configuration for [`PersonAnalyzer`](crate::PersonAnalyzer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Only accept nominative-case name readings.
    pub nominative_case_always: bool,
    /// Documents list persons as "Surname Name Patronymic" (forms, registers).
    pub text_starts_with_lastname_firstname_middlename: bool,
    /// Characters between two progress callbacks.
    pub progress_quantum: usize,
    /// Nesting limit for recursive person matches (parentheticals, lists).
    pub max_depth: usize,
    /// Lowest coefficient accepted without corroboration.
    pub min_coefficient: i32,
    /// Upper bound for a candidate coefficient.
    pub max_coefficient: i32,
    /// Name items considered per match window.
    pub max_name_items: usize,
    /// Surname consolidation policy.
    pub surname_policy: SurnamePolicy,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            nominative_case_always: false,
            text_starts_with_lastname_firstname_middlename: false,
            progress_quantum: 100_000,
            max_depth: 2,
            min_coefficient: 2,
            max_coefficient: 20,
            max_name_items: 15,
            surname_policy: SurnamePolicy::Gendered,
        }
    }
}

impl AnalyzerConfig {
    /// Parses a JSON configuration; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the analyzer cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.progress_quantum == 0 {
            return Err(Error::config("progress_quantum must be positive"));
        }
        if self.max_name_items < 2 {
            return Err(Error::config("max_name_items must be at least 2"));
        }
        if self.min_coefficient > self.max_coefficient {
            return Err(Error::config(format!(
                "min_coefficient {} exceeds max_coefficient {}",
                self.min_coefficient, self.max_coefficient
            )));
        }
        Ok(())
    }

    /// Set nominative-only matching.
    #[must_use]
    pub fn with_nominative_case_always(mut self, on: bool) -> Self {
        self.nominative_case_always = on;
        self
    }

    /// Set the "Surname Name Patronymic" document convention.
    #[must_use]
    pub fn with_text_starts_with_lastname_firstname_middlename(mut self, on: bool) -> Self {
        self.text_starts_with_lastname_firstname_middlename = on;
        self
    }

    /// Set the progress quantum in characters.
    #[must_use]
    pub fn with_progress_quantum(mut self, chars: usize) -> Self {
        self.progress_quantum = chars;
        self
    }

    /// Set the recursion limit.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the surname policy.
    #[must_use]
    pub fn with_surname_policy(mut self, policy: SurnamePolicy) -> Self {
        self.surname_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = AnalyzerConfig::default();
        assert_eq!(c.progress_quantum, 100_000);
        assert_eq!(c.min_coefficient, 2);
        assert_eq!(c.surname_policy, SurnamePolicy::Gendered);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = AnalyzerConfig::from_json(r#"{"surname_policy": "prefer_longest", "max_depth": 4}"#)
            .expect("valid config");
        assert_eq!(c.surname_policy, SurnamePolicy::PreferLongest);
        assert_eq!(c.max_depth, 4);
        assert_eq!(c.max_name_items, 15);
    }

    #[test]
    fn rejects_zero_quantum() {
        let err = AnalyzerConfig::from_json(r#"{"progress_quantum": 0}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
