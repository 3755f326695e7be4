//! Configuration for a RangePlasma deployment.

use serde::{Deserialize, Serialize};

use crate::{PlasmaError, Result, constants};

/// Timing parameters, measured in host-ledger blocks, never wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlasmaConfig {
    /// Minimum host blocks between two block submissions.
    pub block_time: u64,
    /// Host blocks an exit must stay open before it can be finalized.
    pub challenge_period: u64,
}

impl Default for PlasmaConfig {
    fn default() -> Self {
        Self {
            block_time: constants::DEFAULT_BLOCK_TIME,
            challenge_period: constants::DEFAULT_CHALLENGE_PERIOD,
        }
    }
}

impl PlasmaConfig {
    /// Reject configurations that would let exits finalize unchallenged.
    pub fn validate(&self) -> Result<()> {
        if self.challenge_period == 0 {
            return Err(PlasmaError::Configuration(
                "challenge_period must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON config document.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = PlasmaConfig::default();
        assert_eq!(cfg.block_time, 10);
        assert_eq!(cfg.challenge_period, 20);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_challenge_period_rejected() {
        let cfg = PlasmaConfig {
            block_time: 1,
            challenge_period: 0,
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, PlasmaError::Configuration(_)));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg = PlasmaConfig::from_json(r#"{"block_time": 3}"#).unwrap();
        assert_eq!(cfg.block_time, 3);
        assert_eq!(cfg.challenge_period, 20);
    }

    #[test]
    fn invalid_json_is_serialization_error() {
        let err = PlasmaConfig::from_json("{").unwrap_err();
        assert!(matches!(err, PlasmaError::Serialization(_)));
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = PlasmaConfig {
            block_time: 4,
            challenge_period: 7,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: PlasmaConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
