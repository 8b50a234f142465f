use crate::error::{SettlementError, SettlementResult};
use serde::{Deserialize, Serialize};

/// Tuning knobs for one settlement run.
///
/// Page size (how many aggregates one ledger query returns) and chunk
/// size (how many settlements one write transaction covers) are
/// independent; they only happen to share a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    pub page_size: u32,
    pub chunk_size: usize,
    /// Upper bound on per-seller diff rows reported on a verification
    /// mismatch, worst offenders first.
    pub mismatch_report_limit: u32,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            chunk_size: 100,
            mismatch_report_limit: 10,
        }
    }
}

impl SettlementConfig {
    /// Load from a JSON file. Missing fields fall back to defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SettlementResult<()> {
        if self.page_size == 0 {
            return Err(SettlementError::InvalidConfig {
                reason: "page_size must be at least 1".into(),
            });
        }
        if self.chunk_size == 0 {
            return Err(SettlementError::InvalidConfig {
                reason: "chunk_size must be at least 1".into(),
            });
        }
        if self.mismatch_report_limit == 0 {
            return Err(SettlementError::InvalidConfig {
                reason: "mismatch_report_limit must be at least 1".into(),
            });
        }
        Ok(())
    }
}
