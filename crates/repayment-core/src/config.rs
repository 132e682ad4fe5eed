use serde::{Deserialize, Serialize};

/// Knobs for the payment flow. Every field has a default so partial config
/// files are accepted; unknown keys are rejected.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RepaymentConfig {
    /// Days after the due date in which a payoff still counts as "within grace".
    #[serde(default = "default_grace_period_days")]
    pub grace_period_days: i64,
    #[serde(default = "default_notify_overpayment")]
    pub notify_overpayment: bool,
    #[serde(default = "default_cashback_check_enabled")]
    pub cashback_check_enabled: bool,
}

impl Default for RepaymentConfig {
    fn default() -> Self {
        RepaymentConfig {
            grace_period_days: default_grace_period_days(),
            notify_overpayment: default_notify_overpayment(),
            cashback_check_enabled: default_cashback_check_enabled(),
        }
    }
}

fn default_grace_period_days() -> i64 {
    5
}

fn default_notify_overpayment() -> bool {
    true
}

fn default_cashback_check_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let cfg: RepaymentConfig = serde_json::from_str(r#"{"grace_period_days": 3}"#).unwrap();
        assert_eq!(cfg.grace_period_days, 3);
        assert!(cfg.notify_overpayment);
        assert!(cfg.cashback_check_enabled);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let res: Result<RepaymentConfig, _> = serde_json::from_str(r#"{"grace_days": 3}"#);
        assert!(res.is_err());
    }
}
