use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where the cut card may be placed, as fractions of the full shoe size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub fraction: f64,
    pub tolerance: f64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        MarkerConfig {
            fraction: 0.25,
            tolerance: 0.05,
        }
    }
}

impl MarkerConfig {
    /// The inclusive range of valid marker offsets for a shoe holding `size` cards.
    pub fn window(&self, size: usize) -> (usize, usize) {
        let centre = (size as f64 * self.fraction).floor() as usize;
        let spread = (size as f64 * self.tolerance).floor() as usize;
        (centre.saturating_sub(spread), usize::min(size, centre + spread))
    }
}

/// Every rule and limit the round state machine consults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub min_bet: f64,
    pub max_bet: f64,
    pub num_decks: usize,
    pub num_positions: usize,
    pub max_bets_per_player: usize,
    pub max_splits: usize,
    pub dealer_hits_soft_17: bool,
    pub surrender: bool,
    pub insurance: bool,
    pub blackjack_payout: f64,
    /// Totals a player may double down on, `None` allows any total.
    pub double_down_totals: Option<Vec<u32>>,
    pub marker: MarkerConfig,
    pub shuffle_passes: u32,
    pub seed: Option<u64>,
    /// Upper bound on re-asking a policy for the same decision, `None` asks forever.
    pub decision_retry_limit: Option<u32>,
    pub max_rounds: Option<u32>,
    pub house_balance: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            min_bet: 5.0,
            max_bet: 500.0,
            num_decks: 6,
            num_positions: 7,
            max_bets_per_player: 3,
            max_splits: 3,
            dealer_hits_soft_17: false,
            surrender: true,
            insurance: true,
            blackjack_payout: 1.5,
            double_down_totals: None,
            marker: MarkerConfig::default(),
            shuffle_passes: 7,
            seed: None,
            decision_retry_limit: None,
            max_rounds: None,
            house_balance: 1_000_000_000.0,
        }
    }
}

impl TableConfig {
    pub fn from_json_str(json: &str) -> Result<TableConfig, ConfigError> {
        let config: TableConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<TableConfig, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        TableConfig::from_json_str(&json)
    }

    /// Checks the limits are internally consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_bet > 0.0) || self.max_bet < self.min_bet {
            return Err(ConfigError::Invalid(format!(
                "bet limits {:.2}..{:.2} are not a valid range",
                self.min_bet, self.max_bet
            )));
        }
        if self.num_decks == 0 {
            return Err(ConfigError::Invalid("a shoe needs at least one deck".into()));
        }
        if self.num_positions == 0 || self.max_bets_per_player == 0 {
            return Err(ConfigError::Invalid(
                "the table needs at least one betting position".into(),
            ));
        }
        if !(self.blackjack_payout > 0.0) {
            return Err(ConfigError::Invalid(
                "blackjack payout must be positive".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.marker.fraction)
            || self.marker.tolerance < 0.0
            || self.marker.tolerance > self.marker.fraction
        {
            return Err(ConfigError::Invalid(format!(
                "marker window {} +/- {} is not inside the shoe",
                self.marker.fraction, self.marker.tolerance
            )));
        }
        Ok(())
    }

    pub fn can_double_on(&self, soft_sum: u32, hard_sum: u32) -> bool {
        match &self.double_down_totals {
            Some(totals) => totals.contains(&soft_sum) || totals.contains(&hard_sum),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_window_for_six_decks() {
        let marker = MarkerConfig::default();
        // 312 cards: centre 78, spread 15
        assert_eq!(marker.window(312), (63, 93));
        assert_eq!(marker.window(52), (11, 15));
    }

    #[test]
    fn json_overrides_defaults() {
        let config = TableConfig::from_json_str(
            r#"{ "num_decks": 2, "dealer_hits_soft_17": true, "double_down_totals": [9, 10, 11] }"#,
        )
        .unwrap();
        assert_eq!(config.num_decks, 2);
        assert!(config.dealer_hits_soft_17);
        assert_eq!(config.min_bet, 5.0);
        assert!(config.can_double_on(10, 10));
        assert!(config.can_double_on(9, 19));
        assert!(!config.can_double_on(12, 12));
    }

    #[test]
    fn invalid_limits_are_rejected() {
        assert!(TableConfig::from_json_str(r#"{ "min_bet": 50, "max_bet": 10 }"#).is_err());
        assert!(TableConfig::from_json_str(r#"{ "num_decks": 0 }"#).is_err());
        assert!(TableConfig::from_json_str("not json").is_err());
    }
}
