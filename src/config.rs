use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::props::PropMarket;

const CONFIG_DIR: &str = "gridiron_edge";
const CONFIG_FILE: &str = "model_config.json";

/// Every weight, damping factor and threshold the predictors read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub strength: StrengthWeights,
    pub spread: SpreadParams,
    pub totals: TotalsParams,
    pub props: PropParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrengthWeights {
    pub offense: f64,
    pub defense: f64,
    pub turnovers: f64,
    pub recent_form: f64,
    pub home_field: f64,
    pub injury: f64,
}

impl Default for StrengthWeights {
    fn default() -> Self {
        Self {
            offense: 0.25,
            defense: 0.25,
            turnovers: 0.15,
            recent_form: 0.15,
            home_field: 0.10,
            injury: 0.10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadParams {
    pub rating_dampening: f64,
    pub home_field_advantage: f64,
    pub division_dampening: f64,
    pub edge_min: f64,
    pub edge_max: f64,
    pub min_confidence: f64,
    pub strength_gap_divisor: f64,
    pub consistency_k: f64,
    pub weight_strength: f64,
    pub weight_consistency: f64,
    pub weight_record: f64,
    pub moneyline_min_confidence: f64,
    pub moneyline_max_market_spread: f64,
    pub moneyline_min_margin: f64,
}

impl Default for SpreadParams {
    fn default() -> Self {
        Self {
            rating_dampening: 0.85,
            home_field_advantage: 2.5,
            division_dampening: 0.90,
            edge_min: 2.5,
            edge_max: 7.5,
            min_confidence: 65.0,
            strength_gap_divisor: 20.0,
            consistency_k: 2.0,
            weight_strength: 0.50,
            weight_consistency: 0.30,
            weight_record: 0.20,
            moneyline_min_confidence: 85.0,
            moneyline_max_market_spread: 2.0,
            moneyline_min_margin: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TotalsParams {
    pub blend: TotalsBlend,
    pub edge_min: f64,
    pub edge_max: f64,
    pub min_confidence: f64,
    pub consistency_k: f64,
    pub full_sample_games: f64,
    pub weight_data_quality: f64,
    pub weight_sample_size: f64,
    pub weight_consistency: f64,
}

impl Default for TotalsParams {
    fn default() -> Self {
        Self {
            blend: TotalsBlend::default(),
            edge_min: 3.0,
            edge_max: 10.0,
            min_confidence: 60.0,
            consistency_k: 3.0,
            full_sample_games: 8.0,
            weight_data_quality: 0.40,
            weight_sample_size: 0.30,
            weight_consistency: 0.30,
        }
    }
}

/// Weights of the six "base + adjustment" variants that make up a predicted total.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TotalsBlend {
    pub base: f64,
    pub offensive: f64,
    pub defensive: f64,
    pub pace: f64,
    pub competitiveness: f64,
    pub rating: f64,
}

impl Default for TotalsBlend {
    fn default() -> Self {
        Self {
            base: 0.30,
            offensive: 0.20,
            defensive: 0.20,
            pace: 0.15,
            competitiveness: 0.10,
            rating: 0.05,
        }
    }
}

impl TotalsBlend {
    pub fn sum(&self) -> f64 {
        self.base + self.offensive + self.defensive + self.pace + self.competitiveness + self.rating
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PropParams {
    pub min_edge: f64,
    pub opponent_damping: f64,
    pub opponent_ratio_min: f64,
    pub opponent_ratio_max: f64,
    pub full_sample_games: f64,
    pub anytime_td_default_line: f64,
    pub priors: HashMap<PropMarket, MarketPrior>,
}

impl Default for PropParams {
    fn default() -> Self {
        Self {
            min_edge: 0.05,
            opponent_damping: 0.6,
            opponent_ratio_min: 0.7,
            opponent_ratio_max: 1.3,
            full_sample_games: 8.0,
            anytime_td_default_line: 0.5,
            priors: PropMarket::ALL
                .iter()
                .map(|m| (*m, MarketPrior::builtin(*m)))
                .collect(),
        }
    }
}

impl PropParams {
    /// Configured prior for the market, or the built-in one if the file left it out.
    pub fn prior(&self, market: PropMarket) -> MarketPrior {
        self.priors
            .get(&market)
            .copied()
            .unwrap_or_else(|| MarketPrior::builtin(market))
    }
}

/// League-average per-game mean and a fixed spread for one prop market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketPrior {
    pub league_mean: f64,
    pub stdev: f64,
}

impl MarketPrior {
    pub fn builtin(market: PropMarket) -> Self {
        let (league_mean, stdev) = match market {
            PropMarket::PassYds => (225.0, 60.0),
            PropMarket::PassTds => (1.4, 0.9),
            PropMarket::PassCompletions => (21.0, 4.5),
            PropMarket::PassAttempts => (33.0, 5.5),
            PropMarket::RushYds => (55.0, 25.0),
            PropMarket::RushAttempts => (13.0, 4.5),
            PropMarket::ReceptionYds => (45.0, 22.0),
            PropMarket::Receptions => (4.0, 1.8),
            PropMarket::AnytimeTd => (0.35, 0.55),
        };
        Self { league_mean, stdev }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.spread.edge_min <= self.spread.edge_max,
            "spread edge band is inverted"
        );
        ensure!(
            self.totals.edge_min <= self.totals.edge_max,
            "totals edge band is inverted"
        );
        ensure!(
            self.spread.strength_gap_divisor > 0.0,
            "spread strength_gap_divisor must be positive"
        );
        ensure!(
            self.totals.full_sample_games > 0.0 && self.props.full_sample_games > 0.0,
            "full sample game counts must be positive"
        );
        ensure!(
            self.props.opponent_ratio_min <= self.props.opponent_ratio_max,
            "prop opponent ratio clamp is inverted"
        );
        ensure!(
            (self.totals.blend.sum() - 1.0).abs() < 1e-6,
            "totals blend weights must sum to 1, got {}",
            self.totals.blend.sum()
        );
        for (market, prior) in &self.props.priors {
            ensure!(
                prior.stdev >= 0.0,
                "negative stdev for {}",
                market.key()
            );
        }
        Ok(())
    }
}

/// Reads a config file; anything missing, unreadable or invalid yields the defaults.
pub fn load_config(path: &Path) -> ModelConfig {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "no model config, using defaults");
            return ModelConfig::default();
        }
    };
    let cfg = match serde_json::from_str::<ModelConfig>(&raw) {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "model config unparseable, using defaults");
            return ModelConfig::default();
        }
    };
    if let Err(err) = cfg.validate() {
        tracing::warn!(path = %path.display(), %err, "model config rejected, using defaults");
        return ModelConfig::default();
    }
    cfg
}

pub fn load_config_from_env() -> ModelConfig {
    match config_path() {
        Some(path) => load_config(&path),
        None => ModelConfig::default(),
    }
}

pub fn save_config(cfg: &ModelConfig, path: &Path) -> Result<()> {
    cfg.validate()?;
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(cfg).context("serialize model config")?;
    fs::write(&tmp, json).context("write model config")?;
    fs::rename(&tmp, path).context("swap model config")?;
    Ok(())
}

pub fn config_path() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var("GRIDIRON_MODEL_CONFIG") {
        if !explicit.trim().is_empty() {
            return Some(PathBuf::from(explicit));
        }
    }
    app_cache_dir().map(|dir| dir.join(CONFIG_FILE))
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CONFIG_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CONFIG_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("gridiron_edge_{}_{}", std::process::id(), name));
        path
    }

    #[test]
    fn defaults_are_valid() {
        ModelConfig::default().validate().unwrap();
        assert!((TotalsBlend::default().sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let raw = r#"{ "spread": { "home_field_advantage": 1.5 } }"#;
        let cfg: ModelConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.spread.home_field_advantage, 1.5);
        assert_eq!(cfg.spread.rating_dampening, 0.85);
        assert_eq!(cfg.totals.edge_min, 3.0);
        assert_eq!(
            cfg.props.prior(PropMarket::RushYds),
            MarketPrior::builtin(PropMarket::RushYds)
        );
    }

    #[test]
    fn save_then_load_keeps_overrides() {
        let path = scratch_path("roundtrip.json");
        let mut cfg = ModelConfig::default();
        cfg.totals.min_confidence = 55.0;
        save_config(&cfg, &path).unwrap();
        let loaded = load_config(&path);
        assert_eq!(loaded.totals.min_confidence, 55.0);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let path = scratch_path("inverted.json");
        fs::write(&path, r#"{ "spread": { "edge_min": 9.0, "edge_max": 1.0 } }"#).unwrap();
        let loaded = load_config(&path);
        assert_eq!(loaded.spread.edge_min, 2.5);
        let _ = fs::remove_file(path);

        let missing = scratch_path("missing.json");
        assert_eq!(load_config(&missing).spread.edge_max, 7.5);
    }
}
