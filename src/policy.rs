use serde::{Deserialize, Serialize};

/// Slack applied to every inclusive threshold so 47.5 - 44.5 still clears a 3.0 band.
pub const TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Recommend,
    EdgeTooSmall,
    LowConfidence,
    /// Edge so large the model is more likely wrong than the market.
    Unrealistic,
}

impl Verdict {
    pub fn is_recommend(self) -> bool {
        matches!(self, Verdict::Recommend)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeBand {
    pub min: f64,
    pub max: f64,
    pub min_confidence: f64,
}

impl EdgeBand {
    pub fn judge(&self, edge: f64, confidence: f64) -> Verdict {
        if !edge.is_finite() {
            return Verdict::Unrealistic;
        }
        if edge > self.max + TOLERANCE {
            Verdict::Unrealistic
        } else if !at_least(edge, self.min) {
            Verdict::EdgeTooSmall
        } else if !at_least(confidence, self.min_confidence) {
            Verdict::LowConfidence
        } else {
            Verdict::Recommend
        }
    }
}

pub fn at_least(value: f64, threshold: f64) -> bool {
    value >= threshold - TOLERANCE
}

pub fn spread_tier(confidence: f64) -> &'static str {
    if at_least(confidence, 75.0) {
        "STRONG BET"
    } else if at_least(confidence, 65.0) {
        "GOOD BET"
    } else if at_least(confidence, 50.0) {
        "VALUE BET"
    } else {
        "PASS"
    }
}

pub fn totals_tier(confidence: f64) -> &'static str {
    if at_least(confidence, 75.0) {
        "HIGH CONFIDENCE"
    } else if at_least(confidence, 65.0) {
        "GOOD CONFIDENCE"
    } else if at_least(confidence, 55.0) {
        "MODERATE CONFIDENCE"
    } else {
        "LOW CONFIDENCE"
    }
}

pub fn prop_tier(confidence: f64) -> &'static str {
    if at_least(confidence, 75.0) {
        "STRONG"
    } else if at_least(confidence, 65.0) {
        "GOOD"
    } else {
        "VALUE"
    }
}

/// Reason text for a verdict that did not end in a pick.
pub fn pass_reason(verdict: Verdict, edge: f64, confidence: f64, band: &EdgeBand) -> String {
    match verdict {
        Verdict::Recommend => String::new(),
        Verdict::EdgeTooSmall => format!(
            "PASS: edge {edge:.1} is below the {:.1} point threshold.",
            band.min
        ),
        Verdict::LowConfidence => format!(
            "PASS: confidence {confidence:.0}% is below the {:.0}% floor.",
            band.min_confidence
        ),
        Verdict::Unrealistic => format!(
            "PASS: edge {edge:.1} exceeds {:.1} points, likely a model error or missing information.",
            band.max
        ),
    }
}
