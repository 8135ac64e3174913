//! Probability and price helpers shared by the prop evaluator.

/// Standard normal CDF, Abramowitz & Stegun 26.2.17 (|error| < 7.5e-8).
///
/// Evaluated on |x| and mirrored, so `normal_cdf(-x) == 1 - normal_cdf(x)` holds exactly.
pub fn normal_cdf(x: f64) -> f64 {
    if x.is_nan() {
        return 0.5;
    }
    let z = x.abs();
    let upper = if z > 37.0 {
        0.0
    } else {
        let t = 1.0 / (1.0 + 0.231_641_9 * z);
        let poly = t
            * (0.319_381_530
                + t * (-0.356_563_782
                    + t * (1.781_477_937 + t * (-1.821_255_978 + t * 1.330_274_429))));
        let pdf = (-0.5 * z * z).exp() / (2.0 * std::f64::consts::PI).sqrt();
        pdf * poly
    };
    if x >= 0.0 { 1.0 - upper } else { upper }
}

/// Market-implied win probability of an American price.
pub fn american_to_implied(odds: f64) -> f64 {
    if odds >= 0.0 {
        100.0 / (odds + 100.0)
    } else {
        -odds / (-odds + 100.0)
    }
}

/// Profit on a one-unit stake. A price of exactly 0 is settled as even money.
pub fn profit_per_unit(odds: f64) -> f64 {
    if odds > 0.0 {
        odds / 100.0
    } else if odds < 0.0 {
        100.0 / -odds
    } else {
        1.0
    }
}

pub fn expected_value(prob: f64, odds: f64) -> f64 {
    prob * profit_per_unit(odds) - (1.0 - prob)
}

/// P(X > line) for X ~ N(mean, stdev). A degenerate spread collapses to 0 or 1.
pub fn prob_over(mean: f64, stdev: f64, line: f64) -> f64 {
    if !(stdev > 1e-9) {
        return if mean > line { 1.0 } else { 0.0 };
    }
    1.0 - normal_cdf((line - mean) / stdev)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdf_known_points() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.0) - 0.841_344_746).abs() < 1e-6);
        assert!((normal_cdf(-1.96) - 0.024_997_895).abs() < 1e-6);
        assert_eq!(normal_cdf(50.0), 1.0);
        assert_eq!(normal_cdf(-50.0), 0.0);
    }

    #[test]
    fn implied_probability_both_signs() {
        assert!((american_to_implied(100.0) - 0.5).abs() < 1e-12);
        assert!((american_to_implied(-110.0) - 110.0 / 210.0).abs() < 1e-12);
        assert!((american_to_implied(150.0) - 0.4).abs() < 1e-12);
        assert_eq!(american_to_implied(0.0), 1.0);
    }

    #[test]
    fn profit_and_ev() {
        assert_eq!(profit_per_unit(150.0), 1.5);
        assert!((profit_per_unit(-200.0) - 0.5).abs() < 1e-12);
        assert_eq!(profit_per_unit(0.0), 1.0);
        assert!((expected_value(0.55, 100.0) - 0.10).abs() < 1e-12);
        assert!((expected_value(0.5, -110.0) - (0.5 * 100.0 / 110.0 - 0.5)).abs() < 1e-12);
    }

    #[test]
    fn degenerate_stdev_is_a_step() {
        assert_eq!(prob_over(10.0, 0.0, 9.5), 1.0);
        assert_eq!(prob_over(9.5, 0.0, 9.5), 0.0);
        assert_eq!(prob_over(9.0, f64::NAN, 9.5), 0.0);
        assert!((prob_over(9.5, 2.0, 9.5) - 0.5).abs() < 1e-7);
    }
}
