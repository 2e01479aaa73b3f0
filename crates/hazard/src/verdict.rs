use serde::{Serialize, Serializer};
use std::fmt;

pub const NO_HAZARD: &str = "None";
pub const UNKNOWN_HAZARD: &str = "Unknown";
pub const UNRECOGNIZED_HAZARD: &str = "Unrecognized";

/// Which branch of the decision tree produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Evidence {
    Relation,
    Emotion,
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HazardVerdict {
    pub category: String,
    /// Danger score in percent, within [0, 100].
    pub score_percent: f64,
    pub evidence: Evidence,
}

impl HazardVerdict {
    pub fn none() -> Self {
        Self::no_hazard(Evidence::None)
    }

    /// A "None" verdict reached through `evidence`, e.g. an emotion target
    /// that failed its gates.
    pub fn no_hazard(evidence: Evidence) -> Self {
        Self {
            category: NO_HAZARD.to_string(),
            score_percent: 0.0,
            evidence,
        }
    }

    /// A hazard was named and scored above zero. "Unrecognized" verdicts
    /// carry no score and do not count.
    pub fn is_danger(&self) -> bool {
        self.category != NO_HAZARD
            && self.category != UNRECOGNIZED_HAZARD
            && self.score_percent > 0.0
    }

    /// Score rounded to two significant digits, as shown to users.
    pub fn display_score(&self) -> String {
        to_precision(self.score_percent, 2)
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for HazardVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Danger Detected: {}, Danger Score: {}%",
            self.category,
            self.display_score()
        )
    }
}

impl Serialize for HazardVerdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Rendered<'a> {
            category: &'a str,
            score_percent: f64,
            display_score: String,
            evidence: Evidence,
            message: String,
        }

        Rendered {
            category: &self.category,
            score_percent: self.score_percent,
            display_score: self.display_score(),
            evidence: self.evidence,
            message: self.message(),
        }
        .serialize(serializer)
    }
}

/// Render `value` with `digits` significant digits in plain notation.
/// Zero and non-finite values render as "0".
pub fn to_precision(value: f64, digits: u32) -> String {
    if value == 0.0 || !value.is_finite() || digits == 0 {
        return "0".to_string();
    }

    let digits = digits as i32;
    let magnitude = value.abs().log10().floor() as i32;
    let scale = 10f64.powi(digits - 1 - magnitude);
    // Subnormal inputs push the scale past f64::MAX.
    if !scale.is_finite() {
        return "0".to_string();
    }
    let rounded = (value * scale).round() / scale;
    if rounded == 0.0 || !rounded.is_finite() {
        return "0".to_string();
    }

    // Rounding can carry into the next power of ten (9.96 -> 10).
    let magnitude = rounded.abs().log10().floor() as i32;
    let decimals = (digits - 1 - magnitude).max(0) as usize;
    format!("{:.*}", decimals, rounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_significant_digits() {
        assert_eq!(to_precision(46.17, 2), "46");
        assert_eq!(to_precision(4.617, 2), "4.6");
        assert_eq!(to_precision(32.17, 2), "32");
        assert_eq!(to_precision(0.5, 2), "0.50");
        assert_eq!(to_precision(9.96, 2), "10");
        assert_eq!(to_precision(100.0, 2), "100");
        assert_eq!(to_precision(0.0, 2), "0");
    }

    #[test]
    fn test_subnormal_renders_zero() {
        assert_eq!(to_precision(5e-324 * 100.0, 2), "0");
        assert_eq!(to_precision(f64::MIN_POSITIVE, 2), "0");
    }

    #[test]
    fn test_message_format() {
        let verdict = HazardVerdict {
            category: "Fire".to_string(),
            score_percent: 0.4617 * 100.0,
            evidence: Evidence::Emotion,
        };
        assert_eq!(verdict.message(), "Danger Detected: Fire, Danger Score: 46%");

        let small = HazardVerdict {
            score_percent: 0.04617 * 100.0,
            ..verdict
        };
        assert_eq!(small.message(), "Danger Detected: Fire, Danger Score: 4.6%");
    }

    #[test]
    fn test_none_verdict() {
        let verdict = HazardVerdict::none();
        assert!(!verdict.is_danger());
        assert_eq!(verdict.evidence, Evidence::None);
        assert_eq!(verdict.message(), "Danger Detected: None, Danger Score: 0%");

        let gated = HazardVerdict::no_hazard(Evidence::Emotion);
        assert!(!gated.is_danger());
        assert_eq!(gated.message(), verdict.message());
    }

    #[test]
    fn test_unrecognized_is_not_danger() {
        let verdict = HazardVerdict {
            category: UNRECOGNIZED_HAZARD.to_string(),
            score_percent: 0.0,
            evidence: Evidence::Emotion,
        };
        assert!(!verdict.is_danger());

        let fire = HazardVerdict {
            category: "Fire".to_string(),
            score_percent: 25.0,
            evidence: Evidence::Emotion,
        };
        assert!(fire.is_danger());
    }

    #[test]
    fn test_serialized_fields() {
        let verdict = HazardVerdict {
            category: "Flood".to_string(),
            score_percent: 42.9,
            evidence: Evidence::Emotion,
        };
        let value = serde_json::to_value(&verdict).unwrap();

        assert_eq!(value["category"], "Flood");
        assert_eq!(value["score_percent"], 42.9);
        assert_eq!(value["display_score"], "43");
        assert_eq!(value["evidence"], "emotion");
        assert_eq!(value["message"], "Danger Detected: Flood, Danger Score: 43%");
    }
}
