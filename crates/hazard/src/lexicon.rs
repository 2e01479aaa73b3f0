use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use annotation::EmotionVector;

/// Scoring weights and gates for one hazard, keyed by emotion target label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardProfile {
    /// Emotion target text this profile applies to, e.g. "fire".
    pub label: String,
    /// Category reported when the gates pass, e.g. "Fire".
    pub category: String,
    pub base: f64,
    pub sadness_weight: f64,
    pub anger_weight: f64,
    pub joy_weight: f64,
    pub gate: Gate,
}

/// Strict bounds: sadness and anger must exceed their minimum,
/// joy must stay below its maximum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub sadness_above: f64,
    pub joy_below: f64,
    pub anger_above: f64,
}

impl Gate {
    pub fn passes(&self, emotion: &EmotionVector) -> bool {
        emotion.sadness > self.sadness_above
            && emotion.joy < self.joy_below
            && emotion.anger > self.anger_above
    }
}

impl HazardProfile {
    /// Raw danger score, unclamped.
    pub fn score(&self, emotion: &EmotionVector) -> f64 {
        self.base
            + self.sadness_weight * emotion.sadness
            + self.anger_weight * emotion.anger
            + self.joy_weight * emotion.joy
    }

    /// Score if the gates pass, `None` otherwise.
    pub fn evaluate(&self, emotion: &EmotionVector) -> Option<f64> {
        self.gate.passes(emotion).then(|| self.score(emotion))
    }

    pub fn fire() -> Self {
        Self {
            label: "fire".to_string(),
            category: "Fire".to_string(),
            base: 0.46,
            sadness_weight: 1.2,
            anger_weight: 1.2,
            joy_weight: -0.5,
            gate: Gate {
                sadness_above: 0.10,
                joy_below: 0.80,
                anger_above: 0.05,
            },
        }
    }

    pub fn flood() -> Self {
        Self {
            label: "flood".to_string(),
            category: "Flood".to_string(),
            base: 0.20,
            sadness_weight: 1.2,
            anger_weight: 1.2,
            joy_weight: -0.5,
            gate: Gate {
                sadness_above: 0.05,
                joy_below: 0.20,
                anger_above: 0.20,
            },
        }
    }

    fn is_finite(&self) -> bool {
        [
            self.base,
            self.sadness_weight,
            self.anger_weight,
            self.joy_weight,
            self.gate.sadness_above,
            self.gate.joy_below,
            self.gate.anger_above,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// What to do with an emotion target whose label has no profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnrecognizedPolicy {
    /// Score it with the fallback profile.
    #[default]
    Fallback,
    /// Report an explicit "Unrecognized" verdict with a zero score.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardLexicon {
    pub profiles: Vec<HazardProfile>,
    /// Label of the profile used for unknown targets under `Fallback`.
    #[serde(default = "default_fallback")]
    pub fallback: String,
    #[serde(default)]
    pub unrecognized: UnrecognizedPolicy,
}

fn default_fallback() -> String {
    "flood".to_string()
}

impl Default for HazardLexicon {
    fn default() -> Self {
        Self {
            profiles: vec![HazardProfile::fire(), HazardProfile::flood()],
            fallback: default_fallback(),
            unrecognized: UnrecognizedPolicy::Fallback,
        }
    }
}

/// Result of looking a target label up in the lexicon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    Known(&'a HazardProfile),
    Fallback(&'a HazardProfile),
    Unrecognized,
}

impl HazardLexicon {
    pub fn from_json(json: &str) -> Result<Self> {
        let lexicon: HazardLexicon =
            serde_json::from_str(json).context("Failed to parse hazard lexicon")?;
        lexicon.validate()?;
        Ok(lexicon)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read hazard lexicon {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn with_policy(mut self, policy: UnrecognizedPolicy) -> Self {
        self.unrecognized = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for profile in &self.profiles {
            if profile.label.is_empty() {
                anyhow::bail!("Hazard profile with empty label");
            }
            if !seen.insert(profile.label.as_str()) {
                anyhow::bail!("Duplicate hazard profile label: {}", profile.label);
            }
            if !profile.is_finite() {
                anyhow::bail!("Hazard profile {} has non-finite weights", profile.label);
            }
        }

        if self.unrecognized == UnrecognizedPolicy::Fallback && self.profile(&self.fallback).is_none() {
            anyhow::bail!("Fallback hazard profile {} is not defined", self.fallback);
        }

        Ok(())
    }

    /// Exact-match lookup.
    pub fn profile(&self, label: &str) -> Option<&HazardProfile> {
        self.profiles.iter().find(|p| p.label == label)
    }

    pub fn lookup(&self, label: &str) -> Lookup<'_> {
        if let Some(profile) = self.profile(label) {
            return Lookup::Known(profile);
        }
        match self.unrecognized {
            UnrecognizedPolicy::Fallback => match self.profile(&self.fallback) {
                Some(profile) => Lookup::Fallback(profile),
                None => Lookup::Unrecognized,
            },
            UnrecognizedPolicy::Reject => Lookup::Unrecognized,
        }
    }
}
