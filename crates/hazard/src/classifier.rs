use annotation::{AnnotationResult, EmotionProfile, Relation};
use tracing::debug;

use crate::lexicon::{HazardLexicon, Lookup};
use crate::verdict::{Evidence, HazardVerdict, UNKNOWN_HAZARD, UNRECOGNIZED_HAZARD};

/// Turns one annotation result into one hazard verdict.
///
/// Stateless apart from the lexicon it was built with; classify never fails.
#[derive(Debug, Clone, Default)]
pub struct HazardClassifier {
    lexicon: HazardLexicon,
}

impl HazardClassifier {
    pub fn new(lexicon: HazardLexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &HazardLexicon {
        &self.lexicon
    }

    /// Relation evidence wins over emotion evidence. With neither, the
    /// verdict is "None".
    pub fn classify(&self, result: &AnnotationResult) -> HazardVerdict {
        if let Some(relation) = result.relations.first() {
            return self.classify_relation(relation);
        }

        match &result.emotion {
            Some(emotion) => self.classify_emotion(emotion),
            None => {
                debug!("No relations or emotion in annotation");
                HazardVerdict::none()
            }
        }
    }

    fn classify_relation(&self, relation: &Relation) -> HazardVerdict {
        let category = relation.object_subtype().unwrap_or(UNKNOWN_HAZARD);
        debug!(category, score = relation.score, "Classified from relation");

        HazardVerdict {
            category: category.to_string(),
            score_percent: to_percent(relation.score),
            evidence: Evidence::Relation,
        }
    }

    fn classify_emotion(&self, emotion: &EmotionProfile) -> HazardVerdict {
        let Some(target) = emotion.first_target() else {
            debug!("Emotion present without targets");
            return HazardVerdict::no_hazard(Evidence::Emotion);
        };

        let profile = match self.lexicon.lookup(&target.text) {
            Lookup::Known(profile) => profile,
            Lookup::Fallback(profile) => {
                debug!(label = %target.text, fallback = %profile.label, "Unrecognized target label");
                profile
            }
            Lookup::Unrecognized => {
                debug!(label = %target.text, "Rejected unrecognized target label");
                return HazardVerdict {
                    category: UNRECOGNIZED_HAZARD.to_string(),
                    score_percent: 0.0,
                    evidence: Evidence::Emotion,
                };
            }
        };

        match profile.evaluate(&target.emotion) {
            Some(score) => {
                debug!(category = %profile.category, score, "Classified from emotion");
                HazardVerdict {
                    category: profile.category.clone(),
                    score_percent: to_percent(score),
                    evidence: Evidence::Emotion,
                }
            }
            None => {
                debug!(label = %profile.label, "Emotion gates not met");
                HazardVerdict::no_hazard(Evidence::Emotion)
            }
        }
    }
}

/// Scale a [0, 1] score to percent, clamped to [0, 100].
/// NaN maps to 0.
fn to_percent(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    (score * 100.0).clamp(0.0, 100.0)
}
