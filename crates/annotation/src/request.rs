use serde::Serialize;

/// Body of an `analyze` call.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest {
    pub text: String,
    pub features: Features,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Features {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<EntitiesOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<KeywordsOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<EmotionOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relations: Option<RelationsOptions>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntitiesOptions {
    pub emotion: bool,
    pub sentiment: bool,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordsOptions {
    pub emotion: bool,
    pub sentiment: bool,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmotionOptions {
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RelationsOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Which annotations to ask for on every hazard request.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub emotion_targets: Vec<String>,
    pub entity_limit: u32,
    pub keyword_limit: u32,
    /// Custom model used for both entity and relation extraction.
    pub model: Option<String>,
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self {
            emotion_targets: vec!["flood".to_string(), "fire".to_string()],
            entity_limit: 2,
            keyword_limit: 2,
            model: None,
        }
    }
}

pub fn build_hazard_request(text: &str, features: &FeatureSet) -> AnalyzeRequest {
    // The service rejects an emotion feature with an empty target list.
    let emotion = if features.emotion_targets.is_empty() {
        None
    } else {
        Some(EmotionOptions {
            targets: features.emotion_targets.clone(),
        })
    };

    AnalyzeRequest {
        text: text.to_string(),
        features: Features {
            entities: Some(EntitiesOptions {
                emotion: true,
                sentiment: true,
                limit: features.entity_limit,
                model: features.model.clone(),
            }),
            keywords: Some(KeywordsOptions {
                emotion: true,
                sentiment: true,
                limit: features.keyword_limit,
            }),
            emotion,
            relations: Some(RelationsOptions {
                model: features.model.clone(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_request_shape() {
        let request = build_hazard_request("fire in the kitchen", &FeatureSet::default());
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["text"], "fire in the kitchen");
        assert_eq!(value["features"]["emotion"]["targets"], json!(["flood", "fire"]));
        assert_eq!(value["features"]["entities"]["limit"], 2);
        assert_eq!(value["features"]["keywords"]["sentiment"], true);
        assert!(value["features"]["entities"].get("model").is_none());
        assert_eq!(value["features"]["relations"], json!({}));
    }

    #[test]
    fn test_custom_model_applies_to_entities_and_relations() {
        let features = FeatureSet {
            model: Some("hazard-model".to_string()),
            ..FeatureSet::default()
        };
        let value = serde_json::to_value(build_hazard_request("x", &features)).unwrap();

        assert_eq!(value["features"]["entities"]["model"], "hazard-model");
        assert_eq!(value["features"]["relations"]["model"], "hazard-model");
    }

    #[test]
    fn test_no_targets_omits_emotion() {
        let features = FeatureSet {
            emotion_targets: Vec::new(),
            ..FeatureSet::default()
        };
        let value = serde_json::to_value(build_hazard_request("x", &features)).unwrap();

        assert!(value["features"].get("emotion").is_none());
    }
}
