use serde::{Deserialize, Deserializer, Serialize};

/// Everything the NLU service returned for one input text.
///
/// Every collection defaults to empty and every nested object is optional,
/// so a response with any subset of features populated still parses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub entities: Vec<Entity>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<Keyword>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<EmotionProfile>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relations: Vec<Relation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub entity_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disambiguation: Option<Disambiguation>,
}

impl Entity {
    /// First disambiguation subtype label, if the service attached one.
    pub fn subtype(&self) -> Option<&str> {
        self.disambiguation
            .as_ref()?
            .subtype
            .first()
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Disambiguation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtype: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionProfile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub targets: Vec<EmotionTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentEmotion>,
}

impl EmotionProfile {
    pub fn first_target(&self) -> Option<&EmotionTarget> {
        self.targets.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentEmotion {
    #[serde(default, deserialize_with = "null_as_default")]
    pub emotion: EmotionVector,
}

/// A text span the service was asked to score, e.g. "fire".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionTarget {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub emotion: EmotionVector,
}

/// Scores are independent, each in [0, 1]. They do not sum to one.
/// A score the service left out reads as 0.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionVector {
    #[serde(default, deserialize_with = "null_as_default")]
    pub sadness: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub joy: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub anger: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disgust: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fear: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub relation_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub arguments: Vec<RelationArgument>,
}

impl Relation {
    /// Subtype of the first entity of the second argument: the relation's
    /// object. `None` as soon as any step along the way is missing.
    pub fn object_subtype(&self) -> Option<&str> {
        self.arguments.get(1)?.entities.first()?.subtype()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationArgument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<(usize, usize)>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub entities: Vec<Entity>,
}

/// Upstream sends explicit `null` for fields it did not populate; read those
/// as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
