pub mod schema;
pub mod request;
pub mod client;

pub use schema::{
    AnnotationResult, Disambiguation, DocumentEmotion, EmotionProfile, EmotionTarget,
    EmotionVector, Entity, Keyword, Relation, RelationArgument,
};
pub use request::{build_hazard_request, AnalyzeRequest, FeatureSet};
pub use client::{NluClient, NluError};
