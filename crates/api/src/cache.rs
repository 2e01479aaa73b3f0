use annotation::AnnotationResult;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Annotation results keyed by a hash of the input text.
pub struct AnnotationCache {
    annotations: Arc<DashMap<String, AnnotationResult>>,
    max_entries: usize,
}

impl AnnotationCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            annotations: Arc::new(DashMap::new()),
            max_entries,
        }
    }

    pub fn set(&self, text: &str, result: AnnotationResult) {
        if self.max_entries == 0 {
            return;
        }
        if self.annotations.len() >= self.max_entries {
            // Simple eviction: clear 25% when full
            let to_remove: Vec<_> = self.annotations.iter()
                .take((self.max_entries / 4).max(1))
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.annotations.remove(&key);
            }
        }
        let key = self.hash_text(text);
        self.annotations.insert(key, result);
    }

    pub fn get(&self, text: &str) -> Option<AnnotationResult> {
        let key = self.hash_text(text);
        self.annotations.get(&key).map(|r| r.value().clone())
    }

    fn hash_text(&self, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            annotations_cached: self.annotations.len(),
            max_entries: self.max_entries,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct CacheStats {
    pub annotations_cached: usize,
    pub max_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_by_text() {
        let cache = AnnotationCache::new(10);
        let result = AnnotationResult {
            language: Some("en".to_string()),
            ..AnnotationResult::default()
        };

        cache.set("fire in the kitchen", result.clone());

        assert_eq!(cache.get("fire in the kitchen"), Some(result));
        assert_eq!(cache.get("flood in the basement"), None);
    }

    #[test]
    fn test_eviction_keeps_bound() {
        let cache = AnnotationCache::new(4);
        for i in 0..10 {
            cache.set(&format!("text {}", i), AnnotationResult::default());
        }

        assert!(cache.stats().annotations_cached <= 4);
        assert!(cache.get("text 9").is_some());
    }
}
