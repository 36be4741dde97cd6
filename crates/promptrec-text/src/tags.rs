use promptrec_core::config::{default_categories, CategoryDictionary};
use promptrec_core::types::TagSet;

/// Maps free text to the categories and keywords of a category dictionary.
///
/// Matching is a case-insensitive substring test: a keyword matches when it
/// occurs anywhere in the lower-cased text, so "reactive" matches "react".
#[derive(Debug, Clone)]
pub struct TagExtractor {
    entries: Vec<(String, Vec<String>)>,
}

impl TagExtractor {
    pub fn new(dictionary: CategoryDictionary) -> Self {
        let entries = dictionary
            .into_iter()
            .map(|(category, keywords)| {
                let mut kws: Vec<String> = keywords
                    .into_iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                kws.sort();
                kws.dedup();
                (category, kws)
            })
            .collect();
        Self { entries }
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn extract(&self, text: &str) -> TagSet {
        let mut tags = TagSet::default();
        if text.is_empty() {
            return tags;
        }
        let lowered = text.to_lowercase();
        for (category, keywords) in &self.entries {
            for kw in keywords {
                if lowered.contains(kw.as_str()) {
                    tags.categories.insert(category.clone());
                    tags.keywords.insert(kw.clone());
                }
            }
        }
        tags
    }

    /// Same as [`extract`](Self::extract) for raw bytes; invalid UTF-8 is
    /// replaced rather than rejected.
    pub fn extract_bytes(&self, bytes: &[u8]) -> TagSet {
        self.extract(&String::from_utf8_lossy(bytes))
    }
}

impl Default for TagExtractor {
    fn default() -> Self {
        Self::new(default_categories())
    }
}
