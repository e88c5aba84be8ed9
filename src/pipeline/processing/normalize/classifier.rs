use crate::types::Category;

use super::patterns::CATEGORY_KEYWORDS;

/// Scores text against each category's keyword set and picks the best category.
///
/// Pure: the same text always yields the same category.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryClassifier;

impl CategoryClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Number of keyword patterns each category matches, in declaration order
    pub fn scores(&self, text: &str) -> Vec<(Category, usize)> {
        let lowered = text.to_lowercase();
        CATEGORY_KEYWORDS
            .iter()
            .map(|(category, patterns)| {
                let score = patterns.iter().filter(|p| p.is_match(&lowered)).count();
                (*category, score)
            })
            .collect()
    }

    /// Strictly highest score wins; ties keep the earlier category and an
    /// all-zero board falls back to the default category.
    pub fn classify(&self, text: &str) -> Category {
        let mut best = (Category::default(), 0usize);
        for (category, score) in self.scores(text) {
            if score > best.1 {
                best = (category, score);
            }
        }
        best.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_each_category() {
        let classifier = CategoryClassifier::new();
        assert_eq!(classifier.classify("iPhone 16 Pro, 128GB"), Category::Smartphone);
        assert_eq!(classifier.classify("Lenovo ThinkPad"), Category::Laptop);
        assert_eq!(classifier.classify("Laptop Intel i7"), Category::Laptop);
        assert_eq!(classifier.classify("Running shoes"), Category::Sports);
        assert_eq!(
            classifier.classify("MacBook Pro 14-inch M3 Pro 16GB RAM 512GB"),
            Category::Laptop
        );
    }

    #[test]
    fn test_no_keywords_defaults_to_smartphone() {
        let classifier = CategoryClassifier::new();
        assert_eq!(classifier.classify("unknown product"), Category::Smartphone);
        assert_eq!(classifier.classify(""), Category::Smartphone);
    }

    #[test]
    fn test_ties_go_to_first_declared_category() {
        let classifier = CategoryClassifier::new();
        // one smartphone keyword, one laptop keyword
        let scores = classifier.scores("phone laptop");
        assert_eq!(scores[0], (Category::Smartphone, 1));
        assert_eq!(scores[1], (Category::Laptop, 1));
        assert_eq!(classifier.classify("phone laptop"), Category::Smartphone);
    }

    #[test]
    fn test_highest_score_wins() {
        let classifier = CategoryClassifier::new();
        // galaxy (phone) vs galaxy book + laptop (laptop)
        assert_eq!(classifier.classify("Samsung Galaxy Book laptop"), Category::Laptop);
        assert_eq!(
            classifier.classify("Nike Air Max 270 Running US 10 Black"),
            Category::Sports
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = CategoryClassifier::new();
        let text = "Galaxy S24 Ultra running case";
        let first = classifier.classify(text);
        for _ in 0..10 {
            assert_eq!(classifier.classify(text), first);
        }
    }
}
