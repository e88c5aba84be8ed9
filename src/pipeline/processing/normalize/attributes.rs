use std::ops::Range;

use crate::constants::{RAM_CONTEXT_WINDOW, RAM_MARKERS};
use crate::types::{AttributeSet, Category, CategoryAttributes};

use super::patterns::{
    first_label, first_rule, first_span, model_rules, BRANDS, CAPACITY, COLORS, PROCESSORS, RAM,
    SCREEN_SIZES, SHOE_SIZES, SHOE_TYPES,
};

/// Turns free text into the structured attributes of one category.
///
/// Stateless; all pattern tables are process-wide statics, so the engine is free
/// to copy and share across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeExtractionEngine;

/// One capacity mention found in the text
#[derive(Debug, Clone)]
struct CapacityMatch<'t> {
    digits: &'t str,
    unit: &'t str,
    end: usize,
}

impl CapacityMatch<'_> {
    fn value(&self) -> f64 {
        // digits only, so parsing cannot fail short of absurd lengths
        self.digits.parse::<f64>().unwrap_or(0.0)
    }

    fn render(&self) -> String {
        let unit = match self.unit.to_ascii_uppercase().as_str() {
            "TB" | "TIB" => "TB",
            _ => "GB",
        };
        format!("{}{}", self.digits, unit)
    }
}

impl AttributeExtractionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Extract brand, model and the fields of `category` from `text`.
    ///
    /// Never fails: a field with no match is `None`. Running it again on the same
    /// input gives the same result.
    pub fn extract(&self, text: &str, category: Category) -> AttributeSet {
        let details = match category {
            Category::Smartphone => CategoryAttributes::Smartphone {
                storage: self.extract_storage(text),
                color: self.extract_color(text),
                screen_size: self.extract_screen_size(text),
            },
            Category::Laptop => CategoryAttributes::Laptop {
                storage: self.extract_storage(text),
                ram: self.extract_ram(text),
                screen_size: self.extract_screen_size(text),
                processor: self.extract_processor(text),
            },
            Category::Sports => CategoryAttributes::Sports {
                size: self.extract_shoe_size(text),
                color: self.extract_color(text),
                kind: self.extract_shoe_type(text),
            },
        };

        AttributeSet {
            brand: self.extract_brand(text),
            model: self.extract_model(text, category),
            details,
        }
    }

    pub fn extract_brand(&self, text: &str) -> Option<String> {
        first_label(&BRANDS, text)
    }

    pub fn extract_model(&self, text: &str, category: Category) -> Option<String> {
        first_rule(model_rules(category), text)
    }

    /// Pick the storage capacity among every capacity mention.
    ///
    /// A mention whose trailing context (up to [`RAM_CONTEXT_WINDOW`] characters,
    /// leading whitespace skipped) starts with a RAM marker is not storage. The
    /// largest remaining value wins, compared on the digits alone; if every
    /// mention was excluded the first one is used anyway.
    pub fn extract_storage(&self, text: &str) -> Option<String> {
        let matches: Vec<CapacityMatch> = CAPACITY
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some(CapacityMatch {
                    digits: caps.get(1)?.as_str(),
                    unit: caps.get(2)?.as_str(),
                    end: whole.end(),
                })
            })
            .collect();

        let mut best: Option<&CapacityMatch> = None;
        for candidate in matches.iter().filter(|m| !followed_by_ram_marker(text, m.end)) {
            if best.map_or(true, |b| candidate.value() > b.value()) {
                best = Some(candidate);
            }
        }

        best.or_else(|| matches.first()).map(CapacityMatch::render)
    }

    /// First RAM-looking mention, independent of the storage choice
    pub fn extract_ram(&self, text: &str) -> Option<String> {
        RAM.captures(text)
            .map(|caps| format!("{}{}", &caps[1], caps[2].to_ascii_uppercase()))
    }

    pub fn extract_color(&self, text: &str) -> Option<String> {
        first_label(&COLORS, text)
    }

    pub fn extract_screen_size(&self, text: &str) -> Option<String> {
        first_rule(&SCREEN_SIZES, text)
    }

    pub fn extract_processor(&self, text: &str) -> Option<String> {
        first_rule(&PROCESSORS, text)
    }

    /// Shoe size, with the model name and any capacity blanked out so their
    /// digits never read as a bare size.
    pub fn extract_shoe_size(&self, text: &str) -> Option<String> {
        let mut spans: Vec<Range<usize>> = CAPACITY.find_iter(text).map(|m| m.range()).collect();
        spans.extend(first_span(model_rules(Category::Sports), text));

        let mut masked = text.to_string();
        for span in spans {
            masked.replace_range(span.clone(), &" ".repeat(span.len()));
        }
        first_rule(&SHOE_SIZES, &masked)
    }

    pub fn extract_shoe_type(&self, text: &str) -> Option<String> {
        first_label(&SHOE_TYPES, text)
    }
}

fn followed_by_ram_marker(text: &str, end: usize) -> bool {
    let context: String = text[end..].chars().take(RAM_CONTEXT_WINDOW).collect();
    let context = context.trim_start().to_lowercase();
    RAM_MARKERS.iter().any(|marker| context.starts_with(marker))
}
