//! Process-wide pattern registries for query understanding.
//!
//! Every table is ordered: callers walk it front to back and the first entry that
//! matches wins. Tables are compiled once on first use and never mutated.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::ops::Range;

use crate::types::Category;

/// Compile a built-in pattern, always case-insensitive.
fn re(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){}", pattern))
        .unwrap_or_else(|e| panic!("built-in pattern `{}` failed to compile: {}", pattern, e))
}

/// A pattern paired with the function that turns its captures into a canonical value.
pub struct Rule {
    regex: Regex,
    render: fn(&Captures) -> String,
}

impl Rule {
    fn new(pattern: &str, render: fn(&Captures) -> String) -> Self {
        Self {
            regex: re(pattern),
            render,
        }
    }

    pub fn apply(&self, text: &str) -> Option<String> {
        self.regex.captures(text).map(|caps| (self.render)(&caps))
    }

    /// Byte range of the first match
    pub fn span(&self, text: &str) -> Option<Range<usize>> {
        self.regex.find(text).map(|m| m.range())
    }
}

/// A canonical label matched by any of several alternative spellings.
pub struct Label {
    pub value: &'static str,
    regex: Regex,
}

impl Label {
    fn new(value: &'static str, alternatives: &[&str]) -> Self {
        Self {
            value,
            regex: re(&format!(r"\b(?:{})\b", alternatives.join("|"))),
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// First rule in table order that matches, rendered.
pub fn first_rule(rules: &[Rule], text: &str) -> Option<String> {
    rules.iter().find_map(|rule| rule.apply(text))
}

/// Span matched by the first rule in table order that matches.
pub fn first_span(rules: &[Rule], text: &str) -> Option<Range<usize>> {
    rules.iter().find_map(|rule| rule.span(text))
}

/// First label in table order that matches.
pub fn first_label(labels: &[Label], text: &str) -> Option<String> {
    labels
        .iter()
        .find(|label| label.is_match(text))
        .map(|label| label.value.to_string())
}

fn cap<'t>(caps: &Captures<'t>, i: usize) -> Option<&'t str> {
    caps.get(i).map(|m| m.as_str())
}

/// "pro  max" -> "Pro Max"
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// "Base" or "Base Suffix" when the optional capture is present.
fn with_suffix(base: String, suffix: Option<&str>) -> String {
    match suffix {
        Some(s) if !s.trim().is_empty() => format!("{} {}", base, title_case(s)),
        _ => base,
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Keyword patterns per category, in category declaration order. Each pattern
/// contributes at most one point to its category's score.
pub static CATEGORY_KEYWORDS: Lazy<Vec<(Category, Vec<Regex>)>> = Lazy::new(|| {
    let build = |words: &[&str]| {
        words
            .iter()
            .map(|w| re(&format!(r"\b{}\b", w)))
            .collect::<Vec<_>>()
    };
    vec![
        (
            Category::Smartphone,
            build(&[
                "iphone",
                "galaxy",
                "pixel",
                "smartphone",
                "phone",
                "mobile",
                "oneplus",
                "android",
            ]),
        ),
        (
            Category::Laptop,
            build(&[
                "laptop",
                "notebook",
                "macbook",
                "thinkpad",
                "chromebook",
                "ultrabook",
                "xps",
                "zenbook",
                "ideapad",
                r"galaxy\s*book",
                r"surface\s*laptop",
            ]),
        ),
        (
            Category::Sports,
            build(&[
                "nike",
                "adidas",
                "puma",
                "asics",
                r"air\s*max",
                "running",
                "shoes?",
                "sneakers?",
                "trainers",
                "sports?",
                "basketball",
                "football",
                "soccer",
            ]),
        ),
    ]
});

// ---------------------------------------------------------------------------
// Brands
// ---------------------------------------------------------------------------

/// Brand associations. Product-line names imply their maker, so "iPhone" alone
/// yields Apple.
pub static BRANDS: Lazy<Vec<Label>> = Lazy::new(|| {
    vec![
        Label::new("Apple", &["apple", "iphone", "ipad", "macbook", "imac", "airpods"]),
        Label::new("Samsung", &["samsung", "galaxy"]),
        Label::new("Google", &["google", "pixel"]),
        Label::new("OnePlus", &["oneplus"]),
        Label::new("Xiaomi", &["xiaomi", "redmi"]),
        Label::new("Dell", &["dell", "xps", "alienware", "inspiron"]),
        Label::new("HP", &["hp", "spectre", "pavilion", "elitebook"]),
        Label::new("Lenovo", &["lenovo", "thinkpad", "ideapad", "legion"]),
        Label::new("Asus", &["asus", "zenbook", "vivobook"]),
        Label::new("Acer", &["acer", "predator", "aspire"]),
        Label::new("Microsoft", &["microsoft", "surface"]),
        Label::new("Nike", &["nike", r"air\s*max", r"air\s*force", "jordan", "pegasus"]),
        Label::new("Adidas", &["adidas", r"ultra\s*boost", r"stan\s*smith"]),
        Label::new("Puma", &["puma"]),
        Label::new("New Balance", &[r"new\s*balance"]),
        Label::new("Asics", &["asics", r"gel[\s-]*kayano"]),
    ]
});

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

static SMARTPHONE_MODELS: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(
            r"\biphone\s*(\d{1,2})(?:\s*(pro\s*max|pro|plus|mini|max))?\b",
            |c| with_suffix(format!("iPhone {}", &c[1]), cap(c, 2)),
        ),
        Rule::new(
            r"\bgalaxy\s+(s|a|note|z\s*fold|z\s*flip)\s*(\d{1,2})\b(?:\s*(ultra|plus|fe)\b|(\+))?",
            |c| {
                let series = c[1].to_lowercase();
                let base = match series.as_str() {
                    "s" | "a" => format!("Galaxy {}{}", series.to_uppercase(), &c[2]),
                    _ => format!("Galaxy {} {}", title_case(&series), &c[2]),
                };
                if cap(c, 4).is_some() {
                    format!("{} Plus", base)
                } else {
                    let suffix = cap(c, 3).map(|s| {
                        if s.eq_ignore_ascii_case("fe") {
                            "FE".to_string()
                        } else {
                            title_case(s)
                        }
                    });
                    match suffix {
                        Some(s) => format!("{} {}", base, s),
                        None => base,
                    }
                }
            },
        ),
        Rule::new(
            r"\bpixel\s*(\d{1,2}a?)\b(?:\s*(pro\s*xl|pro\s*fold|pro|xl))?\b",
            |c| with_suffix(format!("Pixel {}", c[1].to_lowercase()), cap(c, 2)),
        ),
        Rule::new(r"\boneplus\s*(\d{1,2})(r|t)?\b(?:\s*(pro))?", |c| {
            let base = format!(
                "OnePlus {}{}",
                &c[1],
                cap(c, 2).map(str::to_uppercase).unwrap_or_default()
            );
            with_suffix(base, cap(c, 3))
        }),
    ]
});

static LAPTOP_MODELS: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(r"\bmacbook(?:\s*(pro|air))?\b", |c| {
            with_suffix("MacBook".to_string(), cap(c, 1))
        }),
        Rule::new(r"\bthinkpad(?:\s*([a-z]\d{1,3}[a-z]?))?\b", |c| match cap(c, 1) {
            Some(code) => format!("ThinkPad {}", code.to_uppercase()),
            None => "ThinkPad".to_string(),
        }),
        Rule::new(r"\bxps\s*(\d{2})\b", |c| format!("XPS {}", &c[1])),
        Rule::new(r"\bsurface\s*(laptop|pro|book)(?:\s*(\d{1,2}))?\b", |c| {
            with_suffix(format!("Surface {}", title_case(&c[1])), cap(c, 2))
        }),
        Rule::new(r"\bspectre(?:\s*(x360))?\b", |c| match cap(c, 1) {
            Some(_) => "Spectre x360".to_string(),
            None => "Spectre".to_string(),
        }),
        Rule::new(r"\bzenbook(?:\s*(\d{2}))?\b", |c| {
            with_suffix("ZenBook".to_string(), cap(c, 1))
        }),
    ]
});

static SPORTS_MODELS: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(r"\bair\s*max(?:\s*(\d{2,3}|plus|dn))?\b", |c| {
            with_suffix("Air Max".to_string(), cap(c, 1))
        }),
        Rule::new(r"\bair\s*force\s*1\b", |_| "Air Force 1".to_string()),
        Rule::new(r"\b(?:air\s*)?jordan\s*(\d{1,2})\b", |c| {
            format!("Air Jordan {}", &c[1])
        }),
        Rule::new(r"\bpegasus(?:\s*(\d{2}))?\b", |c| {
            with_suffix("Pegasus".to_string(), cap(c, 1))
        }),
        Rule::new(r"\bultra\s*boost(?:\s*(\d{1,2}|light))?\b", |c| {
            with_suffix("Ultraboost".to_string(), cap(c, 1))
        }),
        Rule::new(r"\bgel[\s-]*kayano(?:\s*(\d{2}))?\b", |c| {
            with_suffix("Gel-Kayano".to_string(), cap(c, 1))
        }),
    ]
});

/// Named-model table for a category
pub fn model_rules(category: Category) -> &'static [Rule] {
    match category {
        Category::Smartphone => &SMARTPHONE_MODELS,
        Category::Laptop => &LAPTOP_MODELS,
        Category::Sports => &SPORTS_MODELS,
    }
}

// ---------------------------------------------------------------------------
// Capacities
// ---------------------------------------------------------------------------

/// Storage-style capacity mention: digits and a binary/decimal unit. There is no
/// leading word boundary, so run-together text like "Pro128GB" still matches.
pub static CAPACITY: Lazy<Regex> = Lazy::new(|| re(r"(\d+)\s*(GB|TB|GiB|TiB)\b"));

/// RAM mention, optionally labelled as such
pub static RAM: Lazy<Regex> = Lazy::new(|| re(r"\b(\d+)\s*(GB|MB)\b(?:\s*(?:ram|memory))?"));

// ---------------------------------------------------------------------------
// Descriptive attributes
// ---------------------------------------------------------------------------

/// Colors, multi-word names ahead of the single words they contain.
pub static COLORS: Lazy<Vec<Label>> = Lazy::new(|| {
    vec![
        Label::new("Natural Titanium", &[r"natural\s+titanium"]),
        Label::new("Desert Titanium", &[r"desert\s+titanium"]),
        Label::new("Black Titanium", &[r"black\s+titanium"]),
        Label::new("White Titanium", &[r"white\s+titanium"]),
        Label::new("Space Gray", &[r"space\s+gr[ae]y"]),
        Label::new("Space Black", &[r"space\s+black"]),
        Label::new("Rose Gold", &[r"rose\s+gold"]),
        Label::new("Midnight", &["midnight"]),
        Label::new("Starlight", &["starlight"]),
        Label::new(
            "Black",
            &["black", "noir", "noire", "schwarz", "negro", "negra", "nero", "preto", "zwart"],
        ),
        Label::new(
            "White",
            &["white", "blanc", "blanche", "weiss", "weiß", "blanco", "blanca", "bianco", "branco"],
        ),
        Label::new(
            "Silver",
            &["silver", "argent", "argenté", "silber", "plata", "plateado", "argento", "prata"],
        ),
        Label::new("Gold", &["gold", "doré", "dore", "dorado", "oro", "dourado"]),
        Label::new("Gray", &["gray", "grey", "gris", "grau", "grigio", "cinza"]),
        Label::new("Blue", &["blue", "bleu", "blau", "azul", "blu"]),
        Label::new("Red", &["red", "rouge", "rot", "rojo", "roja", "rosso", "vermelho"]),
        Label::new("Green", &["green", "vert", "grün", "grun", "verde"]),
        Label::new("Pink", &["pink", "rose", "rosa"]),
        Label::new("Purple", &["purple", "violet", "lila", "morado", "viola"]),
        Label::new("Yellow", &["yellow", "jaune", "gelb", "amarillo", "giallo"]),
        Label::new("Orange", &["orange", "naranja", "arancione"]),
    ]
});

fn inches(c: &Captures) -> String {
    format!("{} inch", &c[1])
}

pub static SCREEN_SIZES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(r"\b(\d{1,2}(?:\.\d{1,2})?)\s*inch(?:es)?\b", inches),
        Rule::new(r"\b(\d{1,2}(?:\.\d{1,2})?)\s*-\s*inch(?:es)?\b", inches),
        Rule::new(r#"\b(\d{1,2}(?:\.\d{1,2})?)\s*(?:"|''|”)"#, inches),
    ]
});

pub static PROCESSORS: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(r"\bm([1-4])(?:\s+(pro|max|ultra))?\b", |c| {
            with_suffix(format!("M{}", &c[1]), cap(c, 2))
        }),
        Rule::new(r"\b(?:intel\s*)?core\s*ultra\s*([579])\b", |c| {
            format!("Intel Core Ultra {}", &c[1])
        }),
        Rule::new(r"\b(?:intel\s*)?(?:core\s*)?i([3579])\b", |c| {
            format!("Intel i{}", &c[1])
        }),
        Rule::new(r"\b(?:amd\s*)?ryzen\s*([3579])\b", |c| {
            format!("AMD Ryzen {}", &c[1])
        }),
        Rule::new(r"\bsnapdragon\s*x\s*(elite|plus)\b", |c| {
            format!("Snapdragon X {}", title_case(&c[1]))
        }),
    ]
});

/// Shoe sizes. A bare number reads as a US size; callers blank out model and
/// capacity spans first so "Air Max 90" is not read as size 90.
pub static SHOE_SIZES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(r"\b(US|UK|EU)\s*(\d{1,2}(?:\.\d)?)\b", |c| {
            format!("{} {}", c[1].to_uppercase(), &c[2])
        }),
        Rule::new(r"\b(\d{1,2}(?:\.\d)?)\s*(US|UK|EU)\b", |c| {
            format!("{} {}", c[2].to_uppercase(), &c[1])
        }),
        Rule::new(r"\b(\d{1,2}(?:\.\d)?)\b", |c| format!("US {}", &c[1])),
    ]
});

/// Shoe types. Explicit activity words come first; model lines that imply an
/// activity are consulted last.
pub static SHOE_TYPES: Lazy<Vec<Label>> = Lazy::new(|| {
    vec![
        Label::new("Running Shoes", &["running", "runner", "jogging"]),
        Label::new("Basketball Shoes", &["basketball"]),
        Label::new("Training Shoes", &["training", "trainer", r"cross[\s-]*training", "gym"]),
        Label::new("Tennis Shoes", &["tennis"]),
        Label::new("Football Boots", &["football", "soccer"]),
        Label::new("Hiking Shoes", &["hiking", "trail"]),
        Label::new(
            "Running Shoes",
            &[r"air\s*max", "pegasus", r"ultra\s*boost", r"gel[\s-]*kayano"],
        ),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tables_compile() {
        assert_eq!(CATEGORY_KEYWORDS.len(), Category::ALL.len());
        assert!(!BRANDS.is_empty());
        for category in Category::ALL {
            assert!(!model_rules(category).is_empty());
        }
        assert!(CAPACITY.is_match("256GB"));
        assert!(CAPACITY.is_match("iPhone16Pro128GB"));
        assert!(RAM.is_match("16GB RAM"));
        assert!(!COLORS.is_empty());
        assert!(!SCREEN_SIZES.is_empty());
        assert!(!PROCESSORS.is_empty());
        assert!(!SHOE_SIZES.is_empty());
        assert!(!SHOE_TYPES.is_empty());
    }

    #[test]
    fn test_category_keywords_follow_declaration_order() {
        let order: Vec<Category> = CATEGORY_KEYWORDS.iter().map(|(c, _)| *c).collect();
        assert_eq!(order, Category::ALL.to_vec());
    }

    #[test]
    fn test_smartphone_models_render_canonically() {
        let rules = model_rules(Category::Smartphone);
        assert_eq!(first_rule(rules, "IPHONE 16 PRO").as_deref(), Some("iPhone 16 Pro"));
        assert_eq!(first_rule(rules, "iphone 15 pro max").as_deref(), Some("iPhone 15 Pro Max"));
        assert_eq!(first_rule(rules, "Samsung Galaxy S24").as_deref(), Some("Galaxy S24"));
        assert_eq!(
            first_rule(rules, "galaxy s24 ultra 256gb").as_deref(),
            Some("Galaxy S24 Ultra")
        );
        assert_eq!(first_rule(rules, "Galaxy Z Fold 6").as_deref(), Some("Galaxy Z Fold 6"));
        assert_eq!(first_rule(rules, "Google Pixel 9 Pro").as_deref(), Some("Pixel 9 Pro"));
        assert_eq!(first_rule(rules, "OnePlus 12R").as_deref(), Some("OnePlus 12R"));
    }

    #[test]
    fn test_laptop_and_sports_models() {
        let laptops = model_rules(Category::Laptop);
        assert_eq!(first_rule(laptops, "Apple MacBook Air M2").as_deref(), Some("MacBook Air"));
        assert_eq!(first_rule(laptops, "Lenovo ThinkPad X1").as_deref(), Some("ThinkPad X1"));
        assert_eq!(first_rule(laptops, "Dell XPS 13").as_deref(), Some("XPS 13"));

        let sports = model_rules(Category::Sports);
        assert_eq!(first_rule(sports, "nike air max 270").as_deref(), Some("Air Max 270"));
        assert_eq!(first_rule(sports, "Air Force 1 white").as_deref(), Some("Air Force 1"));
        assert_eq!(first_rule(sports, "Adidas Ultraboost 22").as_deref(), Some("Ultraboost 22"));
    }

    #[test]
    fn test_color_synonyms_map_to_one_value() {
        for word in ["black", "Noir", "SCHWARZ", "negro"] {
            assert_eq!(first_label(&COLORS, word).as_deref(), Some("Black"), "{}", word);
        }
        assert_eq!(
            first_label(&COLORS, "iPhone 15 Pro Natural Titanium").as_deref(),
            Some("Natural Titanium")
        );
        assert_eq!(first_label(&COLORS, "MacBook space grey").as_deref(), Some("Space Gray"));
        assert_eq!(first_label(&COLORS, "blackberry"), None);
    }

    #[test]
    fn test_screen_size_forms() {
        assert_eq!(first_rule(&SCREEN_SIZES, "6.1 inch").as_deref(), Some("6.1 inch"));
        assert_eq!(first_rule(&SCREEN_SIZES, "14-inch").as_deref(), Some("14 inch"));
        assert_eq!(first_rule(&SCREEN_SIZES, r#"15.6" display"#).as_deref(), Some("15.6 inch"));
        assert_eq!(first_rule(&SCREEN_SIZES, "13 inches").as_deref(), Some("13 inch"));
    }

    #[test]
    fn test_processor_forms() {
        assert_eq!(first_rule(&PROCESSORS, "M3 Pro chip").as_deref(), Some("M3 Pro"));
        assert_eq!(first_rule(&PROCESSORS, "MacBook Air M2").as_deref(), Some("M2"));
        assert_eq!(first_rule(&PROCESSORS, "Laptop Intel i7").as_deref(), Some("Intel i7"));
        assert_eq!(first_rule(&PROCESSORS, "core i5 laptop").as_deref(), Some("Intel i5"));
        assert_eq!(first_rule(&PROCESSORS, "AMD Ryzen 7").as_deref(), Some("AMD Ryzen 7"));
        assert_eq!(first_rule(&PROCESSORS, "MacBook Pro"), None);
    }

    #[test]
    fn test_shoe_size_forms() {
        assert_eq!(first_rule(&SHOE_SIZES, "US 10").as_deref(), Some("US 10"));
        assert_eq!(first_rule(&SHOE_SIZES, "uk9").as_deref(), Some("UK 9"));
        assert_eq!(first_rule(&SHOE_SIZES, "42 EU").as_deref(), Some("EU 42"));
        assert_eq!(first_rule(&SHOE_SIZES, "size 10.5").as_deref(), Some("US 10.5"));
        assert_eq!(first_rule(&SHOE_SIZES, "running shoes 10").as_deref(), Some("US 10"));
        assert_eq!(first_rule(&SHOE_SIZES, "Nike Air Max 270"), None);
    }
}
