//! Keyword-based grocery categorization.

use std::collections::HashSet;

use mealmate_db::models::Category;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while loading a category table.
#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("category {0} listed more than once")]
    DuplicateCategory(Category),

    #[error("Pantry is the fallback and cannot have keywords")]
    PantryKeywords,

    #[error("category {0} has a blank keyword")]
    BlankKeyword(Category),
}

#[derive(Debug, Clone, Deserialize)]
struct CategoryEntry {
    category: Category,
    keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryFile {
    categories: Vec<CategoryEntry>,
}

/// The embedded category table.
static CATEGORIES_TOML: &str = include_str!("categories.toml");

/// Priority-ordered keyword table.
#[derive(Debug, Clone)]
pub struct CategoryRules {
    /// Keywords are stored lower-cased.
    entries: Vec<CategoryEntry>,
}

impl CategoryRules {
    /// The built-in table.
    ///
    /// # Panics
    ///
    /// Panics if the embedded `categories.toml` is malformed.
    pub fn builtin() -> Self {
        Self::parse(CATEGORIES_TOML).expect("embedded categories.toml is invalid")
    }

    /// Parse and validate a table from TOML text. Entry order is priority
    /// order.
    pub fn parse(content: &str) -> Result<Self, CategoryError> {
        let file: CategoryFile = toml::from_str(content)?;

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(file.categories.len());
        for entry in file.categories {
            if entry.category == Category::Pantry {
                return Err(CategoryError::PantryKeywords);
            }
            if !seen.insert(entry.category) {
                return Err(CategoryError::DuplicateCategory(entry.category));
            }
            let keywords = entry
                .keywords
                .iter()
                .map(|k| {
                    let k = k.trim().to_lowercase();
                    if k.is_empty() {
                        Err(CategoryError::BlankKeyword(entry.category))
                    } else {
                        Ok(k)
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            entries.push(CategoryEntry {
                category: entry.category,
                keywords,
            });
        }

        Ok(Self { entries })
    }

    /// File an item name under the first category with a matching keyword.
    pub fn categorize(&self, name: &str) -> Category {
        let lowered = name.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.keywords.iter().any(|k| lowered.contains(k.as_str())))
            .map_or(Category::Pantry, |e| e.category)
    }
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_follows_priority_order() {
        let rules = CategoryRules::builtin();
        let order: Vec<Category> = rules.entries.iter().map(|e| e.category).collect();
        assert_eq!(order, &Category::ALL[..6]);
    }

    #[test]
    fn categorize_examples() {
        let rules = CategoryRules::builtin();
        assert_eq!(rules.categorize("Cherry tomatoes"), Category::Produce);
        assert_eq!(rules.categorize("Chicken Breast"), Category::MeatSeafood);
        assert_eq!(rules.categorize("Greek yogurt"), Category::DairyEggs);
        assert_eq!(rules.categorize("Sourdough bread"), Category::Bakery);
        assert_eq!(rules.categorize("Frozen peas"), Category::Frozen);
        assert_eq!(rules.categorize("Orange juice"), Category::Beverages);
        assert_eq!(rules.categorize("Quinoa"), Category::Pantry);
    }

    #[test]
    fn earlier_category_wins() {
        let rules = CategoryRules::builtin();
        assert_eq!(rules.categorize("Garlic butter"), Category::Produce);
        assert_eq!(rules.categorize("Salmon cream sauce"), Category::MeatSeafood);
        // "cream" is checked before "ice cream".
        assert_eq!(rules.categorize("Vanilla ice cream"), Category::DairyEggs);
    }

    #[test]
    fn empty_name_is_pantry() {
        let rules = CategoryRules::builtin();
        assert_eq!(rules.categorize(""), Category::Pantry);
    }

    #[test]
    fn keywords_are_normalized() {
        let rules = CategoryRules::parse(
            r#"
[[categories]]
category = "Bakery"
keywords = ["  BAGUETTE "]
"#,
        )
        .unwrap();
        assert_eq!(rules.categorize("baguette"), Category::Bakery);
    }

    #[test]
    fn reject_pantry_entry() {
        let err = CategoryRules::parse(
            r#"
[[categories]]
category = "Pantry"
keywords = ["rice"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, CategoryError::PantryKeywords));
    }

    #[test]
    fn reject_duplicate_category() {
        let err = CategoryRules::parse(
            r#"
[[categories]]
category = "Frozen"
keywords = ["frozen"]

[[categories]]
category = "Frozen"
keywords = ["ice"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, CategoryError::DuplicateCategory(Category::Frozen)));
    }

    #[test]
    fn reject_blank_keyword() {
        let err = CategoryRules::parse(
            r#"
[[categories]]
category = "Beverages"
keywords = ["tea", "  "]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, CategoryError::BlankKeyword(Category::Beverages)));
    }
}
