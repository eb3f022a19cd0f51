//! Dietary preference and allergy vocabularies.
//!
//! The rules are data: `dietary.toml` is embedded at compile time and maps
//! each preference or allergy to the ingredient-name substrings it rules
//! out. A preference may `extend` others and inherit their terms.
//!
//! Matching is case-insensitive on both sides (Unicode lower-casing, no
//! locale rules).

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::catalog::Recipe;

/// A named dietary preference and the terms it excludes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceRule {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub excludes: Vec<String>,
    /// Other preferences whose terms this one inherits.
    #[serde(default)]
    pub extends: Vec<String>,
}

/// A named allergy and the terms it excludes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllergyRule {
    pub name: String,
    #[serde(default)]
    pub terms: Vec<String>,
}

/// Errors that can occur while loading a dietary rule table.
#[derive(Debug, Error)]
pub enum DietError {
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("duplicate preference name: {0:?}")]
    DuplicatePreference(String),

    #[error("duplicate allergy name: {0:?}")]
    DuplicateAllergy(String),

    #[error("preference {preference:?} extends unknown preference {parent:?}")]
    UnknownParent { preference: String, parent: String },

    #[error("preference inheritance cycle involving: {0}")]
    CycleDetected(String),
}

#[derive(Debug, Deserialize)]
struct DietFile {
    #[serde(default)]
    preferences: Vec<PreferenceRule>,
    #[serde(default)]
    allergies: Vec<AllergyRule>,
}

/// The embedded dietary rule table.
static DIETARY_TOML: &str = include_str!("dietary.toml");

/// Validated dietary rule table.
#[derive(Debug, Clone)]
pub struct DietaryRules {
    preferences: Vec<PreferenceRule>,
    allergies: Vec<AllergyRule>,
    /// Lower-cased name -> index into `preferences`.
    preference_index: HashMap<String, usize>,
    /// Lower-cased name -> index into `allergies`.
    allergy_index: HashMap<String, usize>,
}

impl DietaryRules {
    /// The built-in rule table.
    ///
    /// # Panics
    ///
    /// Panics if the embedded `dietary.toml` is malformed.
    pub fn builtin() -> Self {
        Self::parse(DIETARY_TOML).expect("embedded dietary.toml is invalid")
    }

    /// Parse and validate a rule table from TOML text.
    pub fn parse(content: &str) -> Result<Self, DietError> {
        let file: DietFile = toml::from_str(content)?;
        Self::new(file.preferences, file.allergies)
    }

    pub fn new(
        preferences: Vec<PreferenceRule>,
        allergies: Vec<AllergyRule>,
    ) -> Result<Self, DietError> {
        let mut preference_index = HashMap::new();
        for (i, rule) in preferences.iter().enumerate() {
            if preference_index.insert(normalize(&rule.name), i).is_some() {
                return Err(DietError::DuplicatePreference(rule.name.clone()));
            }
        }

        let mut allergy_index = HashMap::new();
        for (i, rule) in allergies.iter().enumerate() {
            if allergy_index.insert(normalize(&rule.name), i).is_some() {
                return Err(DietError::DuplicateAllergy(rule.name.clone()));
            }
        }

        for rule in &preferences {
            for parent in &rule.extends {
                if !preference_index.contains_key(&normalize(parent)) {
                    return Err(DietError::UnknownParent {
                        preference: rule.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        check_for_cycles(&preferences, &preference_index)?;

        Ok(Self {
            preferences,
            allergies,
            preference_index,
            allergy_index,
        })
    }

    pub fn preferences(&self) -> &[PreferenceRule] {
        &self.preferences
    }

    pub fn allergies(&self) -> &[AllergyRule] {
        &self.allergies
    }

    /// Look up a preference by name, ignoring case.
    pub fn preference(&self, name: &str) -> Option<&PreferenceRule> {
        self.preference_index
            .get(&normalize(name))
            .map(|&i| &self.preferences[i])
    }

    /// Look up an allergy by name, ignoring case.
    pub fn allergy(&self, name: &str) -> Option<&AllergyRule> {
        self.allergy_index
            .get(&normalize(name))
            .map(|&i| &self.allergies[i])
    }

    /// Build the combined exclusion vocabulary for a set of declared
    /// preferences and allergies.
    ///
    /// Unknown preferences contribute nothing. Every allergy contributes its
    /// own text as a term, plus the table's terms when it is a known one.
    pub fn exclusions<P, A>(&self, preferences: &[P], allergies: &[A]) -> ExclusionSet
    where
        P: AsRef<str>,
        A: AsRef<str>,
    {
        let mut terms = BTreeSet::new();

        for name in preferences {
            let name = name.as_ref();
            if self.preference(name).is_none() {
                debug!(preference = name, "unknown dietary preference, no exclusions");
                continue;
            }
            self.collect_preference_terms(name, &mut terms);
        }

        for name in allergies {
            let name = name.as_ref();
            insert_term(&mut terms, name);
            if let Some(rule) = self.allergy(name) {
                for term in &rule.terms {
                    insert_term(&mut terms, term);
                }
            }
        }

        ExclusionSet { terms }
    }

    /// Walk `extends` breadth-first, collecting every reachable term.
    fn collect_preference_terms(&self, name: &str, terms: &mut BTreeSet<String>) {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([normalize(name)]);
        while let Some(key) = queue.pop_front() {
            if !visited.insert(key.clone()) {
                continue;
            }
            let Some(&i) = self.preference_index.get(&key) else {
                continue;
            };
            let rule = &self.preferences[i];
            for term in &rule.excludes {
                insert_term(terms, term);
            }
            queue.extend(rule.extends.iter().map(|p| normalize(p)));
        }
    }
}

impl Default for DietaryRules {
    fn default() -> Self {
        Self::builtin()
    }
}

/// The set of lower-cased substrings a recipe's ingredient names must not
/// contain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    terms: BTreeSet<String>,
}

/// The first ingredient that put a recipe out of bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation<'a> {
    pub ingredient: &'a str,
    pub term: &'a str,
}

impl ExclusionSet {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    /// Return the first (ingredient, term) pair that excludes `recipe`, in
    /// ingredient order.
    pub fn violation<'a>(&'a self, recipe: &'a Recipe) -> Option<Violation<'a>> {
        if self.terms.is_empty() {
            return None;
        }
        recipe.ingredients.iter().find_map(|ingredient| {
            let lowered = ingredient.name.to_lowercase();
            self.terms
                .iter()
                .find(|term| lowered.contains(term.as_str()))
                .map(|term| Violation {
                    ingredient: ingredient.name.as_str(),
                    term: term.as_str(),
                })
        })
    }

    pub fn permits(&self, recipe: &Recipe) -> bool {
        self.violation(recipe).is_none()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Blank terms would match every ingredient, so they are dropped.
fn insert_term(terms: &mut BTreeSet<String>, term: &str) {
    let term = normalize(term);
    if !term.is_empty() {
        terms.insert(term);
    }
}

/// Reject `extends` cycles with Kahn's algorithm.
fn check_for_cycles(
    preferences: &[PreferenceRule],
    index: &HashMap<String, usize>,
) -> Result<(), DietError> {
    let n = preferences.len();
    let mut in_degree = vec![0usize; n];
    let mut adj: Vec<Vec<usize>> = vec![vec![]; n];

    for (child, rule) in preferences.iter().enumerate() {
        for parent in &rule.extends {
            let parent = index[&normalize(parent)];
            adj[parent].push(child);
            in_degree[child] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut sorted_count = 0usize;
    while let Some(node) = queue.pop_front() {
        sorted_count += 1;
        for &next in &adj[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if sorted_count != n {
        let names: Vec<&str> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, deg)| **deg > 0)
            .map(|(i, _)| preferences[i].name.as_str())
            .collect();
        return Err(DietError::CycleDetected(names.join(", ")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{RecipeCatalog, StaticCatalog};

    fn recipe(name: &str, ingredients: &[&str]) -> Recipe {
        Recipe {
            name: name.to_owned(),
            description: String::new(),
            cuisine: "Test".to_owned(),
            meal_types: vec![mealmate_db::models::MealType::Dinner],
            ingredients: ingredients
                .iter()
                .map(|n| mealmate_db::models::Ingredient::new(*n, 1.0, "pcs"))
                .collect(),
            instructions: vec![],
            prep_time: 0,
            cook_time: 0,
            calories_per_serving: 100,
            nutrition: Default::default(),
        }
    }

    // -- table tests --

    #[test]
    fn builtin_table_loads() {
        let rules = DietaryRules::builtin();
        for name in [
            "Vegetarian", "Vegan", "Keto", "Paleo", "Mediterranean", "Low-carb",
            "High-protein", "Gluten-free", "Dairy-free", "Nut-free",
        ] {
            assert!(rules.preference(name).is_some(), "missing preference {name}");
        }
        for name in ["Nuts", "Dairy", "Eggs", "Soy", "Gluten", "Shellfish", "Fish", "Sesame"] {
            assert!(rules.allergy(name).is_some(), "missing allergy {name}");
        }
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        let rules = DietaryRules::builtin();
        assert_eq!(rules.preference("  vEgAn ").unwrap().name, "Vegan");
        assert_eq!(rules.allergy("shellfish").unwrap().name, "Shellfish");
    }

    #[test]
    fn reject_duplicate_preference() {
        let toml = r#"
[[preferences]]
name = "Vegan"
[[preferences]]
name = "vegan"
"#;
        let err = DietaryRules::parse(toml).unwrap_err();
        assert!(matches!(err, DietError::DuplicatePreference(_)));
    }

    #[test]
    fn reject_duplicate_allergy() {
        let toml = r#"
[[allergies]]
name = "Soy"
[[allergies]]
name = "Soy"
"#;
        let err = DietaryRules::parse(toml).unwrap_err();
        assert!(matches!(err, DietError::DuplicateAllergy(_)));
    }

    #[test]
    fn reject_unknown_parent() {
        let toml = r#"
[[preferences]]
name = "Vegan"
extends = ["Pescatarian"]
"#;
        let err = DietaryRules::parse(toml).unwrap_err();
        assert!(matches!(err, DietError::UnknownParent { parent, .. } if parent == "Pescatarian"));
    }

    #[test]
    fn reject_inheritance_cycle() {
        let toml = r#"
[[preferences]]
name = "A"
extends = ["B"]
[[preferences]]
name = "B"
extends = ["A"]
[[preferences]]
name = "C"
"#;
        let err = DietaryRules::parse(toml).unwrap_err();
        match err {
            DietError::CycleDetected(names) => {
                assert!(names.contains('A') && names.contains('B'));
                assert!(!names.contains('C'));
            }
            other => panic!("expected CycleDetected, got {other:?}"),
        }
    }

    // -- exclusion tests --

    #[test]
    fn vegan_inherits_vegetarian_terms() {
        let rules = DietaryRules::builtin();
        let set = rules.exclusions(&["Vegan"], &[] as &[&str]);
        let terms: Vec<&str> = set.terms().collect();
        assert!(terms.contains(&"chicken"), "inherited from Vegetarian");
        assert!(terms.contains(&"cheese"));
    }

    #[test]
    fn informational_preference_excludes_nothing() {
        let rules = DietaryRules::builtin();
        let set = rules.exclusions(&["Keto", "High-protein"], &[] as &[&str]);
        assert!(set.is_empty());
    }

    #[test]
    fn unknown_preference_is_ignored() {
        let rules = DietaryRules::builtin();
        let set = rules.exclusions(&["Carnivore"], &[] as &[&str]);
        assert!(set.is_empty());
    }

    #[test]
    fn custom_allergy_uses_its_own_text() {
        let rules = DietaryRules::builtin();
        let set = rules.exclusions(&[] as &[&str], &["  Kiwi "]);
        assert_eq!(set.terms().collect::<Vec<_>>(), vec!["kiwi"]);
        assert!(!set.permits(&recipe("Fruit Salad", &["Kiwi fruit", "Banana"])));
    }

    #[test]
    fn blank_allergy_is_ignored() {
        let rules = DietaryRules::builtin();
        let set = rules.exclusions(&[] as &[&str], &["", "   "]);
        assert!(set.is_empty());
        assert!(set.permits(&recipe("Anything", &["Bread"])));
    }

    #[test]
    fn caesar_dressing_counts_as_fish_dairy_and_egg() {
        let rules = DietaryRules::builtin();
        let r = recipe("Side Salad", &["Romaine lettuce", "Caesar dressing"]);
        for allergy in ["Fish", "Dairy", "Eggs"] {
            let set = rules.exclusions(&[] as &[&str], &[allergy]);
            let v = set
                .violation(&r)
                .unwrap_or_else(|| panic!("{allergy} should exclude Caesar dressing"));
            assert_eq!(v.ingredient, "Caesar dressing");
            assert_eq!(v.term, "caesar");
        }
        for preference in ["Vegetarian", "Vegan", "Dairy-free"] {
            assert!(!rules.exclusions(&[preference], &[] as &[&str]).permits(&r), "{preference}");
        }
        assert!(rules.exclusions(&[] as &[&str], &["Soy"]).permits(&r));
    }

    #[test]
    fn violation_reports_first_ingredient() {
        let rules = DietaryRules::builtin();
        let set = rules.exclusions(&["Vegetarian"], &["Dairy"]);
        let r = recipe("Salmon Salad", &["Lettuce", "Salmon fillet", "Feta cheese"]);
        let v = set.violation(&r).unwrap();
        assert_eq!(v.ingredient, "Salmon fillet");
        assert_eq!(v.term, "salmon");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let rules = DietaryRules::builtin();
        let set = rules.exclusions(&["gluten-FREE"], &[] as &[&str]);
        assert!(!set.permits(&recipe("Sandwich", &["SOURDOUGH BREAD"])));
        assert!(set.permits(&recipe("Rice Bowl", &["Jasmine rice"])));
    }

    #[test]
    fn builtin_catalog_has_vegan_options_for_every_planned_meal() {
        let rules = DietaryRules::builtin();
        let set = rules.exclusions(&["Vegan"], &[] as &[&str]);
        let catalog = StaticCatalog::builtin();
        for meal_type in mealmate_db::models::MealType::PLANNED {
            assert!(
                catalog
                    .recipes()
                    .iter()
                    .any(|r| r.serves(meal_type) && set.permits(r)),
                "no vegan {meal_type}"
            );
        }
    }
}
