//! Merge ingredient line items into a shopping list.

use std::collections::HashMap;

use mealmate_db::models::{Ingredient, ShoppingListItem};

use super::categorize::CategoryRules;

/// Merge `ingredients` on (lower-cased name, exact unit), summing
/// quantities.
///
/// Items come out in first-occurrence order and keep the first
/// occurrence's spelling. Negative or non-finite quantities count as zero.
/// No unit conversion is attempted: "1 cup" and "2 tbsp" of the same name
/// stay separate. Each total is summed in ascending order of its parts, so
/// it does not depend on input order.
pub fn consolidate<'a, I>(rules: &CategoryRules, ingredients: I) -> Vec<ShoppingListItem>
where
    I: IntoIterator<Item = &'a Ingredient>,
{
    let mut items: Vec<ShoppingListItem> = Vec::new();
    let mut parts: Vec<Vec<f64>> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for ingredient in ingredients {
        let quantity = sanitize_quantity(ingredient.quantity);
        let key = (ingredient.name.to_lowercase(), ingredient.unit.clone());

        match index.get(&key) {
            Some(&i) => parts[i].push(quantity),
            None => {
                index.insert(key, items.len());
                parts.push(vec![quantity]);
                items.push(ShoppingListItem {
                    name: ingredient.name.clone(),
                    quantity: 0.0,
                    unit: ingredient.unit.clone(),
                    category: rules.categorize(&ingredient.name),
                    checked: false,
                });
            }
        }
    }

    for (item, mut quantities) in items.iter_mut().zip(parts) {
        quantities.sort_by(f64::total_cmp);
        item.quantity = quantities.into_iter().sum();
    }

    items
}

fn sanitize_quantity(quantity: f64) -> f64 {
    if quantity.is_finite() && quantity > 0.0 {
        quantity
    } else {
        0.0
    }
}
