//! Shopping lists: categorization, consolidation and check-off state.

mod categorize;
mod consolidate;
pub mod service;

pub use categorize::{CategoryError, CategoryRules};
pub use consolidate::consolidate;

use mealmate_db::models::{Category, ShoppingListItem};
use serde::Serialize;
use thiserror::Error;

/// Errors from in-memory shopping list edits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShoppingError {
    #[error("item index {index} out of range (list has {len} items)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Title for the list derived from a plan.
pub fn shopping_list_title(plan_title: &str) -> String {
    format!("Shopping List - {plan_title}")
}

/// Group items by category in category priority order. Empty categories
/// are omitted; items keep their list order within a group.
pub fn group_by_category(items: &[ShoppingListItem]) -> Vec<(Category, Vec<&ShoppingListItem>)> {
    Category::ALL
        .iter()
        .filter_map(|&category| {
            let group: Vec<&ShoppingListItem> =
                items.iter().filter(|i| i.category == category).collect();
            (!group.is_empty()).then_some((category, group))
        })
        .collect()
}

/// Flip the `checked` flag of one item. Returns the new state.
pub fn toggle_item(items: &mut [ShoppingListItem], index: usize) -> Result<bool, ShoppingError> {
    let len = items.len();
    let item = items
        .get_mut(index)
        .ok_or(ShoppingError::IndexOutOfRange { index, len })?;
    item.checked = !item.checked;
    Ok(item.checked)
}

/// How much of a list has been checked off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShoppingProgress {
    pub checked: usize,
    pub total: usize,
}

impl ShoppingProgress {
    pub fn of(items: &[ShoppingListItem]) -> Self {
        Self {
            checked: items.iter().filter(|i| i.checked).count(),
            total: items.len(),
        }
    }

    /// Whole percent, rounded down. An empty list is 0%.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        u8::try_from(self.checked * 100 / self.total).unwrap_or(100)
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.checked == self.total
    }
}

/// Render a quantity without trailing zeros: `3`, `1.5`, `0.33`.
pub fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{quantity:.0}")
    } else {
        let s = format!("{quantity:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_owned()
    }
}
