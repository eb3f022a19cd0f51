//! Meal plan and shopping list export.

mod html;

pub use html::render_plan_html;

use std::fmt;
use std::str::FromStr;

use mealmate_db::models::{Meal, MealPlan, ParseEnumError, ShoppingListItem};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plan::day_name;
use crate::shopping::format_quantity;

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    Html,
    /// Recognized so it can be rejected with a helpful message.
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Html => "html",
            Self::Pdf => "pdf",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Html => "text/html; charset=utf-8",
            Self::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "html" => Ok(Self::Html),
            "pdf" => Ok(Self::Pdf),
            _ => Err(ParseEnumError::new("export format", s)),
        }
    }
}

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF export is not supported; export as html and print it to PDF instead")]
    PdfUnsupported,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to finish CSV output: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// A rendered export ready to write to disk or an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

/// Render a plan in `format`.
pub fn export_meal_plan(
    plan: &MealPlan,
    meals: &[Meal],
    format: ExportFormat,
) -> Result<ExportArtifact, ExportError> {
    let body = match format {
        ExportFormat::Csv => plan_csv(meals)?,
        ExportFormat::Html => render_plan_html(plan, meals).into_string(),
        ExportFormat::Pdf => return Err(ExportError::PdfUnsupported),
    };
    Ok(ExportArtifact {
        filename: format!("meal-plan-{}.{}", plan.id, format.extension()),
        content_type: format.content_type(),
        body,
    })
}

/// One row per meal: Day, Meal Type, Recipe Name, Prep Time, Cook Time,
/// Calories, Protein, Carbs, Fat.
pub fn plan_csv(meals: &[Meal]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Day",
        "Meal Type",
        "Recipe Name",
        "Prep Time",
        "Cook Time",
        "Calories",
        "Protein",
        "Carbs",
        "Fat",
    ])?;
    for meal in meals {
        let nutrition = &meal.nutrition_info.0;
        writer.write_record([
            day_name(meal.day_of_week).to_owned(),
            meal.meal_type.label().to_owned(),
            meal.recipe_name.clone(),
            meal.prep_time.to_string(),
            meal.cook_time.to_string(),
            meal.calories_per_serving.to_string(),
            format_quantity(nutrition.protein),
            format_quantity(nutrition.carbs),
            format_quantity(nutrition.fat),
        ])?;
    }
    finish(writer)
}

/// Category, Item, Quantity, Unit, Checked.
pub fn shopping_list_csv(items: &[ShoppingListItem]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Category", "Item", "Quantity", "Unit", "Checked"])?;
    for item in items {
        writer.write_record([
            item.category.label(),
            item.name.as_str(),
            format_quantity(item.quantity).as_str(),
            item.unit.as_str(),
            if item.checked { "yes" } else { "no" },
        ])?;
    }
    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}
