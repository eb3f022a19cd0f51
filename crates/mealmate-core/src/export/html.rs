use maud::{DOCTYPE, Markup, PreEscaped, html};

use mealmate_db::models::{Meal, MealPlan};

use crate::plan::day_name;
use crate::shopping::format_quantity;

const PRINT_CSS: &str = "
body { font-family: Georgia, serif; margin: 2rem; color: #222; }
h1 { margin-bottom: 0.25rem; }
.meta { color: #666; margin-top: 0; }
.day { page-break-inside: avoid; border-top: 1px solid #ccc; padding-top: 0.5rem; }
.meal h3 { margin-bottom: 0.25rem; }
.meal .times { color: #666; font-size: 0.9em; }
@media print { body { margin: 0.5in; } }
";

/// Printable page for a plan, grouped by day. All text is escaped.
pub fn render_plan_html(plan: &MealPlan, meals: &[Meal]) -> Markup {
    let mut days: Vec<i32> = meals.iter().map(|m| m.day_of_week).collect();
    days.dedup();

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (plan.title) }
                style { (PreEscaped(PRINT_CSS)) }
            }
            body {
                h1 { (plan.title) }
                p.meta {
                    "Week of " (plan.week_start_date.format("%B %-d, %Y").to_string())
                    " · " (plan.total_calories) " calories"
                    @if !plan.dietary_preferences.is_empty() {
                        " · " (plan.dietary_preferences.join(", "))
                    }
                }
                @for day in &days {
                    section.day {
                        h2 { (day_name(*day)) }
                        @for meal in meals.iter().filter(|m| m.day_of_week == *day) {
                            (render_meal(meal))
                        }
                    }
                }
            }
        }
    }
}

fn render_meal(meal: &Meal) -> Markup {
    html! {
        article.meal {
            h3 { (meal.meal_type.label()) ": " (meal.recipe_name) }
            p.times {
                "Prep " (meal.prep_time) " min · Cook " (meal.cook_time) " min · Serves "
                (meal.servings) " · " (meal.calories_per_serving) " cal/serving"
            }
            @if !meal.recipe_description.is_empty() {
                p { (meal.recipe_description) }
            }
            ul {
                @for ingredient in &meal.ingredients.0 {
                    li {
                        (format_quantity(ingredient.quantity))
                        @if !ingredient.unit.is_empty() { " " (ingredient.unit) }
                        " " (ingredient.name)
                    }
                }
            }
            @if !meal.instructions.is_empty() {
                ol {
                    @for step in &meal.instructions {
                        li { (step) }
                    }
                }
            }
        }
    }
}
