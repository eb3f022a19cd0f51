//! CLI handlers for `mealmate shopping` subcommands.

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use mealmate_core::export::shopping_list_csv;
use mealmate_core::shopping::service::{
    generate_shopping_list, get_shopping_list, toggle_shopping_item,
};
use mealmate_core::shopping::{CategoryRules, ShoppingProgress, format_quantity};
use mealmate_db::models::{ShoppingList, ShoppingListItem};

use crate::ShoppingCommands;
use crate::resolve::resolve_plan_id;

pub async fn run_shopping_command(
    command: ShoppingCommands,
    pool: &PgPool,
    user_id: Uuid,
) -> Result<()> {
    match command {
        ShoppingCommands::Generate { plan } => {
            let plan_id = resolve_plan_id(pool, user_id, &plan).await?;
            let list =
                generate_shopping_list(pool, &CategoryRules::builtin(), user_id, plan_id).await?;
            print_list(&list);
            Ok(())
        }
        ShoppingCommands::Show { plan } => {
            let list = stored_list(pool, user_id, &plan).await?;
            print_list(&list);
            Ok(())
        }
        ShoppingCommands::Check { plan, item } => {
            let plan_id = resolve_plan_id(pool, user_id, &plan).await?;
            let index = item
                .checked_sub(1)
                .context("item numbers start at 1")?;
            let list = toggle_shopping_item(pool, user_id, plan_id, index).await?;
            let toggled = &list.items.0[index];
            let mark = if toggled.checked { "checked" } else { "unchecked" };
            println!("{item}. {} {mark}.", describe(toggled));
            print_progress(ShoppingProgress::of(&list.items.0));
            Ok(())
        }
        ShoppingCommands::Export { plan, output } => {
            let list = stored_list(pool, user_id, &plan).await?;
            let csv = shopping_list_csv(&list.items.0)?;
            write_output(&csv, output.as_deref())
        }
    }
}

async fn stored_list(pool: &PgPool, user_id: Uuid, plan: &str) -> Result<ShoppingList> {
    let plan_id = resolve_plan_id(pool, user_id, plan).await?;
    get_shopping_list(pool, user_id, plan_id)
        .await?
        .with_context(|| {
            format!("no shopping list for plan {plan_id}; run `mealmate shopping generate {plan}`")
        })
}

fn write_output(body: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, body)
                .with_context(|| format!("failed to write to {}", path.display()))?;
            println!("Shopping list exported to {}", path.display());
        }
        None => print!("{body}"),
    }
    Ok(())
}

fn describe(item: &ShoppingListItem) -> String {
    if item.unit.is_empty() {
        format!("{} {}", format_quantity(item.quantity), item.name)
    } else {
        format!("{} {} {}", format_quantity(item.quantity), item.unit, item.name)
    }
}

fn print_list(list: &ShoppingList) {
    println!("{}", list.title);

    // Numbers follow storage order so `shopping check` can address items.
    let items = &list.items.0;
    let mut by_category: Vec<(usize, &ShoppingListItem)> = items.iter().enumerate().collect();
    by_category.sort_by_key(|(i, item)| (item.category, *i));

    let mut current = None;
    for (i, item) in by_category {
        if current != Some(item.category) {
            current = Some(item.category);
            println!();
            println!("{}", item.category);
        }
        let mark = if item.checked { "x" } else { " " };
        println!("  [{mark}] {:>3}. {}", i + 1, describe(item));
    }

    println!();
    print_progress(ShoppingProgress::of(items));
}

fn print_progress(progress: ShoppingProgress) {
    if progress.is_complete() {
        println!("All {} items checked off.", progress.total);
    } else {
        println!(
            "{} of {} items checked ({}%)",
            progress.checked,
            progress.total,
            progress.percent()
        );
    }
}
