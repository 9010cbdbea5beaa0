//! Skill CLI commands: create, show, tree, update, move, delete.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};

use skilltree_types::skill::{
    CreateSkillRequest, SkillId, SkillNode, SkillView, UpdateSkillRequest,
};

use crate::cli::{CreateArgs, UpdateArgs};
use crate::state::AppState;

fn parse_id(raw: &str) -> Result<SkillId> {
    raw.parse()
        .with_context(|| format!("'{raw}' is not a valid skill id"))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Root-to-node path, e.g. `Math › Algebra › Linear Equations`.
fn breadcrumb(view: &SkillView) -> String {
    view.ancestors
        .iter()
        .map(|a| a.name.as_str())
        .chain(std::iter::once(view.skill.name.as_str()))
        .collect::<Vec<_>>()
        .join(" › ")
}

fn print_view(headline: &str, view: &SkillView) {
    println!();
    println!("  {} {headline}", style("✓").green().bold());
    println!();
    println!("  {}  {}", style("Name:").bold(), style(&view.skill.name).cyan());
    println!("  {}  {}", style("Path:").bold(), breadcrumb(view));
    println!("  {}  {}", style("Depth:").bold(), view.depth);
    println!(
        "  {}  {}",
        style("ID:").bold(),
        style(view.skill.id.to_string()).dim()
    );
    println!();
}

/// Create a skill. Prompts for the name when it was not given.
///
/// # Examples
///
/// ```bash
/// sktree create "Algebra" --parent 0190f5d2-... --icon sigma
/// ```
pub async fn create_skill(state: &AppState, args: CreateArgs, json: bool) -> Result<()> {
    let name = match args.name {
        Some(n) => n,
        None => Input::<String>::new()
            .with_prompt("Skill name")
            .interact_text()?,
    };
    let parent_id = args.parent.as_deref().map(parse_id).transpose()?;

    let request = CreateSkillRequest {
        name,
        description: args.description,
        icon: args.icon,
        color: args.color,
        parent_id,
    };
    let view = state.hierarchy.create(request, args.actor).await?;

    if json {
        return print_json(&view);
    }
    print_view("Skill created", &view);
    Ok(())
}

/// Show one skill: path, fields, direct children and stats.
pub async fn show_skill(state: &AppState, id: &str, json: bool) -> Result<()> {
    let id = parse_id(id)?;
    let detail = state.hierarchy.get(&id).await?;

    if json {
        return print_json(&detail);
    }

    let path = detail
        .ancestors
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(" › ");

    println!();
    println!("  {}", style(&detail.skill.name).cyan().bold());
    if !path.is_empty() {
        println!("  {}", style(format!("in {path}")).dim());
    }
    println!();
    if let Some(description) = &detail.skill.description {
        println!("  {description}");
        println!();
    }
    println!("  {}  {}", style("ID:").bold(), detail.skill.id);
    if let Some(icon) = &detail.skill.icon {
        println!("  {}  {icon}", style("Icon:").bold());
    }
    if let Some(color) = detail.skill.color {
        println!("  {}  {color}", style("Color:").bold());
    }
    if let Some(by) = &detail.skill.created_by {
        println!("  {}  {by}", style("Created by:").bold());
    }
    println!(
        "  {}  {}",
        style("Created:").bold(),
        detail.skill.created_at.format("%Y-%m-%d %H:%M")
    );
    println!(
        "  {}  depth {}, {} direct, {} total below",
        style("Stats:").bold(),
        detail.stats.depth,
        detail.stats.direct_child_count,
        detail.stats.total_descendants
    );
    println!();

    if detail.children.is_empty() {
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Child").fg(Color::White),
        Cell::new("ID").fg(Color::White),
        Cell::new("Description").fg(Color::White),
    ]);
    for child in &detail.children {
        table.add_row(vec![
            Cell::new(&child.name).fg(Color::Cyan),
            Cell::new(child.id.to_string()).fg(Color::DarkGrey),
            Cell::new(child.description.as_deref().unwrap_or("")),
        ]);
    }
    println!("{table}");
    println!();

    Ok(())
}

/// Print the forest, optionally filtered by a name query.
pub async fn print_tree(state: &AppState, search: Option<&str>, json: bool) -> Result<()> {
    let forest = state.hierarchy.list_forest(search).await?;

    if json {
        return print_json(&serde_json::json!({ "skills": forest }));
    }

    if forest.is_empty() {
        println!();
        match search {
            Some(q) if !q.trim().is_empty() => println!(
                "  {} No skills match '{}'.",
                style("i").blue().bold(),
                q.trim()
            ),
            _ => println!(
                "  {} No skills yet. Create one with: {}",
                style("i").blue().bold(),
                style("sktree create <name>").yellow()
            ),
        }
        println!();
        return Ok(());
    }

    println!();
    for line in render_tree(&forest) {
        println!("  {line}");
    }
    println!();
    Ok(())
}

/// Render a forest as indented lines with box-drawing connectors.
///
/// Uses an explicit stack, so arbitrarily deep trees render without
/// recursion.
pub fn render_tree(forest: &[SkillNode]) -> Vec<String> {
    // (node, prefix for its children, connector for itself)
    let mut stack: Vec<(&SkillNode, String, &str)> = forest
        .iter()
        .rev()
        .map(|root| (root, String::new(), ""))
        .collect();
    let mut lines = Vec::new();

    while let Some((node, prefix, connector)) = stack.pop() {
        lines.push(format!("{prefix}{connector}{}", node.skill.name));

        let child_prefix = match connector {
            "" => prefix,
            "├─ " => format!("{prefix}│  "),
            _ => format!("{prefix}   "),
        };
        let last = node.children.len().saturating_sub(1);
        for (i, child) in node.children.iter().enumerate().rev() {
            let connector = if i == last { "└─ " } else { "├─ " };
            stack.push((child, child_prefix.clone(), connector));
        }
    }

    lines
}

/// Edit name, description, icon or color.
pub async fn update_skill(state: &AppState, args: UpdateArgs, json: bool) -> Result<()> {
    let id = parse_id(&args.id)?;
    let request = UpdateSkillRequest {
        name: args.name,
        description: args.description,
        icon: args.icon,
        color: args.color,
        parent_id: None,
    };
    let view = state.hierarchy.update(&id, request).await?;

    if json {
        return print_json(&view);
    }
    print_view("Skill updated", &view);
    Ok(())
}

/// Reparent a skill, or detach it to the root level.
pub async fn move_skill(
    state: &AppState,
    id: &str,
    parent: Option<&str>,
    json: bool,
) -> Result<()> {
    let id = parse_id(id)?;
    let parent_id = parent.map(parse_id).transpose()?;

    let request = UpdateSkillRequest {
        parent_id: Some(parent_id),
        ..Default::default()
    };
    let view = state.hierarchy.update(&id, request).await?;

    if json {
        return print_json(&view);
    }
    print_view("Skill moved", &view);
    Ok(())
}

/// Delete a skill and its subtree after confirmation.
pub async fn delete_skill(state: &AppState, id: &str, force: bool, json: bool) -> Result<()> {
    let id = parse_id(id)?;
    let detail = state.hierarchy.get(&id).await?;

    if !force && !json {
        let below = detail.stats.total_descendants;
        let prompt = if below == 0 {
            format!(
                "Permanently delete skill '{}'?",
                style(&detail.skill.name).red().bold()
            )
        } else {
            format!(
                "Permanently delete skill '{}' and the {below} skill(s) beneath it?",
                style(&detail.skill.name).red().bold()
            )
        };
        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.red} {msg}")?);
    spinner.set_message(format!("Deleting {}...", detail.skill.name));
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let deleted = state.hierarchy.delete(&id).await;
    spinner.finish_and_clear();
    let deleted = deleted?;

    if json {
        return print_json(&serde_json::json!({ "deleted": deleted }));
    }
    println!(
        "  {} Deleted '{}' ({deleted} skill(s) removed).",
        style("✓").red().bold(),
        detail.skill.name
    );
    Ok(())
}
