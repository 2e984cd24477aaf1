use colored::{ColoredString, Colorize};
use reconcile::{Action, Attr, PlanSummary, ResourceModel, Value};

use crate::commands::{Change, PlannedChange};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a step indicator
pub fn step(num: usize, total: usize, msg: &str) {
    println!("{} {}", format!("[{num}/{total}]").blue().bold(), msg);
}

// ============================================================================
// Attribute Formatting
// ============================================================================

/// Display form of a ternary attribute
pub fn format_attr(value: &Attr<Value>) -> String {
    match value {
        Attr::Known(v) => v.to_string(),
        Attr::Null => "null".to_string(),
        Attr::Unknown => "(known after apply)".to_string(),
    }
}

fn colored_symbol(action: Action) -> ColoredString {
    match action {
        Action::Create => action.symbol().green(),
        Action::Update => action.symbol().yellow(),
        Action::Replace => action.symbol().red(),
        Action::NoOp => action.symbol().dimmed(),
    }
}

// ============================================================================
// Plan Display
// ============================================================================

/// Display planned changes grouped by resource, with a summary line
pub fn display_plan(changes: &[PlannedChange], summary: &PlanSummary) {
    if !summary.has_changes() {
        println!();
        println!("  {} No changes, the fabric matches the configuration", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Execution Plan".bold()
    );
    println!("│");

    for change in changes.iter().filter(|c| c.is_change()) {
        match &change.change {
            Change::Apply(plan) => {
                let mut line = format!("│ {} {}", colored_symbol(plan.action), change.key.bold());
                if !plan.replace_reasons.is_empty() {
                    line.push_str(&format!(
                        " {}",
                        format!("(forces replacement: {})", plan.replace_reasons.join(", ")).red()
                    ));
                }
                println!("{line}");

                for name in &plan.changed {
                    let after = format_attr(plan.model.get(name));
                    match (plan.action, &change.prior) {
                        (Action::Create, _) | (_, None) => {
                            println!("│     {} = {}", name, after.green());
                        }
                        (_, Some(prior)) => {
                            let before = format_attr(prior.get(name));
                            println!("│     {} {} → {}", name, before.dimmed(), after.yellow());
                        }
                    }
                }
            }
            Change::Delete(model) => {
                println!("│ {} {}", "-".red(), change.key.bold());
                if let Some(id) = model.id(change.descriptor) {
                    println!("│     {}", id.dimmed());
                }
            }
        }
        println!("│");
    }

    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Plan: {} to create, {} to update, {} to replace, {} to delete",
        summary.creates.to_string().green(),
        summary.updates.to_string().yellow(),
        summary.replaces.to_string().red(),
        summary.deletes.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

/// Display every attribute of a model
pub fn display_model(key: &str, model: &ResourceModel) {
    header(&format!("{key} ({})", model.resource_type));
    let width = model.attributes.keys().map(String::len).max().unwrap_or(0);
    for (name, value) in &model.attributes {
        let text = format_attr(value);
        let text = match value {
            Attr::Known(_) => text.normal(),
            Attr::Null => text.dimmed(),
            Attr::Unknown => text.yellow(),
        };
        println!("  {}  {}", format!("{name:<width$}").dimmed(), text);
    }
}
