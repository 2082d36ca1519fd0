// ABOUTME: Plan rendering for the plan and deploy --dry-run commands.
// ABOUTME: Text output lists numbered operations; JSON output serializes the plan.

use std::fmt::Write;

use super::Plan;

/// Render a plan as human-readable text.
pub fn render_text(plan: &Plan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Environment: {}", plan.environment);
    for (key, value) in &plan.metadata {
        let _ = writeln!(out, "{}: {}", title_case(key), value);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Operations ({}):", plan.operations.len());

    for (index, op) in plan.operations.iter().enumerate() {
        let _ = write!(out, "  {}. {} [{}]", index + 1, op.id, op.kind);
        if !op.dependencies.is_empty() {
            let deps: Vec<&str> = op.dependencies.iter().map(|d| d.as_str()).collect();
            let _ = write!(out, " (depends on: {})", deps.join(", "));
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "     {}", op.description);
    }

    out
}

/// Render a plan as pretty-printed JSON.
pub fn render_json(plan: &Plan) -> serde_json::Result<String> {
    serde_json::to_string_pretty(plan)
}

fn title_case(key: &str) -> String {
    key.split('_')
        .enumerate()
        .map(|(i, word)| {
            if i > 0 {
                return word.to_string();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
