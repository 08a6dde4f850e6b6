//! Diff display

use colored::{ColoredString, Colorize};
use reconcile::{ChangeKind, DiffSummary, ResourceDiff, group_by_type};

fn colored_symbol(kind: ChangeKind) -> ColoredString {
    let symbol = kind.symbol();
    match kind {
        ChangeKind::Start | ChangeKind::Enable => symbol.green(),
        ChangeKind::Stop | ChangeKind::Disable => symbol.red(),
        ChangeKind::Restart | ChangeKind::Reload => symbol.yellow(),
        ChangeKind::Missing => symbol.red().bold(),
        ChangeKind::Unknown => symbol.dimmed(),
    }
}

/// One-line description of a state transition
pub fn transition(diff: &ResourceDiff) -> String {
    match diff.kind() {
        ChangeKind::Missing => "(service not found)".to_string(),
        ChangeKind::Unknown => match &diff.error {
            Some(error) => format!("(status unavailable: {error})"),
            None => format!("{} → {}", diff.current, diff.desired),
        },
        _ => format!("{} → {}", diff.current, diff.desired),
    }
}

/// Display a list of diffs in a user-friendly format
pub fn display_diff(diffs: &[ResourceDiff]) {
    if diffs.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Service Diff".bold()
    );
    println!("│");

    for (resource_type, type_diffs) in group_by_type(diffs) {
        let type_name = match resource_type.as_str() {
            "service" => "Services",
            other => other,
        };
        println!("│ {}", type_name.bold());

        for diff in type_diffs {
            let sudo_indicator = if diff.requires_privilege {
                " [sudo]".red().to_string()
            } else {
                String::new()
            };

            println!(
                "│   {} {:<30} {}{}",
                colored_symbol(diff.kind()),
                diff.resource_id,
                transition(diff).dimmed(),
                sudo_indicator
            );
        }
        println!("│");
    }

    let summary = DiffSummary::from_diffs(diffs);
    let missing = summary.count(ChangeKind::Missing) + summary.count(ChangeKind::Unknown);

    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} changes ({} unprivileged, {} require sudo)",
        summary.total().to_string().bold(),
        (summary.total() - summary.privileged).to_string().green(),
        summary.privileged.to_string().red()
    );
    if missing > 0 {
        println!(
            "│          {} will fail (service missing or unreadable)",
            missing.to_string().red()
        );
    }
    println!("└─────────────────────────────────────────────────────┘");
}

/// Display the sudo boundary warning
pub fn display_sudo_boundary(diffs: &[ResourceDiff]) {
    let privileged: Vec<&ResourceDiff> = diffs.iter().filter(|d| d.requires_privilege).collect();
    if privileged.is_empty() {
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Privilege Boundary".yellow().bold()
    );
    println!("│");
    println!(
        "│  {}  The following {} operations require sudo:",
        "⚠".yellow(),
        privileged.len()
    );
    println!("│");

    for diff in privileged.iter().take(10) {
        println!("│  • {}", diff.description);
    }

    if privileged.len() > 10 {
        println!("│  • ... and {} more", privileged.len() - 10);
    }

    println!("│");
    println!("│  Sudo will be requested once and released immediately after.");
    println!("│");
    println!("└─────────────────────────────────────────────────────────────┘");
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::ResourceState;

    fn diff(current: ResourceState, desired: ResourceState, error: Option<&str>) -> ResourceDiff {
        ResourceDiff {
            resource_id: "kafka-manager".into(),
            resource_type: "service".into(),
            description: "restart kafka-manager".into(),
            current,
            desired,
            error: error.map(str::to_string),
            requires_privilege: true,
        }
    }

    #[test]
    fn test_transition_text() {
        assert_eq!(
            transition(&diff(ResourceState::Running, ResourceState::Restarted, None)),
            "running → restarted"
        );
        assert_eq!(
            transition(&diff(ResourceState::Absent, ResourceState::Restarted, None)),
            "(service not found)"
        );
        assert_eq!(
            transition(&diff(
                ResourceState::Unknown,
                ResourceState::Restarted,
                Some("failed to connect to bus")
            )),
            "(status unavailable: failed to connect to bus)"
        );
    }
}
