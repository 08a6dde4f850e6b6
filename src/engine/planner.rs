//! Execution planner - turns a manifest into an execution plan

use anyhow::{Result, bail};
use reconcile::{ExecutionPlan, Target};

use crate::resource::ServiceResource;
use crate::schema::Manifest;

/// Build a plan from the active declarations of a manifest
///
/// Declarations keep manifest order. Disabled declarations never enter the
/// plan; targeting one by name is an error rather than a silent no-op.
pub fn build_plan(manifest: &Manifest, target: Option<&str>) -> Result<ExecutionPlan> {
    let retry = manifest.retry.to_config();
    let mut plan = ExecutionPlan::new();

    for decl in manifest.active() {
        plan.add_resource(
            Box::new(ServiceResource::new(decl.clone(), retry.clone())),
            &manifest.sudo,
        );
    }

    let plan = plan.filter_by_target(target);

    if let Some(t) = target
        && plan.is_empty()
    {
        let name = Target::parse(t).name.unwrap_or_default();
        if manifest.find(&name).is_some_and(|d| !d.enabled) {
            bail!("'{name}' is disabled in the manifest");
        }
        bail!("No declaration matches '{t}'");
    }

    Ok(plan)
}

/// Active declarations matching a target, as service resources
pub fn select(manifest: &Manifest, target: Option<&str>) -> Vec<ServiceResource> {
    let retry = manifest.retry.to_config();
    let target = target.map(Target::parse);

    manifest
        .active()
        .map(|decl| ServiceResource::new(decl.clone(), retry.clone()))
        .filter(|res| target.as_ref().is_none_or(|t| t.matches(res)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sudo::SudoMode;
    use reconcile::Resource;

    const MANIFEST: &str = r#"
[sudo]
mode = "never"

[[service]]
name = "kafka-manager"
supports = ["restart", "status", "stop", "start"]
action = "restart"

[[service]]
name = "kafka-rest"
supports = ["status"]
action = "status"

[[service]]
name = "burrow"
enabled = false
supports = ["restart", "status", "stop", "start"]
action = "restart"
"#;

    fn manifest() -> Manifest {
        Manifest::from_toml_str(MANIFEST).unwrap()
    }

    fn ids(plan: &ExecutionPlan) -> Vec<String> {
        plan.resources().map(|r| r.id()).collect()
    }

    #[test]
    fn test_disabled_declarations_never_planned() {
        let plan = build_plan(&manifest(), None).unwrap();
        assert_eq!(ids(&plan), ["kafka-manager", "kafka-rest"]);
    }

    #[test]
    fn test_never_mode_keeps_everything_unprivileged() {
        let plan = build_plan(&manifest(), None).unwrap();
        assert!(!plan.has_privileged());
    }

    #[test]
    fn test_always_mode_escalates_mutating_actions() {
        let mut manifest = manifest();
        manifest.sudo.mode = SudoMode::Always;

        let plan = build_plan(&manifest, None).unwrap();

        assert_eq!(plan.privileged.len(), 1);
        assert_eq!(plan.privileged[0].id(), "kafka-manager");
        assert_eq!(plan.unprivileged[0].id(), "kafka-rest");
    }

    #[test]
    fn test_target_filters() {
        let plan = build_plan(&manifest(), Some("service.kafka-rest")).unwrap();
        assert_eq!(ids(&plan), ["kafka-rest"]);

        let plan = build_plan(&manifest(), Some("kafka-*")).unwrap();
        assert_eq!(plan.total_resources(), 2);
    }

    #[test]
    fn test_targeting_disabled_declaration() {
        let err = build_plan(&manifest(), Some("burrow")).unwrap_err();
        assert_eq!(err.to_string(), "'burrow' is disabled in the manifest");

        let err = build_plan(&manifest(), Some("zookeeper")).unwrap_err();
        assert!(err.to_string().contains("No declaration matches"));
    }

    #[test]
    fn test_select() {
        let selected = select(&manifest(), Some("kafka-manager"));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].declaration().name, "kafka-manager");
        assert_eq!(select(&manifest(), None).len(), 2);
    }
}
