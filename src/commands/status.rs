//! `converge status` - read-only view of every declared service

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use unitkit::UnitStatus;

use crate::Context;
use crate::engine::planner;
use crate::resource::ServiceResource;
use crate::ui;

#[derive(Serialize)]
struct StatusEntry {
    name: String,
    unit: String,
    provider: &'static str,
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<UnitStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct StatusReport {
    checked_at: DateTime<Utc>,
    services: Vec<StatusEntry>,
    inert: Vec<String>,
}

fn query(resource: &ServiceResource) -> StatusEntry {
    let decl = resource.declaration();
    let (status, error) = match resource.unit_status() {
        Ok(status) => (Some(status), None),
        Err(e) => (None, Some(format!("{e:#}"))),
    };

    StatusEntry {
        name: decl.name.clone(),
        unit: decl.unit_name().to_string(),
        provider: decl.provider.as_str(),
        action: decl.action.as_str(),
        status,
        error,
    }
}

pub fn run(ctx: &Context, target: Option<&str>, json: bool) -> Result<()> {
    let (_, manifest) = super::load_manifest(ctx)?;

    let services: Vec<StatusEntry> = planner::select(&manifest, target)
        .iter()
        .map(query)
        .collect();
    let inert: Vec<String> = if target.is_some() {
        Vec::new()
    } else {
        manifest.disabled().map(|d| d.name.clone()).collect()
    };

    if json {
        let report = StatusReport {
            checked_at: Utc::now(),
            services,
            inert,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    ui::header("Service Status");

    if services.is_empty() {
        ui::info("No active declarations");
    }

    for entry in &services {
        let detail = match (&entry.status, &entry.error) {
            (Some(status), _) if status.is_running() => status.summary().green(),
            (Some(status), _) if !status.is_present() => status.summary().yellow(),
            (Some(status), _) => status.summary().normal(),
            (None, Some(error)) => error.red(),
            (None, None) => "unknown".dimmed(),
        };
        println!(
            "  {:<24} {:<32} {}",
            entry.name.bold(),
            format!("{} ({})", entry.unit, entry.provider).dimmed(),
            detail
        );
    }

    for name in &inert {
        println!("  {:<24} {}", name.dimmed(), "inert (disabled)".dimmed());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::service::testing::FakeHost;
    use crate::schema::ServiceDeclaration;
    use unitkit::{Client, RetryConfig, ServiceAction};

    fn resource(host: &std::sync::Arc<FakeHost>, name: &str) -> ServiceResource {
        let mut decl = ServiceDeclaration::new(name, ServiceAction::Restart);
        decl.supports.insert(ServiceAction::Restart);
        ServiceResource::with_client(
            decl,
            Client::with_backend(host.backend()),
            RetryConfig::default(),
        )
    }

    #[test]
    fn test_query_running_unit() {
        let host = FakeHost::new();
        host.install("kafka-manager", true, true);

        let entry = query(&resource(&host, "kafka-manager"));
        assert_eq!(entry.unit, "kafka-manager");
        assert_eq!(entry.action, "restart");
        assert!(entry.status.unwrap().is_running());
        assert!(entry.error.is_none());
        assert!(host.controls().is_empty());
    }

    #[test]
    fn test_query_absent_unit_is_not_an_error() {
        let host = FakeHost::new();

        let entry = query(&resource(&host, "burrow"));
        assert!(!entry.status.unwrap().is_present());
        assert!(entry.error.is_none());
    }
}
