//! Execution planner - groups resources by privilege level

use crate::context::PrivilegeClassifier;
use crate::resource::{BoxedResource, Resource};

/// An execution plan with resources grouped by privilege level
///
/// Within each batch, resources keep the order they were added in.
#[derive(Debug, Default)]
pub struct ExecutionPlan {
    /// Resources that run as the invoking user
    pub unprivileged: Vec<BoxedResource>,
    /// Resources that need elevated privileges
    pub privileged: Vec<BoxedResource>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource, using the classifier to pick its batch
    pub fn add_resource<C: PrivilegeClassifier + ?Sized>(
        &mut self,
        resource: BoxedResource,
        classifier: &C,
    ) {
        if classifier.requires_privilege(resource.as_ref()) {
            self.privileged.push(resource);
        } else {
            self.unprivileged.push(resource);
        }
    }

    /// Filter plan to only include resources matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&dyn Resource) -> bool,
    {
        Self {
            unprivileged: self
                .unprivileged
                .into_iter()
                .filter(|r| predicate(r.as_ref()))
                .collect(),
            privileged: self
                .privileged
                .into_iter()
                .filter(|r| predicate(r.as_ref()))
                .collect(),
        }
    }

    /// Filter plan to only include resources matching a target
    ///
    /// Target format: `type`, `type.name`, or a bare `name`.
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let target = Target::parse(t);
                self.filter(|r| target.matches(r))
            }
        }
    }

    /// Iterate over every resource, unprivileged first
    pub fn resources(&self) -> impl Iterator<Item = &BoxedResource> {
        self.unprivileged.iter().chain(self.privileged.iter())
    }

    /// Total number of resources in the plan
    pub fn total_resources(&self) -> usize {
        self.unprivileged.len() + self.privileged.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.unprivileged.is_empty() && self.privileged.is_empty()
    }

    /// Check if plan has any privileged resources
    pub fn has_privileged(&self) -> bool {
        !self.privileged.is_empty()
    }
}

/// A parsed target filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub resource_type: Option<String>,
    pub name: Option<String>,
}

/// Type names accepted in targets, with their plural aliases
const TYPE_ALIASES: &[(&str, &str)] = &[("service", "service"), ("services", "service")];

fn canonical_type(s: &str) -> Option<&'static str> {
    TYPE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == s)
        .map(|(_, canonical)| *canonical)
}

impl Target {
    /// Parse `service`, `service.kafka-manager`, or `kafka-manager`
    ///
    /// Only a known type prefix is split off, so names may contain dots.
    pub fn parse(target: &str) -> Self {
        if let Some(rt) = canonical_type(target) {
            return Self {
                resource_type: Some(rt.to_string()),
                name: None,
            };
        }

        if let Some((prefix, rest)) = target.split_once('.')
            && let Some(rt) = canonical_type(prefix)
        {
            return Self {
                resource_type: Some(rt.to_string()),
                name: Some(rest.to_string()),
            };
        }

        Self {
            resource_type: None,
            name: Some(target.to_string()),
        }
    }

    /// Check if a resource matches this target
    ///
    /// Names match exactly, or by prefix when they end in `*`.
    pub fn matches(&self, resource: &dyn Resource) -> bool {
        if let Some(rt) = &self.resource_type
            && resource.resource_type() != rt
        {
            return false;
        }

        match &self.name {
            None => true,
            Some(n) => match n.strip_suffix('*') {
                Some(prefix) => resource.id().starts_with(prefix),
                None => resource.id() == *n,
            },
        }
    }
}
