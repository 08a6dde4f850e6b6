//! Service resource - converge an OS service unit to its declared action

use anyhow::{Result, bail};
use reconcile::{ApplyContext, ApplyResult, Privilege, Resource, ResourceState};
use std::fmt;
use unitkit::{
    Client, CommandRunner, LocalRunner, RetryConfig, ServiceAction, UnitFileState, UnitStatus,
};

use crate::schema::ServiceDeclaration;
use crate::sudo::SudoRunner;

/// A declared service, bound to the service-manager client for its provider
pub struct ServiceResource {
    decl: ServiceDeclaration,
    client: Client,
    retry: RetryConfig,
}

impl ServiceResource {
    pub fn new(decl: ServiceDeclaration, retry: RetryConfig) -> Self {
        let client = Client::new(decl.provider);
        Self::with_client(decl, client, retry)
    }

    /// Create a resource with a custom client (useful for testing)
    pub fn with_client(decl: ServiceDeclaration, client: Client, retry: RetryConfig) -> Self {
        Self {
            decl,
            client,
            retry,
        }
    }

    pub fn declaration(&self) -> &ServiceDeclaration {
        &self.decl
    }

    fn unit(&self) -> &str {
        self.decl.unit_name()
    }

    /// Query the unit, failing if the declared provider is not running here
    pub fn unit_status(&self) -> Result<UnitStatus> {
        self.client.ensure_provider()?;
        Ok(self.client.status(&LocalRunner, self.unit())?)
    }

    /// Map a unit status onto the state this declaration cares about
    fn state_of(&self, status: &UnitStatus) -> ResourceState {
        if !status.is_present() {
            return ResourceState::Absent;
        }

        match self.decl.action {
            ServiceAction::Enable | ServiceAction::Disable => match status.unit_file {
                UnitFileState::Enabled => ResourceState::Enabled,
                UnitFileState::Disabled => ResourceState::Disabled,
                _ => ResourceState::Observed {
                    details: status.summary(),
                },
            },
            ServiceAction::Status | ServiceAction::Nothing => ResourceState::Observed {
                details: status.summary(),
            },
            _ if status.is_running() => ResourceState::Running,
            _ => ResourceState::Stopped,
        }
    }
}

impl fmt::Debug for ServiceResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceResource")
            .field("decl", &self.decl)
            .field("provider", &self.client.provider())
            .finish_non_exhaustive()
    }
}

impl Resource for ServiceResource {
    fn id(&self) -> String {
        self.decl.name.clone()
    }

    fn description(&self) -> String {
        format!("{} {}", self.decl.action, self.unit())
    }

    fn resource_type(&self) -> &'static str {
        "service"
    }

    fn privilege(&self) -> Privilege {
        if self.decl.action.is_mutating() {
            Privilege::Required {
                reason: format!("{} {} {}", self.decl.provider, self.decl.action, self.unit()),
            }
        } else {
            Privilege::None
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(first) = self.decl.validate(0).into_iter().next() {
            bail!(first);
        }
        Ok(())
    }

    fn current_state(&self) -> Result<ResourceState> {
        let status = self.unit_status()?;
        log::debug!("{}: {}", self.decl.name, status.summary());
        Ok(self.state_of(&status))
    }

    fn desired_state(&self, current: &ResourceState) -> ResourceState {
        match self.decl.action {
            ServiceAction::Start => ResourceState::Running,
            ServiceAction::Stop => ResourceState::Stopped,
            ServiceAction::Restart => ResourceState::Restarted,
            ServiceAction::Reload => ResourceState::Reloaded,
            ServiceAction::Enable => ResourceState::Enabled,
            ServiceAction::Disable => ResourceState::Disabled,
            // Report only: whatever was observed is what we want
            ServiceAction::Status | ServiceAction::Nothing => current.clone(),
        }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        let action = self.decl.action;

        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "dry run".to_string(),
            });
        }
        if !action.is_mutating() {
            return Ok(ApplyResult::NoChange);
        }

        let before = match ctx.observed.take() {
            Some(state) => state,
            None => self.current_state()?,
        };
        if before.is_absent() {
            return Err(unitkit::Error::NotFound {
                unit: self.unit().to_string(),
            }
            .into());
        }
        if action == ServiceAction::Reload && before != ResourceState::Running {
            bail!("cannot reload {}: service is not running", self.unit());
        }

        let sudo;
        let runner: &dyn CommandRunner = match ctx.privileged {
            Some(provider) => {
                sudo = SudoRunner::new(provider);
                &sudo
            }
            None => &LocalRunner,
        };

        self.client
            .control_with_retry(runner, self.unit(), action, &self.retry)?;

        if matches!(action, ServiceAction::Start | ServiceAction::Restart) {
            let after = self.client.status(&LocalRunner, self.unit())?;
            if !after.is_running() {
                bail!(
                    "{} is not running after {action} ({})",
                    self.unit(),
                    after.summary()
                );
            }
        }

        Ok(ApplyResult::Changed {
            action: action.to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use unitkit::backend::Backend;
    use unitkit::{
        ActiveState, CommandRunner, LoadState, Provider, ServiceAction, UnitFileState, UnitStatus,
    };

    /// In-memory service manager shared between a test and its backends
    #[derive(Default)]
    pub struct FakeHost {
        units: Mutex<HashMap<String, UnitStatus>>,
        controls: Mutex<Vec<(String, ServiceAction)>>,
        /// Units that die right after being (re)started
        crashing: Mutex<Vec<String>>,
        status_calls: AtomicUsize,
    }

    impl FakeHost {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn install(&self, unit: &str, running: bool, enabled: bool) {
            let status = UnitStatus {
                unit: unit.to_string(),
                load: LoadState::Loaded,
                active: if running {
                    ActiveState::Active
                } else {
                    ActiveState::Inactive
                },
                sub: if running { "running" } else { "dead" }.to_string(),
                unit_file: if enabled {
                    UnitFileState::Enabled
                } else {
                    UnitFileState::Disabled
                },
            };
            self.units.lock().unwrap().insert(unit.to_string(), status);
        }

        pub fn crash_on_start(&self, unit: &str) {
            self.crashing.lock().unwrap().push(unit.to_string());
        }

        pub fn unit(&self, unit: &str) -> Option<UnitStatus> {
            self.units.lock().unwrap().get(unit).cloned()
        }

        /// Number of status queries answered so far
        pub fn status_calls(&self) -> usize {
            self.status_calls.load(Ordering::SeqCst)
        }

        /// Every control call, in order
        pub fn controls(&self) -> Vec<(String, ServiceAction)> {
            self.controls.lock().unwrap().clone()
        }

        pub fn backend(self: &Arc<Self>) -> Box<dyn Backend> {
            Box::new(FakeBackend {
                host: Arc::clone(self),
            })
        }
    }

    struct FakeBackend {
        host: Arc<FakeHost>,
    }

    impl Backend for FakeBackend {
        fn provider(&self) -> Provider {
            Provider::Systemd
        }

        fn is_available(&self) -> bool {
            true
        }

        fn status(&self, _runner: &dyn CommandRunner, unit: &str) -> unitkit::Result<UnitStatus> {
            self.host.status_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .host
                .unit(unit)
                .unwrap_or_else(|| UnitStatus::not_found(unit)))
        }

        fn control(
            &self,
            _runner: &dyn CommandRunner,
            unit: &str,
            action: ServiceAction,
        ) -> unitkit::Result<()> {
            self.host
                .controls
                .lock()
                .unwrap()
                .push((unit.to_string(), action));

            let crashing = self.host.crashing.lock().unwrap().iter().any(|u| u == unit);
            let mut units = self.host.units.lock().unwrap();
            let status = units.get_mut(unit).ok_or_else(|| unitkit::Error::NotFound {
                unit: unit.to_string(),
            })?;

            match action {
                ServiceAction::Start | ServiceAction::Restart if crashing => {
                    status.active = ActiveState::Failed;
                    status.sub = "failed".into();
                }
                ServiceAction::Start | ServiceAction::Restart => {
                    status.active = ActiveState::Active;
                    status.sub = "running".into();
                }
                ServiceAction::Stop => {
                    status.active = ActiveState::Inactive;
                    status.sub = "dead".into();
                }
                ServiceAction::Enable => status.unit_file = UnitFileState::Enabled,
                ServiceAction::Disable => status.unit_file = UnitFileState::Disabled,
                ServiceAction::Reload | ServiceAction::Status | ServiceAction::Nothing => {}
            }
            Ok(())
        }
    }
}
