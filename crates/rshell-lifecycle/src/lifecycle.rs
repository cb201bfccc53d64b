//! Task lifecycle driver
//!
//! [`TaskLifecycle`] walks one task from template to teardown:
//!
//! ```text
//! Resolving -> Launching -> AwaitingRunning -> HealthChecking
//!           -> AddressResolving -> Ready -> Interactive -> Terminating -> Terminated
//! ```
//!
//! Once a launch yields a task handle, every path out of the driver stops
//! that task exactly once, including failures and interrupts. Interrupts are
//! observed through a [`CancellationToken`] while waiting, health checking
//! and resolving the address. An in-flight launch request is never
//! abandoned; the token is checked once it returns.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use rshell_core::config::{ClientConfig, RemoteConfig, SessionConfig, WaitConfig};
use rshell_core::error::{DescriptorError, LaunchError, RshellError};
use rshell_core::traits::{AddressResolver, ComputeOrchestrator, InteractiveSession};
use rshell_core::types::{Endpoint, TaskDescriptor, TaskHandle};
use rshell_core::DescriptorExtractor;

use crate::address::resolve_endpoint;
use crate::health::check_health;
use crate::launch::{build_launch_request, interpret_outcome};
use crate::state::LifecycleState;
use crate::teardown::TeardownObligation;
use crate::wait::{await_running, WaitOutcome};

/// Drives a single remote task through its lifecycle
pub struct TaskLifecycle {
    orchestrator: Arc<dyn ComputeOrchestrator>,
    resolver: Arc<dyn AddressResolver>,
    extractor: DescriptorExtractor,
    remote: RemoteConfig,
    wait: WaitConfig,
    session: SessionConfig,
    cancel: CancellationToken,
    state: watch::Sender<LifecycleState>,
}

impl TaskLifecycle {
    /// Create a lifecycle over the given collaborators
    pub fn new(
        orchestrator: Arc<dyn ComputeOrchestrator>,
        resolver: Arc<dyn AddressResolver>,
        config: &ClientConfig,
        session: SessionConfig,
    ) -> Self {
        let (state, _) = watch::channel(LifecycleState::Resolving);
        Self {
            orchestrator,
            resolver,
            extractor: DescriptorExtractor::from_config(&config.remote),
            remote: config.remote.clone(),
            wait: config.wait.clone(),
            session,
            cancel: CancellationToken::new(),
            state,
        }
    }

    /// Use an externally owned cancellation token (e.g. wired to signals)
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Watch lifecycle state changes
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    fn transition(&self, next: LifecycleState) {
        let previous = self.state.send_replace(next);
        if previous.allows(next) {
            tracing::debug!("Lifecycle {} -> {}", previous, next);
        } else {
            tracing::error!("Unexpected lifecycle transition {} -> {}", previous, next);
        }
    }

    /// Fetch a template by name and extract its descriptor.
    ///
    /// Nothing has been launched yet, so a failure here ends the lifecycle
    /// without any teardown.
    pub async fn resolve(&self, template_name: &str) -> Result<TaskDescriptor, RshellError> {
        let result = self.resolve_descriptor(template_name).await;
        if result.is_err() {
            self.transition(LifecycleState::Terminated);
        }
        result
    }

    async fn resolve_descriptor(&self, template_name: &str) -> Result<TaskDescriptor, RshellError> {
        tracing::info!("Looking up task template {}", template_name);

        let template = self
            .orchestrator
            .describe_task_template(template_name)
            .await?
            .ok_or_else(|| DescriptorError::TemplateNotFound(template_name.to_string()))?;

        let descriptor = self.extractor.extract(&template)?;
        tracing::debug!(
            "Using container '{}' port {} in cluster {}",
            descriptor.container_name,
            descriptor.port,
            descriptor.cluster
        );
        Ok(descriptor)
    }

    /// Resolve the template and run the whole lifecycle without pausing
    pub async fn run(
        &self,
        template_name: &str,
        session: &dyn InteractiveSession,
    ) -> Result<(), RshellError> {
        let descriptor = self.resolve(template_name).await?;
        self.execute(&descriptor, session).await
    }

    /// Launch a task for `descriptor`, run the session against it, and tear
    /// it down.
    ///
    /// The returned error is the first failure along the way. Teardown
    /// problems are only logged.
    pub async fn execute(
        &self,
        descriptor: &TaskDescriptor,
        session: &dyn InteractiveSession,
    ) -> Result<(), RshellError> {
        if self.cancel.is_cancelled() {
            tracing::warn!("Interrupted before launch");
            self.transition(LifecycleState::Terminated);
            return Err(RshellError::Interrupted);
        }

        let obligation = match self.launch(descriptor).await {
            Ok(handle) => TeardownObligation::new(handle),
            Err(err) => {
                if let Some(handle) = err.handle().cloned() {
                    tracing::warn!("Launch of task {} reported failure: {}", handle, err);
                    self.transition(LifecycleState::Terminating);
                    TeardownObligation::new(handle)
                        .discharge(self.orchestrator.as_ref())
                        .await;
                }
                self.transition(LifecycleState::Terminated);
                return Err(err.into());
            }
        };

        let result = self.drive(descriptor, obligation.handle(), session).await;
        if let Err(e) = &result {
            tracing::debug!("Lifecycle failed in {}: {}", self.state(), e);
        }

        self.transition(LifecycleState::Terminating);
        obligation.discharge(self.orchestrator.as_ref()).await;
        self.transition(LifecycleState::Terminated);

        result
    }

    async fn launch(&self, descriptor: &TaskDescriptor) -> Result<TaskHandle, LaunchError> {
        self.transition(LifecycleState::Launching);

        let request = build_launch_request(descriptor, &self.remote, &self.session);
        tracing::info!(
            "Launching {} in cluster {}",
            descriptor.template_id,
            descriptor.cluster
        );

        let outcome = self
            .orchestrator
            .run_task(&request)
            .await
            .map_err(|e| LaunchError::Rejected(e.to_string()))?;

        let handle = interpret_outcome(outcome, &descriptor.cluster)?;
        tracing::info!("Launched task {}", handle);
        Ok(handle)
    }

    async fn drive(
        &self,
        descriptor: &TaskDescriptor,
        handle: &TaskHandle,
        session: &dyn InteractiveSession,
    ) -> Result<(), RshellError> {
        let endpoint = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::warn!("Interrupted while {}", self.state());
                return Err(RshellError::Interrupted);
            }
            endpoint = self.prepare(descriptor, handle) => endpoint?,
        };

        self.transition(LifecycleState::Ready);
        tracing::info!("Connecting to {}", endpoint);

        self.transition(LifecycleState::Interactive);
        session.run(&endpoint).await?;
        Ok(())
    }

    async fn prepare(
        &self,
        descriptor: &TaskDescriptor,
        handle: &TaskHandle,
    ) -> Result<Endpoint, RshellError> {
        self.transition(LifecycleState::AwaitingRunning);
        match await_running(self.orchestrator.as_ref(), handle, &self.wait).await {
            WaitOutcome::Running => tracing::debug!("Task {} is running", handle),
            other => tracing::debug!("Wait for task {} ended with {:?}", handle, other),
        }

        self.transition(LifecycleState::HealthChecking);
        let status = self.orchestrator.describe_task(handle).await?;
        check_health(&status)?;

        self.transition(LifecycleState::AddressResolving);
        resolve_endpoint(&status, descriptor, self.resolver.as_ref()).await
    }
}
