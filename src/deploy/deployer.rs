// ABOUTME: The Deployer drives one service through the six pipeline stages.
// ABOUTME: Holds the job, the scheduler client, and write-once run-state.

use super::error::{
    CancelledSnafu, ConnectSnafu, DeployError, OutOfOrderSnafu, ServiceNotConfiguredSnafu,
};
use super::job_file::load_job;
use super::merge::{MergedJob, merge_job};
use super::options::DeployOptions;
use super::poll::{await_deployment_id, watch_deployment};
use super::stage::Stage;
use super::submit::{plan_job, register_job, validate_job};
use crate::config::{DatacenterConfig, ServiceConfig};
use crate::nomad::{ConnectTarget, Connector, Job};
use crate::types::{DeploymentId, EvalId, ImageRef, ServiceName};
use snafu::{OptionExt, ResultExt};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Values captured as the pipeline advances. Each is set once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    /// Modify index returned by the plan; registration enforces it.
    pub job_modify_index: Option<u64>,
    pub eval_id: Option<EvalId>,
    pub deployment_id: Option<DeploymentId>,
    /// Time the deployment took to become successful.
    pub rollout: Option<Duration>,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySummary {
    pub service: ServiceName,
    pub dc: String,
    pub image: ImageRef,
    pub job_file: Option<PathBuf>,
    pub job_modify_index: Option<u64>,
    pub eval_id: Option<EvalId>,
    pub deployment_id: Option<DeploymentId>,
    /// Wall-clock time of the whole run.
    pub elapsed: Duration,
    /// Part of `elapsed` spent waiting for the deployment to finish.
    pub rollout: Option<Duration>,
}

/// Deploys one service to one datacenter.
///
/// Stages run strictly in `Stage::ALL` order and the first failure ends the
/// run. Each stage can also be driven on its own with [`Deployer::run_stage`]
/// as long as its predecessors have completed.
pub struct Deployer<'a, C: Connector> {
    options: DeployOptions,
    datacenter: &'a DatacenterConfig,
    connector: C,
    cancel: CancellationToken,
    template: Option<Job>,
    job_file: Option<PathBuf>,
    service: Option<&'a ServiceConfig>,
    client: Option<C::Client>,
    merged: Option<MergedJob>,
    completed: BTreeSet<Stage>,
    state: RunState,
}

impl<'a, C: Connector> Deployer<'a, C> {
    pub fn new(options: DeployOptions, datacenter: &'a DatacenterConfig, connector: C) -> Self {
        Self {
            options,
            datacenter,
            connector,
            cancel: CancellationToken::new(),
            template: None,
            job_file: None,
            service: None,
            client: None,
            merged: None,
            completed: BTreeSet::new(),
            state: RunState::default(),
        }
    }

    /// Use `cancel` to stop the run; checked between stages and while polling.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn options(&self) -> &DeployOptions {
        &self.options
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// The job as submitted, once Validate has merged it.
    pub fn job(&self) -> Option<&Job> {
        self.merged.as_ref().map(|m| &m.job)
    }

    /// The resolved service config with the deployment image, once Validate
    /// has run.
    pub fn service_config(&self) -> Option<&ServiceConfig> {
        self.merged.as_ref().map(|m| &m.service)
    }

    /// Run every stage in order.
    pub async fn run(&mut self) -> Result<DeploySummary, DeployError> {
        self.run_with(|_| {}).await
    }

    /// Run every stage in order, calling `on_stage` as each one starts.
    pub async fn run_with<F: FnMut(Stage)>(
        &mut self,
        mut on_stage: F,
    ) -> Result<DeploySummary, DeployError> {
        let started = Instant::now();
        tracing::info!(
            service = %self.options.service,
            dc = %self.options.dc,
            image = %self.options.image,
            "deploying"
        );

        for stage in Stage::ALL {
            on_stage(stage);
            self.run_stage(stage).await?;
        }

        Ok(self.summary(started.elapsed()))
    }

    /// Run a single stage.
    ///
    /// # Errors
    ///
    /// Besides the stage's own failures, returns `DeployError::Cancelled` if
    /// the token is already cancelled and `DeployError::OutOfOrder` if the
    /// preceding stage has not completed.
    pub async fn run_stage(&mut self, stage: Stage) -> Result<(), DeployError> {
        if self.cancel.is_cancelled() {
            return CancelledSnafu { stage }.fail();
        }
        if let Some(requires) = stage.previous().filter(|prev| !self.completed.contains(prev)) {
            return OutOfOrderSnafu { stage, requires }.fail();
        }
        tracing::debug!(%stage, "stage starting");

        match stage {
            Stage::LoadConfig => self.load_config(),
            Stage::Connect => self.connect().await,
            Stage::Validate => self.validate().await,
            Stage::Plan => self.plan().await,
            Stage::Register => self.register().await,
            Stage::Status => self.status().await,
        }?;

        // A re-run stage invalidates everything after it.
        self.completed.retain(|done| *done < stage);
        self.completed.insert(stage);
        Ok(())
    }

    /// Whether `stage` has run to completion.
    pub fn is_completed(&self, stage: Stage) -> bool {
        self.completed.contains(&stage)
    }

    fn load_config(&mut self) -> Result<(), DeployError> {
        let service = &self.options.service;
        let (job, path) = load_job(&self.options.root, service)?;

        let datacenter: &'a DatacenterConfig = self.datacenter;
        let config = datacenter
            .service(service.as_str())
            .context(ServiceNotConfiguredSnafu {
                service: service.clone(),
                dc: self.options.dc.clone(),
            })?;

        self.template = Some(job);
        self.job_file = Some(path);
        self.service = Some(config);
        Ok(())
    }

    async fn connect(&mut self) -> Result<(), DeployError> {
        let target = ConnectTarget {
            region: self.datacenter.region.clone(),
            address: self.options.address.clone(),
        };
        let client = self
            .connector
            .connect(&target)
            .await
            .context(ConnectSnafu {
                address: target.address.clone(),
            })?;

        self.client = Some(client);
        Ok(())
    }

    async fn validate(&mut self) -> Result<(), DeployError> {
        let template = self.template.as_ref().context(OutOfOrderSnafu {
            stage: Stage::Validate,
            requires: Stage::LoadConfig,
        })?;
        let service = self.service.context(OutOfOrderSnafu {
            stage: Stage::Validate,
            requires: Stage::LoadConfig,
        })?;
        let client = self.client.as_ref().context(OutOfOrderSnafu {
            stage: Stage::Validate,
            requires: Stage::Connect,
        })?;

        // Always merge from the loaded template so a repeated Validate never
        // stacks overrides.
        let merged = merge_job(
            template,
            self.datacenter,
            &self.options.service,
            service,
            &self.options.image,
        )?;
        validate_job(client, &merged.job).await?;

        self.merged = Some(merged);
        Ok(())
    }

    async fn plan(&mut self) -> Result<(), DeployError> {
        let client = self.client.as_ref().context(OutOfOrderSnafu {
            stage: Stage::Plan,
            requires: Stage::Connect,
        })?;
        let merged = self.merged.as_ref().context(OutOfOrderSnafu {
            stage: Stage::Plan,
            requires: Stage::Validate,
        })?;
        let modify_index = plan_job(client, &merged.job).await?;

        self.state.job_modify_index = Some(modify_index);
        Ok(())
    }

    async fn register(&mut self) -> Result<(), DeployError> {
        let modify_index = self.state.job_modify_index.context(OutOfOrderSnafu {
            stage: Stage::Register,
            requires: Stage::Plan,
        })?;
        let client = self.client.as_ref().context(OutOfOrderSnafu {
            stage: Stage::Register,
            requires: Stage::Connect,
        })?;
        let merged = self.merged.as_ref().context(OutOfOrderSnafu {
            stage: Stage::Register,
            requires: Stage::Validate,
        })?;
        self.state.eval_id = None;
        self.state.deployment_id = None;

        let Some(eval_id) = register_job(client, &merged.job, modify_index).await? else {
            return Ok(());
        };
        self.state.eval_id = Some(eval_id.clone());

        let deployment_id =
            await_deployment_id(client, &eval_id, &self.datacenter.polling, &self.cancel).await?;
        self.state.deployment_id = deployment_id;
        Ok(())
    }

    async fn status(&mut self) -> Result<(), DeployError> {
        let Some(deployment_id) = self.state.deployment_id.as_ref() else {
            tracing::info!(service = %self.options.service, "no deployment to watch");
            return Ok(());
        };
        let client = self.client.as_ref().context(OutOfOrderSnafu {
            stage: Stage::Status,
            requires: Stage::Connect,
        })?;

        let rollout =
            watch_deployment(client, deployment_id, &self.datacenter.polling, &self.cancel)
                .await?;

        self.state.rollout = Some(rollout);
        Ok(())
    }

    fn summary(&self, elapsed: Duration) -> DeploySummary {
        DeploySummary {
            service: self.options.service.clone(),
            dc: self.options.dc.clone(),
            image: self.options.image.clone(),
            job_file: self.job_file.clone(),
            job_modify_index: self.state.job_modify_index,
            eval_id: self.state.eval_id.clone(),
            deployment_id: self.state.deployment_id.clone(),
            elapsed,
            rollout: self.state.rollout,
        }
    }
}
