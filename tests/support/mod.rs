// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup, fixture paths, and a scripted scheduler API.

use async_trait::async_trait;
use parking_lot::Mutex;
use pitwall::config::{DatacenterConfig, DeploymentConfig, PollSettings};
use pitwall::nomad::{
    Allocation, ApiError, ConnectTarget, Connector, Deployment, DeploymentStatus, DeploymentsApi,
    Evaluation, EvaluationsApi, Job, JobsApi, PlanResponse, QueryMeta, QueryOptions,
    RegisterResponse, ValidateResponse,
};
use pitwall::types::{DeploymentId, EvalId};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Once};
use std::time::Duration;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("pitwall=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Root of the checked-in configuration tree.
#[allow(dead_code)]
pub fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/deploy")
}

/// The fixture tree loaded with the `test` profile.
#[allow(dead_code)]
pub fn fixture_config() -> DeploymentConfig {
    DeploymentConfig::load(&fixture_root(), "test").unwrap()
}

/// Millisecond-scale poll bounds so tests never sleep for long.
#[allow(dead_code)]
pub fn fast_polling() -> PollSettings {
    PollSettings {
        evaluation_interval: Duration::from_millis(5),
        evaluation_timeout: Duration::from_secs(5),
        deployment_wait: Duration::from_millis(5),
        deployment_timeout: Duration::from_secs(5),
    }
}

/// A fixture datacenter with fast polling.
#[allow(dead_code)]
pub fn fixture_datacenter(name: &str) -> DatacenterConfig {
    let mut dc = fixture_config().datacenters[name].clone();
    dc.polling = fast_polling();
    dc
}

#[allow(dead_code)]
pub fn evaluation(status: &str, job_type: &str, deployment_id: &str) -> Evaluation {
    Evaluation {
        id: "eval-1".to_string(),
        status: status.to_string(),
        status_description: String::new(),
        job_type: job_type.to_string(),
        deployment_id: deployment_id.to_string(),
    }
}

/// One recorded API call.
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum Call {
    Validate(Job),
    Plan(Job),
    Register { job: Job, modify_index: u64 },
    Evaluation(String),
    Deployment { id: String, wait_index: u64 },
    Allocations(String),
}

#[allow(dead_code)]
struct MockState {
    problems: Vec<String>,
    plan_error: Option<String>,
    planned_index: u64,
    scheduler_index: u64,
    eval_id: String,
    evaluations: VecDeque<Evaluation>,
    deployments: VecDeque<(String, String)>,
    deployment_index: u64,
    allocations: Option<Vec<Allocation>>,
    calls: Vec<Call>,
}

/// In-memory scheduler. Scripted responses are consumed in order; the last
/// evaluation and deployment response repeats once the script runs out.
///
/// Registration enforces the modify index like the real scheduler: it fails
/// unless the index from the plan matches the scheduler's current index.
#[derive(Clone)]
#[allow(dead_code)]
pub struct MockApi {
    state: Arc<Mutex<MockState>>,
}

#[allow(dead_code)]
impl MockApi {
    /// A scheduler where everything succeeds and the deployment is
    /// immediately successful.
    pub fn new() -> Self {
        let state = MockState {
            problems: Vec::new(),
            plan_error: None,
            planned_index: 7,
            scheduler_index: 7,
            eval_id: "eval-1".to_string(),
            evaluations: VecDeque::from([evaluation("complete", "service", "deploy-1")]),
            deployments: VecDeque::from([("successful".to_string(), String::new())]),
            deployment_index: 10,
            allocations: Some(Vec::new()),
            calls: Vec::new(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn rejecting(self, problems: &[&str]) -> Self {
        self.state.lock().problems = problems.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn failing_plan(self, message: &str) -> Self {
        self.state.lock().plan_error = Some(message.to_string());
        self
    }

    /// Someone else updates the job between plan and register.
    pub fn with_concurrent_change(self) -> Self {
        self.state.lock().scheduler_index += 1;
        self
    }

    pub fn with_eval_id(self, eval_id: &str) -> Self {
        self.state.lock().eval_id = eval_id.to_string();
        self
    }

    pub fn with_evaluations(self, evaluations: Vec<Evaluation>) -> Self {
        self.state.lock().evaluations = evaluations.into();
        self
    }

    /// Deployment statuses returned by successive queries.
    pub fn with_deployments(self, statuses: &[(&str, &str)]) -> Self {
        self.state.lock().deployments = statuses
            .iter()
            .map(|(s, d)| (s.to_string(), d.to_string()))
            .collect();
        self
    }

    pub fn with_allocations_json(self, json: &str) -> Self {
        self.state.lock().allocations = Some(serde_json::from_str(json).unwrap());
        self
    }

    /// Allocation lookups fail with a server error.
    pub fn failing_allocations(self) -> Self {
        self.state.lock().allocations = None;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn registered_job(&self) -> Option<Job> {
        self.calls().into_iter().find_map(|call| match call {
            Call::Register { job, .. } => Some(job),
            _ => None,
        })
    }

    /// Wait indexes of every deployment query, in order.
    pub fn deployment_wait_indexes(&self) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Deployment { wait_index, .. } => Some(wait_index),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call);
    }
}

#[allow(dead_code)]
fn next_or_last<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[allow(dead_code)]
fn server_error(message: &str) -> ApiError {
    ApiError::Status {
        status: 500,
        message: message.to_string(),
    }
}

#[async_trait]
impl JobsApi for MockApi {
    async fn validate_job(&self, job: &Job) -> Result<ValidateResponse, ApiError> {
        self.record(Call::Validate(job.clone()));
        Ok(ValidateResponse {
            validation_errors: self.state.lock().problems.clone(),
            ..Default::default()
        })
    }

    async fn plan_job(&self, job: &Job) -> Result<PlanResponse, ApiError> {
        self.record(Call::Plan(job.clone()));
        let state = self.state.lock();
        if let Some(message) = &state.plan_error {
            return Err(server_error(message));
        }
        Ok(PlanResponse {
            job_modify_index: state.planned_index,
            ..Default::default()
        })
    }

    async fn enforce_register_job(
        &self,
        job: &Job,
        modify_index: u64,
    ) -> Result<RegisterResponse, ApiError> {
        self.record(Call::Register {
            job: job.clone(),
            modify_index,
        });
        let state = self.state.lock();
        if modify_index != state.scheduler_index {
            return Err(server_error(&format!(
                "Enforcing job modify index {modify_index}: job exists with conflicting job modify index: {}",
                state.scheduler_index
            )));
        }
        Ok(RegisterResponse {
            eval_id: state.eval_id.clone(),
            job_modify_index: state.scheduler_index + 1,
            ..Default::default()
        })
    }
}

#[async_trait]
impl EvaluationsApi for MockApi {
    async fn evaluation(&self, id: &EvalId) -> Result<Evaluation, ApiError> {
        self.record(Call::Evaluation(id.to_string()));
        next_or_last(&mut self.state.lock().evaluations)
            .ok_or_else(|| server_error("evaluation not found"))
    }
}

#[async_trait]
impl DeploymentsApi for MockApi {
    async fn deployment(
        &self,
        id: &DeploymentId,
        query: &QueryOptions,
    ) -> Result<(Deployment, QueryMeta), ApiError> {
        self.record(Call::Deployment {
            id: id.to_string(),
            wait_index: query.wait_index,
        });
        // A blocking query holds the request for the wait time.
        if query.wait_index > 1 {
            tokio::time::sleep(query.wait_time).await;
        }
        let mut state = self.state.lock();
        let (status, description) = next_or_last(&mut state.deployments)
            .ok_or_else(|| server_error("deployment not found"))?;
        let meta = QueryMeta {
            last_index: state.deployment_index,
        };
        state.deployment_index += 1;
        Ok((
            Deployment {
                id: id.clone(),
                status: DeploymentStatus::from(status.as_str()),
                status_description: description,
            },
            meta,
        ))
    }

    async fn deployment_allocations(
        &self,
        id: &DeploymentId,
    ) -> Result<Vec<Allocation>, ApiError> {
        self.record(Call::Allocations(id.to_string()));
        self.state
            .lock()
            .allocations
            .clone()
            .ok_or_else(|| server_error("allocations unavailable"))
    }
}

/// Hands out clones of one MockApi and records every connect.
#[derive(Clone)]
#[allow(dead_code)]
pub struct MockConnector {
    api: MockApi,
    unreachable: bool,
    targets: Arc<Mutex<Vec<ConnectTarget>>>,
}

#[allow(dead_code)]
impl MockConnector {
    pub fn new(api: &MockApi) -> Self {
        Self {
            api: api.clone(),
            unreachable: false,
            targets: Arc::default(),
        }
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn targets(&self) -> Vec<ConnectTarget> {
        self.targets.lock().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Client = MockApi;

    async fn connect(&self, target: &ConnectTarget) -> Result<MockApi, ApiError> {
        self.targets.lock().push(target.clone());
        if self.unreachable {
            return Err(ApiError::Connection {
                address: target.address.clone(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(self.api.clone())
    }
}
