// ABOUTME: HTTP client for the Nomad API over plain HTTP/1.1.
// ABOUTME: One hyper connection per request; every call is scoped to a region.

use super::api::{ConnectTarget, Connector, DeploymentsApi, EvaluationsApi, JobsApi};
use super::error::ApiError;
use super::job::Job;
use super::models::{
    Allocation, Deployment, Evaluation, PlanResponse, QueryMeta, QueryOptions, RegisterResponse,
    ValidateResponse,
};
use crate::types::{DeploymentId, EvalId};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, Uri, header};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::net::TcpStream;

pub const DEFAULT_ADDRESS: &str = "http://127.0.0.1:4646";
const DEFAULT_PORT: u16 = 4646;
const INDEX_HEADER: &str = "X-Nomad-Index";

/// A raw API response: body plus blocking-query metadata.
struct RawResponse {
    body: Bytes,
    meta: QueryMeta,
}

/// Client for one scheduler region, reached through a bootstrap address.
#[derive(Debug, Clone)]
pub struct NomadClient {
    address: String,
    authority: String,
    region: String,
}

impl NomadClient {
    /// Build a client for `address` (`http://host:port`, `host:port`, or `host`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidAddress` for unparsable addresses and for
    /// schemes other than `http`.
    pub fn new(address: &str, region: &str) -> Result<Self, ApiError> {
        let address = address.trim().trim_end_matches('/');
        let with_scheme = if address.contains("://") {
            address.to_string()
        } else {
            format!("http://{address}")
        };

        let uri: Uri = with_scheme
            .parse()
            .map_err(|_| ApiError::InvalidAddress(address.to_string()))?;
        if uri.scheme_str() != Some("http") {
            return Err(ApiError::InvalidAddress(address.to_string()));
        }
        let host = uri
            .host()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ApiError::InvalidAddress(address.to_string()))?;
        let port = uri.port_u16().unwrap_or(DEFAULT_PORT);

        Ok(Self {
            address: with_scheme.clone(),
            authority: format!("{host}:{port}"),
            region: region.to_string(),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Address of the current cluster leader.
    pub async fn leader(&self) -> Result<String, ApiError> {
        let (leader, _) = self
            .get::<String>("/v1/status/leader", Vec::new())
            .await?;
        if leader.is_empty() {
            return Err(ApiError::Connection {
                address: self.address.clone(),
                reason: "cluster has no leader".to_string(),
            });
        }
        Ok(leader)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(&str, String)>,
    ) -> Result<(T, QueryMeta), ApiError> {
        let raw = self.send(Method::GET, path, query, None).await?;
        let value = serde_json::from_slice(&raw.body)?;
        Ok((value, raw.meta))
    }

    async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_vec(&body)?;
        let raw = self.send(Method::PUT, path, Vec::new(), Some(body)).await?;
        Ok(serde_json::from_slice(&raw.body)?)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        mut query: Vec<(&str, String)>,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse, ApiError> {
        query.push(("region", self.region.clone()));
        let query = query
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let uri = format!("{path}?{query}");

        let stream = TcpStream::connect(&self.authority)
            .await
            .map_err(|e| self.connection_error(e))?;
        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| self.connection_error(e))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::warn!("scheduler connection error: {}", e);
            }
        });

        let req = Request::builder()
            .method(method.clone())
            .uri(&uri)
            .header(header::HOST, &self.authority)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| ApiError::Request(format!("failed to build request: {e}")))?;

        tracing::trace!(%method, %uri, "scheduler request");

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| ApiError::Request(format!("{method} {path}: {e}")))?;

        let status = resp.status();
        let last_index = resp
            .headers()
            .get(INDEX_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| ApiError::Request(format!("failed to read response: {e}")))?
            .to_bytes();

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).trim().to_string(),
            });
        }

        Ok(RawResponse {
            body,
            meta: QueryMeta { last_index },
        })
    }

    fn connection_error(&self, e: impl std::fmt::Display) -> ApiError {
        ApiError::Connection {
            address: self.address.clone(),
            reason: e.to_string(),
        }
    }
}

fn job_id(job: &Job) -> Result<String, ApiError> {
    job.id()
        .map(|id| urlencoding::encode(id).into_owned())
        .ok_or_else(|| ApiError::Request("job has neither ID nor Name".to_string()))
}

#[async_trait]
impl JobsApi for NomadClient {
    async fn validate_job(&self, job: &Job) -> Result<ValidateResponse, ApiError> {
        self.put("/v1/validate/job", json!({ "Job": job })).await
    }

    async fn plan_job(&self, job: &Job) -> Result<PlanResponse, ApiError> {
        let path = format!("/v1/job/{}/plan", job_id(job)?);
        self.put(
            &path,
            json!({ "Job": job, "Diff": false, "PolicyOverride": false }),
        )
        .await
    }

    async fn enforce_register_job(
        &self,
        job: &Job,
        modify_index: u64,
    ) -> Result<RegisterResponse, ApiError> {
        self.put(
            "/v1/jobs",
            json!({ "Job": job, "EnforceIndex": true, "JobModifyIndex": modify_index }),
        )
        .await
    }
}

#[async_trait]
impl EvaluationsApi for NomadClient {
    async fn evaluation(&self, id: &EvalId) -> Result<Evaluation, ApiError> {
        let path = format!("/v1/evaluation/{}", urlencoding::encode(id.as_str()));
        self.get(&path, Vec::new()).await.map(|(eval, _)| eval)
    }
}

#[async_trait]
impl DeploymentsApi for NomadClient {
    async fn deployment(
        &self,
        id: &DeploymentId,
        query: &QueryOptions,
    ) -> Result<(Deployment, QueryMeta), ApiError> {
        let path = format!("/v1/deployment/{}", urlencoding::encode(id.as_str()));
        let mut params = vec![
            ("index", query.wait_index.to_string()),
            ("wait", format!("{}ms", query.wait_time.as_millis())),
        ];
        if query.allow_stale {
            params.push(("stale", "true".to_string()));
        }
        self.get(&path, params).await
    }

    async fn deployment_allocations(
        &self,
        id: &DeploymentId,
    ) -> Result<Vec<Allocation>, ApiError> {
        let path = format!(
            "/v1/deployment/allocations/{}",
            urlencoding::encode(id.as_str())
        );
        // The API returns null rather than [] for a deployment with no allocations.
        let (allocs, _) = self.get::<Option<Vec<Allocation>>>(&path, Vec::new()).await?;
        Ok(allocs.unwrap_or_default())
    }
}

/// Connects to a Nomad agent and confirms the cluster has a leader.
#[derive(Debug, Clone, Copy, Default)]
pub struct NomadConnector;

#[async_trait]
impl Connector for NomadConnector {
    type Client = NomadClient;

    async fn connect(&self, target: &ConnectTarget) -> Result<NomadClient, ApiError> {
        let client = NomadClient::new(&target.address, &target.region)?;
        let leader = client.leader().await?;
        tracing::info!(nomad = %client.address(), region = %target.region, %leader, "connected");
        Ok(client)
    }
}
