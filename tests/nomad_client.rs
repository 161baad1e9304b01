// ABOUTME: Integration tests for the HTTP scheduler client against a mock server.
// ABOUTME: Checks request paths, query parameters, bodies, and response decoding.

use pitwall::nomad::{
    ApiError, ConnectTarget, Connector, DeploymentStatus, DeploymentsApi, EvaluationsApi, Job,
    JobsApi, NomadClient, NomadConnector, QueryOptions,
};
use pitwall::types::{DeploymentId, EvalId};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn job() -> Job {
    Job::from_document(r#"{"ID": "api", "Name": "api", "TaskGroups": []}"#).unwrap()
}

async fn client(server: &MockServer) -> NomadClient {
    NomadClient::new(&server.uri(), "europe").unwrap()
}

mod jobs {
    use super::*;

    #[tokio::test]
    async fn validate_puts_wrapped_job() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/v1/validate/job"))
            .and(query_param("region", "europe"))
            .and(body_partial_json(json!({"Job": {"ID": "api"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "DriverConfigValidated": true,
                "ValidationErrors": null,
                "Error": "",
                "Warnings": ""
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = client(&server).await.validate_job(&job()).await.unwrap();
        assert!(resp.problems().is_empty());
    }

    #[tokio::test]
    async fn plan_returns_modify_index() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/v1/job/api/plan"))
            .and(body_partial_json(json!({"Diff": false, "PolicyOverride": false})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"JobModifyIndex": 42, "Warnings": ""})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let resp = client(&server).await.plan_job(&job()).await.unwrap();
        assert_eq!(resp.job_modify_index, 42);
    }

    #[tokio::test]
    async fn register_enforces_index() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/v1/jobs"))
            .and(body_partial_json(json!({"EnforceIndex": true, "JobModifyIndex": 42})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "EvalID": "d092fdc0-e1fd-2536-67d8-43af8ca798ac",
                "EvalCreateIndex": 43,
                "JobModifyIndex": 43,
                "Warnings": ""
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = client(&server)
            .await
            .enforce_register_job(&job(), 42)
            .await
            .unwrap();
        assert_eq!(
            resp.eval_id().map(|id| id.short().to_string()).as_deref(),
            Some("d092fdc0")
        );
    }

    #[tokio::test]
    async fn rejection_keeps_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/v1/jobs"))
            .respond_with(ResponseTemplate::new(500).set_body_string(
                "Enforcing job modify index 42: job exists with conflicting job modify index: 44\n",
            ))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .enforce_register_job(&job(), 42)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { .. }));
        assert_eq!(err.status_code(), Some(500));
        assert!(err.to_string().ends_with("conflicting job modify index: 44"));
    }
}

mod queries {
    use super::*;

    #[tokio::test]
    async fn evaluation_exposes_deployment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/evaluation/eval-1"))
            .and(query_param("region", "europe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ID": "eval-1",
                "Status": "complete",
                "Type": "service",
                "DeploymentID": "deploy-1"
            })))
            .mount(&server)
            .await;

        let eval = client(&server)
            .await
            .evaluation(&EvalId::new("eval-1"))
            .await
            .unwrap();
        assert!(eval.is_complete());
        assert_eq!(eval.deployment_id(), Some(DeploymentId::new("deploy-1")));
    }

    #[tokio::test]
    async fn deployment_is_a_blocking_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/deployment/deploy-1"))
            .and(query_param("index", "10"))
            .and(query_param("wait", "5000ms"))
            .and(query_param("stale", "true"))
            .and(query_param("region", "europe"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Nomad-Index", "11")
                    .set_body_json(json!({
                        "ID": "deploy-1",
                        "Status": "running",
                        "StatusDescription": "Deployment is running"
                    })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let query = QueryOptions {
            wait_index: 10,
            ..QueryOptions::blocking(Duration::from_secs(5))
        };
        let (deployment, meta) = client(&server)
            .await
            .deployment(&DeploymentId::new("deploy-1"), &query)
            .await
            .unwrap();
        assert_eq!(deployment.status, DeploymentStatus::Running);
        assert_eq!(deployment.status_description, "Deployment is running");
        assert_eq!(meta.last_index, 11);
    }

    #[tokio::test]
    async fn null_allocations_are_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/deployment/allocations/deploy-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        let allocs = client(&server)
            .await
            .deployment_allocations(&DeploymentId::new("deploy-1"))
            .await
            .unwrap();
        assert!(allocs.is_empty());
    }

    #[tokio::test]
    async fn garbage_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/evaluation/eval-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .evaluation(&EvalId::new("eval-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}

mod connect {
    use super::*;

    fn target(address: String) -> ConnectTarget {
        ConnectTarget {
            region: "europe".to_string(),
            address,
        }
    }

    #[tokio::test]
    async fn connects_when_cluster_has_leader() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/status/leader"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("10.0.0.1:4647")))
            .expect(1)
            .mount(&server)
            .await;

        let client = NomadConnector.connect(&target(server.uri())).await.unwrap();
        assert_eq!(client.region(), "europe");
    }

    #[tokio::test]
    async fn no_leader_is_a_connection_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/status/leader"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("")))
            .mount(&server)
            .await;

        let err = NomadConnector.connect(&target(server.uri())).await.unwrap_err();
        assert!(matches!(err, ApiError::Connection { .. }));
    }

    #[tokio::test]
    async fn refused_connection_is_a_connection_error() {
        let err = NomadConnector
            .connect(&target("http://127.0.0.1:1".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Connection { .. }));
    }
}
