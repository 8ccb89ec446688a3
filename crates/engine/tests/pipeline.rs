use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use vro_api::HttpTransport;
use vro_engine::{FailureKind, PollSettings, Report, SystemClock, WorkflowRequest, run_workflow};
use vro_types::{Credentials, InputParameter, InputParameterSet, ServerEndpoint, WorkflowReference};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport_for(server: &MockServer) -> HttpTransport {
    let endpoint = ServerEndpoint::new("127.0.0.1", Credentials::new("vcoadmin", "vcoadmin"));
    HttpTransport::with_base_url(&format!("{}/vco/api/", server.uri()), &endpoint).expect("transport")
}

fn fast_polling() -> PollSettings {
    PollSettings {
        timeout: Duration::from_secs(5),
        interval: Duration::from_millis(20),
    }
}

async fn mount_lookup(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/vco/api/workflows"))
        .and(query_param("conditions", "name=test-workflow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "link": [{
                "href": format!("{}/vco/api/workflows/wf-123/", server.uri()),
                "attributes": [
                    { "name": "name", "value": "test-workflow" },
                    { "name": "id", "value": "wf-123" }
                ]
            }],
            "total": 1
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn runs_workflow_to_completion_over_http() {
    let server = MockServer::start().await;
    mount_lookup(&server).await;

    let inputs = InputParameterSet::new(vec![InputParameter::new(
        "inValue",
        "string",
        "local",
        json!({ "string": { "value": "Executed by Ansible" } }),
    )]);
    Mock::given(method("POST"))
        .and(path("/vco/api/workflows/wf-123/executions/"))
        .and(body_json(serde_json::to_value(&inputs).unwrap()))
        .respond_with(ResponseTemplate::new(202).insert_header("Location", "/vco/api/workflows/wf-123/executions/exec-9/"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vco/api/workflows/wf-123/executions/exec-9/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "running" })))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vco/api/workflows/wf-123/executions/exec-9/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "completed" })))
        .with_priority(2)
        .mount(&server)
        .await;
    let record = json!({
        "id": "exec-9",
        "state": "completed",
        "input-parameters": serde_json::to_value(&inputs).unwrap()["parameters"].clone(),
        "output-parameters": []
    });
    Mock::given(method("GET"))
        .and(path("/vco/api/workflows/wf-123/executions/exec-9/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = WorkflowRequest::new(WorkflowReference::Name("test-workflow".into())).with_inputs(inputs);
    request.poll = fast_polling();
    let report = Report::from_result(run_workflow(&transport_for(&server), &request, &SystemClock, &CancellationToken::new()));

    assert!(!report.failed, "report: {report:?}");
    assert!(report.changed);
    assert_eq!(report.execution_id.as_deref(), Some("exec-9"));
    assert_eq!(report.attempts, Some(3));
    assert_eq!(report.result, Some(record));
}

#[tokio::test(flavor = "multi_thread")]
async fn trigger_error_is_reported_without_polling() {
    let server = MockServer::start().await;
    mount_lookup(&server).await;
    Mock::given(method("POST"))
        .and(path("/vco/api/workflows/wf-123/executions/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>Internal Server Error</html>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vco/api/workflows/wf-123/executions/exec-9/state"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = WorkflowRequest::new(WorkflowReference::Name("test-workflow".into()));
    let report = Report::from_result(run_workflow(&transport_for(&server), &request, &SystemClock, &CancellationToken::new()));

    assert!(report.failed);
    assert_eq!(report.failure, Some(FailureKind::Error));
    assert_eq!(
        report.msg.as_deref(),
        Some("trigger failed: POST failed with status code: 500 Internal Server Error")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_execution_is_an_execution_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vco/api/workflows/wf-123/executions/"))
        .and(body_json(json!({})))
        .respond_with(
            ResponseTemplate::new(202).insert_header("Location", format!("{}/vco/api/workflows/wf-123/executions/exec-9/", server.uri())),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vco/api/workflows/wf-123/executions/exec-9/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "failed" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = WorkflowRequest::new(WorkflowReference::Uuid("wf-123".into()));
    request.poll = fast_polling();
    let report = Report::from_result(run_workflow(&transport_for(&server), &request, &SystemClock, &CancellationToken::new()));

    assert!(report.failed);
    assert_eq!(report.failure, Some(FailureKind::Execution));
    assert_eq!(report.msg.as_deref(), Some("Workflow status: failed"));
    assert_eq!(report.result, None);
}
