use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// A Secret Manager that has never heard of `project`'s secret `name` and accepts its creation
pub async fn mocked_secret_manager(project: &str, name: &str, project_number: &str) -> MockServer {
    let mock_server = MockServer::start().await;
    let secret = format!("/v1/projects/{project}/secrets/{name}");

    Mock::given(method("GET"))
        .and(path(secret.as_str()))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "Secret not found", "status": "NOT_FOUND"}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/projects/{project}/secrets")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": format!("projects/{project_number}/secrets/{name}")
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{secret}:addVersion")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": format!("projects/{project_number}/secrets/{name}/versions/1"),
            "state": "ENABLED"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{secret}:getIamPolicy")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": 1, "etag": "BwX1"})))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{secret}:setIamPolicy")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": 1, "etag": "BwX2"})))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/projects/{project}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projectId": project,
            "projectNumber": project_number,
            "lifecycleState": "ACTIVE"
        })))
        .mount(&mock_server)
        .await;

    mock_server
}
