use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

/// Status, headers and decoded JSON body of one request
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl ApiResponse {
    /// Raw token from a `Bearer <token>` response header
    pub fn bearer(&self, name: &str) -> String {
        self.headers
            .get(name)
            .unwrap_or_else(|| panic!("missing header {}", name))
            .to_str()
            .unwrap()
            .strip_prefix("Bearer ")
            .unwrap()
            .to_string()
    }

    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

impl TestSetup {
    /// Sends a request through the router and decodes the JSON body, if any
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        headers: &[(&str, String)],
        body: Option<Value>,
    ) -> ApiResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        ApiResponse {
            status,
            headers,
            body,
        }
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    pub async fn join(&self, username: &str, password: &str) -> ApiResponse {
        self.send(
            "POST",
            "/api/v1/users/join",
            &[],
            Some(json!({
                "username": username,
                "password": password,
                "nickname": format!("{} nick", username),
                "birth": "1995-03-14",
                "gender": "FEMALE",
                "phone": "010-9999-8888"
            })),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> ApiResponse {
        self.send(
            "POST",
            "/api/v1/users/login",
            &[],
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    /// Joins then logs in, returning (access, refresh)
    pub async fn join_and_login(&self, username: &str, password: &str) -> (String, String) {
        assert_eq!(self.join(username, password).await.status, StatusCode::OK);
        let login = self.login(username, password).await;
        assert_eq!(login.status, StatusCode::OK);
        (login.bearer("authorization"), login.bearer("refresh"))
    }

    pub async fn reissue(&self, refresh: &str, access: Option<&str>) -> ApiResponse {
        let mut headers = vec![("Refresh", format!("Bearer {}", refresh))];
        if let Some(access) = access {
            headers.push(("Authorization", format!("Bearer {}", access)));
        }
        self.send("POST", "/api/v1/users/reissue", &headers, None)
            .await
    }

    /// Request carrying an access token
    pub async fn authed(
        &self,
        method: &str,
        uri: &str,
        access: &str,
        body: Option<Value>,
    ) -> ApiResponse {
        self.send(
            method,
            uri,
            &[("Authorization", format!("Bearer {}", access))],
            body,
        )
        .await
    }

    pub async fn create_todo(&self, access: &str, title: &str, start: &str, end: &str) -> ApiResponse {
        self.authed(
            "POST",
            "/api/v1/todos",
            access,
            Some(json!({ "title": title, "start_at": start, "end_at": end })),
        )
        .await
    }
}
