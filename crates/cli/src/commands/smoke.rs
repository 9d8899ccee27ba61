//! `usde smoke-login` - login smoke test against a deployed API
//!
//! Posts the demo credentials to the login endpoint and verifies that the
//! response carries a bearer token. This exercises the deployment, not the
//! sequencer.

use serde::Deserialize;
use tracing::info;
use usde_schema::SmokeConfig;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    data: Option<LoginData>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: Option<String>,
}

pub async fn run() -> anyhow::Result<()> {
    let config = SmokeConfig::from_env();
    info!(url = %config.login_url(), email = %config.email, "running login smoke test");

    let client = reqwest::Client::new();
    let response = client
        .post(config.login_url())
        .json(&serde_json::json!({
            "email": config.email,
            "password": config.password,
        }))
        .send()
        .await?;

    // Read the body as text before parsing; gateways answer errors with HTML
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        anyhow::bail!(
            "login endpoint returned {}: {}",
            status,
            failure_detail(&body)
        );
    }

    let parsed: LoginResponse = serde_json::from_str(&body)
        .map_err(|e| anyhow::anyhow!("login endpoint returned an unparseable body: {}", e))?;
    let token = extract_token(parsed)
        .ok_or_else(|| anyhow::anyhow!("login succeeded but the response carried no token"))?;

    println!(
        "✅ Login OK for {} (token length {})",
        config.email,
        token.len()
    );
    Ok(())
}

/// Pull the API's `message` out of an error body when it is JSON,
/// otherwise fall back to the raw text
fn failure_detail(body: &str) -> String {
    if let Ok(LoginResponse {
        message: Some(message),
        ..
    }) = serde_json::from_str::<LoginResponse>(body)
    {
        return message;
    }
    let text = body.trim();
    if text.is_empty() {
        "no response body".to_string()
    } else {
        text.to_string()
    }
}

fn extract_token(body: LoginResponse) -> Option<String> {
    body.data.and_then(|d| d.token).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_detail_prefers_the_api_message() {
        let detail = failure_detail(r#"{"message": "Invalid credentials"}"#);
        assert_eq!(detail, "Invalid credentials");
    }

    #[test]
    fn failure_detail_survives_non_json_bodies() {
        let detail = failure_detail("<html><body>502 Bad Gateway</body></html>\n");
        assert_eq!(detail, "<html><body>502 Bad Gateway</body></html>");

        assert_eq!(failure_detail(""), "no response body");
    }

    #[test]
    fn tokens_are_extracted_only_when_present_and_non_empty() {
        let with_token: LoginResponse =
            serde_json::from_str(r#"{"data": {"token": "abc123"}}"#).unwrap();
        assert_eq!(extract_token(with_token).as_deref(), Some("abc123"));

        let empty_token: LoginResponse =
            serde_json::from_str(r#"{"data": {"token": ""}}"#).unwrap();
        assert_eq!(extract_token(empty_token), None);

        let no_data: LoginResponse = serde_json::from_str(r#"{"message": "ok"}"#).unwrap();
        assert_eq!(extract_token(no_data), None);
    }
}
