use serde::Deserialize;
use tracing::{error, warn};

pub const DEFAULT_VERIFY_URL: &str =
    "https://challenges.cloudflare.com/turnstile/v0/siteverify";

#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

/// Client for the third-party bot-verification service.
///
/// With no secret configured the outcome is governed by `fail_closed`:
/// fail-open keeps local development working without credentials, production
/// deployments should set `VERIFY_FAIL_CLOSED=true`. A configured secret with
/// an unreachable service always fails closed.
#[derive(Clone)]
pub struct BotVerifier {
    client: reqwest::Client,
    secret: Option<String>,
    verify_url: String,
    fail_closed: bool,
}

impl BotVerifier {
    pub fn new(secret: Option<String>, verify_url: String, fail_closed: bool) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            secret,
            verify_url,
            fail_closed,
        }
    }

    /// Verify a client-supplied token, optionally binding it to the client IP.
    pub async fn verify(&self, token: &str, remote_ip: Option<&str>) -> bool {
        let Some(secret) = &self.secret else {
            warn!("bot verification secret not configured");
            return !self.fail_closed;
        };

        let mut form = vec![
            ("secret", secret.as_str()),
            ("response", token),
        ];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let response = match self.client.post(&self.verify_url).form(&form).send().await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "bot verification request failed");
                return false;
            }
        };

        match response.json::<SiteverifyResponse>().await {
            Ok(body) if body.success => true,
            Ok(body) => {
                warn!(error_codes = ?body.error_codes, "bot verification rejected token");
                false
            }
            Err(err) => {
                error!(error = %err, "bot verification returned malformed response");
                false
            }
        }
    }
}
