//! Access token resolution.
//!
//! Ordered chain, first success wins: environment variables, the OS secret
//! store, the `gh` credential helper, and finally an OAuth 2.0 device
//! authorization flow gated behind an environment-provided client id.

use std::time::{Duration, Instant};

use keyring::Entry;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::core::constants;
use crate::error::{Result, TokenError};

const DEVICE_CODE_URL: &str = "https://github.com/login/device/code";
const ACCESS_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const DEVICE_SCOPE: &str = "gist read:user";
const DEVICE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Resolve a GitHub token.
///
/// An explicit token short-circuits the chain. A token obtained through the
/// device flow is stored back into the OS secret store for next time.
pub fn resolve(explicit: Option<&str>) -> Result<String> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }

    for var in constants::TOKEN_ENV_VARS {
        if let Ok(value) = std::env::var(var) {
            let value = value.trim();
            if !value.is_empty() {
                debug!(var, "token resolved from environment");
                return Ok(value.to_string());
            }
        }
    }

    if let Ok(entry) = Entry::new(constants::SERVICE_NAME, constants::TOKEN_ACCOUNT) {
        if let Ok(token) = entry.get_password() {
            let token = token.trim();
            if !token.is_empty() {
                debug!("token resolved from OS secret store");
                return Ok(token.to_string());
            }
        }
    }

    if let Some(token) = helper_token() {
        debug!("token resolved from gh credential helper");
        return Ok(token);
    }

    if let Ok(client_id) = std::env::var(constants::CLIENT_ID_ENV) {
        let client_id = client_id.trim();
        if !client_id.is_empty() {
            let token = device_flow(client_id)?;
            let _ = store(&token);
            return Ok(token);
        }
    }

    Err(TokenError::NoToken.into())
}

/// Store a token in the OS secret store.
pub fn store(token: &str) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TokenError::Empty.into());
    }
    let entry = Entry::new(constants::SERVICE_NAME, constants::TOKEN_ACCOUNT)
        .map_err(TokenError::Keychain)?;
    entry.set_password(token).map_err(TokenError::Keychain)?;
    Ok(())
}

/// Ask the `gh` CLI for its token, if installed and logged in.
fn helper_token() -> Option<String> {
    let gh = which::which("gh").ok()?;
    let output = std::process::Command::new(gh)
        .args(["auth", "token"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[derive(Deserialize)]
struct DeviceCode {
    device_code: String,
    user_code: String,
    verification_uri: String,
    #[serde(default)]
    interval: u64,
    expires_in: u64,
}

#[derive(Deserialize, Default)]
struct PollResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    error: String,
}

/// Run the OAuth device-authorization flow.
///
/// Displays the user code and verification URL, then polls the exchange
/// endpoint at the server-given interval until a token arrives, the user
/// denies the request, or the server-given expiry deadline passes. The
/// deadline is the only cancellation mechanism.
pub fn device_flow(client_id: &str) -> Result<String> {
    let client = Client::new();

    let response = client
        .post(DEVICE_CODE_URL)
        .header("Accept", "application/json")
        .header("User-Agent", "cloak")
        .form(&[("client_id", client_id), ("scope", DEVICE_SCOPE)])
        .send()
        .map_err(TokenError::Http)?;
    if response.status().as_u16() >= 300 {
        let status = response.status();
        let body = response.text().unwrap_or_default();
        return Err(TokenError::DeviceFlow(format!(
            "device code request failed: {status} {}",
            body.trim()
        ))
        .into());
    }
    let code: DeviceCode = response.json().map_err(TokenError::Http)?;

    println!("Open: {}", code.verification_uri);
    println!("Code: {}", code.user_code);

    let mut interval = Duration::from_secs(if code.interval == 0 { 5 } else { code.interval });
    let deadline = Instant::now() + Duration::from_secs(code.expires_in);

    while Instant::now() < deadline {
        std::thread::sleep(interval);

        let response = match client
            .post(ACCESS_TOKEN_URL)
            .header("Accept", "application/json")
            .header("User-Agent", "cloak")
            .form(&[
                ("client_id", client_id),
                ("device_code", code.device_code.as_str()),
                ("grant_type", DEVICE_GRANT),
            ])
            .send()
        {
            Ok(response) => response,
            Err(_) => continue,
        };

        let payload: PollResponse = response.json().unwrap_or_default();
        if !payload.access_token.is_empty() {
            return Ok(payload.access_token);
        }
        match payload.error.as_str() {
            "" | "authorization_pending" => {}
            "slow_down" => interval += Duration::from_secs(2),
            "access_denied" => {
                return Err(TokenError::Denied(payload.error).into());
            }
            other => return Err(TokenError::DeviceFlow(other.to_string()).into()),
        }
    }

    Err(TokenError::TimedOut.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_token_short_circuits() {
        let token = resolve(Some("  tok-123  ")).unwrap();
        assert_eq!(token, "tok-123");
    }

    #[test]
    fn test_env_token_resolution() {
        std::env::set_var("GH_TOKEN", "from-env");
        let token = resolve(None).unwrap();
        std::env::remove_var("GH_TOKEN");
        assert_eq!(token, "from-env");
    }

    #[test]
    fn test_store_rejects_empty_token() {
        assert!(store("   ").is_err());
    }
}
