//! Best-effort remote log sync.
//!
//! One attempt per call with a bounded timeout; callers log failures and
//! move on. There is no retry queue.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use crate::config::RemoteLogConfig;

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(u16),
    #[error("api key rejected")]
    Rejected,
}

/// Body POSTed to `<url>qso/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QsoEnvelope<'a> {
    pub key: &'a str,
    pub station_profile_id: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub string: &'a str,
}

#[derive(Debug, Clone)]
pub struct RemoteLogClient {
    client: Client,
    config: RemoteLogConfig,
}

impl RemoteLogClient {
    pub fn new(config: RemoteLogConfig, timeout: Duration) -> Result<Self, NetworkError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.url, path)
    }

    /// Checks the API key. Succeeds only on a 200 whose body reports
    /// `<status>Valid</status>`.
    pub async fn authenticate(&self) -> Result<(), NetworkError> {
        let url = self.endpoint(&format!("auth/{}", self.config.api_key));
        tracing::debug!(%url, "authenticating with remote log");
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NetworkError::Status(status.as_u16()));
        }
        let body = resp.text().await?;
        if status_value(&body) == Some("Valid") {
            tracing::info!("remote log authenticated");
            Ok(())
        } else {
            Err(NetworkError::Rejected)
        }
    }

    /// Sends one single-line ADIF record.
    pub async fn post_contact(&self, adif_record: &str) -> Result<(), NetworkError> {
        let envelope = QsoEnvelope {
            key: &self.config.api_key,
            station_profile_id: &self.config.station_profile_id,
            kind: "adif",
            string: adif_record,
        };
        let resp = self
            .client
            .post(self.endpoint("qso/"))
            .json(&envelope)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NetworkError::Status(status.as_u16()));
        }
        Ok(())
    }
}

fn status_value(body: &str) -> Option<&str> {
    let start = body.find("<status>")? + "<status>".len();
    let len = body[start..].find("</status>")?;
    Some(&body[start..start + len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_value_is_extracted() {
        assert_eq!(status_value("<auth><status>Valid</status></auth>"), Some("Valid"));
        assert_eq!(status_value("<status>Invalid</status>"), Some("Invalid"));
        assert_eq!(status_value("nothing"), None);
    }

    #[test]
    fn envelope_uses_type_field() {
        let env = QsoEnvelope {
            key: "k",
            station_profile_id: "1",
            kind: "adif",
            string: "<CALL:4>W1AW<EOR>",
        };
        let json = serde_json::to_value(&env).expect("json");
        assert_eq!(json["type"], "adif");
        assert_eq!(json["string"], "<CALL:4>W1AW<EOR>");
    }
}
