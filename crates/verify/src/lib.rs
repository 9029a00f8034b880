//! Source verification against Blockscout's Etherscan-compatible API.
//!
//! Verification publishes the standard-JSON compiler input for a deployed
//! contract so the explorer can match bytecode to source. Failures here never
//! undo a deployment; callers decide whether to surface them.

use alloy_primitives::{hex, Address, Bytes};
use config::VerificationProfile;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tokio_retry::{strategy::FixedInterval, RetryIf};
use tracing::{debug, info};

/// Default delay between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default number of status polls before giving up.
pub const DEFAULT_MAX_POLLS: usize = 20;

#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response from explorer: {body}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Explorer API error: {0}")]
    Api(String),

    #[error("Verification rejected: {0}")]
    Rejected(String),

    #[error("Verification {guid} still pending after {attempts} checks")]
    Timeout { guid: String, attempts: usize },
}

/// Everything the explorer needs to verify one contract.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub address: Address,
    /// `<sourceName>:<contractName>`
    pub artifact_id: String,
    /// Full compiler version, e.g. `0.8.27+commit.40a35a09`
    pub compiler_version: String,
    /// Standard-JSON compiler input
    pub standard_json_input: serde_json::Value,
    /// ABI-encoded constructor arguments
    pub constructor_args: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Accepted for processing, poll with the guid
    Submitted(String),
    AlreadyVerified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    Pending,
    Verified,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    AlreadyVerified,
}

/// Envelope shared by all Etherscan-style responses.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}

impl ApiResponse {
    fn ok(&self) -> bool {
        self.status == "1"
    }

    fn result_text(&self) -> String {
        match &self.result {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => self.message.clone(),
            other => other.to_string(),
        }
    }
}

enum PollError {
    Pending,
    Fatal(VerificationError),
}

/// Client for one explorer instance.
#[derive(Debug, Clone)]
pub struct VerifierClient {
    client: reqwest::Client,
    profile: VerificationProfile,
    poll_interval: Duration,
    max_polls: usize,
}

impl VerifierClient {
    pub fn new(profile: VerificationProfile) -> Self {
        Self::with_client(reqwest::Client::new(), profile)
    }

    pub const fn with_client(client: reqwest::Client, profile: VerificationProfile) -> Self {
        Self {
            client,
            profile,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    pub const fn with_polling(mut self, interval: Duration, max_polls: usize) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    pub const fn profile(&self) -> &VerificationProfile {
        &self.profile
    }

    /// Verify a contract unless the explorer already has its source.
    pub async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationOutcome, VerificationError> {
        if self.is_verified(request.address).await? {
            info!(address = %request.address, "Contract already verified");
            return Ok(VerificationOutcome::AlreadyVerified);
        }

        match self.submit(request).await? {
            SubmitOutcome::AlreadyVerified => Ok(VerificationOutcome::AlreadyVerified),
            SubmitOutcome::Submitted(guid) => {
                info!(address = %request.address, guid = %guid, "Verification submitted");
                self.wait_for(&guid).await?;
                Ok(VerificationOutcome::Verified)
            }
        }
    }

    /// Whether the explorer has source code for an address.
    pub async fn is_verified(&self, address: Address) -> Result<bool, VerificationError> {
        let address = address.to_string();
        let response = self
            .get(&[
                ("module", "contract"),
                ("action", "getsourcecode"),
                ("address", address.as_str()),
            ])
            .await?;
        Ok(has_source(&response))
    }

    /// Submit standard-JSON input for verification.
    pub async fn submit(
        &self,
        request: &VerificationRequest,
    ) -> Result<SubmitOutcome, VerificationError> {
        let source = request.standard_json_input.to_string();
        let address = request.address.to_string();
        let compiler = compiler_version_param(&request.compiler_version);
        let args = hex::encode(&request.constructor_args);

        let form = [
            ("apikey", self.profile.api_key.as_str()),
            ("module", "contract"),
            ("action", "verifysourcecode"),
            ("contractaddress", address.as_str()),
            ("sourceCode", source.as_str()),
            ("codeformat", "solidity-standard-json-input"),
            ("contractname", request.artifact_id.as_str()),
            ("compilerversion", compiler.as_str()),
            // Misspelling is part of the API.
            ("constructorArguements", args.as_str()),
        ];

        debug!(
            address = %request.address,
            contract = %request.artifact_id,
            compiler = %compiler,
            "Submitting verification"
        );

        let response = self.client.post(&self.profile.api_url).form(&form).send().await?;
        let body = response.error_for_status()?.text().await?;
        parse_submit(decode(body)?)
    }

    /// Current status of a submission.
    pub async fn check_status(&self, guid: &str) -> Result<VerificationStatus, VerificationError> {
        let response = self
            .get(&[
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .await?;
        Ok(parse_status(&response))
    }

    /// Poll until the submission leaves the pending state.
    pub async fn wait_for(&self, guid: &str) -> Result<(), VerificationError> {
        let strategy = FixedInterval::new(self.poll_interval).take(self.max_polls);

        let result = RetryIf::start(
            strategy,
            move || async move {
                match self.check_status(guid).await {
                    Ok(VerificationStatus::Verified) => Ok(()),
                    Ok(VerificationStatus::Pending) => {
                        debug!(guid, "Verification pending");
                        Err(PollError::Pending)
                    }
                    Ok(VerificationStatus::Failed(reason)) => {
                        Err(PollError::Fatal(VerificationError::Rejected(reason)))
                    }
                    Err(e) => Err(PollError::Fatal(e)),
                }
            },
            |e: &PollError| matches!(e, PollError::Pending),
        )
        .await;

        match result {
            Ok(()) => Ok(()),
            Err(PollError::Pending) => Err(VerificationError::Timeout {
                guid: guid.to_string(),
                attempts: self.max_polls + 1,
            }),
            Err(PollError::Fatal(e)) => Err(e),
        }
    }

    async fn get(&self, query: &[(&str, &str)]) -> Result<ApiResponse, VerificationError> {
        let response = self
            .client
            .get(&self.profile.api_url)
            .query(query)
            .query(&[("apikey", self.profile.api_key.as_str())])
            .send()
            .await?;
        let body = response.error_for_status()?.text().await?;
        decode(body)
    }
}

/// `0.8.27+commit.40a35a09` -> `v0.8.27+commit.40a35a09`.
fn compiler_version_param(version: &str) -> String {
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    }
}

fn decode(body: String) -> Result<ApiResponse, VerificationError> {
    serde_json::from_str(&body).map_err(|source| VerificationError::Decode { body, source })
}

fn is_already_verified(text: &str) -> bool {
    text.to_ascii_lowercase().contains("already verified")
}

fn parse_submit(response: ApiResponse) -> Result<SubmitOutcome, VerificationError> {
    let text = response.result_text();
    if response.ok() {
        if text.is_empty() {
            return Err(VerificationError::Api("submission returned no guid".to_string()));
        }
        return Ok(SubmitOutcome::Submitted(text));
    }
    if is_already_verified(&text) {
        return Ok(SubmitOutcome::AlreadyVerified);
    }
    Err(VerificationError::Rejected(text))
}

fn parse_status(response: &ApiResponse) -> VerificationStatus {
    let text = response.result_text();
    let lower = text.to_ascii_lowercase();

    if lower.starts_with("pass") || is_already_verified(&text) {
        VerificationStatus::Verified
    } else if lower.contains("pending") || lower.contains("in progress") {
        VerificationStatus::Pending
    } else if response.ok() {
        // Accepted but not finished yet.
        VerificationStatus::Pending
    } else {
        VerificationStatus::Failed(text)
    }
}

fn has_source(response: &ApiResponse) -> bool {
    if !response.ok() {
        return false;
    }
    response
        .result
        .as_array()
        .and_then(|entries| entries.first())
        .and_then(|entry| entry.get("SourceCode"))
        .and_then(|source| source.as_str())
        .is_some_and(|source| !source.is_empty())
}
