//! Control-plane wrapper for the Bedrock `AgentCore` Gateway: gateway lookup,
//! target registration, credential providers, and readiness polling.

use crate::error::{Result, TargetError};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_bedrockagentcorecontrol::error::ProvideErrorMetadata;
use aws_sdk_bedrockagentcorecontrol::types::{
    CredentialProviderConfiguration, CredentialProviderType, TargetConfiguration, TargetStatus,
};
use aws_smithy_types::error::display::DisplayErrorContext;
use serde::Serialize;
use std::time::Duration;

const READY_POLL_INTERVAL: Duration = Duration::from_secs(2);
const READY_TIMEOUT: Duration = Duration::from_secs(120);

/// Load shared AWS configuration pinned to `region`.
pub async fn load_aws_config(region: &str) -> aws_config::SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

/// Resolved gateway identity, from `GetGateway`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayInfo {
    pub id: String,
    pub name: String,
    pub role_arn: Option<String>,
    pub url: Option<String>,
    pub status: String,
}

/// A registered (or just-created) gateway target.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub id: String,
    pub name: String,
    pub status: String,
}

/// Terminal classification of a target status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Failed,
    Pending,
}

/// Classify a target status for the readiness wait.
#[must_use]
pub fn readiness(status: &TargetStatus) -> Readiness {
    match status {
        TargetStatus::Ready => Readiness::Ready,
        TargetStatus::Failed | TargetStatus::UpdateUnsuccessful => Readiness::Failed,
        _ => Readiness::Pending,
    }
}

/// Check a target name against the gateway's naming rule: up to 100
/// alphanumeric characters, each optionally followed by a single hyphen.
///
/// # Errors
///
/// Returns an error naming the offending input.
pub fn validate_target_name(name: &str) -> Result<()> {
    let mut units = 0usize;
    // Starting "after a hyphen" forbids a leading one.
    let mut previous_was_hyphen = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            units += 1;
            previous_was_hyphen = false;
        } else if c == '-' {
            if previous_was_hyphen {
                return Err(invalid_target_name(name));
            }
            previous_was_hyphen = true;
        } else {
            return Err(invalid_target_name(name));
        }
    }
    if units == 0 || units > 100 {
        return Err(invalid_target_name(name));
    }
    Ok(())
}

fn invalid_target_name(name: &str) -> TargetError {
    TargetError::Gateway(format!(
        "invalid target name '{name}': use letters and digits with single hyphens (max 100)"
    ))
}

/// Check a credential provider name: letters, digits, underscores, hyphens.
///
/// # Errors
///
/// Returns an error naming the offending input.
pub fn validate_provider_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.len() > 128
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(TargetError::Credential(format!(
            "invalid credential provider name '{name}': use letters, digits, '_' or '-' (max 128)"
        )));
    }
    Ok(())
}

/// Credential configuration for targets the gateway invokes with its own
/// execution role (lambda targets).
///
/// # Errors
///
/// Returns an error if the SDK builder rejects the configuration.
pub fn iam_role_credentials() -> Result<Vec<CredentialProviderConfiguration>> {
    let config = CredentialProviderConfiguration::builder()
        .credential_provider_type(CredentialProviderType::GatewayIamRole)
        .build()
        .map_err(|e| TargetError::Credential(format!("IAM role credential configuration: {e}")))?;
    Ok(vec![config])
}

fn is_conflict(err: &impl ProvideErrorMetadata) -> bool {
    err.code() == Some("ConflictException")
}

/// Client for provisioning targets on one gateway.
#[derive(Debug, Clone)]
pub struct GatewayTargets {
    client: aws_sdk_bedrockagentcorecontrol::Client,
    gateway_id: String,
}

impl GatewayTargets {
    /// Bind a control-plane client to `gateway_id`.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig, gateway_id: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_bedrockagentcorecontrol::Client::new(config),
            gateway_id: gateway_id.into(),
        }
    }

    /// Look up the gateway.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub async fn describe(&self) -> Result<GatewayInfo> {
        let output = self
            .client
            .get_gateway()
            .gateway_identifier(&self.gateway_id)
            .send()
            .await
            .map_err(|e| {
                TargetError::Gateway(format!(
                    "get gateway {}: {}",
                    self.gateway_id,
                    DisplayErrorContext(e)
                ))
            })?;
        Ok(GatewayInfo {
            id: output.gateway_id().to_string(),
            name: output.name().to_string(),
            role_arn: output.role_arn().map(str::to_string),
            url: output.gateway_url().map(str::to_string),
            status: output.status().as_str().to_string(),
        })
    }

    /// Ensure an API key credential provider named `name` exists, storing
    /// `api_key`, and return its ARN. An existing provider is reused without
    /// rotating the stored key.
    ///
    /// # Errors
    ///
    /// Returns an error if creation and the fallback lookup both fail.
    pub async fn ensure_api_key_provider(&self, name: &str, api_key: &str) -> Result<String> {
        validate_provider_name(name)?;
        let created = self
            .client
            .create_api_key_credential_provider()
            .name(name)
            .api_key(api_key)
            .send()
            .await;
        match created {
            Ok(output) => {
                tracing::info!("Created API key credential provider {}", name);
                Ok(output.credential_provider_arn().to_string())
            }
            Err(e) => {
                let service_error = e.into_service_error();
                if is_conflict(&service_error) {
                    tracing::debug!("Credential provider {} already exists, reusing it", name);
                    let output = self
                        .client
                        .get_api_key_credential_provider()
                        .name(name)
                        .send()
                        .await
                        .map_err(|e| {
                            TargetError::Credential(format!(
                                "get credential provider {name}: {}",
                                DisplayErrorContext(e)
                            ))
                        })?;
                    Ok(output.credential_provider_arn().to_string())
                } else {
                    Err(TargetError::Credential(format!(
                        "create credential provider {name}: {}",
                        DisplayErrorContext(service_error)
                    )))
                }
            }
        }
    }

    /// Register a target on the gateway.
    ///
    /// On a name conflict the existing target is looked up and returned
    /// instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid, creation fails, or a
    /// conflicting target cannot be found by the fallback listing.
    pub async fn create_target(
        &self,
        name: &str,
        description: Option<&str>,
        configuration: TargetConfiguration,
        credentials: Vec<CredentialProviderConfiguration>,
    ) -> Result<TargetInfo> {
        validate_target_name(name)?;
        let mut request = self
            .client
            .create_gateway_target()
            .gateway_identifier(&self.gateway_id)
            .name(name)
            .target_configuration(configuration);
        if let Some(description) = description {
            request = request.description(description);
        }
        for credential in credentials {
            request = request.credential_provider_configurations(credential);
        }
        match request.send().await {
            Ok(output) => {
                let id = output.target_id().to_string();
                tracing::info!("Created target {} ({})", name, id);
                Ok(TargetInfo {
                    id,
                    name: name.to_string(),
                    status: output.status().as_str().to_string(),
                })
            }
            Err(e) => {
                let service_error = e.into_service_error();
                if is_conflict(&service_error) {
                    tracing::debug!(
                        "Target {} already exists on gateway {}, looking it up",
                        name,
                        self.gateway_id
                    );
                    self.find_target(name).await?.ok_or_else(|| {
                        TargetError::Gateway(format!(
                            "target {name} conflicted on create but is not listed on gateway {}",
                            self.gateway_id
                        ))
                    })
                } else {
                    Err(TargetError::Gateway(format!(
                        "create target {name}: {}",
                        DisplayErrorContext(service_error)
                    )))
                }
            }
        }
    }

    /// List every target registered on the gateway.
    ///
    /// # Errors
    ///
    /// Returns an error if a listing page cannot be fetched.
    pub async fn list_targets(&self) -> Result<Vec<TargetInfo>> {
        let mut targets = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let mut request = self
                .client
                .list_gateway_targets()
                .gateway_identifier(&self.gateway_id);
            if let Some(token) = &next_token {
                request = request.next_token(token);
            }
            let page = request.send().await.map_err(|e| {
                TargetError::Gateway(format!(
                    "list targets on gateway {}: {}",
                    self.gateway_id,
                    DisplayErrorContext(e)
                ))
            })?;
            for item in page.items() {
                targets.push(TargetInfo {
                    id: item.target_id().to_string(),
                    name: item.name().to_string(),
                    status: item.status().as_str().to_string(),
                });
            }
            next_token = page.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }
        Ok(targets)
    }

    /// Find a target by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub async fn find_target(&self, name: &str) -> Result<Option<TargetInfo>> {
        Ok(self.list_targets().await?.into_iter().find(|t| t.name == name))
    }

    /// Poll until `target_id` reaches `READY` and return its final state.
    ///
    /// # Errors
    ///
    /// Returns an error if the target lands in a failed status or the wait
    /// times out.
    pub async fn wait_until_ready(&self, target_id: &str) -> Result<TargetInfo> {
        let started = std::time::Instant::now();
        loop {
            let output = self
                .client
                .get_gateway_target()
                .gateway_identifier(&self.gateway_id)
                .target_id(target_id)
                .send()
                .await
                .map_err(|e| {
                    TargetError::Gateway(format!(
                        "get target {target_id}: {}",
                        DisplayErrorContext(e)
                    ))
                })?;
            let status = output.status().clone();
            match readiness(&status) {
                Readiness::Ready => {
                    return Ok(TargetInfo {
                        id: target_id.to_string(),
                        name: output.name().to_string(),
                        status: status.as_str().to_string(),
                    });
                }
                Readiness::Failed => {
                    let reasons = output.status_reasons().join("; ");
                    return Err(TargetError::Gateway(format!(
                        "target {target_id} entered {}: {reasons}",
                        status.as_str()
                    )));
                }
                Readiness::Pending => {}
            }
            if started.elapsed() >= READY_TIMEOUT {
                return Err(TargetError::Gateway(format!(
                    "target {target_id} not ready after {}s (last status {})",
                    READY_TIMEOUT.as_secs(),
                    status.as_str()
                )));
            }
            tracing::debug!("Target {} is {}, polling again", target_id, status.as_str());
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_target_name() {
        assert!(validate_target_name("NasaApi").is_ok());
        assert!(validate_target_name("CustomCalculator").is_ok());
        assert!(validate_target_name("weather-api-2").is_ok());
        assert!(validate_target_name("").is_err());
        assert!(validate_target_name("-leading").is_err());
        assert!(validate_target_name("double--hyphen").is_err());
        assert!(validate_target_name("under_score").is_err());
        assert!(validate_target_name("spa ce").is_err());
        assert!(validate_target_name("trailing-").is_ok());
        assert!(validate_target_name(&"a".repeat(100)).is_ok());
        assert!(validate_target_name(&"a".repeat(101)).is_err());
        // Hyphens don't count toward the 100-character limit.
        let hyphenated = "a-".repeat(99) + "a";
        assert_eq!(hyphenated.len(), 199);
        assert!(validate_target_name(&hyphenated).is_ok());
    }

    #[test]
    fn test_validate_provider_name() {
        assert!(validate_provider_name("NasaApiKey").is_ok());
        assert!(validate_provider_name("nasa_api-key2").is_ok());
        assert!(validate_provider_name("").is_err());
        assert!(validate_provider_name("has space").is_err());
        assert!(validate_provider_name("dot.name").is_err());
        assert!(validate_provider_name(&"k".repeat(129)).is_err());
    }

    #[test]
    fn test_readiness_classification() {
        assert_eq!(readiness(&TargetStatus::Ready), Readiness::Ready);
        assert_eq!(readiness(&TargetStatus::Failed), Readiness::Failed);
        assert_eq!(
            readiness(&TargetStatus::UpdateUnsuccessful),
            Readiness::Failed
        );
        assert_eq!(readiness(&TargetStatus::Creating), Readiness::Pending);
        assert_eq!(readiness(&TargetStatus::Updating), Readiness::Pending);
        assert_eq!(readiness(&TargetStatus::Deleting), Readiness::Pending);
    }

    #[test]
    fn test_iam_role_credentials() {
        let configs = iam_role_credentials().unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(
            configs[0].credential_provider_type(),
            &CredentialProviderType::GatewayIamRole
        );
        assert!(configs[0].credential_provider().is_none());
    }
}
