//! `OpenAPI` target payloads: the built-in NASA APOD document, external
//! document loading, and API key credential wiring.

use crate::error::{Result, TargetError};
use aws_sdk_bedrockagentcorecontrol::types::{
    ApiKeyCredentialLocation, ApiSchemaConfiguration, CredentialProvider,
    CredentialProviderConfiguration, CredentialProviderType, GatewayApiKeyCredentialProvider,
    McpTargetConfiguration, TargetConfiguration,
};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::path::Path;

/// The built-in `OpenAPI` fragment for NASA's Astronomy Picture of the Day.
#[must_use]
pub fn apod_document() -> Value {
    json!({
        "openapi": "3.0.0",
        "info": {"title": "NASA API", "version": "1.0.0"},
        "servers": [{"url": "https://api.nasa.gov"}],
        "paths": {
            "/planetary/apod": {
                "get": {
                    "operationId": "getAstronomyPictureOfDay",
                    "summary": "Get NASA's Astronomy Picture of the Day",
                    "parameters": [
                        {
                            "name": "date",
                            "in": "query",
                            "required": false,
                            "schema": {"type": "string"},
                            "description": "Date in YYYY-MM-DD format"
                        }
                    ],
                    "responses": {
                        "200": {
                            "description": "Success",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "title": {"type": "string"},
                                            "explanation": {"type": "string"},
                                            "url": {"type": "string"}
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

/// Load an `OpenAPI` document from disk.
///
/// JSON is a valid subset of YAML, so `serde_yaml` handles both formats.
/// Beyond requiring a mapping at the top level the document is passed through
/// unvalidated; the gateway owns the schema contract.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not parse as a
/// mapping.
pub fn load_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|source| TargetError::DocumentReadFile {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(
        "Loaded OpenAPI document from {} (sha256:{})",
        path.display(),
        hex::encode(Sha256::digest(&content))
    );
    let doc: Value = serde_yaml::from_str(&content).map_err(|source| TargetError::DocumentParse {
        location: path.display().to_string(),
        source,
    })?;
    if !doc.is_object() {
        return Err(TargetError::OpenApi(format!(
            "document '{}' must be a mapping at the top level",
            path.display()
        )));
    }
    Ok(doc)
}

/// Serialize a document into the string form the gateway stores as the
/// target's inline payload.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized as JSON.
pub fn inline_payload(doc: &Value) -> Result<String> {
    Ok(serde_json::to_string(doc)?)
}

/// Target configuration for an inline `openApiSchema` target.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized.
pub fn openapi_target_configuration(doc: &Value) -> Result<TargetConfiguration> {
    Ok(TargetConfiguration::Mcp(
        McpTargetConfiguration::OpenApiSchema(ApiSchemaConfiguration::InlinePayload(
            inline_payload(doc)?,
        )),
    ))
}

/// Where the gateway injects the API key on outbound calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialLocation {
    /// Send the key in an HTTP header.
    Header,
    /// Send the key in the query string.
    QueryParameter,
}

impl CredentialLocation {
    fn as_sdk(self) -> ApiKeyCredentialLocation {
        match self {
            Self::Header => ApiKeyCredentialLocation::Header,
            Self::QueryParameter => ApiKeyCredentialLocation::QueryParameter,
        }
    }
}

/// API key wiring for an `openApiSchema` target.
#[derive(Debug, Clone)]
pub struct ApiKeyCredential {
    /// Header or query parameter name carrying the key.
    pub parameter_name: String,
    /// Where the key goes.
    pub location: CredentialLocation,
    /// Optional prefix prepended to the key value (e.g. `"Bearer "`).
    pub prefix: Option<String>,
}

impl ApiKeyCredential {
    /// Build the target credential configuration referencing `provider_arn`.
    ///
    /// # Errors
    ///
    /// Returns an error if the SDK builders reject the configuration.
    pub fn to_provider_configuration(
        &self,
        provider_arn: &str,
    ) -> Result<CredentialProviderConfiguration> {
        let mut provider = GatewayApiKeyCredentialProvider::builder()
            .provider_arn(provider_arn)
            .credential_location(self.location.as_sdk())
            .credential_parameter_name(&self.parameter_name);
        if let Some(prefix) = &self.prefix {
            provider = provider.credential_prefix(prefix);
        }
        let provider = provider.build().map_err(|e| {
            TargetError::Credential(format!("API key credential configuration: {e}"))
        })?;
        CredentialProviderConfiguration::builder()
            .credential_provider_type(CredentialProviderType::ApiKey)
            .credential_provider(CredentialProvider::ApiKeyCredentialProvider(provider))
            .build()
            .map_err(|e| {
                TargetError::Credential(format!("credential provider configuration: {e}"))
            })
    }
}
