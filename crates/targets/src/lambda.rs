//! Lambda target provisioning: the built-in calculator function, its
//! execution role, and the tool schema the gateway registers for it.
//!
//! The deployed artifact is a Python handler the gateway invokes on the
//! agent's behalf; this crate only packages and uploads it.

use crate::error::{Result, TargetError};
use aws_sdk_bedrockagentcorecontrol::types::{
    McpLambdaTargetConfiguration, McpTargetConfiguration, SchemaDefinition, SchemaType,
    TargetConfiguration, ToolDefinition, ToolSchema,
};
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{FunctionCode, Runtime};
use aws_smithy_types::error::display::DisplayErrorContext;
use serde_json::json;
use std::io::Write as _;
use std::time::Duration;

const LAMBDA_HANDLER: &str = "lambda_function.lambda_handler";
const FUNCTION_DESCRIPTION: &str = "Custom calculator for AgentCore Gateway";
const INVOKE_STATEMENT_ID: &str = "AllowAgentCoreInvoke";
const BASIC_EXECUTION_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";
const ROLE_PROPAGATION_WAIT: Duration = Duration::from_secs(10);

/// Source of the deployed handler. The gateway passes the invoked tool name
/// through the Lambda client context as `bedrockAgentCoreToolName`, prefixed
/// with the target name, so the dispatch matches on containment.
const CALCULATOR_HANDLER_SOURCE: &str = r#"import json

def lambda_handler(event, context):
    tool_name = context.client_context.custom.get('bedrockAgentCoreToolName', 'unknown')

    if 'calculate_sum' in tool_name:
        a = event.get('a', 0)
        b = event.get('b', 0)
        return {
            'statusCode': 200,
            'body': json.dumps({'result': a + b})
        }
    elif 'multiply' in tool_name:
        x = event.get('x', 0)
        y = event.get('y', 0)
        return {
            'statusCode': 200,
            'body': json.dumps({'result': x * y})
        }

    return {'statusCode': 200, 'body': json.dumps({'error': 'Unknown tool'})}
"#;

/// Package the calculator handler as an in-memory zip suitable for
/// `CreateFunction`.
///
/// # Errors
///
/// Returns an error if zip writing fails.
pub fn function_bundle() -> Result<Vec<u8>> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    zip.start_file("lambda_function.py", zip::write::FileOptions::default())?;
    zip.write_all(CALCULATOR_HANDLER_SOURCE.as_bytes())?;
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn trust_policy_document() -> Result<String> {
    Ok(serde_json::to_string(&json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": {"Service": "lambda.amazonaws.com"},
            "Action": "sts:AssumeRole"
        }]
    }))?)
}

/// Inline tool schema for the calculator target: `calculate_sum(a, b)` and
/// `multiply(x, y)`.
///
/// # Errors
///
/// Returns an error if the SDK builders reject a definition.
pub fn calculator_tool_schema() -> Result<ToolSchema> {
    let sum = tool_definition(
        "calculate_sum",
        "Add two numbers",
        &[("a", "First number"), ("b", "Second number")],
    )?;
    let product = tool_definition(
        "multiply",
        "Multiply two numbers",
        &[("x", "First number"), ("y", "Second number")],
    )?;
    Ok(ToolSchema::InlinePayload(vec![sum, product]))
}

fn tool_definition(name: &str, description: &str, args: &[(&str, &str)]) -> Result<ToolDefinition> {
    let mut input = SchemaDefinition::builder().r#type(SchemaType::Object);
    for (arg, arg_description) in args {
        let property = SchemaDefinition::builder()
            .r#type(SchemaType::Number)
            .description(*arg_description)
            .build()
            .map_err(|e| TargetError::Lambda(format!("tool schema property '{arg}': {e}")))?;
        input = input.properties(*arg, property).required(*arg);
    }
    let input = input
        .build()
        .map_err(|e| TargetError::Lambda(format!("tool input schema for '{name}': {e}")))?;
    ToolDefinition::builder()
        .name(name)
        .description(description)
        .input_schema(input)
        .build()
        .map_err(|e| TargetError::Lambda(format!("tool definition '{name}': {e}")))
}

/// Target configuration for a lambda target backed by `lambda_arn`.
///
/// # Errors
///
/// Returns an error if the SDK builders reject the configuration.
pub fn lambda_target_configuration(lambda_arn: &str) -> Result<TargetConfiguration> {
    let configuration = McpLambdaTargetConfiguration::builder()
        .lambda_arn(lambda_arn)
        .tool_schema(calculator_tool_schema()?)
        .build()
        .map_err(|e| TargetError::Lambda(format!("lambda target configuration: {e}")))?;
    Ok(TargetConfiguration::Mcp(McpTargetConfiguration::Lambda(
        configuration,
    )))
}

/// Provisions the calculator function and its execution role.
#[derive(Debug, Clone)]
pub struct FunctionProvisioner {
    iam: aws_sdk_iam::Client,
    lambda: aws_sdk_lambda::Client,
}

impl FunctionProvisioner {
    /// Build IAM and Lambda clients from shared AWS configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            iam: aws_sdk_iam::Client::new(config),
            lambda: aws_sdk_lambda::Client::new(config),
        }
    }

    /// Ensure the execution role exists and return its ARN.
    ///
    /// A fresh create attaches `AWSLambdaBasicExecutionRole` and pauses for
    /// IAM propagation; an existing role is reused as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if role creation, lookup, or policy attachment fails.
    pub async fn ensure_role(&self, role_name: &str) -> Result<String> {
        let created = self
            .iam
            .create_role()
            .role_name(role_name)
            .assume_role_policy_document(trust_policy_document()?)
            .send()
            .await;
        match created {
            Ok(output) => {
                let arn = output
                    .role()
                    .map(|role| role.arn().to_string())
                    .ok_or_else(|| {
                        TargetError::Iam(format!("create role {role_name}: no role in response"))
                    })?;
                self.iam
                    .attach_role_policy()
                    .role_name(role_name)
                    .policy_arn(BASIC_EXECUTION_POLICY_ARN)
                    .send()
                    .await
                    .map_err(|e| {
                        TargetError::Iam(format!(
                            "attach AWSLambdaBasicExecutionRole to {role_name}: {}",
                            DisplayErrorContext(e)
                        ))
                    })?;
                tracing::info!(
                    "Created Lambda execution role {}, waiting for IAM propagation",
                    arn
                );
                tokio::time::sleep(ROLE_PROPAGATION_WAIT).await;
                Ok(arn)
            }
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_entity_already_exists_exception() {
                    tracing::debug!("Role {} already exists, reusing it", role_name);
                    let output = self
                        .iam
                        .get_role()
                        .role_name(role_name)
                        .send()
                        .await
                        .map_err(|e| {
                            TargetError::Iam(format!(
                                "get role {role_name}: {}",
                                DisplayErrorContext(e)
                            ))
                        })?;
                    output
                        .role()
                        .map(|role| role.arn().to_string())
                        .ok_or_else(|| {
                            TargetError::Iam(format!("get role {role_name}: no role in response"))
                        })
                } else {
                    Err(TargetError::Iam(format!(
                        "create role {role_name}: {}",
                        DisplayErrorContext(service_error)
                    )))
                }
            }
        }
    }

    /// Ensure the function exists and return its ARN.
    ///
    /// An existing function is reused without updating its code.
    ///
    /// # Errors
    ///
    /// Returns an error if function creation or lookup fails.
    pub async fn ensure_function(
        &self,
        function_name: &str,
        role_arn: &str,
        bundle: Vec<u8>,
    ) -> Result<String> {
        let code = FunctionCode::builder().zip_file(Blob::new(bundle)).build();
        let created = self
            .lambda
            .create_function()
            .function_name(function_name)
            .runtime(Runtime::Python39)
            .role(role_arn)
            .handler(LAMBDA_HANDLER)
            .code(code)
            .description(FUNCTION_DESCRIPTION)
            .send()
            .await;
        match created {
            Ok(output) => {
                let arn = output.function_arn().map(str::to_string).ok_or_else(|| {
                    TargetError::Lambda(format!(
                        "create function {function_name}: no ARN in response"
                    ))
                })?;
                tracing::info!("Created Lambda function {}", arn);
                Ok(arn)
            }
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_resource_conflict_exception() {
                    tracing::debug!("Function {} already exists, reusing it", function_name);
                    let output = self
                        .lambda
                        .get_function()
                        .function_name(function_name)
                        .send()
                        .await
                        .map_err(|e| {
                            TargetError::Lambda(format!(
                                "get function {function_name}: {}",
                                DisplayErrorContext(e)
                            ))
                        })?;
                    output
                        .configuration()
                        .and_then(|c| c.function_arn())
                        .map(str::to_string)
                        .ok_or_else(|| {
                            TargetError::Lambda(format!(
                                "get function {function_name}: no ARN in response"
                            ))
                        })
                } else {
                    Err(TargetError::Lambda(format!(
                        "create function {function_name}: {}",
                        DisplayErrorContext(service_error)
                    )))
                }
            }
        }
    }

    /// Allow the gateway's execution role to invoke the function. An already
    /// present statement is treated as granted.
    ///
    /// # Errors
    ///
    /// Returns an error if the permission cannot be added.
    pub async fn allow_gateway_invoke(
        &self,
        function_name: &str,
        gateway_role_arn: &str,
    ) -> Result<()> {
        let granted = self
            .lambda
            .add_permission()
            .function_name(function_name)
            .statement_id(INVOKE_STATEMENT_ID)
            .action("lambda:InvokeFunction")
            .principal(gateway_role_arn)
            .send()
            .await;
        match granted {
            Ok(_) => {
                tracing::info!(
                    "Granted lambda:InvokeFunction on {} to {}",
                    function_name,
                    gateway_role_arn
                );
                Ok(())
            }
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_resource_conflict_exception() {
                    tracing::debug!("Invoke permission already present on {}", function_name);
                    Ok(())
                } else {
                    Err(TargetError::Lambda(format!(
                        "add invoke permission on {function_name}: {}",
                        DisplayErrorContext(service_error)
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;

    #[test]
    fn test_function_bundle_contains_handler() {
        let bundle = function_bundle().unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bundle)).unwrap();
        let mut file = archive.by_name("lambda_function.py").unwrap();
        let mut source = String::new();
        file.read_to_string(&mut source).unwrap();
        assert!(source.contains("def lambda_handler"));
        assert!(source.contains("bedrockAgentCoreToolName"));
        assert!(source.contains("calculate_sum"));
        assert!(source.contains("multiply"));
    }

    #[test]
    fn test_trust_policy_document() {
        let policy: serde_json::Value =
            serde_json::from_str(&trust_policy_document().unwrap()).unwrap();
        assert_eq!(policy["Version"], "2012-10-17");
        assert_eq!(
            policy["Statement"][0]["Principal"]["Service"],
            "lambda.amazonaws.com"
        );
        assert_eq!(policy["Statement"][0]["Action"], "sts:AssumeRole");
    }

    #[test]
    fn test_calculator_tool_schema() {
        let schema = calculator_tool_schema().unwrap();
        let tools = schema.as_inline_payload().expect("inline payload");
        assert_eq!(tools.len(), 2);

        assert_eq!(tools[0].name(), "calculate_sum");
        assert_eq!(tools[0].description(), "Add two numbers");
        let sum_input = tools[0].input_schema().expect("input schema");
        assert_eq!(sum_input.r#type(), &SchemaType::Object);
        let required: Vec<&str> = sum_input.required().iter().map(String::as_str).collect();
        assert_eq!(required, ["a", "b"]);

        assert_eq!(tools[1].name(), "multiply");
        assert_eq!(tools[1].description(), "Multiply two numbers");
        let product_input = tools[1].input_schema().expect("input schema");
        let required: Vec<&str> = product_input.required().iter().map(String::as_str).collect();
        assert_eq!(required, ["x", "y"]);
    }
}
