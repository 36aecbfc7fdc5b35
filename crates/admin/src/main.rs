//! Admin CLI for provisioning Bedrock `AgentCore` Gateway targets.

use agentgate_targets::config::{DEFAULT_CONFIG_PATH, GatewayConfig};
use agentgate_targets::gateway::{self, GatewayTargets};
use agentgate_targets::{lambda, openapi};
use anyhow::{Context as _, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize as _;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "agentgate-admin",
    about = "Provision Bedrock AgentCore Gateway targets",
    version,
    after_help = "EXAMPLES:\n    agentgate-admin add-api --api-key DEMO_KEY\n    agentgate-admin add-lambda\n    agentgate-admin list-targets --json"
)]
struct Cli {
    /// Path to the gateway configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: PathBuf,

    /// Increase log verbosity (repeat for more).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a REST API as an openApiSchema target with API key credentials
    AddApi(AddApiArgs),
    /// Provision the calculator Lambda and register it as a lambda target
    AddLambda(AddLambdaArgs),
    /// List the targets registered on the gateway
    ListTargets {
        /// Print the list as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct AddApiArgs {
    /// Target name.
    #[arg(long, default_value = "NasaApi")]
    name: String,

    /// OpenAPI document to register (JSON or YAML). Defaults to the built-in
    /// NASA Astronomy Picture of the Day fragment.
    #[arg(long, value_name = "FILE")]
    spec: Option<PathBuf>,

    /// API key stored in the credential provider.
    #[arg(long, env = "NASA_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Where the gateway injects the key.
    #[arg(long, value_enum, default_value = "query")]
    key_location: KeyLocation,

    /// Header or query parameter name carrying the key.
    #[arg(long, default_value = "api_key")]
    key_parameter: String,

    /// Optional prefix prepended to the key value (e.g. "Bearer ").
    #[arg(long)]
    key_prefix: Option<String>,

    /// Credential provider name; defaults to "<name>ApiKey".
    #[arg(long)]
    provider_name: Option<String>,

    /// Target description shown by the gateway.
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args)]
struct AddLambdaArgs {
    /// Target name.
    #[arg(long, default_value = "CustomCalculator")]
    name: String,

    /// Lambda function name.
    #[arg(long, default_value = "CustomCalculatorFunction")]
    function_name: String,

    /// Execution role name.
    #[arg(long, default_value = "CustomCalculatorLambdaRole")]
    role_name: String,

    /// Target description shown by the gateway.
    #[arg(long)]
    description: Option<String>,
}

/// Where the gateway injects the API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KeyLocation {
    /// HTTP header.
    Header,
    /// Query string parameter.
    Query,
}

impl KeyLocation {
    fn as_credential_location(self) -> openapi::CredentialLocation {
        match self {
            Self::Header => openapi::CredentialLocation::Header,
            Self::Query => openapi::CredentialLocation::QueryParameter,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before parsing so `env`-backed arguments can see it.
    if let Err(error) = dotenvy::dotenv() {
        if !error.not_found() {
            eprintln!("warning: failed to load .env: {error}");
        }
    }
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = GatewayConfig::load(&cli.config)
        .with_context(|| format!("load gateway configuration from {}", cli.config.display()))?;
    tracing::debug!("Using gateway {} in {}", config.gateway_id, config.region);

    let aws_config = gateway::load_aws_config(&config.region).await;
    let targets = GatewayTargets::new(&aws_config, &config.gateway_id);

    match cli.command {
        Command::AddApi(args) => add_api(&targets, &args).await,
        Command::AddLambda(args) => add_lambda(&aws_config, &targets, &args).await,
        Command::ListTargets { json } => list_targets(&targets, json).await,
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn,agentgate_admin=info,agentgate_targets=info",
        1 => "info,agentgate_admin=debug,agentgate_targets=debug",
        _ => "debug,agentgate_admin=trace,agentgate_targets=trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn add_api(targets: &GatewayTargets, args: &AddApiArgs) -> anyhow::Result<()> {
    let gateway_info = targets.describe().await?;
    tracing::info!("Gateway {} is {}", gateway_info.name, gateway_info.status);

    let document = match &args.spec {
        Some(path) => openapi::load_document(path)
            .with_context(|| format!("load OpenAPI document {}", path.display()))?,
        None => openapi::apod_document(),
    };

    let provider_name = args
        .provider_name
        .clone()
        .unwrap_or_else(|| format!("{}ApiKey", args.name));
    let provider_arn = targets
        .ensure_api_key_provider(&provider_name, &args.api_key)
        .await
        .context("ensure API key credential provider")?;

    let credential = openapi::ApiKeyCredential {
        parameter_name: args.key_parameter.clone(),
        location: args.key_location.as_credential_location(),
        prefix: args.key_prefix.clone(),
    };

    let created = targets
        .create_target(
            &args.name,
            args.description.as_deref(),
            openapi::openapi_target_configuration(&document)?,
            vec![credential.to_provider_configuration(&provider_arn)?],
        )
        .await?;
    let target = targets.wait_until_ready(&created.id).await?;

    println!(
        "{} API target {} added to gateway {} (target id {})",
        "✓".green(),
        args.name.bold(),
        gateway_info.name,
        target.id
    );
    if args.spec.is_none() {
        println!("Try: \"Get NASA's astronomy picture for 2024-12-25\"");
    }
    Ok(())
}

async fn add_lambda(
    aws_config: &aws_config::SdkConfig,
    targets: &GatewayTargets,
    args: &AddLambdaArgs,
) -> anyhow::Result<()> {
    let gateway_info = targets.describe().await?;
    tracing::info!("Gateway {} is {}", gateway_info.name, gateway_info.status);
    let Some(gateway_role_arn) = gateway_info.role_arn.clone() else {
        bail!(
            "gateway {} has no execution role; cannot grant it invoke permission",
            gateway_info.id
        );
    };

    let provisioner = lambda::FunctionProvisioner::new(aws_config);
    let role_arn = provisioner.ensure_role(&args.role_name).await?;
    let bundle = lambda::function_bundle()?;
    let lambda_arn = provisioner
        .ensure_function(&args.function_name, &role_arn, bundle)
        .await?;
    provisioner
        .allow_gateway_invoke(&args.function_name, &gateway_role_arn)
        .await?;

    let created = targets
        .create_target(
            &args.name,
            args.description.as_deref(),
            lambda::lambda_target_configuration(&lambda_arn)?,
            gateway::iam_role_credentials()?,
        )
        .await?;
    let target = targets.wait_until_ready(&created.id).await?;

    println!(
        "{} Lambda target {} added to gateway {} (target id {})",
        "✓".green(),
        args.name.bold(),
        gateway_info.name,
        target.id
    );
    println!("Try: \"Calculate the sum of 42 and 58\"");
    Ok(())
}

async fn list_targets(targets: &GatewayTargets, json: bool) -> anyhow::Result<()> {
    let listed = targets.list_targets().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&listed)?);
    } else if listed.is_empty() {
        println!("No targets registered.");
    } else {
        for target in &listed {
            println!("{}  {}  {}", target.id, target.status, target.name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn test_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_add_api_defaults() {
        let cli =
            Cli::try_parse_from(["agentgate-admin", "add-api", "--api-key", "DEMO_KEY"]).unwrap();
        let Command::AddApi(args) = cli.command else {
            panic!("expected add-api");
        };
        assert_eq!(args.name, "NasaApi");
        assert_eq!(args.api_key, "DEMO_KEY");
        assert_eq!(args.key_parameter, "api_key");
        assert_eq!(args.key_location, KeyLocation::Query);
        assert!(args.spec.is_none());
        assert!(args.key_prefix.is_none());
        assert!(args.provider_name.is_none());
    }

    #[test]
    fn test_add_api_header_key() {
        let cli = Cli::try_parse_from([
            "agentgate-admin",
            "add-api",
            "--api-key",
            "k",
            "--key-location",
            "header",
            "--key-parameter",
            "X-Api-Key",
            "--key-prefix",
            "Bearer ",
        ])
        .unwrap();
        let Command::AddApi(args) = cli.command else {
            panic!("expected add-api");
        };
        assert_eq!(args.key_location, KeyLocation::Header);
        assert_eq!(args.key_parameter, "X-Api-Key");
        assert_eq!(args.key_prefix.as_deref(), Some("Bearer "));
    }

    #[test]
    fn test_add_lambda_defaults() {
        let cli = Cli::try_parse_from(["agentgate-admin", "add-lambda"]).unwrap();
        let Command::AddLambda(args) = cli.command else {
            panic!("expected add-lambda");
        };
        assert_eq!(args.name, "CustomCalculator");
        assert_eq!(args.function_name, "CustomCalculatorFunction");
        assert_eq!(args.role_name, "CustomCalculatorLambdaRole");
    }

    #[test]
    fn test_config_path_override() {
        let cli = Cli::try_parse_from([
            "agentgate-admin",
            "--config",
            "/tmp/gw.json",
            "list-targets",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("/tmp/gw.json"));
        assert!(matches!(cli.command, Command::ListTargets { json: false }));
    }
}
