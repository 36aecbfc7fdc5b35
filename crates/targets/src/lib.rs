//! Provisioning library for Bedrock `AgentCore` Gateway targets.
//!
//! This crate is the backend of the `agentgate-admin` CLI. It registers two
//! kinds of targets on an existing gateway:
//! - a remote REST API described by an inline `OpenAPI` document, with API key
//!   credential wiring (NASA's Astronomy Picture of the Day by default),
//! - a Lambda function provisioned end to end (execution role, code bundle,
//!   invoke permission) and registered with an inline tool schema.
//!
//! All remote operations are delegated to the AWS SDK; the only errors
//! recovered locally are "already exists" conflicts, which fall back to a
//! lookup of the existing resource.

pub mod config;
pub mod error;
pub mod gateway;
pub mod lambda;
pub mod openapi;
