//! # Policy Check
//!
//! Evaluates one access request against a policy file.
//!
//! The request is read as JSON from stdin:
//!
//! ```json
//! {
//!   "subject": { "id": "u1", "roles": ["User"], "attributes": {} },
//!   "resource": { "name": "Doc", "attributes": { "owner": "u1" } },
//!   "actions": ["read", "update"],
//!   "context": {},
//!   "completeValidation": true
//! }
//! ```
//!
//! The decision is printed as JSON on stdout. Exit status is 0 when access
//! is granted, 1 when it is denied and 2 on any other error.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `WARDEN_POLICY` - Policy file path (required)
//! - `WARDEN_POLICY_FORMAT` - `json` or `yaml` (default: inferred from extension)
//! - `RUST_LOG` - Log level (default: warn)

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_adapters::{FileAdapter, FileType};
use warden_authz::{
    AccessManager, AccessRequest, AuthzError, BasicResource, BasicSubject, Context, PermissionError,
    PolicyManager, PolicyManagerConfig,
};

/// Request read from stdin
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckRequest {
    subject: BasicSubject,
    resource: BasicResource,
    actions: Vec<String>,
    #[serde(default)]
    context: Context,
    #[serde(default)]
    skip_conditions: bool,
    #[serde(default)]
    complete_validation: bool,
}

/// Decision written to stdout
#[derive(Debug, Serialize)]
struct CheckResponse {
    allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    reasons: Vec<DenialReason>,
}

#[derive(Debug, Serialize)]
struct DenialReason {
    role: String,
    action: String,
    resource: String,
    conditions: Vec<FailedCondition>,
}

#[derive(Debug, Serialize)]
struct FailedCondition {
    #[serde(rename = "type")]
    condition_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    reason: String,
}

impl From<&PermissionError> for DenialReason {
    fn from(error: &PermissionError) -> Self {
        Self {
            role: error.role_name.clone(),
            action: error.action.clone(),
            resource: error.resource_name.clone(),
            conditions: error
                .condition_errors
                .iter()
                .map(|e| FailedCondition {
                    condition_type: e.condition.condition_type().to_string(),
                    name: e.condition.name().map(str::to_string),
                    reason: e.reason.clone(),
                })
                .collect(),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            error!("{:#}", err);
            eprintln!("error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<bool> {
    let path = std::env::var("WARDEN_POLICY").context("WARDEN_POLICY is not set")?;

    let adapter = match std::env::var("WARDEN_POLICY_FORMAT") {
        Ok(format) => FileAdapter::new(&path, format.parse::<FileType>()?),
        Err(_) => FileAdapter::from_path(&path)?,
    };

    let policy = PolicyManager::new(
        Arc::new(adapter),
        PolicyManagerConfig { auto_update: false },
    )
    .with_context(|| format!("failed to load policy from {}", path))?;
    let access = AccessManager::new(Arc::new(policy));

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read request from stdin")?;
    let check: CheckRequest = serde_json::from_str(&input).context("invalid request")?;

    debug!(subject = %check.subject.id, resource = %check.resource.name, "Checking request");

    let request = AccessRequest::new(&check.subject, &check.resource, check.actions.iter().cloned())
        .with_context(&check.context)
        .skip_conditions(check.skip_conditions)
        .complete_validation(check.complete_validation);

    let response = match access.authorize(&request) {
        Ok(()) => CheckResponse {
            allowed: true,
            message: None,
            reasons: Vec::new(),
        },
        Err(AuthzError::AccessDenied(denied)) => CheckResponse {
            allowed: false,
            message: Some(denied.to_string()),
            reasons: denied.reasons.iter().map(DenialReason::from).collect(),
        },
        Err(err) => return Err(err.into()),
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(response.allowed)
}
