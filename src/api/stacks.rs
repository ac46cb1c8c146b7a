//! Deployment (stack) resources: listing, inspection, redeploys, logs and
//! manual registration.

use super::{is_valid_comma_delimited_list, Client};
use crate::http::Transport;
use crate::table::{epoch_millis_to_date_str, render_table};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

const DEFAULT_STATUSES: &str = "ready,warming,deprecated";
const DEFAULT_NAMESPACES: &str = "dev,qa,prod";

/// Registers a deployment Nelson did not launch itself
#[derive(Debug, Clone, Serialize)]
pub struct ManualDeploymentRequest {
    pub datacenter: String,
    pub namespace: String,
    pub service_type: String,
    pub version: String,
    pub hash: String,
    pub port: i64,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Stack {
    pub workflow: String,
    pub guid: String,
    pub stack_name: String,
    pub deployed_at: i64,
    #[serde(rename = "unit")]
    pub unit_name: String,
    pub plan: String,
    #[serde(default)]
    pub namespace: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StackStatus {
    pub timestamp: String,
    pub message: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StackDependencies {
    #[serde(default)]
    pub outbound: Vec<Stack>,
    #[serde(default)]
    pub inbound: Vec<Stack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StackSummary {
    pub workflow: String,
    pub guid: String,
    pub stack_name: String,
    pub deployed_at: i64,
    #[serde(rename = "unit")]
    pub unit_name: String,
    pub plan: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub expiration: i64,
    #[serde(default)]
    pub statuses: Vec<StackStatus>,
    #[serde(default)]
    pub dependencies: StackDependencies,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StackLog {
    #[serde(default)]
    pub content: Vec<String>,
    #[serde(default)]
    pub offset: i64,
}

/// Filters for `GET /v1/deployments`; invalid lists fall back to defaults
#[derive(Debug, Clone, Default)]
pub struct StackFilter {
    pub datacenters: Option<String>,
    pub namespaces: Option<String>,
    pub statuses: Option<String>,
}

impl StackFilter {
    pub fn query(&self) -> String {
        let valid = |v: &Option<String>| {
            v.as_deref()
                .filter(|s| is_valid_comma_delimited_list(s))
                .map(str::to_string)
        };

        let mut query = String::from("/v1/deployments?");
        if let Some(dcs) = valid(&self.datacenters) {
            query.push_str(&format!("dc={}&", dcs));
        }
        // Without an explicit status the user almost always wants live stacks
        let statuses = valid(&self.statuses).unwrap_or_else(|| DEFAULT_STATUSES.to_string());
        query.push_str(&format!("status={}&", statuses));
        let namespaces =
            valid(&self.namespaces).unwrap_or_else(|| DEFAULT_NAMESPACES.to_string());
        query.push_str(&format!("ns={}", namespaces));
        query
    }
}

impl<T: Transport> Client<'_, T> {
    pub fn list_stacks(&self, filter: &StackFilter) -> Result<Vec<Stack>> {
        self.get_json(&filter.query())
    }

    pub fn inspect_stack(&self, guid: &str) -> Result<StackSummary> {
        self.get_json(&format!("/v1/deployments/{}", guid))
    }

    pub fn redeploy(&self, guid: &str) -> Result<String> {
        self.post::<()>(&format!("/v1/deployments/{}/redeploy", guid), None)?;
        Ok("Redeployment requested.".to_string())
    }

    pub fn deployment_log(&self, guid: &str) -> Result<StackLog> {
        self.get_json(&format!("/v1/deployments/{}/log", guid))
    }

    pub fn register_manual_deployment(&self, req: &ManualDeploymentRequest) -> Result<String> {
        self.post("/v1/deployments", Some(req))?;
        Ok("Manual stack has been registered.".to_string())
    }
}

pub fn print_stacks<W: Write>(w: &mut W, stacks: &[Stack]) -> Result<()> {
    let rows: Vec<Vec<String>> = stacks
        .iter()
        .map(|s| {
            vec![
                s.guid.clone(),
                s.namespace.clone(),
                s.stack_name.clone(),
                s.plan.clone(),
                s.workflow.clone(),
                epoch_millis_to_date_str(s.deployed_at),
            ]
        })
        .collect();
    render_table(
        w,
        &["GUID", "Namespace", "Stack", "Plan", "Workflow", "Deployed At"],
        &rows,
    )?;
    Ok(())
}

pub fn print_stack_summary<W: Write>(w: &mut W, s: &StackSummary) -> Result<()> {
    let info = vec![
        vec!["GUID:".to_string(), s.guid.clone()],
        vec!["STACK NAME:".to_string(), s.stack_name.clone()],
        vec!["NAMESPACE:".to_string(), s.namespace.clone()],
        vec!["PLAN:".to_string(), s.plan.clone()],
        vec!["WORKFLOW:".to_string(), s.workflow.clone()],
        vec![
            "DEPLOYED AT:".to_string(),
            epoch_millis_to_date_str(s.deployed_at),
        ],
        vec![
            "EXPIRES AT:".to_string(),
            epoch_millis_to_date_str(s.expiration),
        ],
    ];
    writeln!(w, "===>> Stack Information")?;
    render_table(w, &["Parameter", "Value"], &info)?;

    let dependency_row = |d: &Stack, direction: &str| {
        vec![
            d.guid.clone(),
            d.stack_name.clone(),
            d.plan.clone(),
            d.workflow.clone(),
            epoch_millis_to_date_str(d.deployed_at),
            direction.to_string(),
        ]
    };
    let dependencies: Vec<Vec<String>> = s
        .dependencies
        .outbound
        .iter()
        .map(|d| dependency_row(d, "OUTBOUND"))
        .chain(
            s.dependencies
                .inbound
                .iter()
                .map(|d| dependency_row(d, "INBOUND")),
        )
        .collect();
    writeln!(w)?;
    writeln!(w, "===>> Dependencies")?;
    render_table(
        w,
        &["GUID", "Stack", "Plan", "Workflow", "Deployed At", "Direction"],
        &dependencies,
    )?;

    let statuses: Vec<Vec<String>> = s
        .statuses
        .iter()
        .map(|o| vec![o.status.clone(), o.timestamp.clone(), o.message.clone()])
        .collect();
    writeln!(w)?;
    writeln!(w, "===>> Status History")?;
    render_table(w, &["Status", "Timestamp", "Message"], &statuses)?;
    Ok(())
}

pub fn print_stack_log<W: Write>(w: &mut W, guid: &str, log: &StackLog) -> Result<()> {
    writeln!(w, "===>> logs for stack {}", guid)?;
    for line in &log.content {
        writeln!(w, "{}", line)?;
    }
    Ok(())
}
