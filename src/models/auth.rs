//! Caller identity returned by the auth service.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::SystemLinkClient;
use crate::error::{Result, SystemLinkError};

/// Who the API key belongs to and what it can reach.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthInfo {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub org: Option<Org>,
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
    #[serde(default)]
    pub policies: Vec<AuthPolicy>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl AuthInfo {
    /// Id of the workspace called `name`.
    pub fn workspace_id(&self, name: &str) -> Option<&str> {
        self.workspaces
            .iter()
            .find(|w| w.name.as_deref() == Some(name))
            .and_then(|w| w.id.as_deref())
    }

    /// The workspace used when a request names none.
    pub fn default_workspace(&self) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.default == Some(true))
    }
}

/// Registration state of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Pending,
    Active,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// External id (NIUA id, SID or login name).
    #[serde(default)]
    pub niua_id: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub org_id: Option<String>,
    /// Ids of policies assigned to the user.
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default)]
    pub status: Option<UserStatus>,
}

impl User {
    /// "First Last", falling back to the login or email.
    pub fn display_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(first), None) => Some(first.clone()),
            (None, Some(last)) => Some(last.clone()),
            (None, None) => self.login.clone().or_else(|| self.email.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Org {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Used when callers omit a workspace id.
    #[serde(default)]
    pub default: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPolicy {
    #[serde(default)]
    pub statements: Vec<AuthStatement>,
}

/// Actions allowed on resources in one workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatement {
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub resource: Vec<String>,
    #[serde(default)]
    pub workspace: Option<String>,
}

/// Look up the identity behind the client's API key.
#[tracing::instrument(skip(client))]
pub async fn authenticate(client: &SystemLinkClient) -> Result<AuthInfo> {
    let response = client.get("niauth/v1/auth").await?;
    response.json().await.map_err(SystemLinkError::HttpError)
}
