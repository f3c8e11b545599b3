use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::launch::error::{LaunchError, missing_parameter};

pub const NEW_OAUTH_FLAG: &str = "new_oauth";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteName {
    LtiLaunches,
    ContentItemSelection,
}

impl RouteName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LtiLaunches => "lti_launches",
            Self::ContentItemSelection => "content_item_selection",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::LtiLaunches => "/lti_launches",
            Self::ContentItemSelection => "/content_item_selection",
        }
    }

    /// Absolute URL of this route under the service's public base URL.
    pub fn url(self, public_base_url: &str) -> String {
        format!("{}{}", public_base_url.trim_end_matches('/'), self.path())
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Principal established by the OAuth 1 check in front of this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LtiUser {
    pub user_id: String,
    pub oauth_consumer_key: String,
    /// Comma separated LTI roles exactly as the LMS sent them.
    pub roles: String,
}

impl LtiUser {
    pub fn from_params(params: &BTreeMap<String, String>) -> Result<Self, LaunchError> {
        let oauth_consumer_key = params
            .get("oauth_consumer_key")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| missing_parameter("oauth_consumer_key"))?;

        Ok(Self {
            user_id: params.get("user_id").cloned().unwrap_or_default(),
            oauth_consumer_key: oauth_consumer_key.clone(),
            roles: params.get("roles").cloned().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    method: HttpMethod,
    route: RouteName,
    params: BTreeMap<String, String>,
    lti_user: LtiUser,
}

impl LaunchRequest {
    pub fn new(
        method: HttpMethod,
        route: RouteName,
        params: BTreeMap<String, String>,
    ) -> Result<Self, LaunchError> {
        let lti_user = LtiUser::from_params(&params)?;
        Ok(Self::with_user(method, route, params, lti_user))
    }

    pub fn with_user(
        method: HttpMethod,
        route: RouteName,
        params: BTreeMap<String, String>,
        lti_user: LtiUser,
    ) -> Self {
        Self {
            method,
            route,
            params,
            lti_user,
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn route(&self) -> RouteName {
        self.route
    }

    pub fn lti_user(&self) -> &LtiUser {
        &self.lti_user
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn require_param(&self, name: &str) -> Result<&str, LaunchError> {
        self.param(name).ok_or_else(|| missing_parameter(name))
    }
}

/// Data handed to the external renderer; no markup is produced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewPayload {
    pub renderer: String,
    pub variables: serde_json::Value,
}

impl ViewPayload {
    pub fn new(renderer: impl Into<String>, variables: serde_json::Value) -> Self {
        Self {
            renderer: renderer.into(),
            variables,
        }
    }
}
