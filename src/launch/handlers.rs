use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::{
    content_item::{
        handler::{canvas_course_id, resolve_lms_url},
        types::PickerCredentials,
    },
    launch::{
        error::{LaunchError, internal_error},
        types::{LaunchRequest, ViewPayload},
    },
    ports::{ApplicationInstancePort, CanvasFileCapabilityPort, LaunchHandlerPort},
    predicates::resolver::ConfigurationResolver,
};

pub const CONFIGURED_LAUNCH_RENDERER: &str = "lms:templates/basic_lti_launch.html.jinja2";
pub const UNCONFIGURED_LAUNCH_RENDERER: &str =
    "lms:templates/unconfigured_basic_lti_launch.html.jinja2";
pub const UNAUTHORIZED_LAUNCH_RENDERER: &str =
    "lms:templates/unconfigured_basic_lti_launch_not_authorized.html.jinja2";

/// Launches of assignments that already point at a document.
pub struct ConfiguredAssignmentHandler {
    resolver: Arc<ConfigurationResolver>,
}

impl ConfiguredAssignmentHandler {
    pub fn new(resolver: Arc<ConfigurationResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl LaunchHandlerPort for ConfiguredAssignmentHandler {
    async fn handle(&self, request: &LaunchRequest) -> Result<ViewPayload, LaunchError> {
        let configuration = self.resolver.resolve(request).await?.ok_or_else(|| {
            internal_error("configured launch view selected for an unconfigured assignment")
        })?;

        tracing::info!(
            target: "launch",
            configuration = configuration.variant().as_str(),
            resource_link_id = request.param("resource_link_id").unwrap_or_default(),
            "configured_assignment_launched"
        );

        let variables = serde_json::to_value(&configuration).map_err(|err| {
            internal_error(format!("failed to serialize assignment configuration: {err}"))
        })?;
        Ok(ViewPayload::new(CONFIGURED_LAUNCH_RENDERER, variables))
    }
}

/// First launch of an assignment by someone allowed to pick its document.
pub struct UnconfiguredAssignmentHandler {
    lti_launch_url: String,
    credentials: PickerCredentials,
    instances: Arc<dyn ApplicationInstancePort>,
    canvas_files: Arc<dyn CanvasFileCapabilityPort>,
}

impl UnconfiguredAssignmentHandler {
    pub fn new(
        lti_launch_url: impl Into<String>,
        credentials: PickerCredentials,
        instances: Arc<dyn ApplicationInstancePort>,
        canvas_files: Arc<dyn CanvasFileCapabilityPort>,
    ) -> Self {
        Self {
            lti_launch_url: lti_launch_url.into(),
            credentials,
            instances,
            canvas_files,
        }
    }
}

#[async_trait]
impl LaunchHandlerPort for UnconfiguredAssignmentHandler {
    async fn handle(&self, request: &LaunchRequest) -> Result<ViewPayload, LaunchError> {
        let resource_link_id = request.require_param("resource_link_id")?;
        let lms_url = resolve_lms_url(request, self.instances.as_ref()).await?;
        let course_id = canvas_course_id(request, self.canvas_files.as_ref()).await?;

        let mut variables = json!({
            "resource_link_id": resource_link_id,
            "tool_consumer_instance_guid": request.param("tool_consumer_instance_guid"),
            "lti_launch_url": self.lti_launch_url,
            "lms_url": lms_url,
            "google_client_id": self.credentials.google_client_id(),
            "google_developer_key": self.credentials.google_developer_key(),
        });
        if let Some(course_id) = course_id {
            variables["course_id"] = json!(course_id);
        }

        Ok(ViewPayload::new(UNCONFIGURED_LAUNCH_RENDERER, variables))
    }
}

/// First launch of an assignment by a learner; nothing to show yet.
#[derive(Debug, Clone, Default)]
pub struct UnauthorizedAssignmentHandler;

#[async_trait]
impl LaunchHandlerPort for UnauthorizedAssignmentHandler {
    async fn handle(&self, request: &LaunchRequest) -> Result<ViewPayload, LaunchError> {
        tracing::debug!(
            target: "launch",
            user_id = %request.lti_user().user_id,
            "unconfigured_assignment_not_authorized"
        );
        Ok(ViewPayload::new(
            UNAUTHORIZED_LAUNCH_RENDERER,
            json!({ "message": "This assignment has not been configured yet" }),
        ))
    }
}
