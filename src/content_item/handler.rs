use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    content_item::types::{
        ContentItemFormFields, ContentItemSelectionContext, PickerCredentials,
        SelectionProtocolState,
    },
    launch::{
        error::{LaunchError, LaunchErrorKind, internal_error, upstream_lookup},
        types::{LaunchRequest, ViewPayload},
    },
    ports::{ApplicationInstancePort, CanvasFileCapabilityPort, LaunchHandlerPort},
};

pub const CONTENT_ITEM_SELECTION_RENDERER: &str =
    "lms:templates/content_item_selection.html.jinja2";

/// Handles `ContentItemSelectionRequest` launches by preparing everything the
/// document picker needs to post a selection back to the LMS.
pub struct ContentItemSelectionHandler {
    lti_launch_url: String,
    credentials: PickerCredentials,
    instances: Arc<dyn ApplicationInstancePort>,
    canvas_files: Arc<dyn CanvasFileCapabilityPort>,
}

impl ContentItemSelectionHandler {
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

    pub async fn build_selection_context(
        &self,
        request: &LaunchRequest,
    ) -> Result<ContentItemSelectionContext, LaunchError> {
        let content_item_return_url = request.require_param("content_item_return_url")?;
        let lti_version = request.require_param("lti_version")?;

        let lms_url = resolve_lms_url(request, self.instances.as_ref()).await?;
        let course_id = canvas_course_id(request, self.canvas_files.as_ref()).await?;

        Ok(ContentItemSelectionContext {
            content_item_return_url: content_item_return_url.to_string(),
            lti_launch_url: self.lti_launch_url.clone(),
            form_fields: ContentItemFormFields::new(lti_version),
            google_client_id: self.credentials.google_client_id().to_string(),
            google_developer_key: self.credentials.google_developer_key().to_string(),
            lms_url,
            course_id,
        })
    }
}

#[async_trait]
impl LaunchHandlerPort for ContentItemSelectionHandler {
    async fn handle(&self, request: &LaunchRequest) -> Result<ViewPayload, LaunchError> {
        let context = self.build_selection_context(request).await?;
        tracing::info!(
            target: "content_item",
            state = SelectionProtocolState::SelectionRequestReceived.as_str(),
            consumer_key = %request.lti_user().oauth_consumer_key,
            has_course_id = context.course_id.is_some(),
            "content_item_selection_context_built"
        );

        let variables = serde_json::to_value(&context).map_err(|err| {
            internal_error(format!("failed to serialize content item selection context: {err}"))
        })?;
        Ok(ViewPayload::new(CONTENT_ITEM_SELECTION_RENDERER, variables))
    }
}

/// URL of the top-level LMS page, needed by Google Picker inside an iframe.
///
/// Canvas tells us its domain directly; everything else goes through the
/// application instance lookup.
pub async fn resolve_lms_url(
    request: &LaunchRequest,
    instances: &dyn ApplicationInstancePort,
) -> Result<String, LaunchError> {
    if let Some(domain) = request.param("custom_canvas_api_domain") {
        return Ok(domain.to_string());
    }

    let consumer_key = &request.lti_user().oauth_consumer_key;
    instances.lms_url(consumer_key).await.map_err(|err| {
        tracing::warn!(
            target: "content_item",
            consumer_key = %consumer_key,
            error = %err,
            "lms_url_lookup_failed"
        );
        if err.kind == LaunchErrorKind::UpstreamLookup {
            return err;
        }
        upstream_lookup(format!(
            "failed to resolve lms url for consumer key '{consumer_key}': {err}"
        ))
    })
}

/// Canvas course id for the Canvas file picker, when file browsing is available.
pub async fn canvas_course_id(
    request: &LaunchRequest,
    canvas_files: &dyn CanvasFileCapabilityPort,
) -> Result<Option<String>, LaunchError> {
    if !canvas_files.is_canvas_file_browsing_available(request).await? {
        return Ok(None);
    }
    request
        .require_param("custom_canvas_course_id")
        .map(|course_id| Some(course_id.to_string()))
}
