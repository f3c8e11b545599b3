use serde::{Deserialize, Serialize};

use crate::launch::error::{LaunchError, configuration_error};

pub const CONTENT_ITEM_SELECTION_MESSAGE_TYPE: &str = "ContentItemSelection";

/// Google Picker credentials, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerCredentials {
    google_client_id: String,
    google_developer_key: String,
}

impl PickerCredentials {
    pub fn new(
        google_client_id: impl Into<String>,
        google_developer_key: impl Into<String>,
    ) -> Result<Self, LaunchError> {
        let google_client_id = google_client_id.into();
        let google_developer_key = google_developer_key.into();
        if google_client_id.trim().is_empty() {
            return Err(configuration_error("google_picker.client_id cannot be empty"));
        }
        if google_developer_key.trim().is_empty() {
            return Err(configuration_error(
                "google_picker.developer_key cannot be empty",
            ));
        }
        Ok(Self {
            google_client_id,
            google_developer_key,
        })
    }

    pub fn google_client_id(&self) -> &str {
        &self.google_client_id
    }

    pub fn google_developer_key(&self) -> &str {
        &self.google_developer_key
    }
}

/// Fields echoed back in the ContentItemSelection form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItemFormFields {
    pub lti_message_type: String,
    pub lti_version: String,
}

impl ContentItemFormFields {
    pub fn new(lti_version: impl Into<String>) -> Self {
        Self {
            lti_message_type: CONTENT_ITEM_SELECTION_MESSAGE_TYPE.to_string(),
            lti_version: lti_version.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItemSelectionContext {
    pub content_item_return_url: String,
    pub lti_launch_url: String,
    pub form_fields: ContentItemFormFields,
    pub google_client_id: String,
    pub google_developer_key: String,
    pub lms_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
}

/// Content-Item Selection handshake as seen from this service.
///
/// Only the first transition happens in-process; the user's pick and the
/// form POST to `content_item_return_url` are browser-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionProtocolState {
    AwaitingSelectionRequest,
    SelectionRequestReceived,
    SelectionMadeByUser,
    SelectionResponsePosted,
}

impl SelectionProtocolState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingSelectionRequest => "awaiting_selection_request",
            Self::SelectionRequestReceived => "selection_request_received",
            Self::SelectionMadeByUser => "selection_made_by_user",
            Self::SelectionResponsePosted => "selection_response_posted",
        }
    }
}
