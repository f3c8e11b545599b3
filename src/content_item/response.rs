use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::{
    content_item::types::ContentItemSelectionContext,
    launch::error::{LaunchError, internal_error},
};

pub const CONTENT_ITEM_JSON_LD_CONTEXT: &str = "http://purl.imsglobal.org/ctx/lti/v1/ContentItem";
pub const LTI_LINK_MEDIA_TYPE: &str = "application/vnd.ims.lti.v1.ltilink";

/// The document a user picked in the content item picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentSelection {
    Url { url: String },
    LmsFile { file_id: String },
    VitalSourceBook { book_id: String, cfi: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LtiLinkItem {
    #[serde(rename = "@type")]
    pub item_type: String,
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub url: String,
}

/// JSON-LD `ContentItem` pointing back at our launch endpoint; the LMS stores
/// it and replays the query parameters on every later launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@graph")]
    pub graph: Vec<LtiLinkItem>,
}

impl ContentItem {
    pub fn for_url(lti_launch_url: &str, document_url: &str) -> Self {
        Self::with_launch_params(lti_launch_url, &[("url", document_url)])
    }

    pub fn for_lms_file(lti_launch_url: &str, file_id: &str) -> Self {
        Self::with_launch_params(
            lti_launch_url,
            &[("canvas_file", "true"), ("file_id", file_id)],
        )
    }

    pub fn for_vitalsource_book(lti_launch_url: &str, book_id: &str, cfi: &str) -> Self {
        Self::with_launch_params(
            lti_launch_url,
            &[("vitalsource_book", "true"), ("book_id", book_id), ("cfi", cfi)],
        )
    }

    pub fn from_selection(lti_launch_url: &str, selection: &DocumentSelection) -> Self {
        match selection {
            DocumentSelection::Url { url } => Self::for_url(lti_launch_url, url),
            DocumentSelection::LmsFile { file_id } => Self::for_lms_file(lti_launch_url, file_id),
            DocumentSelection::VitalSourceBook { book_id, cfi } => {
                Self::for_vitalsource_book(lti_launch_url, book_id, cfi)
            }
        }
    }

    fn with_launch_params(lti_launch_url: &str, params: &[(&str, &str)]) -> Self {
        let mut sorted = params.to_vec();
        sorted.sort_by_key(|(name, _)| *name);
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(sorted)
            .finish();

        Self {
            context: CONTENT_ITEM_JSON_LD_CONTEXT.to_string(),
            graph: vec![LtiLinkItem {
                item_type: "LtiLinkItem".to_string(),
                media_type: LTI_LINK_MEDIA_TYPE.to_string(),
                url: format!("{lti_launch_url}?{query}"),
            }],
        }
    }
}

/// The ContentItemSelection form the browser posts to the LMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItemSelectionForm {
    pub action: String,
    pub fields: BTreeMap<String, String>,
}

impl ContentItemSelectionForm {
    pub fn new(
        context: &ContentItemSelectionContext,
        item: &ContentItem,
    ) -> Result<Self, LaunchError> {
        let content_items = serde_json::to_string(item)
            .map_err(|err| internal_error(format!("failed to serialize content item: {err}")))?;

        let mut fields = BTreeMap::new();
        fields.insert(
            "lti_message_type".to_string(),
            context.form_fields.lti_message_type.clone(),
        );
        fields.insert(
            "lti_version".to_string(),
            context.form_fields.lti_version.clone(),
        );
        fields.insert("content_items".to_string(), content_items);

        Ok(Self {
            action: context.content_item_return_url.clone(),
            fields,
        })
    }
}
