use std::sync::Arc;

use url::Url;

use crate::{
    launch::{error::LaunchError, types::LaunchRequest},
    ports::{AssignmentStorePort, CanvasFileCapabilityPort},
    predicates::types::{AssignmentConfiguration, AssignmentRef, ConfigurationPredicate},
};

const CANVAS_PRODUCT_FAMILY: &str = "canvas";

/// Classifies an assignment launch into at most one configuration variant.
///
/// Signals are checked in the order DB, URL, Canvas file, VitalSource book and
/// the first hit wins, so two concrete variants can never both hold.
pub struct ConfigurationResolver {
    assignments: Arc<dyn AssignmentStorePort>,
    canvas_files: Arc<dyn CanvasFileCapabilityPort>,
}

impl ConfigurationResolver {
    pub fn new(
        assignments: Arc<dyn AssignmentStorePort>,
        canvas_files: Arc<dyn CanvasFileCapabilityPort>,
    ) -> Self {
        Self {
            assignments,
            canvas_files,
        }
    }

    pub async fn resolve(
        &self,
        request: &LaunchRequest,
    ) -> Result<Option<AssignmentConfiguration>, LaunchError> {
        if let Some(document_url) = self.db_configured(request).await? {
            return Ok(Some(AssignmentConfiguration::Db { document_url }));
        }
        if let Some(document_url) = url_configured(request) {
            return Ok(Some(AssignmentConfiguration::Url { document_url }));
        }
        if let Some(file_id) = self.canvas_file_configured(request).await? {
            return Ok(Some(AssignmentConfiguration::CanvasFile { file_id }));
        }
        if let Some((book_id, cfi)) = vitalsource_book_configured(request) {
            return Ok(Some(AssignmentConfiguration::VitalSourceBook { book_id, cfi }));
        }
        Ok(None)
    }

    pub async fn evaluate(
        &self,
        predicate: ConfigurationPredicate,
        request: &LaunchRequest,
    ) -> Result<bool, LaunchError> {
        let resolved = self.resolve(request).await?;
        Ok(predicate.holds_for(resolved.as_ref()))
    }

    pub async fn db_configured(
        &self,
        request: &LaunchRequest,
    ) -> Result<Option<String>, LaunchError> {
        let Some(assignment) = AssignmentRef::from_request(request) else {
            return Ok(None);
        };
        self.assignments.document_url(&assignment).await
    }

    pub async fn canvas_file_configured(
        &self,
        request: &LaunchRequest,
    ) -> Result<Option<String>, LaunchError> {
        if !request.has_param("canvas_file") {
            return Ok(None);
        }
        let Some(file_id) = request.param("file_id") else {
            return Ok(None);
        };
        if !launched_from_canvas(request) {
            return Ok(None);
        }
        if !self
            .canvas_files
            .is_canvas_file_browsing_available(request)
            .await?
        {
            return Ok(None);
        }
        Ok(Some(file_id.to_string()))
    }
}

pub fn url_configured(request: &LaunchRequest) -> Option<String> {
    let raw = request.param("url")?.trim();
    Url::parse(raw).ok().map(|_| raw.to_string())
}

pub fn vitalsource_book_configured(request: &LaunchRequest) -> Option<(String, Option<String>)> {
    if !request.has_param("vitalsource_book") {
        return None;
    }
    let book_id = request.param("book_id").filter(|id| !id.trim().is_empty())?;
    Some((book_id.to_string(), request.param("cfi").map(str::to_string)))
}

pub fn launched_from_canvas(request: &LaunchRequest) -> bool {
    request
        .param("tool_consumer_info_product_family_code")
        .is_some_and(|family| family.eq_ignore_ascii_case(CANVAS_PRODUCT_FAMILY))
}
