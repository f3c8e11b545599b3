use async_trait::async_trait;

use crate::{
    launch::{
        error::LaunchError,
        types::{LaunchRequest, ViewPayload},
    },
    predicates::types::AssignmentRef,
};

/// Server-side storage of assignment document references.
#[async_trait]
pub trait AssignmentStorePort: Send + Sync {
    /// `Ok(None)` means the assignment has no stored configuration.
    async fn document_url(&self, assignment: &AssignmentRef) -> Result<Option<String>, LaunchError>;
}

/// Lookup of registered LMS installations by OAuth consumer key.
#[async_trait]
pub trait ApplicationInstancePort: Send + Sync {
    /// Fails with an upstream lookup error when the key cannot be resolved.
    async fn lms_url(&self, consumer_key: &str) -> Result<String, LaunchError>;

    async fn developer_key(&self, consumer_key: &str) -> Result<Option<String>, LaunchError>;
}

pub trait FeatureFlagPort: Send + Sync {
    fn is_enabled(&self, flag: &str, request: &LaunchRequest) -> bool;
}

#[async_trait]
pub trait CanvasFileCapabilityPort: Send + Sync {
    async fn is_canvas_file_browsing_available(
        &self,
        request: &LaunchRequest,
    ) -> Result<bool, LaunchError>;
}

/// Side effects that must have succeeded before a launch handler runs.
#[async_trait]
pub trait AccountProvisioningPort: Send + Sync {
    async fn upsert_user(&self, request: &LaunchRequest) -> Result<(), LaunchError>;

    async fn upsert_course_group(&self, request: &LaunchRequest) -> Result<(), LaunchError>;
}

#[async_trait]
pub trait LaunchHandlerPort: Send + Sync {
    async fn handle(&self, request: &LaunchRequest) -> Result<ViewPayload, LaunchError>;
}
