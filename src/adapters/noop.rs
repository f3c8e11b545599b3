use async_trait::async_trait;

use crate::{
    launch::{error::LaunchError, types::LaunchRequest},
    ports::AccountProvisioningPort,
};

/// Provisioning stand-in that only records the upserts in the trace log.
#[derive(Debug, Clone, Default)]
pub struct NoopAccountProvisioning;

#[async_trait]
impl AccountProvisioningPort for NoopAccountProvisioning {
    async fn upsert_user(&self, request: &LaunchRequest) -> Result<(), LaunchError> {
        tracing::debug!(
            target: "provisioning",
            user_id = %request.lti_user().user_id,
            consumer_key = %request.lti_user().oauth_consumer_key,
            "user_upsert_skipped"
        );
        Ok(())
    }

    async fn upsert_course_group(&self, request: &LaunchRequest) -> Result<(), LaunchError> {
        tracing::debug!(
            target: "provisioning",
            context_id = request.param("context_id").unwrap_or_default(),
            consumer_key = %request.lti_user().oauth_consumer_key,
            "course_group_upsert_skipped"
        );
        Ok(())
    }
}
