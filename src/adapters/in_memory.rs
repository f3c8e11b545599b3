use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;

use crate::{
    config::{ApplicationInstanceConfig, AssignmentSeedConfig},
    launch::{
        error::{LaunchError, configuration_error, internal_error, upstream_lookup},
        types::LaunchRequest,
    },
    ports::{
        ApplicationInstancePort, AssignmentStorePort, CanvasFileCapabilityPort, FeatureFlagPort,
    },
    predicates::types::AssignmentRef,
};

#[derive(Default)]
pub struct InMemoryAssignmentStore {
    records: RwLock<BTreeMap<AssignmentRef, String>>,
}

impl InMemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seeds(seeds: &[AssignmentSeedConfig]) -> Self {
        let records = seeds
            .iter()
            .map(|seed| {
                (
                    AssignmentRef::new(&seed.tool_consumer_instance_guid, &seed.resource_link_id),
                    seed.document_url.clone(),
                )
            })
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn insert(&self, assignment: AssignmentRef, document_url: impl Into<String>) {
        self.records
            .write()
            .expect("lock poisoned")
            .insert(assignment, document_url.into());
    }

    pub fn len(&self) -> usize {
        self.records.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AssignmentStorePort for InMemoryAssignmentStore {
    async fn document_url(
        &self,
        assignment: &AssignmentRef,
    ) -> Result<Option<String>, LaunchError> {
        let guard = self
            .records
            .read()
            .map_err(|_| internal_error("assignment store lock poisoned"))?;
        Ok(guard.get(assignment).cloned())
    }
}

/// Application instances registered in the config file, keyed by consumer key.
pub struct StaticApplicationInstances {
    by_consumer_key: BTreeMap<String, ApplicationInstanceConfig>,
}

impl StaticApplicationInstances {
    pub fn from_config(instances: &[ApplicationInstanceConfig]) -> Result<Self, LaunchError> {
        let mut by_consumer_key = BTreeMap::new();
        for instance in instances {
            if instance.consumer_key.trim().is_empty() {
                return Err(configuration_error(
                    "application_instances[].consumer_key cannot be empty",
                ));
            }
            if by_consumer_key
                .insert(instance.consumer_key.clone(), instance.clone())
                .is_some()
            {
                return Err(configuration_error(format!(
                    "duplicate consumer key '{}' in application_instances",
                    instance.consumer_key
                )));
            }
        }
        Ok(Self { by_consumer_key })
    }
}

#[async_trait]
impl ApplicationInstancePort for StaticApplicationInstances {
    async fn lms_url(&self, consumer_key: &str) -> Result<String, LaunchError> {
        self.by_consumer_key
            .get(consumer_key)
            .map(|instance| instance.lms_url.clone())
            .ok_or_else(|| {
                upstream_lookup(format!(
                    "no application instance registered for consumer key '{consumer_key}'"
                ))
            })
    }

    async fn developer_key(&self, consumer_key: &str) -> Result<Option<String>, LaunchError> {
        Ok(self
            .by_consumer_key
            .get(consumer_key)
            .and_then(|instance| instance.developer_key.clone()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticFeatureFlags {
    flags: BTreeMap<String, bool>,
}

impl StaticFeatureFlags {
    pub fn new(flags: BTreeMap<String, bool>) -> Self {
        Self { flags }
    }

    pub fn enabled(names: &[&str]) -> Self {
        Self::new(names.iter().map(|name| (name.to_string(), true)).collect())
    }
}

impl FeatureFlagPort for StaticFeatureFlags {
    fn is_enabled(&self, flag: &str, _request: &LaunchRequest) -> bool {
        self.flags.get(flag).copied().unwrap_or(false)
    }
}

/// Canvas file browsing needs a Canvas course and a developer key for the
/// launching application instance.
pub struct DeveloperKeyCanvasFileCapability {
    instances: Arc<dyn ApplicationInstancePort>,
}

impl DeveloperKeyCanvasFileCapability {
    pub fn new(instances: Arc<dyn ApplicationInstancePort>) -> Self {
        Self { instances }
    }
}

#[async_trait]
impl CanvasFileCapabilityPort for DeveloperKeyCanvasFileCapability {
    async fn is_canvas_file_browsing_available(
        &self,
        request: &LaunchRequest,
    ) -> Result<bool, LaunchError> {
        if !request.has_param("custom_canvas_course_id") {
            return Ok(false);
        }
        let developer_key = self
            .instances
            .developer_key(&request.lti_user().oauth_consumer_key)
            .await?;
        Ok(developer_key.is_some())
    }
}
