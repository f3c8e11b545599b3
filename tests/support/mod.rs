#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use lms_launch::{
    adapters::{InMemoryAssignmentStore, StaticFeatureFlags},
    content_item::types::PickerCredentials,
    launch::{
        error::{LaunchError, internal_error, upstream_lookup},
        routes::LaunchViews,
        types::{HttpMethod, LaunchRequest, NEW_OAUTH_FLAG, RouteName},
    },
    ports::{
        AccountProvisioningPort, ApplicationInstancePort, AssignmentStorePort,
        CanvasFileCapabilityPort,
    },
    predicates::types::AssignmentRef,
};

pub const CONSUMER_KEY: &str = "Hypothesis4dd96539c449ca5c3d57cc3d778d6bf3";
pub const LMS_URL: &str = "https://moodle.example.edu";
pub const INSTRUCTOR_ROLES: &str = "Instructor,urn:lti:instrole:ims/lis/Administrator";
pub const LEARNER_ROLES: &str = "Learner";

pub fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Params every launch carries before any route-specific extras.
pub fn base_params(roles: &str) -> BTreeMap<String, String> {
    params(&[
        ("oauth_consumer_key", CONSUMER_KEY),
        ("user_id", "user-1"),
        ("roles", roles),
        ("tool_consumer_instance_guid", "lms.example.edu"),
        ("resource_link_id", "rl-1"),
        ("context_id", "course-1"),
    ])
}

pub fn launch(roles: &str, extra: &[(&str, &str)]) -> LaunchRequest {
    let mut all = base_params(roles);
    all.extend(params(extra));
    LaunchRequest::new(HttpMethod::Post, RouteName::LtiLaunches, all)
        .expect("launch request should build")
}

pub fn content_item_request(extra: &[(&str, &str)]) -> LaunchRequest {
    let mut all = base_params(INSTRUCTOR_ROLES);
    all.extend(params(extra));
    LaunchRequest::new(HttpMethod::Post, RouteName::ContentItemSelection, all)
        .expect("content item request should build")
}

pub fn credentials() -> PickerCredentials {
    PickerCredentials::new("google-client-id", "google-developer-key")
        .expect("credentials should be valid")
}

pub fn stored_assignment() -> AssignmentRef {
    AssignmentRef::new("lms.example.edu", "rl-1")
}

/// Application instance lookup that knows only `CONSUMER_KEY`, records the keys
/// it was asked for and can be told to fail.
#[derive(Default)]
pub struct CountingInstances {
    requested_keys: Mutex<Vec<String>>,
    fail: AtomicBool,
    developer_key: Option<String>,
}

impl CountingInstances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_developer_key(developer_key: &str) -> Self {
        Self {
            developer_key: Some(developer_key.to_string()),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        let instances = Self::default();
        instances.fail.store(true, Ordering::SeqCst);
        instances
    }

    pub fn lms_url_calls(&self) -> usize {
        self.requested_keys().len()
    }

    pub fn requested_keys(&self) -> Vec<String> {
        self.requested_keys.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl ApplicationInstancePort for CountingInstances {
    async fn lms_url(&self, consumer_key: &str) -> Result<String, LaunchError> {
        self.requested_keys
            .lock()
            .expect("lock poisoned")
            .push(consumer_key.to_string());
        if self.fail.load(Ordering::SeqCst) || consumer_key != CONSUMER_KEY {
            return Err(upstream_lookup(format!(
                "no application instance for consumer key '{consumer_key}'"
            )));
        }
        Ok(LMS_URL.to_string())
    }

    async fn developer_key(&self, consumer_key: &str) -> Result<Option<String>, LaunchError> {
        if consumer_key != CONSUMER_KEY {
            return Ok(None);
        }
        Ok(self.developer_key.clone())
    }
}

/// Canvas file browsing capability with a fixed answer.
pub struct FixedCanvasFiles {
    available: bool,
    calls: AtomicUsize,
}

impl FixedCanvasFiles {
    pub fn available() -> Self {
        Self {
            available: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CanvasFileCapabilityPort for FixedCanvasFiles {
    async fn is_canvas_file_browsing_available(
        &self,
        _request: &LaunchRequest,
    ) -> Result<bool, LaunchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.available)
    }
}

pub struct FailingAssignmentStore;

#[async_trait]
impl AssignmentStorePort for FailingAssignmentStore {
    async fn document_url(
        &self,
        _assignment: &AssignmentRef,
    ) -> Result<Option<String>, LaunchError> {
        Err(internal_error("assignment store connection refused"))
    }
}

/// Provisioning double that records the order of upserts and can fail the user step.
#[derive(Default)]
pub struct RecordingAccounts {
    fail_user_upsert: bool,
    pub user_upserts: AtomicUsize,
    pub course_group_upserts: AtomicUsize,
}

impl RecordingAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_user_upsert: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl AccountProvisioningPort for RecordingAccounts {
    async fn upsert_user(&self, _request: &LaunchRequest) -> Result<(), LaunchError> {
        if self.fail_user_upsert {
            return Err(internal_error("user table is read-only"));
        }
        self.user_upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert_course_group(&self, _request: &LaunchRequest) -> Result<(), LaunchError> {
        self.course_group_upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Views wired to in-process doubles; callers swap individual collaborators.
pub fn views(store: InMemoryAssignmentStore) -> LaunchViews {
    LaunchViews {
        public_base_url: "https://lms.hypothes.is".to_string(),
        credentials: credentials(),
        assignments: Arc::new(store),
        instances: Arc::new(CountingInstances::new()),
        canvas_files: Arc::new(FixedCanvasFiles::unavailable()),
        feature_flags: Arc::new(StaticFeatureFlags::enabled(&[NEW_OAUTH_FLAG])),
        accounts: Arc::new(RecordingAccounts::new()),
    }
}
