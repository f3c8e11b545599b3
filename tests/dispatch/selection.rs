use std::sync::{Arc, atomic::Ordering};

use lms_launch::{
    adapters::{InMemoryAssignmentStore, StaticFeatureFlags},
    launch::{
        error::LaunchErrorKind,
        handlers::{
            CONFIGURED_LAUNCH_RENDERER, UNAUTHORIZED_LAUNCH_RENDERER,
            UNCONFIGURED_LAUNCH_RENDERER,
        },
        routes::build_default_dispatcher,
        types::{HttpMethod, LaunchRequest, RouteName},
    },
};

use crate::support::{
    FailingAssignmentStore, FixedCanvasFiles, INSTRUCTOR_ROLES, LEARNER_ROLES, RecordingAccounts,
    base_params, launch, stored_assignment, views,
};

#[tokio::test]
async fn stored_assignment_renders_configured_view_after_upserts() {
    let store = InMemoryAssignmentStore::new();
    store.insert(stored_assignment(), "https://example.com/stored.pdf");
    let accounts = Arc::new(RecordingAccounts::new());
    let mut views = views(store);
    views.accounts = accounts.clone();
    let dispatcher = build_default_dispatcher(views).expect("default views should register");

    let payload = dispatcher
        .dispatch(&launch(LEARNER_ROLES, &[]))
        .await
        .expect("configured launch should dispatch");

    assert_eq!(payload.renderer, CONFIGURED_LAUNCH_RENDERER);
    assert_eq!(payload.variables["configuration"], "db");
    assert_eq!(
        payload.variables["document_url"],
        "https://example.com/stored.pdf"
    );
    assert_eq!(accounts.user_upserts.load(Ordering::SeqCst), 1);
    assert_eq!(accounts.course_group_upserts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn vitalsource_launch_selects_its_own_candidate() {
    let dispatcher = build_default_dispatcher(views(InMemoryAssignmentStore::new()))
        .expect("default views should register");

    let request = launch(
        LEARNER_ROLES,
        &[("vitalsource_book", "true"), ("book_id", "BOOK-1")],
    );
    let candidate = dispatcher
        .select(&request)
        .await
        .expect("a candidate should match");
    assert_eq!(candidate.name, "vitalsource_book_basic_lti_launch");
}

#[tokio::test]
async fn unconfigured_launch_splits_on_authorization() {
    let dispatcher = build_default_dispatcher(views(InMemoryAssignmentStore::new()))
        .expect("default views should register");

    let instructor = dispatcher
        .dispatch(&launch(INSTRUCTOR_ROLES, &[]))
        .await
        .expect("instructor launch should dispatch");
    assert_eq!(instructor.renderer, UNCONFIGURED_LAUNCH_RENDERER);
    assert_eq!(instructor.variables["resource_link_id"], "rl-1");
    assert_eq!(
        instructor.variables["lti_launch_url"],
        "https://lms.hypothes.is/lti_launches"
    );

    let learner = dispatcher
        .dispatch(&launch(LEARNER_ROLES, &[]))
        .await
        .expect("learner launch should dispatch");
    assert_eq!(learner.renderer, UNAUTHORIZED_LAUNCH_RENDERER);
}

#[tokio::test]
async fn disabled_feature_flag_leaves_no_matching_view() {
    let mut views = views(InMemoryAssignmentStore::new());
    views.feature_flags = Arc::new(StaticFeatureFlags::enabled(&[]));
    let dispatcher = build_default_dispatcher(views).expect("default views should register");

    let err = dispatcher
        .dispatch(&launch(INSTRUCTOR_ROLES, &[]))
        .await
        .expect_err("no view should match");
    assert_eq!(err.kind, LaunchErrorKind::NotFound);
}

#[tokio::test]
async fn get_requests_have_no_registered_views() {
    let dispatcher = build_default_dispatcher(views(InMemoryAssignmentStore::new()))
        .expect("default views should register");

    let request = LaunchRequest::new(
        HttpMethod::Get,
        RouteName::LtiLaunches,
        base_params(INSTRUCTOR_ROLES),
    )
    .expect("request should build");
    let err = dispatcher
        .dispatch(&request)
        .await
        .expect_err("GET has no candidates");
    assert_eq!(err.kind, LaunchErrorKind::NotFound);
}

#[tokio::test]
async fn learners_cannot_open_content_item_selection() {
    let dispatcher = build_default_dispatcher(views(InMemoryAssignmentStore::new()))
        .expect("default views should register");

    let mut params = base_params(LEARNER_ROLES);
    params.insert(
        "content_item_return_url".to_string(),
        "https://lms.example/return".to_string(),
    );
    params.insert("lti_version".to_string(), "LTI-1p0".to_string());
    let request =
        LaunchRequest::new(HttpMethod::Post, RouteName::ContentItemSelection, params)
            .expect("request should build");

    let err = dispatcher
        .dispatch(&request)
        .await
        .expect_err("learner must not reach the picker");
    assert_eq!(err.kind, LaunchErrorKind::NotFound);
}

#[tokio::test]
async fn store_failure_is_a_guard_evaluation_error_not_unconfigured() {
    let mut views = views(InMemoryAssignmentStore::new());
    views.assignments = Arc::new(FailingAssignmentStore);
    let dispatcher = build_default_dispatcher(views).expect("default views should register");

    let err = dispatcher
        .dispatch(&launch(INSTRUCTOR_ROLES, &[]))
        .await
        .expect_err("store failure must abort dispatch");
    assert_eq!(err.kind, LaunchErrorKind::GuardEvaluation);
    assert!(err.message.contains("connection refused"));
}

#[tokio::test]
async fn pre_step_failure_blocks_the_handler() {
    let store = InMemoryAssignmentStore::new();
    store.insert(stored_assignment(), "https://example.com/stored.pdf");
    let accounts = Arc::new(RecordingAccounts::failing());
    let mut views = views(store);
    views.accounts = accounts.clone();
    let dispatcher = build_default_dispatcher(views).expect("default views should register");

    let err = dispatcher
        .dispatch(&launch(LEARNER_ROLES, &[]))
        .await
        .expect_err("failed upsert must stop the launch");
    assert_eq!(err.kind, LaunchErrorKind::Internal);
    assert_eq!(accounts.course_group_upserts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn configuration_is_resolved_once_per_selection() {
    let canvas = Arc::new(FixedCanvasFiles::unavailable());
    let mut views = views(InMemoryAssignmentStore::new());
    views.canvas_files = canvas.clone();
    let dispatcher = build_default_dispatcher(views).expect("default views should register");

    let request = launch(
        LEARNER_ROLES,
        &[
            ("canvas_file", "true"),
            ("file_id", "42"),
            ("tool_consumer_info_product_family_code", "canvas"),
        ],
    );
    let candidate = dispatcher
        .select(&request)
        .await
        .expect("unauthorized view should match");

    assert_eq!(candidate.name, "unconfigured_basic_lti_launch_not_authorized");
    assert_eq!(canvas.calls(), 1);
}
