use std::sync::Arc;

use lms_launch::{
    adapters::InMemoryAssignmentStore,
    predicates::{
        authorization::authorized_to_configure_assignments,
        resolver::ConfigurationResolver,
        types::{AssignmentConfiguration, ConfigurationPredicate},
    },
};

use crate::support::{
    FailingAssignmentStore, FixedCanvasFiles, INSTRUCTOR_ROLES, LEARNER_ROLES, launch,
    stored_assignment,
};

fn resolver_with(
    store: InMemoryAssignmentStore,
    canvas: FixedCanvasFiles,
) -> ConfigurationResolver {
    ConfigurationResolver::new(Arc::new(store), Arc::new(canvas))
}

#[tokio::test]
async fn stored_document_wins_over_url_parameter() {
    let store = InMemoryAssignmentStore::new();
    store.insert(stored_assignment(), "https://example.com/stored.pdf");
    let resolver = resolver_with(store, FixedCanvasFiles::unavailable());

    let request = launch(INSTRUCTOR_ROLES, &[("url", "https://example.com/param.pdf")]);
    let resolved = resolver.resolve(&request).await.expect("resolve should succeed");

    assert_eq!(
        resolved,
        Some(AssignmentConfiguration::Db {
            document_url: "https://example.com/stored.pdf".to_string()
        })
    );
    assert!(
        !resolver
            .evaluate(ConfigurationPredicate::UrlConfigured, &request)
            .await
            .expect("evaluate should succeed")
    );
}

#[tokio::test]
async fn url_parameter_must_parse_as_absolute_url() {
    let resolver = resolver_with(InMemoryAssignmentStore::new(), FixedCanvasFiles::unavailable());

    let valid = launch(LEARNER_ROLES, &[("url", " https://example.com/a.pdf ")]);
    assert_eq!(
        resolver.resolve(&valid).await.expect("resolve should succeed"),
        Some(AssignmentConfiguration::Url {
            document_url: "https://example.com/a.pdf".to_string()
        })
    );

    let relative = launch(LEARNER_ROLES, &[("url", "not a url")]);
    assert_eq!(
        resolver.resolve(&relative).await.expect("resolve should succeed"),
        None
    );
}

#[tokio::test]
async fn canvas_file_requires_canvas_launch_and_browsing_capability() {
    let canvas_params = [
        ("canvas_file", "true"),
        ("file_id", "42"),
        ("tool_consumer_info_product_family_code", "canvas"),
    ];

    let enabled = resolver_with(InMemoryAssignmentStore::new(), FixedCanvasFiles::available());
    assert_eq!(
        enabled
            .resolve(&launch(LEARNER_ROLES, &canvas_params))
            .await
            .expect("resolve should succeed"),
        Some(AssignmentConfiguration::CanvasFile {
            file_id: "42".to_string()
        })
    );

    let disabled = resolver_with(InMemoryAssignmentStore::new(), FixedCanvasFiles::unavailable());
    assert_eq!(
        disabled
            .resolve(&launch(LEARNER_ROLES, &canvas_params))
            .await
            .expect("resolve should succeed"),
        None
    );

    let moodle = launch(
        LEARNER_ROLES,
        &[
            ("canvas_file", "true"),
            ("file_id", "42"),
            ("tool_consumer_info_product_family_code", "moodle"),
        ],
    );
    assert_eq!(
        enabled.resolve(&moodle).await.expect("resolve should succeed"),
        None
    );
}

#[tokio::test]
async fn vitalsource_book_keeps_optional_cfi() {
    let resolver = resolver_with(InMemoryAssignmentStore::new(), FixedCanvasFiles::unavailable());

    let with_cfi = launch(
        LEARNER_ROLES,
        &[
            ("vitalsource_book", "true"),
            ("book_id", "BOOKSHELF-TUTORIAL"),
            ("cfi", "/6/8"),
        ],
    );
    assert_eq!(
        resolver.resolve(&with_cfi).await.expect("resolve should succeed"),
        Some(AssignmentConfiguration::VitalSourceBook {
            book_id: "BOOKSHELF-TUTORIAL".to_string(),
            cfi: Some("/6/8".to_string()),
        })
    );

    let blank_book = launch(
        LEARNER_ROLES,
        &[("vitalsource_book", "true"), ("book_id", "  ")],
    );
    assert_eq!(
        resolver.resolve(&blank_book).await.expect("resolve should succeed"),
        None
    );
}

#[tokio::test]
async fn store_failure_surfaces_from_resolution() {
    let resolver = ConfigurationResolver::new(
        Arc::new(FailingAssignmentStore),
        Arc::new(FixedCanvasFiles::unavailable()),
    );

    let err = resolver
        .evaluate(ConfigurationPredicate::Configured, &launch(LEARNER_ROLES, &[]))
        .await
        .expect_err("store failure must not read as unconfigured");
    assert!(err.message.contains("connection refused"));
}

#[test]
fn instructors_and_admins_may_configure_assignments() {
    let instructor = launch(INSTRUCTOR_ROLES, &[]);
    let learner = launch(LEARNER_ROLES, &[]);
    let assistant = launch("urn:lti:role:ims/lis/TeachingAssistant", &[]);

    assert!(authorized_to_configure_assignments(instructor.lti_user()));
    assert!(authorized_to_configure_assignments(assistant.lti_user()));
    assert!(!authorized_to_configure_assignments(learner.lti_user()));
}
