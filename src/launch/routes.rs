use std::sync::Arc;

use crate::{
    adapters::{
        DeveloperKeyCanvasFileCapability, InMemoryAssignmentStore, NoopAccountProvisioning,
        StaticApplicationInstances, StaticFeatureFlags,
    },
    config::Config,
    content_item::{handler::ContentItemSelectionHandler, types::PickerCredentials},
    dispatch::{
        dispatcher::{DispatchCollaborators, LaunchDispatcher, LaunchDispatcherBuilder},
        registry::PredicateRegistry,
        types::{CandidateDeclaration, PreStep, RouteKey},
    },
    launch::{
        error::LaunchError,
        handlers::{
            ConfiguredAssignmentHandler, UnauthorizedAssignmentHandler,
            UnconfiguredAssignmentHandler,
        },
        types::{NEW_OAUTH_FLAG, RouteName},
    },
    ports::{
        AccountProvisioningPort, ApplicationInstancePort, AssignmentStorePort,
        CanvasFileCapabilityPort, FeatureFlagPort, LaunchHandlerPort,
    },
    predicates::resolver::ConfigurationResolver,
};

/// Everything the default launch views depend on.
pub struct LaunchViews {
    pub public_base_url: String,
    pub credentials: PickerCredentials,
    pub assignments: Arc<dyn AssignmentStorePort>,
    pub instances: Arc<dyn ApplicationInstancePort>,
    pub canvas_files: Arc<dyn CanvasFileCapabilityPort>,
    pub feature_flags: Arc<dyn FeatureFlagPort>,
    pub accounts: Arc<dyn AccountProvisioningPort>,
}

impl LaunchViews {
    pub fn from_config(config: &Config) -> Result<Self, LaunchError> {
        let credentials = config.picker_credentials()?;
        let instances: Arc<dyn ApplicationInstancePort> = Arc::new(
            StaticApplicationInstances::from_config(&config.application_instances)?,
        );

        Ok(Self {
            public_base_url: config.server.public_base_url.clone(),
            credentials,
            assignments: Arc::new(InMemoryAssignmentStore::from_seeds(&config.assignments)),
            canvas_files: Arc::new(DeveloperKeyCanvasFileCapability::new(Arc::clone(
                &instances,
            ))),
            instances,
            feature_flags: Arc::new(StaticFeatureFlags::new(config.feature_flags.clone())),
            accounts: Arc::new(NoopAccountProvisioning),
        })
    }
}

pub fn build_default_dispatcher(views: LaunchViews) -> Result<LaunchDispatcher, LaunchError> {
    let resolver = Arc::new(ConfigurationResolver::new(
        Arc::clone(&views.assignments),
        Arc::clone(&views.canvas_files),
    ));

    let mut builder = LaunchDispatcher::builder(PredicateRegistry::with_builtin_predicates()?);
    register_default_launch_views(&mut builder, &views, Arc::clone(&resolver))?;

    let dispatcher = builder.build(DispatchCollaborators {
        resolver,
        feature_flags: views.feature_flags,
        accounts: views.accounts,
    });
    for route in dispatcher.routes() {
        tracing::debug!(
            target: "dispatch",
            route = %route,
            candidates = dispatcher.candidates(route).len(),
            "launch_route_registered"
        );
    }
    Ok(dispatcher)
}

pub fn register_default_launch_views(
    builder: &mut LaunchDispatcherBuilder,
    views: &LaunchViews,
    resolver: Arc<ConfigurationResolver>,
) -> Result<(), LaunchError> {
    let lti_launch_url = RouteName::LtiLaunches.url(&views.public_base_url);

    let content_item_selection: Arc<dyn LaunchHandlerPort> =
        Arc::new(ContentItemSelectionHandler::new(
            lti_launch_url.clone(),
            views.credentials.clone(),
            Arc::clone(&views.instances),
            Arc::clone(&views.canvas_files),
        ));
    builder.register(
        CandidateDeclaration::new(
            "content_item_selection",
            RouteKey::post(RouteName::ContentItemSelection),
            content_item_selection,
        )
        .feature_flag(NEW_OAUTH_FLAG, true)
        .predicate("authorized_to_configure_assignments", true)
        .pre_step(PreStep::UpsertUser)
        .pre_step(PreStep::UpsertCourseGroup),
    )?;

    let launches = RouteKey::post(RouteName::LtiLaunches);
    let configured: Arc<dyn LaunchHandlerPort> =
        Arc::new(ConfiguredAssignmentHandler::new(resolver));
    for predicate in ["db_configured", "canvas_file", "url_configured", "vitalsource_book"] {
        builder.register(
            CandidateDeclaration::new(
                format!("{predicate}_basic_lti_launch"),
                launches,
                Arc::clone(&configured),
            )
            .feature_flag(NEW_OAUTH_FLAG, true)
            .predicate(predicate, true)
            .pre_step(PreStep::UpsertUser)
            .pre_step(PreStep::UpsertCourseGroup),
        )?;
    }

    builder.register(
        CandidateDeclaration::new(
            "unconfigured_basic_lti_launch",
            launches,
            Arc::new(UnconfiguredAssignmentHandler::new(
                lti_launch_url,
                views.credentials.clone(),
                Arc::clone(&views.instances),
                Arc::clone(&views.canvas_files),
            )),
        )
        .feature_flag(NEW_OAUTH_FLAG, true)
        .predicate("configured", false)
        .predicate("authorized_to_configure_assignments", true)
        .pre_step(PreStep::UpsertUser)
        .pre_step(PreStep::UpsertCourseGroup),
    )?;
    builder.register(
        CandidateDeclaration::new(
            "unconfigured_basic_lti_launch_not_authorized",
            launches,
            Arc::new(UnauthorizedAssignmentHandler),
        )
        .feature_flag(NEW_OAUTH_FLAG, true)
        .predicate("configured", false)
        .predicate("authorized_to_configure_assignments", false),
    )?;

    Ok(())
}
