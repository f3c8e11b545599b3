use std::{collections::BTreeMap, sync::Arc};

use tokio::sync::OnceCell;

use crate::{
    dispatch::{
        registry::PredicateRegistry,
        types::{CandidateDeclaration, DispatchCandidate, Guard, GuardSet, PreStep, RouteKey},
    },
    launch::{
        error::{LaunchError, LaunchErrorKind, configuration_error, guard_evaluation, not_found},
        types::{LaunchRequest, ViewPayload},
    },
    ports::{AccountProvisioningPort, FeatureFlagPort},
    predicates::{
        authorization::authorized_to_configure_assignments,
        resolver::ConfigurationResolver,
        types::{AssignmentConfiguration, ViewPredicate},
    },
};

pub struct DispatchCollaborators {
    pub resolver: Arc<ConfigurationResolver>,
    pub feature_flags: Arc<dyn FeatureFlagPort>,
    pub accounts: Arc<dyn AccountProvisioningPort>,
}

/// Collects candidates at startup and rejects any pair on the same route whose
/// guards could both match one request.
pub struct LaunchDispatcherBuilder {
    predicates: PredicateRegistry,
    table: BTreeMap<RouteKey, Vec<DispatchCandidate>>,
}

impl LaunchDispatcherBuilder {
    pub fn new(predicates: PredicateRegistry) -> Self {
        Self {
            predicates,
            table: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, declaration: CandidateDeclaration) -> Result<(), LaunchError> {
        if declaration.name.trim().is_empty() {
            return Err(configuration_error("dispatch candidate name cannot be empty"));
        }

        let mut guards = Vec::with_capacity(
            declaration.feature_flags.len() + declaration.predicates.len(),
        );
        for (flag, enabled) in &declaration.feature_flags {
            if flag.trim().is_empty() {
                return Err(configuration_error(format!(
                    "dispatch candidate '{}' has an empty feature flag name",
                    declaration.name
                )));
            }
            guards.push(Guard::FeatureFlag {
                flag: flag.clone(),
                enabled: *enabled,
            });
        }
        for (name, expected) in &declaration.predicates {
            guards.push(Guard::Predicate {
                predicate: self.predicates.lookup(name)?,
                expected: *expected,
            });
        }
        let guards = GuardSet::new(guards);

        let candidates = self.table.entry(declaration.route).or_default();
        if candidates
            .iter()
            .any(|existing| existing.name == declaration.name)
        {
            return Err(configuration_error(format!(
                "dispatch candidate '{}' is already registered on {}",
                declaration.name, declaration.route
            )));
        }
        if let Some(overlapping) = candidates
            .iter()
            .find(|existing| !existing.guards.is_mutually_exclusive_with(&guards))
        {
            return Err(configuration_error(format!(
                "dispatch candidate '{}' {} overlaps with '{}' {} on {}",
                declaration.name, guards, overlapping.name, overlapping.guards, declaration.route
            )));
        }

        candidates.push(DispatchCandidate {
            name: declaration.name,
            route: declaration.route,
            guards,
            pre_steps: declaration.pre_steps,
            handler: declaration.handler,
        });
        Ok(())
    }

    pub fn build(self, collaborators: DispatchCollaborators) -> LaunchDispatcher {
        LaunchDispatcher {
            table: self.table,
            resolver: collaborators.resolver,
            feature_flags: collaborators.feature_flags,
            accounts: collaborators.accounts,
        }
    }
}

pub struct LaunchDispatcher {
    table: BTreeMap<RouteKey, Vec<DispatchCandidate>>,
    resolver: Arc<ConfigurationResolver>,
    feature_flags: Arc<dyn FeatureFlagPort>,
    accounts: Arc<dyn AccountProvisioningPort>,
}

impl LaunchDispatcher {
    pub fn builder(predicates: PredicateRegistry) -> LaunchDispatcherBuilder {
        LaunchDispatcherBuilder::new(predicates)
    }

    pub fn candidates(&self, route: RouteKey) -> &[DispatchCandidate] {
        self.table.get(&route).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn routes(&self) -> impl Iterator<Item = RouteKey> + '_ {
        self.table.keys().copied()
    }

    #[tracing::instrument(
        name = "launch_dispatch",
        target = "dispatch",
        skip(self, request),
        fields(route = %request.route(), method = %request.method())
    )]
    pub async fn dispatch(&self, request: &LaunchRequest) -> Result<ViewPayload, LaunchError> {
        let candidate = self.select(request).await?;
        self.run_pre_steps(candidate, request).await?;

        let result = candidate.handler.handle(request).await;
        if let Err(err) = &result {
            tracing::warn!(
                target: "dispatch",
                candidate = %candidate.name,
                kind = err.kind.as_str(),
                error = %err,
                "launch_handler_failed"
            );
        }
        result
    }

    /// Picks the one candidate whose guards all pass for `request`.
    pub async fn select(&self, request: &LaunchRequest) -> Result<&DispatchCandidate, LaunchError> {
        let route = RouteKey::new(request.route(), request.method());
        let evaluator = GuardEvaluator::new(request, &self.resolver, self.feature_flags.as_ref());

        for candidate in self.candidates(route) {
            if evaluator.matches(&candidate.guards).await? {
                tracing::debug!(
                    target: "dispatch",
                    candidate = %candidate.name,
                    guards = %candidate.guards,
                    "launch_candidate_selected"
                );
                return Ok(candidate);
            }
        }

        tracing::debug!(target: "dispatch", route = %route, "launch_candidate_not_found");
        Err(not_found(format!("no launch view matches {route}")))
    }

    async fn run_pre_steps(
        &self,
        candidate: &DispatchCandidate,
        request: &LaunchRequest,
    ) -> Result<(), LaunchError> {
        for step in &candidate.pre_steps {
            let result = match step {
                PreStep::UpsertUser => self.accounts.upsert_user(request).await,
                PreStep::UpsertCourseGroup => self.accounts.upsert_course_group(request).await,
            };
            if let Err(err) = result {
                tracing::warn!(
                    target: "dispatch",
                    candidate = %candidate.name,
                    pre_step = step.as_str(),
                    error = %err,
                    "launch_pre_step_failed"
                );
                return Err(err);
            }
        }
        Ok(())
    }
}

/// Per-request guard evaluation; configuration is resolved at most once.
struct GuardEvaluator<'a> {
    request: &'a LaunchRequest,
    resolver: &'a ConfigurationResolver,
    feature_flags: &'a dyn FeatureFlagPort,
    configuration: OnceCell<Option<AssignmentConfiguration>>,
}

impl<'a> GuardEvaluator<'a> {
    fn new(
        request: &'a LaunchRequest,
        resolver: &'a ConfigurationResolver,
        feature_flags: &'a dyn FeatureFlagPort,
    ) -> Self {
        Self {
            request,
            resolver,
            feature_flags,
            configuration: OnceCell::new(),
        }
    }

    async fn matches(&self, guards: &GuardSet) -> Result<bool, LaunchError> {
        for guard in guards.iter() {
            if !self.evaluate(guard).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn evaluate(&self, guard: &Guard) -> Result<bool, LaunchError> {
        match guard {
            Guard::FeatureFlag { flag, enabled } => {
                Ok(self.feature_flags.is_enabled(flag, self.request) == *enabled)
            }
            Guard::Predicate {
                predicate,
                expected,
            } => Ok(self.predicate_value(*predicate).await? == *expected),
        }
    }

    async fn predicate_value(&self, predicate: ViewPredicate) -> Result<bool, LaunchError> {
        match predicate {
            ViewPredicate::AuthorizedToConfigureAssignments => Ok(
                authorized_to_configure_assignments(self.request.lti_user()),
            ),
            ViewPredicate::Configuration(configuration_predicate) => {
                let resolved = self.configuration().await?;
                Ok(configuration_predicate.holds_for(resolved.as_ref()))
            }
        }
    }

    async fn configuration(&self) -> Result<&Option<AssignmentConfiguration>, LaunchError> {
        self.configuration
            .get_or_try_init(|| async {
                self.resolver.resolve(self.request).await.map_err(|err| {
                    if err.kind == LaunchErrorKind::GuardEvaluation {
                        return err;
                    }
                    guard_evaluation(format!(
                        "configuration predicate could not be evaluated ({}): {}",
                        err.kind.as_str(),
                        err.message
                    ))
                })
            })
            .await
    }
}
