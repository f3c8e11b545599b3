use std::{fmt, sync::Arc};

use crate::{
    launch::types::{HttpMethod, RouteName},
    ports::LaunchHandlerPort,
    predicates::types::ViewPredicate,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteKey {
    pub route: RouteName,
    pub method: HttpMethod,
}

impl RouteKey {
    pub fn new(route: RouteName, method: HttpMethod) -> Self {
        Self { route, method }
    }

    pub fn post(route: RouteName) -> Self {
        Self::new(route, HttpMethod::Post)
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.route)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    FeatureFlag { flag: String, enabled: bool },
    Predicate { predicate: ViewPredicate, expected: bool },
}

impl Guard {
    /// Relative evaluation cost; cheaper guards run first.
    pub fn cost(&self) -> u8 {
        match self {
            Self::FeatureFlag { .. } => 0,
            Self::Predicate {
                predicate: ViewPredicate::AuthorizedToConfigureAssignments,
                ..
            } => 1,
            Self::Predicate { .. } => 2,
        }
    }

    pub fn contradicts(&self, other: &Guard) -> bool {
        match (self, other) {
            (
                Self::FeatureFlag { flag, enabled },
                Self::FeatureFlag {
                    flag: other_flag,
                    enabled: other_enabled,
                },
            ) => flag == other_flag && enabled != other_enabled,
            (
                Self::Predicate {
                    predicate,
                    expected,
                },
                Self::Predicate {
                    predicate: other_predicate,
                    expected: other_expected,
                },
            ) => predicate.excludes(*expected, *other_predicate, *other_expected),
            _ => false,
        }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FeatureFlag { flag, enabled } => write!(f, "feature_flag:{flag}={enabled}"),
            Self::Predicate {
                predicate,
                expected,
            } => write!(f, "{}={expected}", predicate.name()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardSet {
    guards: Vec<Guard>,
}

impl GuardSet {
    pub fn new(mut guards: Vec<Guard>) -> Self {
        guards.sort_by_key(Guard::cost);
        Self { guards }
    }

    /// Guards in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &Guard> {
        self.guards.iter()
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// True when no request can satisfy both sets.
    pub fn is_mutually_exclusive_with(&self, other: &GuardSet) -> bool {
        self.guards
            .iter()
            .any(|lhs| other.guards.iter().any(|rhs| lhs.contradicts(rhs)))
    }
}

impl fmt::Display for GuardSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.guards.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", rendered.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreStep {
    UpsertUser,
    UpsertCourseGroup,
}

impl PreStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UpsertUser => "upsert_user",
            Self::UpsertCourseGroup => "upsert_course_group",
        }
    }
}

/// A handler registration that refers to predicates by name.
pub struct CandidateDeclaration {
    pub name: String,
    pub route: RouteKey,
    pub feature_flags: Vec<(String, bool)>,
    pub predicates: Vec<(String, bool)>,
    pub pre_steps: Vec<PreStep>,
    pub handler: Arc<dyn LaunchHandlerPort>,
}

impl CandidateDeclaration {
    pub fn new(
        name: impl Into<String>,
        route: RouteKey,
        handler: Arc<dyn LaunchHandlerPort>,
    ) -> Self {
        Self {
            name: name.into(),
            route,
            feature_flags: Vec::new(),
            predicates: Vec::new(),
            pre_steps: Vec::new(),
            handler,
        }
    }

    pub fn feature_flag(mut self, flag: impl Into<String>, enabled: bool) -> Self {
        self.feature_flags.push((flag.into(), enabled));
        self
    }

    pub fn predicate(mut self, name: impl Into<String>, expected: bool) -> Self {
        self.predicates.push((name.into(), expected));
        self
    }

    pub fn pre_step(mut self, step: PreStep) -> Self {
        self.pre_steps.push(step);
        self
    }
}

pub struct DispatchCandidate {
    pub name: String,
    pub route: RouteKey,
    pub guards: GuardSet,
    pub pre_steps: Vec<PreStep>,
    pub handler: Arc<dyn LaunchHandlerPort>,
}
