pub mod dispatcher;
pub mod registry;
pub mod types;

pub use dispatcher::{DispatchCollaborators, LaunchDispatcher, LaunchDispatcherBuilder};
pub use registry::PredicateRegistry;
pub use types::{CandidateDeclaration, DispatchCandidate, Guard, GuardSet, PreStep, RouteKey};
