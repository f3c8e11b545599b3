pub mod error;
pub mod handlers;
pub mod routes;
pub mod types;

pub use error::{LaunchError, LaunchErrorKind};
pub use handlers::{
    ConfiguredAssignmentHandler, UnauthorizedAssignmentHandler, UnconfiguredAssignmentHandler,
};
pub use routes::{LaunchViews, build_default_dispatcher, register_default_launch_views};
pub use types::{HttpMethod, LaunchRequest, LtiUser, NEW_OAUTH_FLAG, RouteName, ViewPayload};
