pub mod in_memory;
pub mod noop;

pub use in_memory::{
    DeveloperKeyCanvasFileCapability, InMemoryAssignmentStore, StaticApplicationInstances,
    StaticFeatureFlags,
};
pub use noop::NoopAccountProvisioning;
