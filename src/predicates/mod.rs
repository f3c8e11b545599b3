pub mod authorization;
pub mod resolver;
pub mod types;

pub use authorization::authorized_to_configure_assignments;
pub use resolver::{
    ConfigurationResolver, launched_from_canvas, url_configured, vitalsource_book_configured,
};
pub use types::{
    AssignmentConfiguration, AssignmentRef, ConfigurationPredicate, ConfigurationVariant,
    ViewPredicate,
};
