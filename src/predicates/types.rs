use serde::{Deserialize, Serialize};

use crate::launch::types::LaunchRequest;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssignmentRef {
    pub tool_consumer_instance_guid: String,
    pub resource_link_id: String,
}

impl AssignmentRef {
    pub fn new(
        tool_consumer_instance_guid: impl Into<String>,
        resource_link_id: impl Into<String>,
    ) -> Self {
        Self {
            tool_consumer_instance_guid: tool_consumer_instance_guid.into(),
            resource_link_id: resource_link_id.into(),
        }
    }

    pub fn from_request(request: &LaunchRequest) -> Option<Self> {
        let guid = request.param("tool_consumer_instance_guid")?;
        let resource_link_id = request.param("resource_link_id")?;
        Some(Self::new(guid, resource_link_id))
    }
}

/// Concrete configuration variants in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationVariant {
    Db,
    Url,
    CanvasFile,
    VitalSourceBook,
}

impl ConfigurationVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Db => "db",
            Self::Url => "url",
            Self::CanvasFile => "canvas_file",
            Self::VitalSourceBook => "vitalsource_book",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "configuration", rename_all = "snake_case")]
pub enum AssignmentConfiguration {
    Db {
        document_url: String,
    },
    Url {
        document_url: String,
    },
    CanvasFile {
        file_id: String,
    },
    VitalSourceBook {
        book_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cfi: Option<String>,
    },
}

impl AssignmentConfiguration {
    pub fn variant(&self) -> ConfigurationVariant {
        match self {
            Self::Db { .. } => ConfigurationVariant::Db,
            Self::Url { .. } => ConfigurationVariant::Url,
            Self::CanvasFile { .. } => ConfigurationVariant::CanvasFile,
            Self::VitalSourceBook { .. } => ConfigurationVariant::VitalSourceBook,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigurationPredicate {
    DbConfigured,
    UrlConfigured,
    CanvasFileConfigured,
    VitalSourceBookConfigured,
    Configured,
}

impl ConfigurationPredicate {
    pub const ALL: [Self; 5] = [
        Self::DbConfigured,
        Self::UrlConfigured,
        Self::CanvasFileConfigured,
        Self::VitalSourceBookConfigured,
        Self::Configured,
    ];

    /// `None` for the `Configured` union.
    pub fn concrete_variant(self) -> Option<ConfigurationVariant> {
        match self {
            Self::DbConfigured => Some(ConfigurationVariant::Db),
            Self::UrlConfigured => Some(ConfigurationVariant::Url),
            Self::CanvasFileConfigured => Some(ConfigurationVariant::CanvasFile),
            Self::VitalSourceBookConfigured => Some(ConfigurationVariant::VitalSourceBook),
            Self::Configured => None,
        }
    }

    pub fn holds_for(self, resolved: Option<&AssignmentConfiguration>) -> bool {
        match self.concrete_variant() {
            Some(variant) => {
                resolved.is_some_and(|configuration| configuration.variant() == variant)
            }
            None => resolved.is_some(),
        }
    }

    /// Whether `self == expected` and `other == other_expected` can never hold
    /// for the same request. Callers handle `self == other` themselves.
    pub fn excludes(self, expected: bool, other: Self, other_expected: bool) -> bool {
        match (self.concrete_variant(), other.concrete_variant()) {
            (Some(lhs), Some(rhs)) => lhs != rhs && expected && other_expected,
            (Some(_), None) => expected && !other_expected,
            (None, Some(_)) => !expected && other_expected,
            (None, None) => false,
        }
    }
}

/// Closed set of predicates a dispatch guard can reference by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ViewPredicate {
    Configuration(ConfigurationPredicate),
    AuthorizedToConfigureAssignments,
}

impl ViewPredicate {
    pub const BUILTIN: [Self; 6] = [
        Self::Configuration(ConfigurationPredicate::DbConfigured),
        Self::Configuration(ConfigurationPredicate::CanvasFileConfigured),
        Self::Configuration(ConfigurationPredicate::UrlConfigured),
        Self::Configuration(ConfigurationPredicate::VitalSourceBookConfigured),
        Self::Configuration(ConfigurationPredicate::Configured),
        Self::AuthorizedToConfigureAssignments,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Configuration(ConfigurationPredicate::DbConfigured) => "db_configured",
            Self::Configuration(ConfigurationPredicate::CanvasFileConfigured) => "canvas_file",
            Self::Configuration(ConfigurationPredicate::UrlConfigured) => "url_configured",
            Self::Configuration(ConfigurationPredicate::VitalSourceBookConfigured) => {
                "vitalsource_book"
            }
            Self::Configuration(ConfigurationPredicate::Configured) => "configured",
            Self::AuthorizedToConfigureAssignments => "authorized_to_configure_assignments",
        }
    }

    pub fn excludes(self, expected: bool, other: Self, other_expected: bool) -> bool {
        if self == other {
            return expected != other_expected;
        }
        match (self, other) {
            (Self::Configuration(lhs), Self::Configuration(rhs)) => {
                lhs.excludes(expected, rhs, other_expected)
            }
            _ => false,
        }
    }
}
