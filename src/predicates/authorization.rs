use crate::launch::types::LtiUser;

const CONFIGURING_ROLES: [&str; 3] = ["administrator", "instructor", "teachingassistant"];

/// Roles are matched as substrings so full LIS URNs such as
/// `urn:lti:role:ims/lis/Instructor` count as well.
pub fn authorized_to_configure_assignments(user: &LtiUser) -> bool {
    let roles = user.roles.to_ascii_lowercase();
    CONFIGURING_ROLES.iter().any(|role| roles.contains(role))
}
