//! Resources
//!
//! A resource is an authenticatable entity of the host application (e.g. a
//! `User` model). Every name this crate puts on the schema is derived from it.
use std::fmt;

use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    name: String,
    mapping: String,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mapping = mapping_for(&name);
        Self { name, mapping }
    }

    /// The identifier as the host application wrote it
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The normalized lower snake case identifier. ``Admin/Staff`` becomes ``admin_staff``.
    pub fn mapping(&self) -> &str {
        &self.mapping
    }

    /// The prefix for public type names. ``Admin/Staff`` becomes ``AdminStaff``.
    pub fn graphql_prefix(&self) -> String {
        self.mapping.to_upper_camel_case()
    }

    /// ``<mapping>_<operation>``, the key an operation is registered under
    pub fn qualify(&self, operation: &str) -> String {
        format!("{}_{}", self.mapping, operation)
    }

    /// ``<Prefix><Operation>``, e.g. ``UserSignUp`` for ``sign_up`` on ``User``
    pub fn graphql_name(&self, operation: &str) -> String {
        format!(
            "{}{}",
            self.graphql_prefix(),
            operation.to_upper_camel_case()
        )
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for Resource {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// ``snake_case`` splits on path separators too, so ``/`` and ``::`` end up as ``_``
fn mapping_for(name: &str) -> String {
    name.split(|c| c == '/' || c == ':')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_snake_case())
        .collect::<Vec<_>>()
        .join("_")
}

/// Field and argument names on the sealed schema are lower camel case
pub fn field_name(key: &str) -> String {
    key.to_lower_camel_case()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping() {
        assert_eq!(Resource::new("User").mapping(), "user");
        assert_eq!(Resource::new("AdminUser").mapping(), "admin_user");
        assert_eq!(Resource::new("Admin/Staff").mapping(), "admin_staff");
        assert_eq!(Resource::new("Admin::Staff").mapping(), "admin_staff");
        assert_eq!(Resource::new("Users::HTTPClient").mapping(), "users_http_client");
    }

    #[test]
    fn test_names() {
        let resource = Resource::new("Admin/Staff");
        assert_eq!(resource.qualify("sign_up"), "admin_staff_sign_up");
        assert_eq!(resource.graphql_name("sign_up"), "AdminStaffSignUp");
        assert_eq!(resource.graphql_prefix(), "AdminStaff");
        assert_eq!(Resource::new("User").graphql_name("mutation_1"), "UserMutation1");
        assert_eq!(field_name("user_send_password_reset"), "userSendPasswordReset");
    }
}
