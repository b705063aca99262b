//! Account roles and the permission decisions that depend on them.
//!
//! The backend reports a role string with every token grant. It is parsed
//! once into [`Role`] and every menu or action check matches on the enum.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::navigation::{Action, Section};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Parse a backend role string. Matching is case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::User => "User",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Whether this role may perform `action` on `section`.
    pub fn can(&self, action: Action, section: Section) -> bool {
        match self {
            Role::Admin => true,
            Role::User => match section {
                Section::Bills | Section::Users => false,
                Section::Dashboard | Section::Trainers | Section::Courses => {
                    matches!(action, Action::View)
                }
                Section::Students | Section::Activities | Section::Accidents => match action {
                    Action::View | Action::Create | Action::Edit => true,
                    Action::Delete => false,
                },
            },
        }
    }

    /// Sections shown in the navigation menu for this role, in menu order.
    pub fn menu(&self) -> Vec<Section> {
        Section::ALL
            .iter()
            .copied()
            .filter(|section| self.can(Action::View, *section))
            .collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Role::parse(&value).ok_or_else(|| format!("unknown role: {:?}", value))
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse(" USER "), Some(Role::User));
        assert_eq!(Role::parse(""), None);
        assert_eq!(Role::parse("Superuser"), None);
    }

    #[test]
    fn test_role_serde() {
        let role: Role = serde_json::from_str("\"Admin\"").expect("parse admin");
        assert_eq!(role, Role::Admin);
        assert_eq!(serde_json::to_string(&Role::User).expect("serialize"), "\"User\"");
        assert!(serde_json::from_str::<Role>("\"Guest\"").is_err());
    }

    #[test]
    fn test_admin_can_do_everything() {
        for section in Section::ALL {
            for action in Action::ALL {
                assert!(Role::Admin.can(action, section), "{:?} {:?}", action, section);
            }
        }
        assert_eq!(Role::Admin.menu(), Section::ALL.to_vec());
    }

    #[test]
    fn test_user_permissions() {
        assert!(Role::User.can(Action::View, Section::Students));
        assert!(Role::User.can(Action::Create, Section::Activities));
        assert!(Role::User.can(Action::Edit, Section::Accidents));
        assert!(!Role::User.can(Action::Delete, Section::Students));
        assert!(!Role::User.can(Action::Create, Section::Courses));
        assert!(!Role::User.can(Action::View, Section::Bills));
        assert!(!Role::User.can(Action::View, Section::Users));
    }

    #[test]
    fn test_user_menu_hides_admin_sections() {
        let menu = Role::User.menu();
        assert!(!menu.contains(&Section::Bills));
        assert!(!menu.contains(&Section::Users));
        assert_eq!(menu.first(), Some(&Section::Dashboard));
        assert_eq!(menu.len(), Section::ALL.len() - 2);
    }
}
