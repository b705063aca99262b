//! Dashboard sections and the actions that can be taken in them.
//!
//! Visibility and permission decisions live on [`Role`](crate::auth::Role).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    Dashboard,
    Students,
    Trainers,
    Courses,
    Activities,
    Accidents,
    Bills,
    Users,
}

impl Section {
    /// All sections in menu order
    pub const ALL: [Section; 8] = [
        Section::Dashboard,
        Section::Students,
        Section::Trainers,
        Section::Courses,
        Section::Activities,
        Section::Accidents,
        Section::Bills,
        Section::Users,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::Students => "Students",
            Section::Trainers => "Trainers",
            Section::Courses => "Courses",
            Section::Activities => "Activities",
            Section::Accidents => "Accidents",
            Section::Bills => "Bills & Inventory",
            Section::Users => "User Accounts",
        }
    }

    /// Route path the UI navigates to for this section
    pub fn path(&self) -> &'static str {
        match self {
            Section::Dashboard => "/",
            Section::Students => "/students",
            Section::Trainers => "/trainers",
            Section::Courses => "/courses",
            Section::Activities => "/activities",
            Section::Accidents => "/accidents",
            Section::Bills => "/bills",
            Section::Users => "/users",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Create, Action::Edit, Action::Delete];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_paths_unique() {
        let mut paths: Vec<&str> = Section::ALL.iter().map(|s| s.path()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), Section::ALL.len());
    }

    #[test]
    fn test_section_titles() {
        assert_eq!(Section::Bills.title(), "Bills & Inventory");
        assert_eq!(Section::Dashboard.path(), "/");
    }
}
