use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::model::Role;

/// The one dashboard view, configured for the signed-in role.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub view: &'static str,
    pub role: Role,
    pub sections: &'static [&'static str],
    pub stylesheet: Option<PathBuf>,
}

impl DashboardView {
    pub fn for_role(role: Role, themes_dir: Option<&Path>) -> Self {
        DashboardView {
            view: "dashboard",
            role,
            sections: sections(role),
            stylesheet: resolve_stylesheet(themes_dir, role),
        }
    }
}

pub fn sections(role: Role) -> &'static [&'static str] {
    match role {
        Role::Admin => &[
            "users",
            "teachers",
            "students",
            "classes",
            "attendance",
            "notifications",
        ],
        Role::Teacher => &["classes", "attendance", "notifications"],
        Role::Student => &["subjects", "attendance", "notifications"],
    }
}

/// Finds `<themes_dir>/<role>.css`. A missing theme is not an error; the
/// dashboard renders unstyled.
pub fn resolve_stylesheet(themes_dir: Option<&Path>, role: Role) -> Option<PathBuf> {
    let dir = themes_dir?;
    let path = dir.join(format!("{}.css", role.as_str().to_ascii_lowercase()));
    if path.is_file() {
        Some(path)
    } else {
        warn!(path = %path.display(), role = %role, "stylesheet not found; continuing without theme");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_role_gets_notifications() {
        for role in Role::ALL {
            assert!(sections(role).contains(&"notifications"), "{}", role);
        }
        assert!(sections(Role::Admin).contains(&"users"));
        assert!(!sections(Role::Student).contains(&"users"));
    }

    #[test]
    fn missing_stylesheet_is_tolerated() {
        let dir = std::env::temp_dir().join(format!("attendd-themes-missing-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create dir");
        let view = DashboardView::for_role(Role::Teacher, Some(&dir));
        assert_eq!(view.stylesheet, None);
        assert_eq!(view.view, "dashboard");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn present_stylesheet_is_picked_by_role() {
        let dir = std::env::temp_dir().join(format!("attendd-themes-present-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create dir");
        std::fs::write(dir.join("admin.css"), "body {}").expect("write css");
        let view = DashboardView::for_role(Role::Admin, Some(&dir));
        assert_eq!(view.stylesheet, Some(dir.join("admin.css")));
        assert_eq!(resolve_stylesheet(Some(&dir), Role::Student), None);
        let _ = std::fs::remove_dir_all(dir);
    }
}
