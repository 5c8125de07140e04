// src/state/routes.rs
use crate::model::Role;

/// Top-level destinations a freshly authenticated user can land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    AdminDashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/dashboard/profile",
            Route::AdminDashboard => "/admindashboard/admin",
        }
    }
}

/// Pure role-to-route mapping. The session manager calls this only
/// after the profile lookup has settled, never on the raw auth
/// callback, so a slow lookup can not misroute an admin.
pub fn landing_route(role: Role) -> Route {
    match role {
        Role::Admin => Route::AdminDashboard,
        Role::User => Route::Dashboard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_routes_to_admin_dashboard() {
        assert_eq!(landing_route(Role::Admin), Route::AdminDashboard);
    }

    #[test]
    fn test_everything_else_routes_to_dashboard() {
        assert_eq!(landing_route(Role::User), Route::Dashboard);
        // Unrecognized and absent role strings parse to User upstream.
        assert_eq!(landing_route(Role::parse("moderator")), Route::Dashboard);
        assert_eq!(landing_route(Role::parse("")), Route::Dashboard);
        assert_eq!(landing_route(Role::default()), Route::Dashboard);
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Dashboard.path(), "/dashboard/profile");
        assert_eq!(Route::AdminDashboard.path(), "/admindashboard/admin");
    }
}
