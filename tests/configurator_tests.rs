use std::sync::{Arc, Mutex};

use pipewright::errors::ConfigurationError;
use pipewright::middleware::MiddlewareBlueprint;
use pipewright::route::{HandlerRef, MenuItem};
use pipewright::routing::{MenuEntry, MenuRegistry, RoutingConfigurator};

#[test]
fn test_group_applies_prefix_name_and_middleware() {
    let collection = RoutingConfigurator::new()
        .prefix("/admin")
        .name("admin")
        .middleware(MiddlewareBlueprint::new("auth"))
        .group(|c| c.get("users", "/users", "list_users"))
        .unwrap()
        .into_collection();

    let route = collection.find_by_name("admin.users").unwrap();
    assert_eq!(route.pattern().raw(), "/admin/users");
    assert_eq!(route.middleware_stack()[0].tag(), "auth");
}

#[test]
fn test_nested_groups_merge_attributes() {
    let collection = RoutingConfigurator::new()
        .prefix("/admin")
        .name("admin")
        .middleware(MiddlewareBlueprint::new("auth"))
        .group(|c| {
            c.prefix("/reports")
                .name("reports")
                .middleware(MiddlewareBlueprint::new("audit"))
                .group(|c| c.get("monthly", "/monthly", "monthly_report"))
        })
        .unwrap()
        .into_collection();

    let route = collection.find_by_name("admin.reports.monthly").unwrap();
    assert_eq!(route.pattern().raw(), "/admin/reports/monthly");
    let tags: Vec<&str> = route.middleware_stack().iter().map(|m| m.tag()).collect();
    assert_eq!(tags, vec!["auth", "audit"]);
}

#[test]
fn test_group_attributes_pop_after_the_closure() {
    let collection = RoutingConfigurator::new()
        .prefix("/admin")
        .group(|c| c.get("inside", "/inside", "inside_handler"))
        .unwrap()
        .get("outside", "/outside", "outside_handler")
        .unwrap()
        .into_collection();

    assert_eq!(
        collection.find_by_name("inside").unwrap().pattern().raw(),
        "/admin/inside"
    );
    assert_eq!(
        collection.find_by_name("outside").unwrap().pattern().raw(),
        "/outside"
    );
}

#[test]
fn test_innermost_namespace_wins() {
    let collection = RoutingConfigurator::new()
        .namespace("outer")
        .group(|c| {
            c.namespace("inner")
                .group(|c| c.get("deep", "/deep", "deep_handler"))?
                .get("shallow", "/shallow", "shallow_handler")
        })
        .unwrap()
        .into_collection();

    assert_eq!(
        collection.find_by_name("deep").unwrap().handler(),
        &HandlerRef::Named {
            name: "inner::deep_handler".to_string()
        }
    );
    assert_eq!(
        collection.find_by_name("shallow").unwrap().handler(),
        &HandlerRef::Named {
            name: "outer::shallow_handler".to_string()
        }
    );
}

#[test]
fn test_staged_attributes_without_group_reject_registration() {
    let err = RoutingConfigurator::new()
        .prefix("/admin")
        .get("users", "/users", "list_users")
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::UnappliedAttributes { .. }));
}

#[test]
fn test_duplicate_static_registration_is_rejected() {
    let err = RoutingConfigurator::new()
        .get("a", "/same", "a_handler")
        .unwrap()
        .get("b", "/same", "b_handler")
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::DuplicateStaticRoute { .. }));
}

#[test]
fn test_same_static_path_different_methods_coexist() {
    let collection = RoutingConfigurator::new()
        .get("items.list", "/items", "list_items")
        .unwrap()
        .post("items.create", "/items", "create_item")
        .unwrap()
        .into_collection();
    assert_eq!(collection.len(), 2);
}

#[test]
fn test_redirect_routes() {
    let collection = RoutingConfigurator::new()
        .redirect("/old", "/new")
        .unwrap()
        .permanent_redirect("/gone", "/moved")
        .unwrap()
        .temporary_redirect("/busy", "/later")
        .unwrap()
        .into_collection();

    let redirect = collection.find_by_name("redirect.old").unwrap();
    assert_eq!(
        redirect.handler(),
        &HandlerRef::Redirect {
            to: "/new".to_string(),
            status: 302,
        }
    );
    let permanent = collection.find_by_name("redirect.gone").unwrap();
    assert!(
        matches!(permanent.handler(), HandlerRef::Redirect { status: 301, .. })
    );
    let temporary = collection.find_by_name("redirect.busy").unwrap();
    assert!(
        matches!(temporary.handler(), HandlerRef::Redirect { status: 307, .. })
    );
}

#[test]
fn test_route_after_fallback_is_rejected() {
    let err = RoutingConfigurator::new()
        .fallback("not_found_handler")
        .unwrap()
        .get("late", "/late", "late_handler")
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::RouteAfterFallback { .. }));
}

#[test]
fn test_second_fallback_is_rejected() {
    let err = RoutingConfigurator::new()
        .fallback("first_handler")
        .unwrap()
        .fallback("second_handler")
        .unwrap_err();
    // Fallback after fallback trips the ordering invariant first.
    assert!(matches!(
        err,
        ConfigurationError::RouteAfterFallback { .. } | ConfigurationError::DuplicateFallback
    ));
}

#[derive(Default)]
struct CapturingRegistry {
    entries: Mutex<Vec<MenuEntry>>,
}

impl MenuRegistry for CapturingRegistry {
    fn register(&self, entry: &MenuEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

#[test]
fn test_dashboard_pages_are_prefixed_and_registered_in_the_menu() {
    let registry = Arc::new(CapturingRegistry::default());
    let collection = RoutingConfigurator::new()
        .with_menu_registry(Arc::clone(&registry) as Arc<dyn MenuRegistry>)
        .dashboard(|d| {
            d.page(
                "settings",
                "/settings",
                "settings_handler",
                Some(MenuItem {
                    title: "Settings".to_string(),
                    parent: None,
                }),
            )?
            .page(
                "settings.api",
                "/settings/api",
                "api_settings_handler",
                Some(MenuItem {
                    title: "API".to_string(),
                    parent: Some("settings".to_string()),
                }),
            )
        })
        .unwrap()
        .into_collection();

    let page = collection.find_by_name("settings").unwrap();
    assert_eq!(page.pattern().raw(), "/wp-admin/settings");
    assert_eq!(page.methods(), &[http::Method::GET]);

    let entries = registry.entries.lock().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].title, "Settings");
    assert_eq!(entries[1].parent.as_deref(), Some("settings"));
}

#[test]
fn test_dashboard_prefix_is_configurable() {
    let collection = RoutingConfigurator::new()
        .with_dashboard_prefix("/admin")
        .dashboard(|d| d.page("tools", "/tools", "tools_handler", None))
        .unwrap()
        .into_collection();
    assert_eq!(
        collection.find_by_name("tools").unwrap().pattern().raw(),
        "/admin/tools"
    );
}

#[test]
fn test_dashboard_rejects_unknown_menu_parent() {
    let err = RoutingConfigurator::new()
        .dashboard(|d| {
            d.page(
                "orphan",
                "/orphan",
                "orphan_handler",
                Some(MenuItem {
                    title: "Orphan".to_string(),
                    parent: Some("never_registered".to_string()),
                }),
            )
        })
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::UnknownMenuParent { .. }));
}

#[test]
fn test_dashboard_rejects_parent_that_is_itself_a_child() {
    let err = RoutingConfigurator::new()
        .dashboard(|d| {
            d.page(
                "settings",
                "/settings",
                "settings_handler",
                Some(MenuItem {
                    title: "Settings".to_string(),
                    parent: None,
                }),
            )?
            .page(
                "settings.api",
                "/settings/api",
                "api_settings_handler",
                Some(MenuItem {
                    title: "API".to_string(),
                    parent: Some("settings".to_string()),
                }),
            )?
            .page(
                "settings.api.keys",
                "/settings/api/keys",
                "api_keys_handler",
                Some(MenuItem {
                    title: "Keys".to_string(),
                    parent: Some("settings.api".to_string()),
                }),
            )
        })
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::ConflictingMenuParent { .. }));
}

#[test]
fn test_dashboard_rejects_staged_attributes() {
    let err = RoutingConfigurator::new()
        .prefix("/extra")
        .dashboard(|d| d.page("tools", "/tools", "tools_handler", None))
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::UnappliedAttributes { .. }));
}

#[test]
fn test_duplicate_name_newest_wins_for_lookup() {
    let collection = RoutingConfigurator::new()
        .get("page", "/first", "first_handler")
        .unwrap()
        .get("page", "/second", "second_handler")
        .unwrap()
        .into_collection();
    // Both routes stay matchable; the name index points at the newest.
    assert_eq!(collection.len(), 2);
    assert_eq!(
        collection.find_by_name("page").unwrap().pattern().raw(),
        "/second"
    );
}
