//! End-to-end resolution runs over an in-memory inventory

use std::collections::HashMap;

use pretty_assertions::assert_eq;
use serde_yaml::Value;

use inventory_core::{
    Contribution, Error, Invocation, Inventory, ResolutionSession, SiteVarsDoc, VariableLayers,
};

fn yaml(s: &str) -> Value {
    serde_yaml::from_str(s).unwrap()
}

fn inventory() -> Inventory {
    Inventory::from_value(&yaml(
        r#"
projects:
  p1:
    web:
      development: 192.168.50.5
  p2:
    web:
      development:
        - ansible_host: 192.168.50.6
          vagrant_autostart: true
groups:
  active:
    children: [p1, p2]
    web:
      development:
        - ansible_host: 192.168.50.9
          base_project: p2
"#,
    ))
    .unwrap()
}

fn layer(doc: &str) -> Vec<Contribution> {
    Contribution::layer_from_value(&yaml(doc)).unwrap()
}

fn project_doc(project: &str, doc: &str) -> (String, SiteVarsDoc) {
    (
        project.to_string(),
        SiteVarsDoc::from_value(project, &yaml(doc)).unwrap(),
    )
}

fn layers() -> VariableLayers {
    VariableLayers {
        site_vars_default: layer("[{all: {local_path: 'www/{{ site }}', current_path: current}}]"),
        site_vars_global: layer("[{p1: {current_path: live}}]"),
        project_vars: HashMap::from([
            project_doc(
                "p1",
                r#"
site_vars_for_project:
  - all: {local_path: 'apps/{{ site }}'}
site_vars:
  p1.dev:
    - all: {site_hosts: [{canonical: '{{ site }}', redirects: ['www.{{ site }}']}]}
    - p1: {multisite: {enabled: true, subdomains: true}}
"#,
            ),
            project_doc(
                "p2",
                r#"
site_vars:
  p2.dev:
    - all: {site_hosts: [{canonical: p2.dev, redirects: [www.p1.dev]}]}
"#,
            ),
        ]),
    }
}

fn session(invocation: Invocation) -> ResolutionSession {
    ResolutionSession::new(inventory(), layers(), serde_yaml::Mapping::new(), invocation)
}

#[test]
fn single_project_machine_resolves_all_layers() {
    let resolution = session(Invocation::default()).run().unwrap();
    let p1 = resolution.machines.get("p1").unwrap();

    assert_eq!(p1.ip, "192.168.50.5");
    let paths = &p1.site_paths["p1.dev"];
    // project layer overrides the default local_path template
    assert_eq!(paths.local, "apps/p1.dev");
    // global layer overrides the default current_path for p1 only
    assert_eq!(paths.current, "live");
    assert_eq!(p1.site_hosts, vec!["p1.dev", "www.p1.dev"]);
    assert!(p1.multisite_subdomains);
    assert!(!p1.vagrant_autostart);
}

#[test]
fn overlay_machine_carries_autostart_and_address() {
    let resolution = session(Invocation::default()).run().unwrap();
    let p2 = resolution.machines.get("p2").unwrap();

    assert_eq!(p2.ip, "192.168.50.6");
    assert!(p2.vagrant_autostart);
    assert_eq!(p2.site_paths["p2.dev"].current, "current");
}

#[test]
fn multi_project_machine_merges_targets() {
    let resolution = session(Invocation::default()).run().unwrap();
    let active = resolution.machines.get("active").unwrap();

    assert_eq!(active.ip, "192.168.50.9");
    assert!(active.site_paths.contains_key("p1.dev"));
    assert!(active.site_paths.contains_key("p2.dev"));
    // hostnames deduplicated first-seen across target projects
    assert_eq!(active.site_hosts, vec!["p1.dev", "www.p1.dev", "p2.dev"]);
    // last target project (p2, no multisite) overwrites p1's flag
    assert!(!active.multisite_subdomains);
    assert_eq!(active.base_project(), Some("p2"));
}

#[test]
fn bare_up_selects_autostart_machines_and_orders_them_first() {
    let resolution = session(Invocation::new(["up"])).run().unwrap();

    assert_eq!(resolution.selected, vec!["p2"]);
    // selected machines boot first; the rest keep candidate order
    assert_eq!(resolution.machines.names(), vec!["p2", "active", "p1"]);
}

#[test]
fn explicit_invocation_names_win_over_autostart() {
    let resolution = session(Invocation::new(["up", "p1"])).run().unwrap();
    assert_eq!(resolution.selected, vec!["p1"]);
    assert_eq!(resolution.machines.names()[0], "p1");
}

#[test]
fn regex_invocation_token_selects_by_inner_body() {
    let resolution = session(Invocation::new(["provision", "/^p/"])).run().unwrap();
    assert_eq!(resolution.selected, vec!["p1", "p2"]);
}

#[test]
fn local_vconfig_of_base_project_feeds_autostart_fallback() {
    let local: serde_yaml::Mapping = serde_yaml::from_str("vagrant_autostart: true").unwrap();
    let resolution = session(Invocation::default())
        .with_local_vconfigs(HashMap::from([("p2".to_string(), local)]))
        .run()
        .unwrap();

    // `active` declares base_project p2, so p2's local overrides apply to it
    assert!(resolution.machines.get("active").unwrap().vagrant_autostart);
    // ...but not to p1, whose base project is itself
    assert!(!resolution.machines.get("p1").unwrap().vagrant_autostart);
}

#[test]
fn all_projects_group_targets_every_dev_project() {
    let doc = yaml(
        r#"
projects:
  p1: {web: {development: 192.168.50.5}}
  p2: {web: {development: 192.168.50.6}}
groups:
  all-projects:
    web: {development: 192.168.50.11}
"#,
    );
    // reuse the standard variable layers
    let inv = Inventory::from_value(&doc).unwrap();
    let resolution =
        ResolutionSession::new(inv, layers(), serde_yaml::Mapping::new(), Invocation::default())
            .run()
            .unwrap();

    let all = resolution.machines.get("all-projects").unwrap();
    assert!(all.site_paths.contains_key("p1.dev"));
    assert!(all.site_paths.contains_key("p2.dev"));
}

fn two_site_fixture() -> (Inventory, VariableLayers) {
    let inv = Inventory::from_value(&yaml(
        "projects:\n  p1: {web: {development: 192.168.50.5}}\n",
    ))
    .unwrap();
    let layers = VariableLayers {
        site_vars_default: layer("[{all: {local_path: 'www/{{ site }}', current_path: current}}]"),
        site_vars_global: layer("[{p1: {current_path: live}}]"),
        project_vars: HashMap::from([project_doc(
            "p1",
            r#"
site_vars:
  z.dev:
    - all: {site_hosts: [{canonical: '{{ site }}'}], current_path: special}
  a.dev:
    - all: {site_hosts: [{canonical: '{{ site }}'}]}
"#,
        )]),
    };
    (inv, layers)
}

#[test]
fn site_override_does_not_leak_into_sibling_sites() {
    let (inv, layers) = two_site_fixture();
    let resolution =
        ResolutionSession::new(inv, layers, serde_yaml::Mapping::new(), Invocation::default())
            .run()
            .unwrap();
    let p1 = resolution.machines.get("p1").unwrap();

    // z.dev's own layer overrides current_path for z.dev only; a.dev still
    // resolves to the global value
    assert_eq!(p1.site_paths["z.dev"].current, "special");
    assert_eq!(p1.site_paths["a.dev"].current, "live");
}

#[test]
fn site_paths_keep_site_declaration_order() {
    let (inv, layers) = two_site_fixture();
    let resolution =
        ResolutionSession::new(inv, layers, serde_yaml::Mapping::new(), Invocation::default())
            .run()
            .unwrap();
    let p1 = resolution.machines.get("p1").unwrap();

    let sites: Vec<&str> = p1.site_paths.iter().map(|(site, _)| site).collect();
    assert_eq!(sites, vec!["z.dev", "a.dev"]);
}

#[test]
fn malformed_site_hosts_fails_the_whole_resolution() {
    let mut layers = layers();
    layers.project_vars.insert(
        "p2".to_string(),
        SiteVarsDoc::from_value(
            "p2",
            &yaml("site_vars:\n  p2.dev:\n    - all: {site_hosts: [{redirects: [www.p2.dev]}]}\n"),
        )
        .unwrap(),
    );

    let err = ResolutionSession::new(
        inventory(),
        layers,
        serde_yaml::Mapping::new(),
        Invocation::default(),
    )
    .run()
    .unwrap_err();

    assert!(matches!(
        err,
        Error::SiteHosts { ref project, ref site } if project == "p2" && site == "p2.dev"
    ));
}

#[test]
fn target_without_project_vars_is_fatal() {
    let inv = Inventory::from_value(&yaml(
        "projects:\n  solo: {web: {development: 10.0.0.5}}\n",
    ))
    .unwrap();
    let err = ResolutionSession::new(
        inv,
        VariableLayers::default(),
        serde_yaml::Mapping::new(),
        Invocation::default(),
    )
    .run()
    .unwrap_err();

    assert!(matches!(err, Error::ProjectVars { ref project } if project == "solo"));
}
