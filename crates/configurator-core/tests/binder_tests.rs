// Host-side tests for the state/material binder, driven against the
// in-memory recording viewer.

use configurator_core::recording::{join, Applied, RecordingViewer};
use configurator_core::{
    Binder, BinderError, Clock, Configuration, ConfiguratorEvent, Context, ErrorKind, EventBus,
    EventLog, MaterialSlot, SelectionState, UrlParams,
};
use pollster::block_on;
use std::cell::RefCell;
use std::future::ready as ready_now;
use std::rc::Rc;

const PRODUCT: &str = include_str!("fixtures/product.json");

struct Harness {
    binder: Binder<RecordingViewer>,
    viewer: RecordingViewer,
    log: EventLog,
}

fn fixed_clock() -> Clock {
    Rc::new(|| 1_000.0)
}

fn harness() -> Harness {
    let config = Rc::new(Configuration::from_json(PRODUCT).unwrap());
    let viewer = RecordingViewer::new(["Case", "Dial", "Strap"]);
    let bus = EventBus::new();
    let log = EventLog::attach(&bus);
    let binder = Binder::new(config, Rc::new(viewer.clone()), Context::new(bus, fixed_clock())).unwrap();
    Harness { binder, viewer, log }
}

fn ready() -> Harness {
    let h = harness();
    block_on(h.binder.initialize()).unwrap();
    h.log.clear();
    h.viewer.clear_applied();
    h
}

fn selection(color: &str, strap: &str, environment: &str) -> SelectionState {
    SelectionState {
        color: color.into(),
        strap: strap.into(),
        environment: environment.into(),
    }
}

#[test]
fn initialize_applies_defaults_then_signals_ready() {
    let h = harness();
    block_on(h.binder.initialize()).unwrap();
    assert!(h.binder.is_initialized());
    assert_eq!(h.log.names(), vec!["initialized"]);
    assert_eq!(h.viewer.base_color_of("Case").as_deref(), Some("textures/red_primary.jpg"));
    assert_eq!(h.viewer.base_color_of("Dial").as_deref(), Some("textures/red_accent.jpg"));
    // Dynamic strap follows the color's accent texture.
    assert_eq!(h.viewer.base_color_of("Strap").as_deref(), Some("textures/red_accent.jpg"));
    assert!(h
        .viewer
        .applied()
        .contains(&Applied::Roughness { material: "Case".into(), url: "textures/red_roughness.jpg".into() }));
    assert!(h.viewer.applied().contains(&Applied::Background("#f0f0f0".into())));
}

#[test]
fn initialize_fails_when_a_material_is_missing() {
    let config = Rc::new(Configuration::from_json(PRODUCT).unwrap());
    let viewer = RecordingViewer::new(["Case", "Dial"]);
    let bus = EventBus::new();
    let log = EventLog::attach(&bus);
    let binder = Binder::new(config, Rc::new(viewer.clone()), Context::new(bus, fixed_clock())).unwrap();
    match block_on(binder.initialize()) {
        Err(BinderError::MissingMaterial { slot, name }) => {
            assert_eq!(slot, MaterialSlot::Accent);
            assert_eq!(name, "Strap");
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(!binder.is_initialized());
    assert!(log.names().is_empty());
    assert!(viewer.loads().is_empty());
}

#[test]
fn construction_rejects_an_invalid_configuration() {
    let mut config = Configuration::from_json(PRODUCT).unwrap();
    config.defaults.color = "green".into();
    let viewer = RecordingViewer::new(["Case", "Dial", "Strap"]);
    let result = Binder::new(Rc::new(config), Rc::new(viewer), Context::new(EventBus::new(), fixed_clock()));
    assert!(matches!(result, Err(BinderError::Config(_))));
}

#[test]
fn change_color_emits_color_then_dynamic_strap() {
    let h = ready();
    block_on(h.binder.change_color("blue"));
    assert_eq!(
        h.log.events(),
        vec![
            ConfiguratorEvent::ColorChanged("blue".into()),
            ConfiguratorEvent::StrapChanged("selected".into()),
        ]
    );
    assert_eq!(h.binder.state(), selection("blue", "selected", "studio"));
    assert_eq!(h.viewer.base_color_of("Case").as_deref(), Some("textures/blue_primary.jpg"));
    assert_eq!(h.viewer.base_color_of("Strap").as_deref(), Some("textures/blue_accent.jpg"));
}

#[test]
fn every_color_settles_with_dynamic_strap() {
    let h = ready();
    let ids: Vec<String> = h.binder.config().colors.iter().map(|c| c.id.clone()).collect();
    for id in ids {
        block_on(h.binder.change_strap("steel"));
        block_on(h.binder.change_color(&id));
        let state = h.binder.state();
        assert_eq!(state.color, id);
        // Re-selecting the current color is a no-op, so the strap stays
        // on steel for the default color.
        if id != "red" || state.strap != "steel" {
            assert_eq!(state.strap, "selected");
        }
    }
}

#[test]
fn color_change_overrides_a_fixed_strap() {
    let h = ready();
    block_on(h.binder.change_strap("leather"));
    assert_eq!(h.binder.state().strap, "leather");
    block_on(h.binder.change_color("sand"));
    assert_eq!(h.binder.state(), selection("sand", "selected", "studio"));
    assert_eq!(h.viewer.base_color_of("Strap").as_deref(), Some("textures/sand_accent.jpg"));
}

#[test]
fn color_changed_fires_before_any_texture_load() {
    let h = ready();
    let seen = Rc::new(RefCell::new(Vec::new()));
    {
        let seen = seen.clone();
        let viewer = h.viewer.clone();
        h.binder.context().bus.subscribe(move |event| {
            if let ConfiguratorEvent::ColorChanged(id) = event {
                seen.borrow_mut().push((id.clone(), viewer.loads().len()));
            }
        });
    }
    let before = h.viewer.loads().len();
    block_on(h.binder.change_color("blue"));
    assert_eq!(*seen.borrow(), vec![("blue".to_string(), before)]);
    assert!(h.viewer.loads().len() > before);
}

#[test]
fn overlapping_failures_roll_back_to_the_last_applied_color() {
    let h = ready();
    h.viewer.fail_url("textures/blue_primary.jpg");
    h.viewer.delay_url("textures/blue_primary.jpg", 1);
    h.viewer.fail_url("textures/sand_primary.jpg");
    h.viewer.delay_url("textures/sand_primary.jpg", 5);

    block_on(join(h.binder.change_color("blue"), h.binder.change_color("sand")));

    assert_eq!(
        h.log.names(),
        vec!["colorChanged", "colorChanged", "error", "colorChanged", "error"]
    );
    assert_eq!(h.log.events()[3], ConfiguratorEvent::ColorChanged("red".into()));
    assert_eq!(h.binder.state(), selection("red", "selected", "studio"));
    assert!(h.viewer.applied().is_empty());
}

#[test]
fn failed_change_leaves_a_newer_selection_alone() {
    let h = ready();
    h.viewer.fail_url("textures/blue_primary.jpg");
    h.viewer.delay_url("textures/blue_primary.jpg", 1);
    h.viewer.delay_url("textures/sand_primary.jpg", 5);

    block_on(join(h.binder.change_color("blue"), h.binder.change_color("sand")));

    assert_eq!(
        h.log.names(),
        vec!["colorChanged", "colorChanged", "error", "strapChanged"]
    );
    assert_eq!(h.binder.state(), selection("sand", "selected", "studio"));
    assert_eq!(h.viewer.base_color_of("Case").as_deref(), Some("textures/sand_primary.jpg"));
}

#[test]
fn overlapping_changes_leave_the_last_finished_textures() {
    let h = ready();
    h.viewer.delay_url("textures/blue_primary.jpg", 5);
    h.viewer.delay_url("textures/sand_primary.jpg", 1);

    block_on(join(h.binder.change_color("blue"), h.binder.change_color("sand")));

    // The selection names the last call; the slots hold whichever finished last.
    assert_eq!(h.binder.state().color, "sand");
    assert_eq!(h.viewer.base_color_of("Case").as_deref(), Some("textures/blue_primary.jpg"));
    assert_eq!(h.viewer.base_color_of("Strap").as_deref(), Some("textures/blue_accent.jpg"));
    assert!(h.log.names().iter().all(|n| *n != "error"));
}

#[test]
fn failure_after_a_success_rolls_back_to_that_success() {
    let h = ready();
    block_on(h.binder.change_color("blue"));
    h.viewer.fail_url("textures/sand_accent.jpg");
    h.log.clear();
    block_on(h.binder.change_color("sand"));
    assert_eq!(h.binder.state(), selection("blue", "selected", "studio"));
    assert_eq!(h.log.events()[1], ConfiguratorEvent::ColorChanged("blue".into()));
}

#[test]
fn same_color_twice_is_a_noop() {
    let h = ready();
    block_on(h.binder.change_color("blue"));
    let loads = h.viewer.loads().len();
    h.log.clear();
    block_on(h.binder.change_color("blue"));
    assert!(h.log.names().is_empty());
    assert_eq!(h.viewer.loads().len(), loads);
}

#[test]
fn unknown_ids_leave_state_untouched() {
    let h = ready();
    let before = h.binder.state();
    block_on(h.binder.change_color("nonexistent"));
    block_on(h.binder.change_strap("nonexistent"));
    h.binder.change_environment("nonexistent");
    assert_eq!(h.binder.state(), before);
    assert!(h.log.names().is_empty());
}

#[test]
fn failed_color_rolls_back_and_reports() {
    let h = ready();
    h.viewer.fail_url("textures/blue_accent.jpg");
    block_on(h.binder.change_color("blue"));

    assert_eq!(h.binder.state().color, "red");
    assert_eq!(h.binder.state().strap, "selected");
    let events = h.log.events();
    assert_eq!(h.log.names(), vec!["colorChanged", "colorChanged", "error"]);
    assert_eq!(events[0], ConfiguratorEvent::ColorChanged("blue".into()));
    assert_eq!(events[1], ConfiguratorEvent::ColorChanged("red".into()));
    match &events[2] {
        ConfiguratorEvent::Error(info) => {
            assert_eq!(info.kind, ErrorKind::Network);
            assert_eq!(info.timestamp, 1_000.0);
            assert!(info.details.as_deref().unwrap_or("").contains("blue_accent"));
        }
        other => panic!("expected error event, got {other:?}"),
    }

    // Still usable afterwards.
    h.viewer.heal();
    block_on(h.binder.change_color("blue"));
    assert_eq!(h.binder.state().color, "blue");
}

#[test]
fn failed_strap_snap_restores_previous_strap() {
    let h = ready();
    block_on(h.binder.change_strap("leather"));
    h.viewer.fail_material("Strap");
    h.log.clear();
    block_on(h.binder.change_color("blue"));
    assert_eq!(h.binder.state(), selection("red", "leather", "studio"));
    assert_eq!(h.log.names(), vec!["colorChanged", "colorChanged", "error"]);
}

#[test]
fn render_failure_is_reported_as_webgl() {
    let h = ready();
    h.viewer.fail_material("Case");
    block_on(h.binder.change_color("sand"));
    let kinds: Vec<ErrorKind> = h
        .log
        .events()
        .into_iter()
        .filter_map(|e| match e {
            ConfiguratorEvent::Error(info) => Some(info.kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![ErrorKind::Webgl]);
}

#[test]
fn change_strap_keeps_color() {
    let h = ready();
    for strap in ["leather", "steel", "selected"] {
        block_on(h.binder.change_strap(strap));
        assert_eq!(h.binder.state().strap, strap);
        assert_eq!(h.binder.state().color, "red");
    }
    assert_eq!(h.log.names(), vec!["strapChanged", "strapChanged", "strapChanged"]);
    assert_eq!(h.viewer.base_color_of("Strap").as_deref(), Some("textures/red_accent.jpg"));
}

#[test]
fn fixed_strap_uses_its_own_texture() {
    let h = ready();
    block_on(h.binder.change_strap("steel"));
    assert_eq!(h.viewer.base_color_of("Strap").as_deref(), Some("textures/strap_steel.jpg"));
}

#[test]
fn failed_strap_rolls_back() {
    let h = ready();
    h.viewer.fail_url("textures/strap_leather.jpg");
    block_on(h.binder.change_strap("leather"));
    assert_eq!(h.binder.state().strap, "selected");
    assert_eq!(h.log.names(), vec!["error"]);
}

#[test]
fn environment_change_sets_background_without_textures() {
    let h = ready();
    let loads = h.viewer.loads().len();
    h.binder.change_environment("dusk");
    assert_eq!(h.binder.state().environment, "dusk");
    assert_eq!(h.log.events(), vec![ConfiguratorEvent::EnvironmentChanged("dusk".into())]);
    assert_eq!(h.viewer.applied(), vec![Applied::Background("#2b1f3a".into())]);
    assert_eq!(h.viewer.loads().len(), loads);
}

#[test]
fn reset_returns_to_defaults() {
    let h = ready();
    block_on(h.binder.change_color("blue"));
    block_on(h.binder.change_strap("steel"));
    h.binder.change_environment("forest");
    h.log.clear();

    block_on(h.binder.reset());
    let defaults = selection("red", "selected", "studio");
    assert_eq!(h.binder.state(), defaults);
    assert_eq!(h.log.events().last(), Some(&ConfiguratorEvent::Reset(defaults)));
}

#[test]
fn reset_from_defaults_only_emits_reset() {
    let h = ready();
    block_on(h.binder.reset());
    assert_eq!(h.log.names(), vec!["reset"]);
}

#[test]
fn snapshot_is_a_copy() {
    let h = ready();
    let mut snap = h.binder.state();
    snap.color = "blue".into();
    assert_eq!(h.binder.state().color, "red");
}

#[test]
fn share_url_round_trips_through_url_params() {
    let h = ready();
    block_on(h.binder.change_color("sand"));
    block_on(h.binder.change_strap("leather"));
    h.binder.change_environment("dusk");
    let link = h.binder.share_url("https://shop.example.com/configure?ref=nav").unwrap();

    let other = ready();
    let params = UrlParams::from_url(&link).unwrap();
    block_on(other.binder.apply_url_params(&params));
    assert_eq!(other.binder.state(), h.binder.state());
}

#[test]
fn url_params_skip_unknown_values() {
    let h = ready();
    let params = UrlParams::from_query("?color=purple&strap=steel&environment=moon");
    block_on(h.binder.apply_url_params(&params));
    assert_eq!(h.binder.state(), selection("red", "steel", "studio"));
}

#[test]
fn changes_before_initialize_are_reported_as_user_errors() {
    let h = harness();
    block_on(h.binder.change_color("blue"));
    assert_eq!(h.binder.state().color, "red");
    match h.log.events().last() {
        Some(ConfiguratorEvent::Error(info)) => assert_eq!(info.kind, ErrorKind::User),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn teardown_clears_cache_and_listeners() {
    let h = ready();
    assert!(!h.binder.cache().is_empty());
    h.binder.teardown();
    assert!(h.binder.cache().is_empty());
    assert_eq!(h.binder.context().bus.listener_count(), 0);
    assert!(!h.binder.is_initialized());
}

#[test]
fn preload_after_teardown_loads_nothing() {
    let h = ready();
    h.binder.teardown();
    let loads = h.viewer.loads().len();
    let summary = block_on(h.binder.preload_textures(|_| ready_now(())));
    assert_eq!(summary.loaded, 0);
    assert_eq!(h.viewer.loads().len(), loads);
    assert!(h.binder.cache().is_empty());
}
