//! Integration tests for rot-frontend
//!
//! These tests drive the frontend end to end with the simulated rotator
//! and the scripted test backend.

use std::ops::ControlFlow;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use rot_frontend::testing::{scripted_caps, MockSerial, Probe};
use rot_frontend::{
    CapsRegistry, ErrorKind, Position, PortType, RotId, RotManager, RotModel, RotResult,
    RotatorConfig,
};

// =============================================================================
// Helpers
// =============================================================================

const SCRIPTED: RotModel = RotModel(150);

fn load_dummy(registry: &CapsRegistry) -> RotResult<()> {
    for caps in rot_dummy::all_caps() {
        registry.register(caps)?;
    }
    Ok(())
}

fn manager() -> (RotManager, Arc<MockSerial>, Arc<Probe>) {
    let registry = Arc::new(CapsRegistry::new());
    registry.register_loader(rot_dummy::DUMMY_BACKEND, load_dummy);

    let probe = Probe::new();
    registry
        .register(scripted_caps(SCRIPTED, PortType::Serial, probe.clone()))
        .unwrap();

    let serial = Arc::new(MockSerial::new());
    (
        RotManager::with_serial(registry, serial.clone()),
        serial,
        probe,
    )
}

/// Open handles must be exactly the registry entries
fn assert_registry_consistent(mgr: &RotManager) {
    for id in mgr.handles() {
        assert_eq!(
            mgr.is_open(id),
            mgr.opened().contains(id),
            "registry out of sync for {}",
            id
        );
    }
    assert_eq!(
        mgr.opened().len(),
        mgr.handles().into_iter().filter(|id| mgr.is_open(*id)).count()
    );
}

// =============================================================================
// Opened-handle traversal
// =============================================================================

#[test]
fn test_traversal_is_most_recent_first() {
    let (mut mgr, _, _) = manager();
    let a = mgr.create(rot_dummy::MODEL_DUMMY).unwrap();
    let b = mgr.create(rot_dummy::MODEL_DUMMY).unwrap();
    let c = mgr.create(rot_dummy::MODEL_DUMMY).unwrap();
    for id in [a, b, c] {
        mgr.open(id).unwrap();
    }

    let mut seen = Vec::new();
    let visited = mgr.for_each_opened(|id, _| {
        seen.push(id);
        ControlFlow::Continue(())
    });

    assert_eq!(visited, 3);
    assert_eq!(seen, vec![c, b, a]);
}

#[test]
fn test_traversal_stops_early() {
    let (mut mgr, _, _) = manager();
    let ids: Vec<RotId> = (0..3)
        .map(|_| mgr.create(rot_dummy::MODEL_DUMMY).unwrap())
        .collect();
    for id in &ids {
        mgr.open(*id).unwrap();
    }

    let mut seen = Vec::new();
    let visited = mgr.for_each_opened(|id, _| {
        seen.push(id);
        if id == ids[1] {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });

    assert_eq!(visited, 2);
    assert_eq!(seen, vec![ids[2], ids[1]]);
}

#[test]
fn test_traversal_reaches_handles() {
    let (mut mgr, _, _) = manager();
    let a = mgr.create(rot_dummy::MODEL_DUMMY).unwrap();
    let b = mgr.create(rot_dummy::MODEL_DUMMY).unwrap();
    mgr.open(a).unwrap();
    mgr.open(b).unwrap();

    mgr.for_each_opened(|_, rot| {
        rot.set_position(200.0, 15.0).unwrap();
        ControlFlow::Continue(())
    });

    for id in [a, b] {
        assert_eq!(mgr.get_position(id).unwrap(), Position::new(200.0, 15.0));
    }
}

#[test]
fn test_empty_traversal() {
    let (mut mgr, _, _) = manager();
    mgr.create(rot_dummy::MODEL_DUMMY).unwrap();
    assert_eq!(mgr.for_each_opened(|_, _| ControlFlow::Continue(())), 0);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_registry_tracks_open_handles() {
    let (mut mgr, serial, _) = manager();
    let dummy = mgr.create(rot_dummy::MODEL_DUMMY).unwrap();
    let scripted = mgr.create(SCRIPTED).unwrap();
    assert_registry_consistent(&mgr);

    mgr.open(dummy).unwrap();
    assert_registry_consistent(&mgr);
    mgr.open(scripted).unwrap();
    assert_registry_consistent(&mgr);
    assert_eq!(mgr.opened().iter().collect::<Vec<_>>(), vec![scripted, dummy]);

    mgr.close(dummy).unwrap();
    assert_registry_consistent(&mgr);
    assert!(mgr.open(scripted).is_err());
    assert_registry_consistent(&mgr);

    mgr.destroy(scripted).unwrap();
    assert_registry_consistent(&mgr);
    assert!(mgr.opened().is_empty());
    assert_eq!(serial.opened(), serial.released());
}

#[test]
fn test_lazy_backend_loading() {
    let (mut mgr, _, _) = manager();
    assert!(mgr.caps_registry().get(RotModel(1)).is_some());

    let err = mgr.create(RotModel(99)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = mgr.create(RotModel(4201)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_dummy_defaults() {
    let (mut mgr, _, _) = manager();
    let id = mgr.create(rot_dummy::MODEL_DUMMY).unwrap();
    let rot = mgr.rot(id).unwrap();

    assert_eq!(rot.caps().model_name, "Dummy");
    assert_eq!(rot.state().port.port_type, PortType::None);
    assert_eq!(
        (rot.state().min_az, rot.state().max_az),
        (0.0, 360.0)
    );
    assert_eq!(
        (rot.state().min_el, rot.state().max_el),
        (0.0, 90.0)
    );
}

// =============================================================================
// Positioning and info
// =============================================================================

#[test]
fn test_dummy_position_round_trip() {
    let (mut mgr, _, _) = manager();
    let id = mgr.create(rot_dummy::MODEL_DUMMY).unwrap();
    mgr.open(id).unwrap();

    mgr.set_position(id, 123.0, 45.0).unwrap();
    assert_eq!(mgr.get_position(id).unwrap(), Position::new(123.0, 45.0));
    assert_eq!(
        mgr.rot(id).unwrap().state().current,
        Position::new(123.0, 45.0)
    );
}

#[test]
fn test_dummy_info() {
    let (mut mgr, _, _) = manager();
    let id = mgr.create(rot_dummy::MODEL_DUMMY).unwrap();
    assert_eq!(mgr.get_info(id), Some("Hamlib Dummy v0.1"));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_token_lookup_and_magic_conf() {
    let (mut mgr, _, _) = manager();
    let id = mgr.create(rot_dummy::MODEL_DUMMY).unwrap();

    let token = mgr.token_lookup(id, "mcfg").unwrap();
    assert_eq!(token, rot_dummy::TOK_MAGICCONF);
    assert_eq!(mgr.get_conf(id, token).unwrap(), "DX");

    mgr.set_conf(id, token, "QRZ").unwrap();
    assert_eq!(mgr.get_conf(id, token).unwrap(), "QRZ");

    assert_eq!(
        mgr.token_lookup(id, "no_such_param").unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn test_conf_params_of_dummy() {
    let (mut mgr, _, _) = manager();
    let id = mgr.create(rot_dummy::MODEL_DUMMY).unwrap();

    let rot = mgr.rot(id).unwrap();
    let mcfg = rot.conf_params().find(|p| p.name == "mcfg").unwrap();
    assert_eq!(mcfg.label, "Magic conf");
    assert_eq!(mcfg.default, "DX");
    assert!(rot.conf_params().any(|p| p.name == "serial_speed"));
}

#[test]
fn test_config_file_applies_to_serial_handle() {
    let (mut mgr, serial, probe) = manager();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rotator.toml");
    std::fs::write(
        &path,
        r#"
model = 150

[conf]
rot_pathname = "/dev/ttyUSB1"
serial_speed = 19200
serial_parity = "Even"
speed = 2
"#,
    )
    .unwrap();

    let cfg = RotatorConfig::from_file(&path).unwrap();
    let id = mgr.create(cfg.model).unwrap();
    mgr.apply_config(id, &cfg).unwrap();
    mgr.open(id).unwrap();

    let port = &mgr.rot(id).unwrap().state().port;
    assert_eq!(port.pathname, "/dev/ttyUSB1");
    assert_eq!(port.serial.rate, 19200);
    assert!(port.is_attached());
    assert_eq!(serial.opened(), 1);
    assert_eq!(probe.opens(), 1);
}
