//! Display names follow the physical device, not its table position.

use std::sync::Arc;

use tempchain::acquisition::{AcquisitionLoop, SharedState};
use tempchain::app::ports::KeyValueStore;
use tempchain::config::SensorConfig;
use tempchain::error::{Error, NameError};
use tempchain::registry::{LOGGING_KEY, SensorRegistry, UNKNOWN_SENSOR};

use super::mock_hw::{
    FixedClock, MemFiles, MemKv, MockBus, NoDelay, RecordingSink, rom, standard_frame,
};

#[test]
fn name_follows_device_across_reorder() {
    let kitchen = rom(0x28, 1);
    let cellar = rom(0x28, 2);
    let bus = MockBus::with_devices(&[
        (kitchen, standard_frame(0x0150)),
        (cellar, standard_frame(0x00A0)),
    ]);
    let shared = Arc::new(SharedState::new());
    let mut lp = AcquisitionLoop::new(bus.clone(), NoDelay, &SensorConfig::default(), shared.clone());
    let mut files = MemFiles::default();
    let clock = FixedClock::at(2024, 5, 1);
    let mut sink = RecordingSink::default();

    let mut registry = SensorRegistry::new(MemKv::default());
    registry.set_name(&kitchen.id(), "kitchen").unwrap();
    registry.set_name(&cellar.id(), "cellar").unwrap();

    lp.run_cycle(&mut files, &clock, &mut sink);
    let name_at = |i: usize| {
        let id = shared.readings.get(i).map(|r| r.address().id()).unwrap_or_default();
        registry.name_of(&id)
    };
    assert_eq!(name_at(0).as_str(), "kitchen");
    assert_eq!(name_at(1).as_str(), "cellar");

    bus.reverse_devices();
    shared.request_rescan();
    lp.run_cycle(&mut files, &clock, &mut sink);
    assert_eq!(name_at(0).as_str(), "cellar");
    assert_eq!(name_at(1).as_str(), "kitchen");
    assert_eq!(shared.readings.get(0).map(|r| r.celsius()), Some(10.0));
}

#[test]
fn unbound_identity_reads_unknown() {
    let registry = SensorRegistry::new(MemKv::default());
    assert_eq!(registry.name_of(&rom(0x28, 9).id()).as_str(), UNKNOWN_SENSOR);
}

#[test]
fn names_survive_a_new_registry_on_the_same_store() {
    let kv = MemKv::default();
    let id = rom(0x28, 4).id();
    SensorRegistry::new(kv.clone()).set_name(&id, "attic").unwrap();
    assert_eq!(SensorRegistry::new(kv).name_of(&id).as_str(), "attic");
}

#[test]
fn over_long_name_is_rejected_without_writing() {
    let kv = MemKv::default();
    let id = rom(0x28, 5).id();
    let mut registry = SensorRegistry::new(kv.clone());
    registry.set_name(&id, "garage").unwrap();

    let err = registry.set_name(&id, "fifteen-chars!!").unwrap_err();
    assert_eq!(err, Error::Name(NameError::TooLong { len: 15, max: 14 }));
    assert_eq!(kv.raw(&id).as_deref(), Some(&b"garage"[..]));

    // Exactly at the limit is fine.
    registry.set_name(&id, "fourteen-chars").unwrap();
    assert_eq!(registry.name_of(&id).as_str(), "fourteen-chars");
}

#[test]
fn empty_name_clears_binding() {
    let kv = MemKv::default();
    let id = rom(0x28, 6).id();
    let mut registry = SensorRegistry::new(kv.clone());
    registry.set_name(&id, "porch").unwrap();
    registry.set_name(&id, "").unwrap();
    assert!(!kv.exists(&id));
    assert_eq!(registry.name_of(&id).as_str(), UNKNOWN_SENSOR);
}

#[test]
fn logging_flag_defaults_off_and_persists() {
    let kv = MemKv::default();
    let mut registry = SensorRegistry::new(kv.clone());
    assert!(!registry.logging_enabled());
    registry.set_logging_enabled(true).unwrap();
    assert_eq!(kv.raw(LOGGING_KEY), Some(vec![1]));
    assert!(SensorRegistry::new(kv).logging_enabled());
}
