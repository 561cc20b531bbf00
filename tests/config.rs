//! Loading systems from configuration

use orrery::{MagnitudeAlgorithm, OrreryError, PlanetType, SystemConfig, Timescale};
use std::io::Write;
use tempfile::NamedTempFile;

const SMALL_SYSTEM: &str = r#"{
    "settings": {"magnitude_algorithm": "Mueller_1893", "cache_capacity": 4, "parallel": false},
    "bodies": [
        {"name": "Moonlet", "parent": "Rock", "type": "moon",
         "orbit": {"model": "osculating", "elements": [
            {"epoch": 2451545.0, "a": 0.001, "e": 0.0, "i": 0.0, "node": 0.0,
             "arg_perihelion": 0.0, "mean_anomaly": 0.0, "gm": 1e-9}]}},
        {"name": "Rock", "parent": "Star", "type": "asteroid", "radius_km": 100.0,
         "absolute_magnitude": 7.0, "slope": 0.15,
         "orbit": {"model": "osculating", "elements": [
            {"epoch": 2451545.0, "a": 2.5, "e": 0.1, "i": 5.0, "node": 30.0,
             "arg_perihelion": 60.0, "mean_anomaly": 90.0}]},
         "rotation": {"period": 0.3, "obliquity": 20.0}},
        {"name": "Star", "type": "star", "radius_km": 696000.0,
         "orbit": {"model": "fixed"}}
    ]
}"#;

#[test]
fn test_records_in_any_order() {
    let config = SystemConfig::from_json_str(SMALL_SYSTEM).unwrap();
    assert_eq!(config.settings.magnitude_algorithm, MagnitudeAlgorithm::Mueller1893);

    let system = config.build();
    assert!(system.rejected().is_empty());
    assert_eq!(system.len(), 3);
    let star = system.id_of("Star").unwrap();
    let rock = system.id_of("Rock").unwrap();
    let moonlet = system.id_of("Moonlet").unwrap();
    assert_eq!(system.root(), Some(star));
    assert_eq!(system.get(rock).unwrap().parent(), Some(star));
    assert_eq!(system.get(moonlet).unwrap().parent(), Some(rock));
    assert_eq!(system.get(rock).unwrap().kind(), PlanetType::Asteroid);
    assert!(!system.settings().parallel);
}

#[test]
fn test_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(SMALL_SYSTEM.as_bytes()).unwrap();
    let config = SystemConfig::from_file(file.path()).unwrap();
    assert_eq!(config.bodies.len(), 3);
    assert_eq!(config.settings.cache_capacity, 4);

    let mut system = config.build();
    system.advance_to(&Timescale::default().tt_jd(2_451_545.0)).unwrap();
    let rock = system.id_of("Rock").unwrap();
    let r = system.heliocentric_ecliptic_pos(rock).unwrap().norm();
    assert!((2.25..2.75).contains(&r));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = SystemConfig::from_file(dir.path().join("missing.json"));
    assert!(matches!(result, Err(OrreryError::Io(_))));
}

#[test]
fn test_malformed_json_is_json_error() {
    assert!(matches!(
        SystemConfig::from_json_str("{\"bodies\": [}"),
        Err(OrreryError::Json(_))
    ));
}

#[test]
fn test_oversized_cache_capacity_is_rejected() {
    let json = SMALL_SYSTEM.replace(
        "\"cache_capacity\": 4",
        "\"cache_capacity\": 18446744073709551615",
    );
    assert!(matches!(
        SystemConfig::from_json_str(&json),
        Err(OrreryError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_oversized_cache_capacity_still_builds() {
    let mut config = SystemConfig::from_json_str(SMALL_SYSTEM).unwrap();
    config.settings.cache_capacity = usize::MAX;
    let mut system = config.build();
    system.advance_to(&Timescale::default().tt_jd(2_451_545.0)).unwrap();
    let rock = system.id_of("Rock").unwrap();
    assert!(system.heliocentric_ecliptic_pos_at(rock, 2_451_600.5).is_ok());
}

#[test]
fn test_unknown_magnitude_algorithm() {
    let err = "Herschel_1800".parse::<MagnitudeAlgorithm>().unwrap_err();
    assert!(matches!(err, OrreryError::UnknownMagnitudeAlgorithm(_)));

    let json = SMALL_SYSTEM.replace("Mueller_1893", "Herschel_1800");
    assert!(SystemConfig::from_json_str(&json).is_err());
}

#[test]
fn test_invalid_bodies_are_rejected_with_their_children() {
    let json = SMALL_SYSTEM.replace("\"period\": 0.3", "\"period\": -0.3");
    let system = SystemConfig::from_json_str(&json).unwrap().build();

    let names: Vec<_> = system.rejected().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Rock", "Moonlet"]);
    assert!(system.find("Star").is_some());
    assert!(system.find("Rock").is_none());
    assert_eq!(system.len(), 1);
}

#[test]
fn test_unknown_parent_and_duplicates_are_rejected() {
    let mut config = SystemConfig::from_json_str(SMALL_SYSTEM).unwrap();
    let mut stray = config.bodies[1].clone();
    stray.name = "Stray".into();
    stray.parent = Some("Nemesis".into());
    let duplicate = config.bodies[2].clone();
    config.bodies.push(stray);
    config.bodies.push(duplicate);

    let system = config.build();
    let reasons: Vec<_> = system
        .rejected()
        .iter()
        .map(|r| (r.name.as_str(), r.reason.as_str()))
        .collect();
    assert_eq!(reasons.len(), 2);
    assert!(reasons.iter().any(|(name, reason)| *name == "Stray" && reason.contains("Nemesis")));
    assert!(reasons.iter().any(|(name, _)| *name == "Star"));
    assert_eq!(system.len(), 3);
}

#[test]
fn test_builtin_round_trips_through_json() {
    let config = SystemConfig::solar_system().unwrap();
    let text = config.to_json_string().unwrap();
    let again = SystemConfig::from_json_str(&text).unwrap();
    assert_eq!(config, again);
}
