use wayline_cli::load_plan;

#[test]
fn loads_plan_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.json");
    std::fs::write(
        &path,
        r#"{
            "settings": {
                "name": "Lake View",
                "finish_action": "auto_land",
                "takeoff_security_height_m": 25.0,
                "global_transitional_speed_mps": 6.0
            },
            "waypoints": [
                { "lat": 33.7101, "lon": 73.1201, "altitude_m": 50.0, "speed_mps": 6.0 },
                { "lat": 33.7111, "lon": 73.1211, "altitude_m": 50.0, "speed_mps": 6.0,
                  "turn_mode": "coordinate_turn" }
            ]
        }"#,
    )
    .unwrap();

    let plan = load_plan(&path).unwrap();
    assert_eq!(plan.slug(), "lake-view");
    assert_eq!(plan.settings.finish_action.as_wpml(), "autoLand");
    assert_eq!(plan.waypoints[1].turn_mode.as_wpml(), "coordinateTurn");
    // no point of interest: camera points straight down
    assert!(plan.waypoints.iter().all(|w| w.gimbal_pitch_deg == -90.0));
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = load_plan(&path).unwrap_err();
    assert!(format!("{err:#}").contains("absent.json"));
}
