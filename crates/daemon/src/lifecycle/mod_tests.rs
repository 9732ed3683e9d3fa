// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use tempfile::tempdir;

const AGENT_VARS: &[&str] = &[
    "SIGNAGE_CONFIG",
    "SIGNAGE_SERVER_URL",
    "DEVICE_ID",
    "CHECK_INTERVAL",
    "RAPID_CHECK_INTERVAL",
    "MEDIA_DIR",
    "SIGNAGE_STATE_DIR",
    "XDG_STATE_HOME",
    "SCREEN_INDEX",
    "SIGNAGE_PLAYER",
    "SIGNAGE_REBOOT_COMMAND",
    "SIGNAGE_UPDATE_URL",
    "SIGNAGE_STOP_TIMEOUT_MS",
    "SIGNAGE_WATCHDOG_MS",
    "SIGNAGE_RETRY_DELAY_MS",
];

/// Run `f` with only `vars` set among the agent's variables.
fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
    for key in AGENT_VARS {
        std::env::remove_var(key);
    }
    for (key, value) in vars {
        std::env::set_var(key, value);
    }
    let result = f();
    for (key, _) in vars {
        std::env::remove_var(key);
    }
    result
}

#[test]
#[serial]
fn defaults_apply_without_file_or_env() {
    let config = with_env(&[("SIGNAGE_STATE_DIR", "/var/lib/signage")], || {
        Config::resolve(FileConfig::default()).unwrap()
    });

    assert_eq!(config.server_url, "http://localhost:5000");
    assert_eq!(config.device_id, "device-001");
    assert_eq!(config.heartbeat_interval, Duration::from_secs(60));
    assert_eq!(config.rapid_interval, Duration::from_secs(2));
    assert_eq!(config.player, "vlc");
    assert_eq!(config.reboot_command, vec!["sudo", "reboot"]);
    assert_eq!(config.update_url, "http://localhost:5000/download/signaged");
    assert_eq!(config.lock_path(), PathBuf::from("/var/lib/signage/signaged.pid"));
    assert_eq!(config.manifest_path(), PathBuf::from("/var/lib/signage/current.m3u"));
    assert_eq!(config.log_dir(), PathBuf::from("/var/lib/signage/logs"));
}

#[test]
#[serial]
fn file_overrides_defaults_and_env_overrides_file() {
    let file: FileConfig = toml::from_str(
        r#"
        server_url = "http://signage.local:8080/"
        device_id = "lobby"
        check_interval = 30
        rapid_check_interval = 5
        screen_index = 1
        reboot_command = ["systemctl", "reboot"]
        "#,
    )
    .unwrap();

    let config = with_env(
        &[
            ("SIGNAGE_STATE_DIR", "/tmp/state"),
            ("DEVICE_ID", "entrance"),
            ("RAPID_CHECK_INTERVAL", "3"),
            ("SIGNAGE_WATCHDOG_MS", "250"),
        ],
        || Config::resolve(file).unwrap(),
    );

    assert_eq!(config.server_url, "http://signage.local:8080");
    assert_eq!(config.update_url, "http://signage.local:8080/download/signaged");
    assert_eq!(config.device_id, "entrance");
    assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
    assert_eq!(config.rapid_interval, Duration::from_secs(3));
    assert_eq!(config.screen_index, 1);
    assert_eq!(config.reboot_command, vec!["systemctl", "reboot"]);
    assert_eq!(config.watchdog_interval, Duration::from_millis(250));
}

#[test]
#[serial]
fn state_dir_precedence() {
    let file = || FileConfig { state_dir: Some("/srv/signage".into()), ..FileConfig::default() };

    let from_file =
        with_env(&[("XDG_STATE_HOME", "/home/kiosk/.local/state")], || Config::resolve(file()));
    assert_eq!(from_file.unwrap().state_dir, PathBuf::from("/srv/signage"));

    let explicit = with_env(
        &[("XDG_STATE_HOME", "/home/kiosk/.local/state"), ("SIGNAGE_STATE_DIR", "/run/signage")],
        || Config::resolve(file()),
    );
    assert_eq!(explicit.unwrap().state_dir, PathBuf::from("/run/signage"));

    let from_xdg = with_env(&[("XDG_STATE_HOME", "/home/kiosk/.local/state")], || {
        Config::resolve(FileConfig::default())
    });
    assert_eq!(from_xdg.unwrap().state_dir, PathBuf::from("/home/kiosk/.local/state/signage"));
}

#[test]
#[serial]
fn invalid_interval_env_falls_back() {
    for value in ["0", "-5", "soon", "  "] {
        let config = with_env(
            &[("SIGNAGE_STATE_DIR", "/tmp/state"), ("CHECK_INTERVAL", value)],
            || Config::resolve(FileConfig::default()).unwrap(),
        );
        assert_eq!(config.heartbeat_interval, Duration::from_secs(60), "CHECK_INTERVAL={value:?}");
    }
}

#[test]
#[serial]
fn load_reads_file_named_by_env() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("agent.toml");
    std::fs::write(&path, "device_id = \"from-file\"\nplayer = \"cvlc\"\n").unwrap();

    let config = with_env(
        &[("SIGNAGE_CONFIG", path.to_str().unwrap()), ("SIGNAGE_STATE_DIR", "/tmp/state")],
        || Config::load().unwrap(),
    );

    assert_eq!(config.device_id, "from-file");
    assert_eq!(config.player, "cvlc");
}

#[test]
#[serial]
fn missing_file_is_empty_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let config = with_env(
        &[("SIGNAGE_CONFIG", path.to_str().unwrap()), ("SIGNAGE_STATE_DIR", "/tmp/state")],
        || Config::load().unwrap(),
    );

    assert_eq!(config.device_id, "device-001");
}

#[test]
fn unknown_key_is_a_config_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("agent.toml");
    std::fs::write(&path, "device = \"typo\"\n").unwrap();

    let err = FileConfig::read(&path).unwrap_err();

    assert!(matches!(err, LifecycleError::Config { .. }));
    assert!(err.to_string().contains("agent.toml"));
}
