//! Tests for `cloak init`.

mod support;
use support::{assert_failure, assert_success, stderr, stdout, TestEnv};

#[test]
fn test_init_file_mode_on_empty_home() {
    let env = TestEnv::new();

    let output = env.init();
    assert_success(&output);
    assert!(stdout(&output).contains("initialized"));

    let config = env.config_json();
    let machine = &config["machine"];
    assert!(!machine["id"].as_str().unwrap().is_empty());
    assert!(machine["public_key"].as_str().unwrap().starts_with("age1"));
    assert_eq!(config["key_storage"], "file");

    // Exactly one recipient: this machine's public key.
    let recipients = config["recipients"].as_array().unwrap();
    assert_eq!(recipients.len(), 1);
    assert_eq!(recipients[0], machine["public_key"]);

    // Private key landed in the keys directory, referenced from config.
    let key_file = config["key_file"].as_str().unwrap();
    assert!(std::path::Path::new(key_file).exists());
}

#[test]
fn test_init_twice_is_noop() {
    let env = TestEnv::new();

    assert_success(&env.init());
    let first = env.config_json();

    let output = env.init();
    assert_success(&output);
    assert!(stdout(&output).contains("already initialized"));

    let second = env.config_json();
    assert_eq!(first["machine"]["id"], second["machine"]["id"]);
    assert_eq!(first["machine"]["public_key"], second["machine"]["public_key"]);
}

#[test]
fn test_init_rejects_invalid_key_storage() {
    let env = TestEnv::new();

    let output = env
        .cmd()
        .args(["init", "--key-storage", "clay-tablet"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert!(stderr(&output).contains("invalid key storage"));
}

#[test]
fn test_init_custom_machine_name() {
    let env = TestEnv::new();

    let output = env
        .cmd()
        .args(["init", "--machine-name", "workstation"])
        .output()
        .unwrap();
    assert_success(&output);

    let config = env.config_json();
    assert_eq!(config["machine"]["name"], "workstation");
}
