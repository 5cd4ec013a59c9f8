//! Tests for `cloak set/get/rm/ls`.

mod support;
use support::{assert_failure, assert_success, stderr, stdout, TestEnv};

#[test]
fn test_set_and_get_roundtrip() {
    let env = TestEnv::new();
    assert_success(&env.init());

    let output = env.set("demo", "DATABASE_URL", "postgres://localhost/db");
    assert_success(&output);
    assert!(stdout(&output).contains("added DATABASE_URL to demo"));

    let output = env.get("demo", "DATABASE_URL");
    assert_success(&output);
    assert_eq!(stdout(&output), "postgres://localhost/db\n");
}

#[test]
fn test_set_same_key_updates_without_duplicate() {
    let env = TestEnv::new();
    assert_success(&env.init());

    env.set("demo", "TOKEN", "first");
    let output = env.set("demo", "TOKEN", "second");
    assert_success(&output);
    assert!(stdout(&output).contains("updated TOKEN in demo"));

    let output = env.get("demo", "TOKEN");
    assert_eq!(stdout(&output), "second\n");
}

#[test]
fn test_set_joins_multiple_words() {
    let env = TestEnv::new();
    assert_success(&env.init());

    let output = env
        .cmd()
        .args(["set", "GREETING", "hello", "brave", "world", "-p", "demo"])
        .output()
        .unwrap();
    assert_success(&output);

    let output = env.get("demo", "GREETING");
    assert_eq!(stdout(&output), "hello brave world\n");
}

#[test]
fn test_set_without_init_fails() {
    let env = TestEnv::new();

    let output = env.set("demo", "KEY", "value");
    assert_failure(&output);
    assert!(stderr(&output).contains("not initialized"));
}

#[test]
fn test_get_missing_key_fails() {
    let env = TestEnv::new();
    assert_success(&env.init());

    let output = env.get("demo", "NOPE");
    assert_failure(&output);
    assert!(stderr(&output).contains("not found"));
}

#[test]
fn test_rm_deletes_secret() {
    let env = TestEnv::new();
    assert_success(&env.init());
    env.set("demo", "DOOMED", "value");

    let output = env
        .cmd()
        .args(["rm", "DOOMED", "-p", "demo", "-y"])
        .output()
        .unwrap();
    assert_success(&output);
    assert!(stdout(&output).contains("deleted DOOMED from demo"));

    let output = env.get("demo", "DOOMED");
    assert_failure(&output);

    // The bundle file survives the last secret's removal.
    assert!(env.home.path().join("store").join("demo.json.age").exists());
}

#[test]
fn test_rm_missing_key_fails() {
    let env = TestEnv::new();
    assert_success(&env.init());
    env.set("demo", "KEEP", "value");

    let output = env
        .cmd()
        .args(["rm", "MISSING", "-p", "demo", "-y"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert!(stderr(&output).contains("not found"));
}

#[test]
fn test_ls_groups_and_masks() {
    let env = TestEnv::new();
    assert_success(&env.init());
    env.set("demo", "STRIPE_SECRET", "sk_live_123456789");
    env.set("demo", "RANDOM_THING", "abc");

    let output = env.cmd().args(["ls", "demo"]).output().unwrap();
    assert_success(&output);
    let out = stdout(&output);

    assert!(out.contains("[Payments]"));
    assert!(out.contains("[General]"));
    // Long values keep a 6-char prefix; the full value never appears.
    assert!(out.contains("sk_liv"));
    assert!(!out.contains("sk_live_123456789"));
    assert!(out.contains("***"));
}

#[test]
fn test_ls_empty_project() {
    let env = TestEnv::new();
    assert_success(&env.init());

    let output = env.cmd().args(["ls", "ghost"]).output().unwrap();
    assert_success(&output);
    assert!(stdout(&output).contains("no secrets in ghost"));
}

#[test]
fn test_project_names_sanitized_on_disk() {
    let env = TestEnv::new();
    assert_success(&env.init());

    let output = env.set("My App!", "KEY", "value");
    assert_success(&output);
    assert!(stdout(&output).contains("my-app"));

    assert!(env.home.path().join("store").join("my-app.json.age").exists());
}

#[test]
fn test_store_file_is_encrypted() {
    let env = TestEnv::new();
    assert_success(&env.init());
    env.set("demo", "SECRET_VALUE", "super-sensitive-plaintext");

    let raw = std::fs::read_to_string(env.home.path().join("store").join("demo.json.age")).unwrap();
    assert!(raw.starts_with("-----BEGIN AGE ENCRYPTED FILE-----"));
    assert!(!raw.contains("super-sensitive-plaintext"));
}
