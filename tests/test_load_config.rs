use std::env;

use serial_test::serial;

use substitution_checker::config::{load_config, RunMode};

const REQUIRED: [&str; 7] = [
    "OPENAI_API_KEY",
    "EMAIL_USERNAME",
    "EMAIL_PASSWORD",
    "RECIPIENT_EMAIL",
    "AUTH_USERNAME",
    "AUTH_PASSWORD",
    "PDF_URL",
];

fn clear_env() {
    for name in REQUIRED {
        env::remove_var(name);
    }
    env::remove_var("MODE");
    env::remove_var("GITHUB_ACTIONS");
}

fn set_required() {
    env::set_var("OPENAI_API_KEY", "sk-test");
    env::set_var("EMAIL_USERNAME", "sender@example.com");
    env::set_var("EMAIL_PASSWORD", "mail-secret");
    env::set_var("RECIPIENT_EMAIL", "recipient@example.com");
    env::set_var("AUTH_USERNAME", "school-user");
    env::set_var("AUTH_PASSWORD", "school-pass");
    env::set_var("PDF_URL", "https://school.example/plan.pdf");
}

#[test]
#[serial]
fn complete_environment_loads() {
    clear_env();
    set_required();

    let config = load_config().expect("Complete environment should load");

    assert_eq!(config.plan_url, "https://school.example/plan.pdf");
    assert_eq!(config.recipient_email, "recipient@example.com");
    assert_eq!(config.auth_username, "school-user");
    assert_eq!(config.mode, RunMode::Email, "MODE defaults to email");
    assert!(
        !config.scheduled,
        "Runs are unscheduled unless the workflow marker is set"
    );
}

#[test]
#[serial]
fn missing_values_are_reported_together() {
    clear_env();
    set_required();
    env::remove_var("EMAIL_PASSWORD");
    env::remove_var("PDF_URL");

    let err = load_config().expect_err("Incomplete environment should fail");

    assert_eq!(err.missing.len(), 2, "Both names should be reported at once");
    assert!(err.missing.contains(&"EMAIL_PASSWORD".to_string()));
    assert!(err.missing.contains(&"PDF_URL".to_string()));

    let msg = err.to_string();
    assert!(
        msg.contains("EMAIL_PASSWORD") && msg.contains("PDF_URL"),
        "Message should itemize every missing name, got: {msg}"
    );
}

#[test]
#[serial]
fn blank_values_count_as_missing() {
    clear_env();
    set_required();
    env::set_var("AUTH_PASSWORD", "   ");

    let err = load_config().expect_err("A blank value should fail");
    assert_eq!(err.missing, vec!["AUTH_PASSWORD".to_string()]);
}

#[test]
#[serial]
fn mode_test_selects_a_dry_run() {
    clear_env();
    set_required();
    env::set_var("MODE", "test");

    let config = load_config().expect("Environment should load");
    assert_eq!(config.mode, RunMode::DryRun);
}

#[test]
#[serial]
fn scheduled_flag_follows_the_workflow_marker() {
    clear_env();
    set_required();
    env::set_var("GITHUB_ACTIONS", "true");

    let config = load_config().expect("Environment should load");
    assert!(config.scheduled);
}
