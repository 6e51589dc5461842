use linkvet::handlers::*;
use linkvet_scanner::{Link, LinkCategory, Outcome};

#[test]
fn test_numeric_first_argument_is_worker_count() {
    let (workers, base_url) = parse_target_args(Some("4"), None);
    assert_eq!(workers, Some(4));
    assert_eq!(base_url, None);
}

#[test]
fn test_url_first_argument_overrides_base() {
    let (workers, base_url) = parse_target_args(Some("http://localhost:8000"), None);
    assert_eq!(workers, None);
    assert_eq!(base_url, Some("http://localhost:8000".to_string()));
}

#[test]
fn test_url_then_worker_count() {
    let (workers, base_url) = parse_target_args(Some("http://localhost:8000"), Some("6"));
    assert_eq!(workers, Some(6));
    assert_eq!(base_url, Some("http://localhost:8000".to_string()));
}

#[test]
fn test_non_numeric_second_argument_is_ignored() {
    let (workers, base_url) = parse_target_args(Some("http://localhost:8000"), Some("fast"));
    assert_eq!(workers, None);
    assert_eq!(base_url, Some("http://localhost:8000".to_string()));
}

#[test]
fn test_no_arguments_yields_defaults() {
    let (workers, base_url) = parse_target_args(None, None);
    assert_eq!(workers, None);
    assert_eq!(base_url, None);
}

#[test]
fn test_console_line_shows_verdict_and_url() {
    let passed = Outcome::pass(
        Link::new("#/home", "Home", LinkCategory::InternalHash),
        Some(200),
    );
    let line = outcome_console_line(&passed, false).unwrap();
    assert!(line.contains("PASS"));
    assert!(line.contains("Home"));
    assert!(line.contains("#/home"));

    let failed = Outcome::fail(
        Link::new("https://example.com/404", "Broken", LinkCategory::External),
        Some(404),
        "HTTP 404".to_string(),
    );
    let line = outcome_console_line(&failed, false).unwrap();
    assert!(line.contains("FAIL"));
}

#[test]
fn test_quiet_mode_suppresses_per_link_lines() {
    let outcome = Outcome::pass(
        Link::new("#/home", "Home", LinkCategory::InternalHash),
        Some(200),
    );
    assert!(outcome_console_line(&outcome, true).is_none());
}

#[test]
fn test_default_base_url_points_at_the_site() {
    assert!(DEFAULT_BASE_URL.starts_with("https://"));
    assert!(DEFAULT_BASE_URL.contains("ccri-cyberknights"));
}
