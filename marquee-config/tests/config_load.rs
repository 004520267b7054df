use marquee_config::{LlmProvider, LogFormat, MarqueeConfigLoader};
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();

    let file_yaml = r#"
version: "0.1"
query:
  default: jazz
scraper:
  site_url: "https://www.ticketmaster.com/"
  headless: true
  render_wait_ms: 1500
llm:
  provider: azure
  model: "gpt-35-turbo"
  auth_token: "${MARQUEE_TEST_AZURE_KEY}"
  endpoint: "https://example.openai.azure.com"
  temperature: 0.2
output:
  path: "out/events.json"
logging:
  format: json
  filter: "marquee=debug"
  "#;
    let p = write_yaml(&tmp, "marquee.yaml", file_yaml);

    temp_env::with_var("MARQUEE_TEST_AZURE_KEY", Some("secret-key"), || {
        let config = MarqueeConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load config");

        assert_eq!(config.version.as_deref(), Some("0.1"));
        assert_eq!(config.query.default, "jazz");
        assert!(config.scraper.headless);
        assert_eq!(config.scraper.render_wait_ms, 1500);
        assert_eq!(config.scraper.search_selector, "#searchFormInput-input");
        assert_eq!(config.llm.provider, LlmProvider::Azure);
        assert_eq!(config.llm.auth_token.as_deref(), Some("secret-key"));
        assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.output.path, PathBuf::from("out/events.json"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.file_name, "agent.log");
    });
}

#[test]
#[serial]
fn missing_file_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = MarqueeConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults load");

    assert_eq!(config.query.default, "techno");
    assert_eq!(config.scraper.render_wait_ms, 3000);
    assert!(!config.scraper.headless);
    assert_eq!(config.scraper.webdriver_url, "http://localhost:9515");
    assert_eq!(config.output.path, PathBuf::from("events.json"));
    assert!(config.extractor.label_tags);
    assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
}

#[test]
#[serial]
fn required_file_must_exist() {
    let tmp = TempDir::new().unwrap();
    let result = MarqueeConfigLoader::new()
        .with_required_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}

#[test]
#[serial]
fn env_overrides_win_over_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(
        &tmp,
        "marquee.yaml",
        "scraper:\n  headless: false\noutput:\n  path: from-file.json\n",
    );

    temp_env::with_vars(
        [
            ("MARQUEE__SCRAPER__HEADLESS", Some("true")),
            ("MARQUEE__OUTPUT__PATH", Some("from-env.json")),
        ],
        || {
            let config = MarqueeConfigLoader::new().with_file(&p).load().unwrap();
            assert!(config.scraper.headless);
            assert_eq!(config.output.path, PathBuf::from("from-env.json"));
        },
    );
}

#[test]
#[serial]
fn unknown_provider_is_rejected() {
    let result = MarqueeConfigLoader::new()
        .with_yaml_str("llm:\n  provider: gemini\n")
        .load();
    assert!(result.is_err());
}
