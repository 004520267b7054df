//! Loader for workspace configuration with YAML + environment overlays.
//!
//! Sources are merged in order: an optional `marquee.yaml`, inline YAML
//! snippets, then `MARQUEE__`-prefixed environment variables (`__` separates
//! nesting, e.g. `MARQUEE__SCRAPER__HEADLESS=true`). After merging, every
//! string value goes through `${VAR}` expansion. Every section has defaults,
//! so an empty configuration is valid.
use config::{Config, ConfigError, Environment, File};
use marquee_common::DEFAULT_QUERY;
pub use marquee_common::observability::LogFormat;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Default, Deserialize)]
pub struct MarqueeConfig {
    #[serde(default, deserialize_with = "version_string")]
    pub version: Option<String>,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_query")]
    pub default: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default: default_query(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScraperConfig {
    #[serde(default = "default_site_url")]
    pub site_url: String,
    #[serde(default = "default_search_selector")]
    pub search_selector: String,
    #[serde(default = "default_render_wait_ms")]
    pub render_wait_ms: u64,
    #[serde(default)]
    pub headless: bool,
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "default_element_timeout_ms")]
    pub element_timeout_ms: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            site_url: default_site_url(),
            search_selector: default_search_selector(),
            render_wait_ms: default_render_wait_ms(),
            headless: false,
            webdriver_url: default_webdriver_url(),
            element_timeout_ms: default_element_timeout_ms(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default = "default_max_markup_bytes")]
    pub max_markup_bytes: usize,
    #[serde(default = "default_true")]
    pub label_tags: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_markup_bytes: default_max_markup_bytes(),
            label_tags: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Azure,
    Openai,
}

/// Language model settings. For Azure, `model` is the deployment name and
/// `endpoint` the resource URL; for OpenAI, `endpoint` is the API base.
/// Unset values are resolved against provider defaults when the client is
/// built.
#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: None,
            auth_token: None,
            endpoint: None,
            api_version: None,
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_log_file")]
    pub file_name: String,
    #[serde(default = "default_true")]
    pub emit_stdout: bool,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            file_name: default_log_file(),
            emit_stdout: true,
            format: LogFormat::default(),
            filter: default_filter(),
        }
    }
}

fn default_query() -> String {
    DEFAULT_QUERY.into()
}
fn default_site_url() -> String {
    "https://www.ticketmaster.com/".into()
}
fn default_search_selector() -> String {
    "#searchFormInput-input".into()
}
fn default_render_wait_ms() -> u64 {
    3000
}
fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}
fn default_element_timeout_ms() -> u64 {
    30_000
}
fn default_max_markup_bytes() -> usize {
    16 * 1024 * 1024
}
fn default_true() -> bool {
    true
}
fn default_temperature() -> f32 {
    0.7
}
fn default_output_path() -> PathBuf {
    PathBuf::from("events.json")
}
fn default_log_file() -> String {
    "agent.log".into()
}
fn default_filter() -> String {
    "info".into()
}

// `version: 0.1` arrives as a number once YAML is parsed.
fn version_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct MarqueeConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_prefix: &'static str,
}

impl Default for MarqueeConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl MarqueeConfigLoader {
    /// Start with no file sources; `MARQUEE__` env overrides are applied last.
    ///
    /// ```
    /// use marquee_config::MarqueeConfigLoader;
    ///
    /// let config = MarqueeConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.query.default, "techno");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env_prefix: "MARQUEE",
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by
    /// suffix. A missing file is skipped so env-only setups still load.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Attach a file that must exist.
    pub fn with_required_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use marquee_config::{LlmProvider, MarqueeConfigLoader};
    ///
    /// let cfg = MarqueeConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// scraper:
    ///   headless: true
    ///   render_wait_ms: 500
    /// llm:
    ///   provider: openai
    ///   model: "gpt-4o-mini"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(cfg.scraper.headless);
    /// assert_eq!(cfg.scraper.render_wait_ms, 500);
    /// assert_eq!(cfg.llm.provider, LlmProvider::Openai);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use marquee_config::MarqueeConfigLoader;
    ///
    /// unsafe { std::env::set_var("DOC_AZURE_KEY", "injected-from-env"); }
    ///
    /// let config = MarqueeConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// llm:
    ///   provider: azure
    ///   auth_token: "${DOC_AZURE_KEY}"
    ///   endpoint: "https://example.openai.azure.com"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.llm.auth_token.as_deref(), Some("injected-from-env"));
    /// assert_eq!(config.llm.model, None);
    /// assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
    ///
    /// unsafe { std::env::remove_var("DOC_AZURE_KEY"); }
    /// ```
    pub fn load(self) -> Result<MarqueeConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(self.env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);
        if v.is_null() {
            v = Value::Object(serde_json::Map::new());
        }

        let typed: MarqueeConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
