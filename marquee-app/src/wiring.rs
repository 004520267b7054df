//! Turns loaded configuration into the collaborators the pipeline needs.
use anyhow::{Context, Result, bail};
use marquee_common::observability::LogConfig;
use marquee_config::{LlmConfig, LlmProvider, LoggingConfig, MarqueeConfig};
use marquee_drivers::browser::driver::DriverOptions;
use marquee_llm::config::{ChatEndpoint, DEFAULT_AZURE_API_VERSION};
use marquee_llm::{
    DEFAULT_AZURE_DEPLOYMENT, DEFAULT_OPENAI_MODEL, OPENAI_API_BASE, build_llm_client,
};
use marquee_pipeline::stages::{ExtractStage, ParseStage, ScrapeStage};
use marquee_pipeline::{JsonFileSink, Orchestrator};
use marquee_web::browser::{FantocciniCapturer, SearchTarget};
use marquee_web::extract::FlattenOptions;
use std::sync::Arc;
use std::time::Duration;

pub fn log_config(logging: &LoggingConfig) -> LogConfig {
    LogConfig {
        app_name: "marquee",
        log_dir: logging.dir.clone(),
        file_name: Some(logging.file_name.clone()),
        emit_stdout: logging.emit_stdout,
        format: logging.format,
        default_filter: logging.filter.clone(),
    }
}

/// Resolve the `llm:` section into a concrete endpoint.
///
/// The API key comes from config, else `AZURE_OPENAI_API_KEY` or
/// `OPENAI_API_KEY`; the Azure endpoint from config, else
/// `AZURE_OPENAI_ENDPOINT`. Unexpanded `${VAR}` placeholders count as unset.
pub fn chat_endpoint(llm: &LlmConfig) -> Result<ChatEndpoint> {
    let key_var = match llm.provider {
        LlmProvider::Azure => "AZURE_OPENAI_API_KEY",
        LlmProvider::Openai => "OPENAI_API_KEY",
    };
    let Some(api_key) = non_empty(llm.auth_token.clone()).or_else(|| env_value(key_var)) else {
        bail!("no API key configured: set llm.auth_token or {key_var}");
    };

    Ok(match llm.provider {
        LlmProvider::Azure => {
            let Some(endpoint) =
                non_empty(llm.endpoint.clone()).or_else(|| env_value("AZURE_OPENAI_ENDPOINT"))
            else {
                bail!("llm.endpoint (or AZURE_OPENAI_ENDPOINT) must be set for Azure OpenAI");
            };
            ChatEndpoint::Azure {
                api_key,
                endpoint,
                deployment: non_empty(llm.model.clone())
                    .unwrap_or_else(|| DEFAULT_AZURE_DEPLOYMENT.to_string()),
                api_version: non_empty(llm.api_version.clone())
                    .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
            }
        }
        LlmProvider::Openai => ChatEndpoint::OpenAi {
            api_key,
            model: non_empty(llm.model.clone()).unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            base_url: non_empty(llm.endpoint.clone())
                .unwrap_or_else(|| OPENAI_API_BASE.to_string()),
        },
    })
}

fn env_value(var: &str) -> Option<String> {
    non_empty(std::env::var(var).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty() && !v.contains("${"))
}

pub fn build_orchestrator(cfg: &MarqueeConfig) -> Result<Orchestrator> {
    let scraper = &cfg.scraper;
    let target = SearchTarget::new(
        &scraper.site_url,
        &scraper.search_selector,
        Duration::from_millis(scraper.render_wait_ms),
    )?;
    let capturer = FantocciniCapturer::new(
        target,
        DriverOptions {
            headless: scraper.headless,
            webdriver_url: scraper.webdriver_url.clone(),
            element_timeout: Duration::from_millis(scraper.element_timeout_ms),
        },
    );

    let extractor = ExtractStage::new(FlattenOptions {
        label_tags: cfg.extractor.label_tags,
        max_markup_bytes: cfg.extractor.max_markup_bytes,
    });

    let llm = build_llm_client(chat_endpoint(&cfg.llm)?).context("failed to build LLM client")?;
    let parser = ParseStage::new(llm)
        .with_temperature(cfg.llm.temperature)
        .with_max_tokens(cfg.llm.max_tokens);

    tracing::info!(
        target: "marquee.orchestrator",
        site = %scraper.site_url,
        headless = scraper.headless,
        output = %cfg.output.path.display(),
        "pipeline configured"
    );

    Ok(Orchestrator::new(
        Arc::new(ScrapeStage::new(Arc::new(capturer))),
        Arc::new(extractor),
        Arc::new(parser),
        Arc::new(JsonFileSink::new(cfg.output.path.clone())),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_common::observability::LogFormat;

    const CREDENTIAL_VARS: [&str; 3] =
        ["AZURE_OPENAI_API_KEY", "AZURE_OPENAI_ENDPOINT", "OPENAI_API_KEY"];

    #[test]
    fn azure_endpoint_uses_the_deployment_name() {
        let llm = LlmConfig {
            auth_token: Some("k".into()),
            endpoint: Some("https://res.openai.azure.com".into()),
            ..LlmConfig::default()
        };
        assert_eq!(
            chat_endpoint(&llm).unwrap(),
            ChatEndpoint::Azure {
                api_key: "k".into(),
                endpoint: "https://res.openai.azure.com".into(),
                deployment: DEFAULT_AZURE_DEPLOYMENT.into(),
                api_version: DEFAULT_AZURE_API_VERSION.into(),
            }
        );
    }

    #[test]
    fn missing_credentials_are_reported() {
        temp_env::with_vars_unset(CREDENTIAL_VARS, || {
            let err = chat_endpoint(&LlmConfig::default()).unwrap_err();
            assert!(err.to_string().contains("no API key"));
        });
    }

    #[test]
    fn credentials_fall_back_to_provider_env_vars() {
        temp_env::with_vars(
            [
                ("AZURE_OPENAI_API_KEY", Some("from-env")),
                ("AZURE_OPENAI_ENDPOINT", Some("https://res.openai.azure.com")),
            ],
            || {
                let llm = LlmConfig {
                    auth_token: Some("${AZURE_OPENAI_API_KEY_UNSET}".into()),
                    ..LlmConfig::default()
                };
                match chat_endpoint(&llm).unwrap() {
                    ChatEndpoint::Azure { api_key, endpoint, .. } => {
                        assert_eq!(api_key, "from-env");
                        assert_eq!(endpoint, "https://res.openai.azure.com");
                    }
                    other => panic!("unexpected endpoint {other:?}"),
                }
            },
        );
    }

    #[test]
    fn openai_endpoint_defaults_to_the_public_api() {
        let llm = LlmConfig {
            provider: LlmProvider::Openai,
            auth_token: Some("sk-test".into()),
            ..LlmConfig::default()
        };
        match chat_endpoint(&llm).unwrap() {
            ChatEndpoint::OpenAi { base_url, model, .. } => {
                assert_eq!(base_url, OPENAI_API_BASE);
                assert_eq!(model, DEFAULT_OPENAI_MODEL);
            }
            other => panic!("unexpected endpoint {other:?}"),
        }
    }

    #[test]
    fn logging_section_maps_onto_log_config() {
        let logging = LoggingConfig {
            format: LogFormat::Json,
            emit_stdout: false,
            ..LoggingConfig::default()
        };
        let cfg = log_config(&logging);
        assert_eq!(cfg.format, LogFormat::Json);
        assert_eq!(cfg.file_name.as_deref(), Some("agent.log"));
        assert!(!cfg.emit_stdout);
        assert_eq!(cfg.default_filter, "info");
    }
}
