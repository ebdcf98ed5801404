use crate::llm::{InvocationResult, gateway};
use crate::resolver::ProviderKind;
use crate::schema::{self, AgentConfig};
use crate::tools;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Render a successful invocation for stdout.
pub fn render_result(
    result: &InvocationResult,
    format: OutputFormat,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(result.text.clone()),
        OutputFormat::Json => serde_json::to_string_pretty(result),
    }
}

/// One-screen summary of a validated configuration.
pub fn render_config_summary(config: &AgentConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Configuration is valid");
    let _ = writeln!(out, "  name:     {}", config.name);
    let _ = writeln!(
        out,
        "  model:    {}{}",
        config.model,
        if schema::is_known_model(&config.model) {
            ""
        } else {
            " (not a known model, passed through)"
        }
    );
    let _ = writeln!(
        out,
        "  provider: {}",
        config.provider.as_deref().unwrap_or("anthropic (default)")
    );
    if let Some(region) = &config.region {
        let _ = writeln!(out, "  region:   {region}");
    }
    if !config.tools.is_empty() {
        let _ = writeln!(out, "  tools:    {}", config.tools.join(", "));
        let unknown = tools::unknown_tools(&config.tools);
        if !unknown.is_empty() {
            let _ = writeln!(out, "            not in registry: {}", unknown.join(", "));
        }
    }
    for (k, v) in &config.metadata {
        let _ = writeln!(out, "  metadata.{k}: {v}");
    }
    out
}

/// Providers with the model aliases each one recognises, then the built-in tools.
pub fn render_models() -> String {
    let mut out = String::new();
    for kind in ProviderKind::ALL {
        let (note, models) = match kind {
            ProviderKind::Gateway => (
                " (any model identifier accepted)",
                gateway::EXAMPLE_MODELS,
            ),
            _ => ("", schema::KNOWN_MODELS),
        };
        let _ = writeln!(out, "{kind}{note}");
        for model in models {
            let _ = writeln!(out, "  {model}");
        }
    }
    let _ = writeln!(out, "\nbuilt-in tools");
    for tool in tools::builtin_tools() {
        let _ = writeln!(out, "  {:<12}{}", tool.name, tool.description);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Usage;

    fn result() -> InvocationResult {
        InvocationResult {
            text: "Hello there".into(),
            provider: ProviderKind::DirectApi,
            model: "claude-3-sonnet-20240229".into(),
            usage: Some(Usage {
                input_tokens: 10,
                output_tokens: 3,
            }),
        }
    }

    #[test]
    fn text_format_prints_only_the_response() {
        assert_eq!(render_result(&result(), OutputFormat::Text).unwrap(), "Hello there");
    }

    #[test]
    fn json_format_includes_provider_and_model() {
        let json: serde_json::Value =
            serde_json::from_str(&render_result(&result(), OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["response"], "Hello there");
        assert_eq!(json["provider"], "anthropic");
        assert_eq!(json["model"], "claude-3-sonnet-20240229");
        assert_eq!(json["usage"]["output_tokens"], 3);
    }

    #[test]
    fn models_listing_covers_every_provider() {
        let listing = render_models();
        for kind in ProviderKind::ALL {
            assert!(listing.contains(kind.as_str()));
        }
        assert!(listing.contains("claude-3-haiku"));
        assert!(listing.contains("mixtral-8x7b"));
        for name in tools::BUILTIN_TOOL_NAMES {
            assert!(listing.contains(name), "missing tool {name}");
        }
    }

    #[test]
    fn summary_flags_tools_outside_the_registry() {
        let config = AgentConfig {
            name: "a".into(),
            model: "claude-3-sonnet".into(),
            provider: None,
            region: None,
            max_tokens: None,
            tools: vec!["echo".into(), "web_search".into()],
            prompts: schema::Prompts {
                system: "S".into(),
                task: "T".into(),
            },
            metadata: Default::default(),
        };
        let summary = render_config_summary(&config);
        assert!(summary.contains("tools:    echo, web_search"));
        assert!(summary.contains("not in registry: web_search"));
    }
}
