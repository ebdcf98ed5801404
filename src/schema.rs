//! Agent configuration schema.
//!
//! Validation walks the parsed YAML tree by hand rather than deriving
//! `Deserialize`, so every independent field can be checked in one pass and
//! reported with its dotted path.

use crate::error::{Error, Result, SchemaReport};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// Models every provider knows by alias. Others are accepted with a warning.
pub const KNOWN_MODELS: &[&str] = &["claude-3-opus", "claude-3-sonnet", "claude-3-haiku"];

const AGENT_KEYS: &[&str] = &[
    "name",
    "model",
    "provider",
    "region",
    "max_tokens",
    "tools",
    "prompts",
    "metadata",
];
const PROMPT_KEYS: &[&str] = &["system", "task"];

pub const EXAMPLE_CONFIG: &str = r#"agent:
  name: example-agent
  model: claude-3-sonnet
  # provider: anthropic | bedrock | goose
  # region: us-east-1
  tools:
    - echo
    - calculator
  prompts:
    system: You are a helpful AI assistant.
    task: Help the user with their request.
  metadata:
    version: "1.0"
    description: Example agent configuration
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentConfig {
    pub name: String,
    pub model: String,
    /// Raw provider name; the resolver decides whether it is supported.
    pub provider: Option<String>,
    pub region: Option<String>,
    pub max_tokens: Option<u32>,
    pub tools: Vec<String>,
    pub prompts: Prompts,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompts {
    pub system: String,
    pub task: String,
}

pub fn is_known_model(model: &str) -> bool {
    KNOWN_MODELS.contains(&model)
}

/// Parse YAML text into a document tree.
pub fn parse_document(text: &str) -> std::result::Result<Value, serde_yaml::Error> {
    serde_yaml::from_str(text)
}

/// Validate a parsed document and build an [`AgentConfig`] with defaults applied.
///
/// `name`, `model`, `prompts` and the optional fields are checked
/// independently; all violations come back together in one
/// [`Error::Schema`].
pub fn validate(document: &Value) -> Result<AgentConfig> {
    let mut report = SchemaReport::default();

    let root = match document {
        Value::Mapping(m) => m,
        Value::Null => {
            report.push("agent", "required field missing");
            return Err(Error::Schema(report));
        }
        other => {
            report.push(
                "<root>",
                format!(
                    "expected a mapping with top-level key 'agent', found {}",
                    kind(other)
                ),
            );
            return Err(Error::Schema(report));
        }
    };
    warn_unknown_keys(root, "", &["agent"]);

    let agent = match root.get("agent") {
        None | Some(Value::Null) => {
            report.push("agent", "required field missing");
            return Err(Error::Schema(report));
        }
        Some(Value::Mapping(m)) => m,
        Some(other) => {
            report.push("agent", format!("expected a mapping, found {}", kind(other)));
            return Err(Error::Schema(report));
        }
    };
    warn_unknown_keys(agent, "agent.", AGENT_KEYS);

    let name = required_string(agent, "agent", "name", &mut report);
    let model = required_string(agent, "agent", "model", &mut report);
    let prompts = prompts(agent, &mut report);
    let tools = tools(agent, &mut report);
    let metadata = metadata(agent, &mut report);
    let provider = optional_string(agent, "agent", "provider", &mut report);
    let region = optional_string(agent, "agent", "region", &mut report);
    let max_tokens = max_tokens(agent, &mut report);

    match (name, model, prompts) {
        (Some(name), Some(model), Some(prompts)) if report.is_empty() => {
            if !is_known_model(&model) {
                warn!(
                    model = %model,
                    known = ?KNOWN_MODELS,
                    "model is not in the known set, passing it through to the provider"
                );
            }
            Ok(AgentConfig {
                name,
                model,
                provider,
                region,
                max_tokens,
                tools,
                prompts,
                metadata,
            })
        }
        _ => Err(Error::Schema(report)),
    }
}

fn required_string(
    map: &Mapping,
    parent: &str,
    key: &str,
    report: &mut SchemaReport,
) -> Option<String> {
    let path = format!("{parent}.{key}");
    match map.get(key) {
        None | Some(Value::Null) => {
            report.push(path, "required field missing");
            None
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            report.push(path, "must not be empty");
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            report.push(path, format!("expected a string, found {}", kind(other)));
            None
        }
    }
}

fn optional_string(
    map: &Mapping,
    parent: &str,
    key: &str,
    report: &mut SchemaReport,
) -> Option<String> {
    match map.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            report.push(
                format!("{parent}.{key}"),
                format!("expected a string, found {}", kind(other)),
            );
            None
        }
    }
}

fn prompts(agent: &Mapping, report: &mut SchemaReport) -> Option<Prompts> {
    let prompts = match agent.get("prompts") {
        None | Some(Value::Null) => {
            report.push("agent.prompts", "required field missing");
            return None;
        }
        Some(Value::Mapping(m)) => m,
        Some(other) => {
            report.push(
                "agent.prompts",
                format!("expected a mapping, found {}", kind(other)),
            );
            return None;
        }
    };
    warn_unknown_keys(prompts, "agent.prompts.", PROMPT_KEYS);

    let system = required_string(prompts, "agent.prompts", "system", report);
    let task = required_string(prompts, "agent.prompts", "task", report);
    Some(Prompts {
        system: system?,
        task: task?,
    })
}

fn tools(agent: &Mapping, report: &mut SchemaReport) -> Vec<String> {
    let items = match agent.get("tools") {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Sequence(items)) => items,
        Some(other) => {
            report.push(
                "agent.tools",
                format!("expected a sequence of strings, found {}", kind(other)),
            );
            return Vec::new();
        }
    };

    let mut tools = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item {
            Value::String(s) => tools.push(s.clone()),
            other => report.push(
                format!("agent.tools[{i}]"),
                format!("expected a string, found {}", kind(other)),
            ),
        }
    }
    tools
}

fn metadata(agent: &Mapping, report: &mut SchemaReport) -> BTreeMap<String, String> {
    let map = match agent.get("metadata") {
        None | Some(Value::Null) => return BTreeMap::new(),
        Some(Value::Mapping(m)) => m,
        Some(other) => {
            report.push(
                "agent.metadata",
                format!("expected a mapping, found {}", kind(other)),
            );
            return BTreeMap::new();
        }
    };

    let mut metadata = BTreeMap::new();
    for (k, v) in map {
        let Some(key) = scalar_text(k) else {
            report.push(
                "agent.metadata",
                format!("keys must be scalars, found {}", kind(k)),
            );
            continue;
        };
        match scalar_text(v) {
            Some(value) => {
                metadata.insert(key, value);
            }
            None => report.push(
                format!("agent.metadata.{key}"),
                format!("expected a scalar value, found {}", kind(v)),
            ),
        }
    }
    metadata
}

fn max_tokens(agent: &Mapping, report: &mut SchemaReport) -> Option<u32> {
    match agent.get("max_tokens") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => match n.as_u64().and_then(|n| u32::try_from(n).ok()) {
            Some(0) | None => {
                report.push(
                    "agent.max_tokens",
                    format!("expected a positive integer, found {n}"),
                );
                None
            }
            Some(n) => Some(n),
        },
        Some(other) => {
            report.push(
                "agent.max_tokens",
                format!("expected a positive integer, found {}", kind(other)),
            );
            None
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn warn_unknown_keys(map: &Mapping, prefix: &str, known: &[&str]) {
    for key in map.keys() {
        match key.as_str() {
            Some(k) if known.contains(&k) => {}
            Some(k) => warn!(
                field = %format!("{prefix}{k}"),
                "ignoring unknown configuration field"
            ),
            None => warn!(prefix, "ignoring non-string configuration key"),
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
