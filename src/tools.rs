//! Built-in tool registry.
//!
//! Tools are declared in agent configs by name and carried through to the
//! request. Nothing here executes them; the registry only knows which names
//! exist and what their inputs look like.

use serde::Serialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

pub const BUILTIN_TOOL_NAMES: &[&str] = &["echo", "calculator", "text_count"];

pub fn builtin_tools() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "echo",
            description: "Echoes back the provided text. Useful for testing tool wiring.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string", "description": "Text to echo back", "minLength": 1}
                },
                "required": ["text"],
                "additionalProperties": false
            }),
        },
        ToolDef {
            name: "calculator",
            description: "Evaluates arithmetic expressions such as '2 + 2' or '10 * 3.5'.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "expression": {
                        "type": "string",
                        "description": "Expression using numbers, + - * / % ^ and parentheses",
                        "minLength": 1,
                        "pattern": r"^[\d\s\+\-\*\/\(\)\.\%\^]+$"
                    }
                },
                "required": ["expression"],
                "additionalProperties": false
            }),
        },
        ToolDef {
            name: "text_count",
            description: "Counts characters, words and lines in the provided text.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string", "description": "Text to analyze"},
                    "count_type": {
                        "type": "string",
                        "enum": ["characters", "words", "lines", "all"],
                        "default": "all"
                    }
                },
                "required": ["text"],
                "additionalProperties": false
            }),
        },
    ]
}

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_TOOL_NAMES.contains(&name)
}

/// Tool ids in `tools` that the registry does not know, in input order.
pub fn unknown_tools(tools: &[String]) -> Vec<&str> {
    tools
        .iter()
        .map(String::as_str)
        .filter(|t| !is_builtin(t))
        .collect()
}
