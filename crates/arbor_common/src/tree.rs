//! Decision tree schema.
//!
//! A tree is a [`DecisionNode`] holding an ordered list of [`TreeOption`]s.
//! On the wire an option is `{ "text", "next"?, "result"? }`; in Rust the
//! field-presence convention becomes an explicit enum so every consumer has to
//! handle all four cases.

use crate::error::LlmError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Protocol convention for options per node. Advisory only.
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 4;

/// One question with its ordered options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionNode {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<TreeOption>,
}

/// One branch of a [`DecisionNode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireOption", into = "WireOption")]
pub enum TreeOption {
    /// First-layer option in incremental mode. Text only.
    Branching { text: String },
    /// Later-layer option in incremental mode that needs another generation step.
    Continuing { text: String },
    /// Leaf carrying a recommendation.
    Terminal { text: String, result: String },
    /// Full-tree option owning its subtree.
    FullNext {
        text: String,
        next: Box<DecisionNode>,
    },
}

#[derive(Serialize, Deserialize)]
struct WireOption {
    #[serde(default)]
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next: Option<Box<DecisionNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<String>,
}

impl From<WireOption> for TreeOption {
    fn from(wire: WireOption) -> Self {
        match (wire.next, wire.result) {
            // `next` wins when a provider sends both
            (Some(next), _) => TreeOption::FullNext {
                text: wire.text,
                next,
            },
            (None, Some(result)) if !result.trim().is_empty() => TreeOption::Terminal {
                text: wire.text,
                result,
            },
            _ => TreeOption::Continuing { text: wire.text },
        }
    }
}

impl From<TreeOption> for WireOption {
    fn from(option: TreeOption) -> Self {
        match option {
            TreeOption::Branching { text } | TreeOption::Continuing { text } => WireOption {
                text,
                next: None,
                result: None,
            },
            TreeOption::Terminal { text, result } => WireOption {
                text,
                next: None,
                result: Some(result),
            },
            TreeOption::FullNext { text, next } => WireOption {
                text,
                next: Some(next),
                result: None,
            },
        }
    }
}

impl TreeOption {
    pub fn branching(text: impl Into<String>) -> Self {
        TreeOption::Branching { text: text.into() }
    }

    pub fn continuing(text: impl Into<String>) -> Self {
        TreeOption::Continuing { text: text.into() }
    }

    pub fn terminal(text: impl Into<String>, result: impl Into<String>) -> Self {
        TreeOption::Terminal {
            text: text.into(),
            result: result.into(),
        }
    }

    pub fn full_next(text: impl Into<String>, next: DecisionNode) -> Self {
        TreeOption::FullNext {
            text: text.into(),
            next: Box::new(next),
        }
    }

    /// Display label.
    pub fn text(&self) -> &str {
        match self {
            TreeOption::Branching { text }
            | TreeOption::Continuing { text }
            | TreeOption::Terminal { text, .. }
            | TreeOption::FullNext { text, .. } => text,
        }
    }

    pub fn result(&self) -> Option<&str> {
        match self {
            TreeOption::Terminal { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<&DecisionNode> {
        match self {
            TreeOption::FullNext { next, .. } => Some(next),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TreeOption::Terminal { .. })
    }

    /// True when choosing this option requires another generation call.
    pub fn needs_generation(&self) -> bool {
        matches!(
            self,
            TreeOption::Branching { .. } | TreeOption::Continuing { .. }
        )
    }
}

impl DecisionNode {
    pub fn new(question: impl Into<String>, options: Vec<TreeOption>) -> Self {
        Self {
            question: question.into(),
            options,
        }
    }

    /// Interpret an extracted JSON value as a node.
    ///
    /// Only the top-level shape is checked: the value must be an object whose
    /// fields fit the tolerant option encoding. Missing fields default.
    pub fn from_value(value: serde_json::Value) -> Result<Self, LlmError> {
        if !value.is_object() {
            return Err(LlmError::MalformedResponse(format!(
                "expected a JSON object, got {}",
                json_kind(&value)
            )));
        }
        serde_json::from_value(value)
            .map_err(|e| LlmError::MalformedResponse(format!("not a decision node: {}", e)))
    }

    /// Number of layers, counting this node as 1.
    pub fn depth(&self) -> usize {
        1 + self
            .options
            .iter()
            .filter_map(TreeOption::next)
            .map(DecisionNode::depth)
            .max()
            .unwrap_or(0)
    }

    /// Number of terminal options reachable from this node.
    pub fn leaf_count(&self) -> usize {
        self.options
            .iter()
            .map(|option| match option {
                TreeOption::Terminal { .. } => 1,
                TreeOption::FullNext { next, .. } => next.leaf_count(),
                _ => 0,
            })
            .sum()
    }

    pub fn find_option(&self, text: &str) -> Option<&TreeOption> {
        self.options.iter().find(|o| o.text() == text)
    }

    /// True when every option ends the decision.
    pub fn is_terminal_layer(&self) -> bool {
        !self.options.is_empty() && self.options.iter().all(TreeOption::is_terminal)
    }

    /// Check the protocol conventions, recursively.
    ///
    /// The engine only logs these; output is never rejected on schema grounds.
    pub fn validate(&self) -> Vec<SchemaIssue> {
        let mut issues = Vec::new();
        self.collect_issues("root", &mut issues);
        issues
    }

    fn collect_issues(&self, path: &str, issues: &mut Vec<SchemaIssue>) {
        if self.question.trim().is_empty() {
            issues.push(SchemaIssue::EmptyQuestion {
                path: path.to_string(),
            });
        }

        let count = self.options.len();
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&count) {
            issues.push(SchemaIssue::OptionCount {
                path: path.to_string(),
                count,
            });
        }

        let mut seen = HashSet::new();
        for option in &self.options {
            let label = option.text();
            if label.trim().is_empty() {
                issues.push(SchemaIssue::EmptyLabel {
                    path: path.to_string(),
                });
            } else if !seen.insert(label) {
                issues.push(SchemaIssue::DuplicateLabel {
                    path: path.to_string(),
                    label: label.to_string(),
                });
            }

            match option {
                TreeOption::Terminal { result, .. } if result.trim().is_empty() => {
                    issues.push(SchemaIssue::EmptyResult {
                        path: path.to_string(),
                        label: label.to_string(),
                    });
                }
                TreeOption::FullNext { next, .. } => {
                    next.collect_issues(&format!("{} > {}", path, label), issues);
                }
                _ => {}
            }
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// A convention violation found by [`DecisionNode::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIssue {
    EmptyQuestion { path: String },
    OptionCount { path: String, count: usize },
    EmptyLabel { path: String },
    DuplicateLabel { path: String, label: String },
    EmptyResult { path: String, label: String },
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaIssue::EmptyQuestion { path } => write!(f, "{}: empty question", path),
            SchemaIssue::OptionCount { path, count } => write!(
                f,
                "{}: {} options (expected {}-{})",
                path, count, MIN_OPTIONS, MAX_OPTIONS
            ),
            SchemaIssue::EmptyLabel { path } => write!(f, "{}: option with empty text", path),
            SchemaIssue::DuplicateLabel { path, label } => {
                write!(f, "{}: duplicate option '{}'", path, label)
            }
            SchemaIssue::EmptyResult { path, label } => {
                write!(f, "{}: option '{}' has an empty result", path, label)
            }
        }
    }
}

/// Path context for incremental generation. Built fresh by the caller for
/// every call; the engine never keeps it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationContext {
    pub is_first_level: bool,
    pub previous_choices: Vec<String>,
    pub current_question: String,
    pub selected_option: String,
}

impl GenerationContext {
    pub fn first_level() -> Self {
        Self {
            is_first_level: true,
            ..Default::default()
        }
    }

    /// Context for the layer after `selected` was chosen at `current_question`.
    pub fn after(
        previous_choices: Vec<String>,
        current_question: impl Into<String>,
        selected: impl Into<String>,
    ) -> Self {
        Self {
            is_first_level: false,
            previous_choices,
            current_question: current_question.into(),
            selected_option: selected.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_option_variants_from_wire() {
        let node: DecisionNode = serde_json::from_value(json!({
            "question": "Q",
            "options": [
                {"text": "a"},
                {"text": "b", "result": "done"},
                {"text": "c", "next": {"question": "Q2", "options": []}},
                {"text": "d", "result": "   "}
            ]
        }))
        .unwrap();

        assert!(matches!(node.options[0], TreeOption::Continuing { .. }));
        assert_eq!(node.options[1].result(), Some("done"));
        assert_eq!(node.options[2].next().unwrap().question, "Q2");
        // blank result is not a recommendation
        assert!(node.options[3].needs_generation());
    }

    #[test]
    fn test_next_wins_over_result() {
        let option: TreeOption = serde_json::from_value(json!({
            "text": "both",
            "result": "r",
            "next": {"question": "deeper", "options": []}
        }))
        .unwrap();
        assert!(matches!(option, TreeOption::FullNext { .. }));
    }

    #[test]
    fn test_serialize_only_variant_fields() {
        let node = DecisionNode::new(
            "Q",
            vec![
                TreeOption::branching("a"),
                TreeOption::terminal("b", "r"),
            ],
        );
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({
                "question": "Q",
                "options": [{"text": "a"}, {"text": "b", "result": "r"}]
            })
        );
    }

    #[test]
    fn test_missing_fields_default() {
        let node: DecisionNode = serde_json::from_value(json!({"extra": 1})).unwrap();
        assert!(node.question.is_empty());
        assert!(node.options.is_empty());
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        let err = DecisionNode::from_value(json!([1, 2])).unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }

    #[test]
    fn test_depth_and_leaf_count() {
        let inner = DecisionNode::new(
            "inner",
            vec![TreeOption::terminal("x", "rx"), TreeOption::terminal("y", "ry")],
        );
        let root = DecisionNode::new(
            "root",
            vec![
                TreeOption::full_next("a", inner),
                TreeOption::terminal("b", "rb"),
            ],
        );
        assert_eq!(root.depth(), 2);
        assert_eq!(root.leaf_count(), 3);
        assert!(!root.is_terminal_layer());
        assert!(root.find_option("a").is_some());
        assert!(root.find_option("z").is_none());
    }

    #[test]
    fn test_validate_reports_nested_issues() {
        let inner = DecisionNode::new("", vec![TreeOption::terminal("x", "r")]);
        let root = DecisionNode::new(
            "root",
            vec![
                TreeOption::full_next("a", inner),
                TreeOption::continuing("a"),
                TreeOption::terminal("b", "  "),
            ],
        );
        let issues = root.validate();
        assert!(issues.contains(&SchemaIssue::DuplicateLabel {
            path: "root".to_string(),
            label: "a".to_string(),
        }));
        assert!(issues.contains(&SchemaIssue::EmptyQuestion {
            path: "root > a".to_string(),
        }));
        assert!(issues.contains(&SchemaIssue::OptionCount {
            path: "root > a".to_string(),
            count: 1,
        }));
        assert!(issues.contains(&SchemaIssue::EmptyResult {
            path: "root".to_string(),
            label: "b".to_string(),
        }));
    }

    #[test]
    fn test_validate_flags_empty_terminal_result() {
        let node = DecisionNode::new(
            "Q",
            vec![TreeOption::terminal("a", ""), TreeOption::terminal("b", "r")],
        );
        assert_eq!(
            node.validate(),
            vec![SchemaIssue::EmptyResult {
                path: "root".to_string(),
                label: "a".to_string(),
            }]
        );
    }

    #[test]
    fn test_context_camel_case() {
        let ctx: GenerationContext = serde_json::from_value(json!({
            "isFirstLevel": false,
            "previousChoices": ["a", "b"],
            "selectedOption": "b"
        }))
        .unwrap();
        assert_eq!(ctx.previous_choices, vec!["a", "b"]);
        assert_eq!(ctx.selected_option, "b");
        assert!(ctx.current_question.is_empty());
    }
}
