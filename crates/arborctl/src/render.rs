//! Plain-text tree rendering for the terminal.

use arbor_common::{DecisionNode, TreeOption};

/// Render `node` and everything below it, one line per question or option.
pub fn render_tree(node: &DecisionNode) -> String {
    let mut lines = Vec::new();
    render_node(node, "", &mut lines);
    lines.join("\n")
}

fn render_node(node: &DecisionNode, prefix: &str, lines: &mut Vec<String>) {
    lines.push(format!("{}? {}", prefix, node.question));

    let count = node.options.len();
    for (i, option) in node.options.iter().enumerate() {
        let last = i + 1 == count;
        let branch = if last { "└── " } else { "├── " };
        let line = format!("{}{}{}", prefix, branch, option.text());

        match option {
            TreeOption::Terminal { result, .. } => lines.push(format!("{} => {}", line, result)),
            TreeOption::Branching { .. } | TreeOption::Continuing { .. } => {
                lines.push(format!("{} …", line))
            }
            TreeOption::FullNext { next, .. } => {
                lines.push(line);
                let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
                render_node(next, &child_prefix, lines);
            }
        }
    }
}

/// Mask an API key for display.
pub fn mask_key(key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return "(not set)".to_string();
    }
    let visible: String = key.chars().take(4).collect();
    format!("{}…", visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_nested_tree() {
        let tree = DecisionNode::new(
            "root?",
            vec![
                TreeOption::full_next(
                    "a",
                    DecisionNode::new("inner?", vec![TreeOption::terminal("x", "do x")]),
                ),
                TreeOption::continuing("b"),
            ],
        );

        let rendered = render_tree(&tree);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                "? root?",
                "├── a",
                "│   ? inner?",
                "│   └── x => do x",
                "└── b …",
            ]
        );
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key(""), "(not set)");
        assert_eq!(mask_key("sk-abcdef"), "sk-a…");
        assert_eq!(mask_key("ab"), "ab…");
    }
}
