//! System instructions sent to live providers.
//!
//! Three templates: a full nested tree in one call, the first layer of an
//! incremental session, and the next layer given the caller's path so far.
//! "JSON only" is advisory; see [`crate::extract`].

use crate::tree::GenerationContext;

/// Separator used when rendering the chosen path.
pub const PATH_SEPARATOR: &str = " → ";

/// What a single generation call should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode<'a> {
    /// One complete nested tree.
    FullTree,
    /// The first layer of an incremental session.
    FirstLayer,
    /// The layer after the option recorded in the context.
    NextLayer(&'a GenerationContext),
}

impl<'a> GenerationMode<'a> {
    /// No context means full-tree mode.
    pub fn from_context(context: Option<&'a GenerationContext>) -> Self {
        match context {
            None => GenerationMode::FullTree,
            Some(ctx) if ctx.is_first_level => GenerationMode::FirstLayer,
            Some(ctx) => GenerationMode::NextLayer(ctx),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GenerationMode::FullTree => "full-tree",
            GenerationMode::FirstLayer => "first-layer",
            GenerationMode::NextLayer(_) => "next-layer",
        }
    }
}

const FULL_TREE_PROMPT: &str = r#"你是一个决策助手。根据用户的问题，一次性生成一棵完整的决策树。
决策树的格式必须严格遵循以下JSON结构：
{
  "question": "第一个问题",
  "options": [
    {
      "text": "选项1",
      "next": {
        "question": "下一个问题",
        "options": [
          { "text": "选项A", "result": "最终建议" },
          { "text": "选项B", "result": "最终建议" }
        ]
      }
    },
    {
      "text": "选项2",
      "result": "最终建议"
    }
  ]
}

规则：
1. 决策树深度为2-4层，每个问题包含2-4个选项
2. 每个选项必须且只能包含 next 或 result 之一
3. next 是下一层问题，result 是可执行的最终建议
4. 问题要针对用户的决策需求，选项要清晰、互斥
5. 只返回JSON，不要有其他文字说明"#;

const FIRST_LAYER_PROMPT: &str = r#"你是一个决策助手。根据用户的问题，生成决策树的第一层。
决策树的格式必须严格遵循以下JSON结构：
{
  "question": "第一个问题",
  "options": [
    {
      "text": "选项1"
    },
    {
      "text": "选项2"
    }
  ]
}

规则：
1. 只生成一层，包含一个问题和2-4个选项
2. 每个选项只需要 text 字段，不需要 next 或 result
3. 问题要针对用户的决策需求
4. 选项要清晰、互斥
5. 只返回JSON，不要有其他文字说明"#;

/// Build the system instruction for `question` in `mode`.
pub fn system_prompt(question: &str, mode: GenerationMode<'_>) -> String {
    match mode {
        GenerationMode::FullTree => FULL_TREE_PROMPT.to_string(),
        GenerationMode::FirstLayer => FIRST_LAYER_PROMPT.to_string(),
        GenerationMode::NextLayer(ctx) => next_layer_prompt(question, ctx),
    }
}

fn next_layer_prompt(question: &str, ctx: &GenerationContext) -> String {
    format!(
        r#"你是一个决策助手。根据用户之前的选择，生成决策树的下一层。

用户的原始问题：{question}
之前的选择路径：{path}
当前问题：{current}
用户选择了：{selected}

请生成下一层决策节点，格式如下：
{{
  "question": "下一个问题",
  "options": [
    {{
      "text": "选项1"
    }},
    {{
      "text": "选项2",
      "result": "如果这是最终答案，提供结果说明"
    }}
  ]
}}

规则：
1. 只生成一层，包含一个问题和2-4个选项
2. 如果某个选项是最终答案，添加 result 字段
3. 如果还需要继续决策，只提供 text 字段，不要提供 next 字段
4. 问题要基于之前的选择，逐步深入
5. 只返回JSON，不要有其他文字说明"#,
        question = question,
        path = ctx.previous_choices.join(PATH_SEPARATOR),
        current = ctx.current_question,
        selected = ctx.selected_option,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_context() {
        assert_eq!(GenerationMode::from_context(None), GenerationMode::FullTree);

        let first = GenerationContext::first_level();
        assert_eq!(
            GenerationMode::from_context(Some(&first)),
            GenerationMode::FirstLayer
        );

        let later = GenerationContext::after(vec!["a".into()], "Q", "a");
        assert_eq!(GenerationMode::from_context(Some(&later)).label(), "next-layer");
    }

    #[test]
    fn test_next_layer_interpolates_path() {
        let ctx = GenerationContext::after(
            vec!["职业发展机会".into(), "金融行业".into()],
            "你更倾向于哪种行业环境？",
            "金融行业",
        );
        let prompt = system_prompt("我该去哪个城市工作", GenerationMode::NextLayer(&ctx));

        assert!(prompt.contains("用户的原始问题：我该去哪个城市工作"));
        assert!(prompt.contains("之前的选择路径：职业发展机会 → 金融行业"));
        assert!(prompt.contains("当前问题：你更倾向于哪种行业环境？"));
        assert!(prompt.contains("用户选择了：金融行业"));
        // literal braces survive format!
        assert!(prompt.contains("\"question\": \"下一个问题\""));
    }

    #[test]
    fn test_every_template_demands_json_only() {
        let ctx = GenerationContext::after(vec![], "Q", "a");
        for mode in [
            GenerationMode::FullTree,
            GenerationMode::FirstLayer,
            GenerationMode::NextLayer(&ctx),
        ] {
            assert!(system_prompt("q", mode).contains("只返回JSON"), "{}", mode.label());
        }
    }

    #[test]
    fn test_layer_templates_forbid_next() {
        assert!(FIRST_LAYER_PROMPT.contains("不需要 next 或 result"));
        assert!(FULL_TREE_PROMPT.contains("next 或 result 之一"));
    }
}
