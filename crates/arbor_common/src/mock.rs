//! Deterministic tree synthesizer used for demo mode and as the fallback when
//! a live provider fails. Never performs I/O.
//!
//! Incremental sessions are a small state machine: the first layer offers the
//! labels of one [`Topic`], and the next layer is looked up by parsing the
//! selected label back into a [`Choice`]. Labels are declared once in
//! [`labels`] and used by both sides, so a rename cannot desynchronize them.

use crate::prompts::GenerationMode;
use crate::tree::{DecisionNode, GenerationContext, TreeOption};

/// Option labels shared by the first-layer generator and the transition table.
pub mod labels {
    pub const CAREER_GROWTH: &str = "职业发展机会";
    pub const COST_OF_LIVING: &str = "生活成本和质量";
    pub const CLIMATE: &str = "气候和环境";

    pub const BUDGET_LOW: &str = "5000元以下";
    pub const BUDGET_MID: &str = "5000-10000元";
    pub const BUDGET_HIGH: &str = "10000元以上";

    pub const URGENT: &str = "非常紧急，需要立即决定";
    pub const NOT_URGENT: &str = "不太紧急，可以慢慢考虑";
    pub const JUST_ADVICE: &str = "只是想听听建议";

    pub const START_OVER: &str = "重新开始";
}

use self::labels::*;

// CJK keywords match anywhere; English ones only as whole words.
const CAREER_KEYWORDS: [&str; 2] = ["工作", "城市"];
const CAREER_WORDS: [&str; 4] = ["work", "job", "city", "career"];
const PURCHASE_KEYWORDS: [&str; 2] = ["买", "购"];
const PURCHASE_WORDS: [&str; 2] = ["buy", "purchase"];

fn mentions(question: &str, keywords: &[&str], words: &[&str]) -> bool {
    keywords.iter().any(|k| question.contains(k))
        || question
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| words.contains(&token))
}

/// Question category, decided by keyword presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Career,
    Purchase,
    General,
}

impl Topic {
    /// Career keywords are checked before purchase keywords; anything else is
    /// general.
    pub fn classify(question: &str) -> Self {
        let q = question.to_lowercase();
        if mentions(&q, &CAREER_KEYWORDS, &CAREER_WORDS) {
            Topic::Career
        } else if mentions(&q, &PURCHASE_KEYWORDS, &PURCHASE_WORDS) {
            Topic::Purchase
        } else {
            Topic::General
        }
    }

    pub fn root_question(&self) -> &'static str {
        match self {
            Topic::Career => "你最看重工作的哪个方面？",
            Topic::Purchase => "你的预算范围是多少？",
            Topic::General => "请先考虑这个问题的优先级",
        }
    }

    /// First-layer choices, in display order.
    pub fn choices(&self) -> [Choice; 3] {
        match self {
            Topic::Career => [Choice::CareerGrowth, Choice::CostOfLiving, Choice::Climate],
            Topic::Purchase => [Choice::BudgetLow, Choice::BudgetMid, Choice::BudgetHigh],
            Topic::General => [Choice::Urgent, Choice::NotUrgent, Choice::JustAdvice],
        }
    }
}

/// A first-layer option: the states of the incremental state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Choice {
    CareerGrowth,
    CostOfLiving,
    Climate,
    BudgetLow,
    BudgetMid,
    BudgetHigh,
    Urgent,
    NotUrgent,
    JustAdvice,
}

impl Choice {
    pub const ALL: [Choice; 9] = [
        Choice::CareerGrowth,
        Choice::CostOfLiving,
        Choice::Climate,
        Choice::BudgetLow,
        Choice::BudgetMid,
        Choice::BudgetHigh,
        Choice::Urgent,
        Choice::NotUrgent,
        Choice::JustAdvice,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Choice::CareerGrowth => CAREER_GROWTH,
            Choice::CostOfLiving => COST_OF_LIVING,
            Choice::Climate => CLIMATE,
            Choice::BudgetLow => BUDGET_LOW,
            Choice::BudgetMid => BUDGET_MID,
            Choice::BudgetHigh => BUDGET_HIGH,
            Choice::Urgent => URGENT,
            Choice::NotUrgent => NOT_URGENT,
            Choice::JustAdvice => JUST_ADVICE,
        }
    }

    /// Exact label match.
    pub fn from_label(label: &str) -> Option<Self> {
        Choice::ALL.into_iter().find(|c| c.label() == label)
    }

    /// The layer shown after this choice. Every option in it is terminal.
    pub fn next_layer(&self) -> DecisionNode {
        match self {
            Choice::CareerGrowth => layer(
                "你更倾向于哪种行业环境？",
                &[
                    ("互联网科技行业", "建议选择北京或深圳。北京有更多大型互联网公司总部，深圳则有腾讯等科技巨头，两地都有丰富的职业发展机会。"),
                    ("金融行业", "建议选择上海。上海是中国的金融中心，拥有最多的金融机构和相关职位，职业发展空间大。"),
                    ("创业环境", "建议选择深圳。深圳的创业氛围浓厚，政策支持力度大，适合有创业想法的人。"),
                ],
            ),
            Choice::CostOfLiving => layer(
                "你的预算范围是？",
                &[
                    ("预算充足，追求高品质生活", "建议选择上海。上海的生活配套设施完善，国际化程度高，适合追求高品质生活的人群。"),
                    ("希望性价比高", "建议选择深圳。相比北京上海，深圳的生活成本相对较低，同时气候宜人，生活质量不错。"),
                ],
            ),
            Choice::Climate => layer(
                "你更喜欢什么样的气候？",
                &[
                    ("四季分明", "建议选择北京。北京四季分明，春秋季节尤其舒适，适合喜欢季节变化的人。"),
                    ("温暖湿润", "建议选择深圳。深圳属于亚热带气候，全年温暖，冬天不冷，适合怕冷的人。"),
                ],
            ),
            Choice::BudgetLow => layer(
                "你主要用途是什么？",
                &[
                    ("日常办公学习", "建议购买中端笔记本电脑或平板电脑，性价比高，满足基本需求。"),
                    ("娱乐游戏", "建议购买游戏主机或中端游戏手机，体验更好。"),
                ],
            ),
            Choice::BudgetMid => layer(
                "你更看重什么？",
                &[
                    ("性能和配置", "建议购买高性能笔记本或台式机，可以满足专业工作和游戏需求。"),
                    ("便携性", "建议购买轻薄本或高端平板，方便携带，性能也不错。"),
                ],
            ),
            Choice::BudgetHigh => layer(
                "你的具体需求是？",
                &[
                    ("专业创作", "建议购买 MacBook Pro 或高端工作站，适合视频剪辑、设计等专业工作。"),
                    ("高端游戏", "建议购买旗舰游戏本，配备最新显卡和处理器，畅玩所有游戏。"),
                ],
            ),
            Choice::Urgent => layer(
                "你有足够的信息做决定吗？",
                &[
                    ("是的，信息充足", "建议根据现有信息快速做出决定，相信你的直觉和经验。"),
                    ("不，还需要更多信息", "建议先快速收集关键信息，咨询相关专家或有经验的人，然后做决定。"),
                ],
            ),
            Choice::NotUrgent => layer(
                "这个决定的影响范围有多大？",
                &[
                    ("影响重大，关系到长远发展", "建议充分调研，列出各选项的利弊，必要时咨询专业人士，做出深思熟虑的决定。"),
                    ("影响较小，可以调整", "建议先尝试一个方案，根据实际效果再调整，不必过度纠结。"),
                ],
            ),
            Choice::JustAdvice => layer(
                "你更倾向于哪种决策方式？",
                &[
                    ("理性分析", "建议列出所有可能的选项，分析每个选项的优缺点，用数据和逻辑做决定。"),
                    ("直觉判断", "建议相信你的第一感觉，结合过往经验，快速做出选择。"),
                ],
            ),
        }
    }

    /// Extra depth used by full-tree mode below one option of this choice's
    /// layer.
    fn deeper_layer(&self, option: &str) -> Option<DecisionNode> {
        match (self, option) {
            (Choice::CareerGrowth, "互联网科技行业") => Some(layer(
                "你更看重平台规模还是成长速度？",
                &[
                    ("大厂平台", "建议选择北京。北京聚集了大量互联网公司总部，大厂平台资源丰富，适合积累经验。"),
                    ("快速成长", "建议选择深圳。深圳科技企业成长迅速，年轻团队多，晋升通道更快。"),
                ],
            )),
            (Choice::BudgetHigh, "专业创作") => Some(layer(
                "你主要从事哪类创作？",
                &[
                    ("视频剪辑与设计", "建议购买 MacBook Pro，屏幕色彩准确，剪辑软件生态成熟。"),
                    ("三维建模与渲染", "建议购买高端图形工作站，配备专业显卡，渲染效率更高。"),
                ],
            )),
            (Choice::NotUrgent, "影响重大，关系到长远发展") => Some(layer(
                "你身边有可以咨询的专业人士吗？",
                &[
                    ("有，可以请教", "建议先与专业人士深入沟通，再结合自己的情况列出利弊，做出深思熟虑的决定。"),
                    ("没有，需要自己判断", "建议充分调研，列出各选项的利弊，给自己设定一个决策期限，避免无限拖延。"),
                ],
            )),
            _ => None,
        }
    }

    /// This choice's layer with the full-tree extra depth attached.
    fn subtree(&self) -> DecisionNode {
        let mut node = self.next_layer();
        node.options = node
            .options
            .into_iter()
            .map(|option| match self.deeper_layer(option.text()) {
                Some(deeper) => TreeOption::full_next(option.text(), deeper),
                None => option,
            })
            .collect();
        node
    }
}

fn layer(question: &str, options: &[(&str, &str)]) -> DecisionNode {
    DecisionNode::new(
        question,
        options
            .iter()
            .map(|(text, result)| TreeOption::terminal(*text, *result))
            .collect(),
    )
}

/// Layer returned for labels the table does not know.
pub fn default_layer() -> DecisionNode {
    layer(
        "需要更多信息来帮助你决策",
        &[(START_OVER, "建议重新思考你的问题，提供更多背景信息。")],
    )
}

/// Incremental first layer: the topic's choices, text only.
pub fn first_layer(topic: Topic) -> DecisionNode {
    DecisionNode::new(
        topic.root_question(),
        topic
            .choices()
            .iter()
            .map(|c| TreeOption::branching(c.label()))
            .collect(),
    )
}

/// Incremental later layer, keyed by the selected label.
pub fn layer_after(selected_option: &str) -> DecisionNode {
    Choice::from_label(selected_option)
        .map(|c| c.next_layer())
        .unwrap_or_else(default_layer)
}

/// Complete nested tree for the topic.
pub fn full_tree(topic: Topic) -> DecisionNode {
    DecisionNode::new(
        topic.root_question(),
        topic
            .choices()
            .iter()
            .map(|c| TreeOption::full_next(c.label(), c.subtree()))
            .collect(),
    )
}

/// Mock output for the mode implied by `context`.
pub fn synthesize(question: &str, context: Option<&GenerationContext>) -> DecisionNode {
    match GenerationMode::from_context(context) {
        GenerationMode::FullTree => full_tree(Topic::classify(question)),
        GenerationMode::FirstLayer => first_layer(Topic::classify(question)),
        GenerationMode::NextLayer(ctx) => layer_after(&ctx.selected_option),
    }
}
