//! Posture analysis result model and the rubric sent to the vision model.

use serde::{Deserialize, Serialize};

/// Score at or above which a normal posture counts as qualified.
pub const QUALIFIED_SCORE: u8 = 80;

pub const POSTURE_PROMPT: &str = r#"你是一位专业的儿童人体工程学专家。请分析上传图片中孩子的写字坐姿。

评分标准 (满分100分)：
1. 背部是否挺直 (不驼背) - 占 30 分
2. 眼睛离桌面/书本距离是否足够 (约一尺/33cm) - 占 25 分
3. 胸口离桌沿是否有一定距离 (约一拳) - 占 25 分
4. 头是否摆正 (不歪头) - 占 20 分

特殊情况处理：
- 如果图片中没有人，返回 status 为 "no_person"
- 如果人物明显不在写字状态（如离开座位、站立），返回 status 为 "not_writing"

请严格按照以下 JSON 格式返回结果，不要包含任何 Markdown 标记或额外文字：
{
    "status": "normal" | "no_person" | "not_writing",
    "score": 0-100 的整数,
    "is_qualified": true 或 false (score >= 80 为 true),
    "issues": ["问题1", "问题2"],
    "suggestion": "给孩子的温柔语音提醒，30字以内，语气像温柔的大姐姐，以鼓励为主。如果合格则为空字符串"
}

请评估这张图片中的坐姿。"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureStatus {
    Normal,
    NoPerson,
    NotWriting,
}

impl std::fmt::Display for PostureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::NoPerson => write!(f, "no_person"),
            Self::NotWriting => write!(f, "not_writing"),
        }
    }
}

/// Normalized outcome of one posture check.
///
/// `is_qualified` is taken verbatim from the model; see [`AnalysisResult::matches_rubric`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub status: PostureStatus,
    #[serde(deserialize_with = "deserialize_score")]
    pub score: u8,
    pub is_qualified: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub issues: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggestion: String,
}

impl AnalysisResult {
    /// Whether the model's own `is_qualified` agrees with the scoring rubric.
    pub fn matches_rubric(&self) -> bool {
        let expected = self.status == PostureStatus::Normal && self.score >= QUALIFIED_SCORE;
        expected == self.is_qualified
    }

    /// A spoken reminder is only worth producing for an unqualified normal posture.
    pub fn wants_reminder(&self) -> bool {
        self.status == PostureStatus::Normal
            && !self.is_qualified
            && !self.suggestion.trim().is_empty()
    }
}

fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    // Models sometimes emit 85.0 instead of 85
    let raw = f64::deserialize(deserializer)?;
    if raw.fract() != 0.0 || !(0.0..=100.0).contains(&raw) {
        return Err(serde::de::Error::custom(format!("score {raw} outside 0-100")));
    }
    Ok(raw as u8)
}

/// An explicit `null` reads the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
