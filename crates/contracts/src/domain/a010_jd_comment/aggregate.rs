use crate::domain::common::BaseAggregate;
use serde::{Deserialize, Serialize};

crate::define_aggregate_id!(JdCommentId);

/// Отзыв покупателя о товаре JD
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdComment {
    #[serde(flatten)]
    pub base: BaseAggregate<JdCommentId>,
    pub sku_id: i64,
    pub jd_comment_id: i64,
    /// Оценка 1..=5
    pub score: i32,
    pub content: String,
    pub nickname: Option<String>,
    pub images: Vec<String>,
    pub commented_at: Option<String>,
}

impl JdComment {
    pub fn new_for_insert(sku_id: i64, jd_comment_id: i64, score: i32, content: String) -> Self {
        Self {
            base: BaseAggregate::new(
                JdCommentId::new_v4(),
                format!("CMT-{}", jd_comment_id),
                content.chars().take(64).collect(),
            ),
            sku_id,
            jd_comment_id,
            score: score.clamp(1, 5),
            content,
            nickname: None,
            images: Vec::new(),
            commented_at: None,
        }
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_is_clamped() {
        assert_eq!(JdComment::new_for_insert(1, 2, 9, "ok".into()).score, 5);
        assert_eq!(JdComment::new_for_insert(1, 2, 0, "ok".into()).score, 1);
    }
}
