use contracts::domain::a010_jd_comment::aggregate::JdComment;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::lenient;

pub const METHOD_COMMENT_LIST: &str = "jingdong.ctp.ware.comment.getCommentList";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentEntry {
    #[serde(deserialize_with = "lenient::i64_from_any")]
    pub comment_id: i64,
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub content: String,
    pub nick_name: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub creation_time: Option<String>,
}

impl CommentEntry {
    pub fn to_comment(&self, sku_id: i64) -> JdComment {
        let mut comment =
            JdComment::new_for_insert(sku_id, self.comment_id, self.score, self.content.clone());
        comment.nickname = self.nick_name.clone();
        comment.images = self.images.clone();
        comment.commented_at = self.creation_time.clone();
        comment
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    #[serde(default)]
    pub comments: Vec<CommentEntry>,
    pub total: Option<i64>,
}

pub fn list_params(sku_id: i64, page_no: u32, page_size: u32) -> Value {
    json!({"commentParam": {"skuId": sku_id, "pageNo": page_no, "pageSize": page_size}})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_to_comment() {
        let entry: CommentEntry = serde_json::from_value(json!({
            "commentId": "555", "score": 9, "content": "好用", "nickName": "j***n",
            "images": ["img/1.jpg"], "creationTime": "2024-05-03 12:00:00"
        }))
        .unwrap();
        let comment = entry.to_comment(100);
        assert_eq!(comment.jd_comment_id, 555);
        assert_eq!(comment.score, 5);
        assert_eq!(comment.images.len(), 1);
    }
}
