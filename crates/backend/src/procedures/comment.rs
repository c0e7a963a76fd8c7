use async_trait::async_trait;
use contracts::domain::a010_jd_comment::aggregate::JdComment;
use serde::Deserialize;
use serde_json::{json, Value};

use super::params::{default_page_no, parse, to_value};
use super::{ProcedureContext, ProcedureError, ProcedureGroup};
use crate::domain::a010_jd_comment::service;
use crate::shared::jd_cloud::api::comment as comment_api;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    account_id: String,
    sku_id: i64,
    #[serde(default = "default_page_no")]
    page_no: u32,
    #[serde(default = "default_page_size")]
    page_size: u32,
}

fn default_page_size() -> u32 {
    10
}

pub struct CommentProcedures;

#[async_trait]
impl ProcedureGroup for CommentProcedures {
    fn methods(&self) -> &'static [&'static str] {
        &["jd.comment.list"]
    }

    async fn call(
        &self,
        ctx: &ProcedureContext,
        method: &str,
        params: Value,
    ) -> Result<Value, ProcedureError> {
        match method {
            "jd.comment.list" => {
                let p: ListParams = parse(params)?;
                let (_, creds) = ctx.credentials(&p.account_id).await?;
                let page: comment_api::CommentPage = ctx
                    .cached_call_as(
                        &creds,
                        comment_api::METHOD_COMMENT_LIST,
                        comment_api::list_params(p.sku_id, p.page_no, p.page_size),
                    )
                    .await?;

                let mut comments: Vec<JdComment> =
                    page.comments.iter().map(|c| c.to_comment(p.sku_id)).collect();
                let inserted = service::store_remote(&mut comments).await?;

                Ok(json!({
                    "comments": to_value(&comments)?,
                    "total": page.total,
                    "inserted": inserted,
                }))
            }
            other => Err(ProcedureError::MethodNotFound(other.to_string())),
        }
    }
}
