use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::params::{parse, to_value};
use super::{ProcedureContext, ProcedureError, ProcedureGroup};
use crate::domain::a002_jd_category::service;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    /// 0 = корневые категории
    #[serde(default)]
    parent_id: i64,
}

pub struct CategoryProcedures;

#[async_trait]
impl ProcedureGroup for CategoryProcedures {
    fn methods(&self) -> &'static [&'static str] {
        &["jd.category.list"]
    }

    async fn call(
        &self,
        _ctx: &ProcedureContext,
        method: &str,
        params: Value,
    ) -> Result<Value, ProcedureError> {
        match method {
            "jd.category.list" => {
                let p: ListParams = parse(params)?;
                to_value(&service::list_by_parent(p.parent_id).await?)
            }
            other => Err(ProcedureError::MethodNotFound(other.to_string())),
        }
    }
}
