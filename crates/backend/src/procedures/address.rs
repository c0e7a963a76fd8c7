use async_trait::async_trait;
use contracts::domain::a004_jd_delivery_address::aggregate::JdDeliveryAddressDto;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::params::{parse, to_value};
use super::{ProcedureContext, ProcedureError, ProcedureGroup};
use crate::domain::a004_jd_delivery_address::service;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountParams {
    account_id: String,
}

#[derive(Debug, Deserialize)]
struct IdParams {
    id: String,
}

impl IdParams {
    fn uuid(&self) -> Result<Uuid, ProcedureError> {
        Uuid::parse_str(&self.id)
            .map_err(|_| ProcedureError::InvalidParams(format!("Invalid address id: {}", self.id)))
    }
}

pub struct AddressProcedures;

#[async_trait]
impl ProcedureGroup for AddressProcedures {
    fn methods(&self) -> &'static [&'static str] {
        &[
            "jd.address.list",
            "jd.address.save",
            "jd.address.delete",
            "jd.address.setDefault",
        ]
    }

    async fn call(
        &self,
        _ctx: &ProcedureContext,
        method: &str,
        params: Value,
    ) -> Result<Value, ProcedureError> {
        match method {
            "jd.address.list" => {
                let p: AccountParams = parse(params)?;
                to_value(&service::list_by_account(&p.account_id).await?)
            }
            "jd.address.save" => {
                let dto: JdDeliveryAddressDto = parse(params)?;
                let id = service::save(dto).await?;
                Ok(json!({"id": id.to_string()}))
            }
            "jd.address.delete" => {
                let p: IdParams = parse(params)?;
                let deleted = service::delete(p.uuid()?).await?;
                Ok(json!({"deleted": deleted}))
            }
            "jd.address.setDefault" => {
                let p: IdParams = parse(params)?;
                service::set_default(p.uuid()?).await?;
                Ok(json!({"ok": true}))
            }
            other => Err(ProcedureError::MethodNotFound(other.to_string())),
        }
    }
}
