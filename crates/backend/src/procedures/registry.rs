use async_trait::async_trait;
use contracts::shared::json_rpc::{JsonRpcError, SERVER_ERROR};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use super::context::ProcedureContext;
use crate::shared::jd_cloud::JdError;

#[derive(Debug, Error)]
pub enum ProcedureError {
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Jd(#[from] JdError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

fn jd_error_data(err: &JdError) -> Value {
    let (kind, code) = match err {
        JdError::Http(_) => ("http", None),
        JdError::Parse(_) => ("parse", None),
        JdError::Api { code, .. } => ("api", Some(code.clone())),
        JdError::Business { code, .. } => ("business", Some(code.clone())),
        JdError::MissingResponse { .. } => ("missing_response", None),
        JdError::Unauthorized { .. } => ("unauthorized", None),
        JdError::OAuth { code, .. } => ("oauth", Some(code.clone())),
    };
    json!({"kind": kind, "jdCode": code})
}

impl ProcedureError {
    pub fn to_rpc_error(&self) -> JsonRpcError {
        match self {
            Self::MethodNotFound(method) => JsonRpcError::method_not_found(method),
            Self::InvalidParams(detail) => JsonRpcError::invalid_params(detail.clone()),
            Self::Jd(err) => JsonRpcError::new(SERVER_ERROR, err.to_string()).with_data(jd_error_data(err)),
            // сервисы возвращают anyhow, внутри может быть ошибка JD
            Self::Internal(err) => match err.downcast_ref::<JdError>() {
                Some(jd) => JsonRpcError::new(SERVER_ERROR, jd.to_string()).with_data(jd_error_data(jd)),
                None => JsonRpcError::new(SERVER_ERROR, err.to_string())
                    .with_data(json!({"kind": "internal"})),
            },
        }
    }
}

/// Группа процедур одной предметной области
#[async_trait]
pub trait ProcedureGroup: Send + Sync {
    fn methods(&self) -> &'static [&'static str];

    async fn call(
        &self,
        ctx: &ProcedureContext,
        method: &str,
        params: Value,
    ) -> Result<Value, ProcedureError>;
}

/// Таблица `method -> группа`
#[derive(Default, Clone)]
pub struct Registry {
    routes: HashMap<&'static str, Arc<dyn ProcedureGroup>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Реестр со всеми процедурами jd.*
    pub fn with_default_groups() -> Self {
        let mut registry = Self::new();
        registry.register(super::account::AccountProcedures);
        registry.register(super::category::CategoryProcedures);
        registry.register(super::sku::SkuProcedures);
        registry.register(super::address::AddressProcedures);
        registry.register(super::order::OrderProcedures);
        registry.register(super::logistics::LogisticsProcedures);
        registry.register(super::after_sales::AfterSalesProcedures);
        registry.register(super::invoice::InvoiceProcedures);
        registry.register(super::comment::CommentProcedures);
        registry
    }

    pub fn register<G: ProcedureGroup + 'static>(&mut self, group: G) {
        let group: Arc<dyn ProcedureGroup> = Arc::new(group);
        for method in group.methods() {
            if self.routes.insert(*method, group.clone()).is_some() {
                tracing::warn!("Procedure {} registered twice, last one wins", method);
            }
        }
    }

    pub fn methods(&self) -> Vec<&'static str> {
        let mut methods: Vec<&'static str> = self.routes.keys().copied().collect();
        methods.sort_unstable();
        methods
    }

    pub async fn dispatch(
        &self,
        ctx: &ProcedureContext,
        method: &str,
        params: Value,
    ) -> Result<Value, ProcedureError> {
        let group = self
            .routes
            .get(method)
            .ok_or_else(|| ProcedureError::MethodNotFound(method.to_string()))?;
        tracing::debug!("JSON-RPC call {}", method);
        group.call(ctx, method, params).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::shared::config::parse_config;
    use contracts::shared::json_rpc::{INVALID_PARAMS, METHOD_NOT_FOUND};

    pub(crate) fn test_context() -> ProcedureContext {
        let config = parse_config("[database]\npath = \"unused.db\"\n").unwrap();
        ProcedureContext::new(&config).unwrap()
    }

    struct EchoProcedures;

    #[async_trait]
    impl ProcedureGroup for EchoProcedures {
        fn methods(&self) -> &'static [&'static str] {
            &["test.echo", "test.fail"]
        }

        async fn call(
            &self,
            _ctx: &ProcedureContext,
            method: &str,
            params: Value,
        ) -> Result<Value, ProcedureError> {
            match method {
                "test.echo" => Ok(params),
                _ => Err(JdError::Business {
                    code: "3008".into(),
                    message: "sku not found".into(),
                }
                .into()),
            }
        }
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_method() {
        let mut registry = Registry::new();
        registry.register(EchoProcedures);
        let ctx = test_context();

        let result = registry
            .dispatch(&ctx, "test.echo", json!({"a": 1}))
            .await
            .unwrap();
        assert_eq!(result, json!({"a": 1}));

        let err = registry
            .dispatch(&ctx, "test.missing", Value::Null)
            .await
            .unwrap_err();
        assert_eq!(err.to_rpc_error().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_jd_error_carries_code() {
        let mut registry = Registry::new();
        registry.register(EchoProcedures);
        let err = registry
            .dispatch(&test_context(), "test.fail", Value::Null)
            .await
            .unwrap_err()
            .to_rpc_error();
        assert_eq!(err.code, SERVER_ERROR);
        assert_eq!(err.data, Some(json!({"kind": "business", "jdCode": "3008"})));
    }

    #[test]
    fn test_wrapped_jd_error_is_unwrapped() {
        let err: ProcedureError = anyhow::Error::new(JdError::Unauthorized {
            account: "acc".into(),
        })
        .into();
        let rpc = err.to_rpc_error();
        assert_eq!(rpc.data.unwrap()["kind"], "unauthorized");

        let rpc = ProcedureError::InvalidParams("skuIds is empty".into()).to_rpc_error();
        assert_eq!(rpc.code, INVALID_PARAMS);
    }

    #[test]
    fn test_default_groups_cover_all_procedures() {
        let methods = Registry::with_default_groups().methods();
        assert_eq!(methods.len(), 27);
        assert!(methods.contains(&"jd.sku.price"));
        assert!(methods.contains(&"jd.afterSales.cancel"));
        assert!(methods.contains(&"jd.account.exchangeCode"));
    }
}
