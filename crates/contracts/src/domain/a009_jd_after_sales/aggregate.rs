use crate::domain::common::BaseAggregate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_aggregate_id!(JdAfterSalesId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfterSalesType {
    Return,
    Exchange,
    Repair,
}

impl AfterSalesType {
    /// customerExpect в API JD: 10 = возврат, 20 = обмен, 30 = ремонт
    pub fn jd_code(&self) -> i32 {
        match self {
            Self::Return => 10,
            Self::Exchange => 20,
            Self::Repair => 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfterSalesState {
    Applied,
    Approved,
    Rejected,
    Processing,
    Completed,
    Cancelled,
}

impl AfterSalesState {
    /// Нормализация afsServiceStep JD
    pub fn from_jd_step(step: i32) -> Self {
        match step {
            10 => Self::Applied,
            20 => Self::Rejected,
            21 | 31 | 32 | 33 | 34 => Self::Processing,
            40 => Self::Approved,
            50 => Self::Completed,
            60 => Self::Cancelled,
            _ => Self::Processing,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Rejected | Self::Completed | Self::Cancelled)
    }
}

/// Заявка на послепродажное обслуживание
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdAfterSales {
    #[serde(flatten)]
    pub base: BaseAggregate<JdAfterSalesId>,
    pub order_ref: String,
    pub jd_order_id: i64,
    pub sku_id: i64,
    pub service_type: AfterSalesType,
    pub quantity: i32,
    pub reason: String,
    pub image_urls: Vec<String>,
    /// 4 = курьер забирает, 40 = клиент отправляет сам
    pub pickware_type: i32,
    pub afs_service_id: Option<i64>,
    pub state: AfterSalesState,
    pub applied_at: DateTime<Utc>,
}

impl JdAfterSales {
    pub fn new_application(
        order_ref: String,
        jd_order_id: i64,
        sku_id: i64,
        service_type: AfterSalesType,
        quantity: i32,
        reason: String,
        image_urls: Vec<String>,
        pickware_type: i32,
    ) -> Self {
        Self {
            base: BaseAggregate::new(
                JdAfterSalesId::new_v4(),
                format!("AFS-{}-{}", jd_order_id, sku_id),
                reason.clone(),
            ),
            order_ref,
            jd_order_id,
            sku_id,
            service_type,
            quantity,
            reason,
            image_urls,
            pickware_type,
            afs_service_id: None,
            state: AfterSalesState::Applied,
            applied_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.quantity <= 0 {
            return Err("Quantity must be positive".into());
        }
        if self.reason.trim().is_empty() {
            return Err("Reason is required".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_mapping() {
        assert_eq!(AfterSalesState::from_jd_step(10), AfterSalesState::Applied);
        assert_eq!(AfterSalesState::from_jd_step(50), AfterSalesState::Completed);
        assert!(AfterSalesState::from_jd_step(60).is_final());
        assert!(!AfterSalesState::from_jd_step(31).is_final());
    }
}
