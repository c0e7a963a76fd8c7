use crate::domain::common::BaseAggregate;
use serde::{Deserialize, Serialize};

crate::define_aggregate_id!(JdCategoryId);

/// Максимальная глубина дерева категорий JD
pub const MAX_CATEGORY_LEVEL: i32 = 3;

/// Категория товаров JD (дерево из трех уровней)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdCategory {
    #[serde(flatten)]
    pub base: BaseAggregate<JdCategoryId>,
    pub category_id: i64,
    /// 0 для категорий первого уровня
    pub parent_id: i64,
    pub level: i32,
    pub name: String,
    /// 1 = действующая, 0 = отключенная
    pub state: i32,
}

impl JdCategory {
    pub fn new_for_insert(category_id: i64, parent_id: i64, level: i32, name: String, state: i32) -> Self {
        Self {
            base: BaseAggregate::new(
                JdCategoryId::new_v4(),
                format!("JD-CAT-{}", category_id),
                name.clone(),
            ),
            category_id,
            parent_id,
            level,
            name,
            state,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.category_id <= 0 {
            return Err("Category id must be positive".into());
        }
        if !(1..=MAX_CATEGORY_LEVEL).contains(&self.level) {
            return Err(format!("Category level {} out of range", self.level));
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.description = self.name.clone();
        self.base.touch();
    }
}
