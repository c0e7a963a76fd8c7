use super::repository;
use contracts::domain::a004_jd_delivery_address::aggregate::{
    JdDeliveryAddress, JdDeliveryAddressDto,
};
use uuid::Uuid;

/// Создание или обновление адреса доставки
pub async fn save(dto: JdDeliveryAddressDto) -> anyhow::Result<Uuid> {
    let existing_id = match dto.id.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Some(Uuid::parse_str(s).map_err(|_| anyhow::anyhow!("Invalid ID"))?),
        None => None,
    };

    // для перемещенного адреса: аккаунт, из которого он ушел
    let mut moved_from = None;
    let mut aggregate = match existing_id {
        Some(id) => {
            let mut current = repository::get_by_id(id)
                .await?
                .filter(|a| !a.base.metadata.is_deleted)
                .ok_or_else(|| anyhow::anyhow!("Address {} not found", id))?;
            if current.account_ref != dto.account_id {
                moved_from = Some(current.account_ref.clone());
            }
            current.update(&dto);
            current.base.metadata.increment_version();
            current
        }
        None => JdDeliveryAddress::from_dto(&dto),
    };

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();

    let id = aggregate.base.id.value();

    // У аккаунта с адресами всегда есть адрес по умолчанию.
    // Сама редактируемая запись в БД еще старая, поэтому не считается.
    if !aggregate.is_default {
        let other_default = repository::get_default(&aggregate.account_ref)
            .await?
            .filter(|d| d.base.id.value() != id);
        if other_default.is_none() {
            aggregate.is_default = true;
        }
    }

    if aggregate.is_default {
        repository::clear_other_default_flags(&aggregate.account_ref, Some(id)).await?;
    }

    match existing_id {
        Some(_) => repository::update(&aggregate).await?,
        None => {
            repository::insert(&aggregate).await?;
        }
    }

    if let Some(previous_account) = moved_from {
        ensure_default(&previous_account).await?;
    }
    Ok(id)
}

/// Назначить адрес по умолчанию, если у аккаунта его не осталось
async fn ensure_default(account_ref: &str) -> anyhow::Result<()> {
    if repository::get_default(account_ref).await?.is_some() {
        return Ok(());
    }
    if let Some(mut first) = repository::list_by_account(account_ref)
        .await?
        .into_iter()
        .next()
    {
        first.is_default = true;
        first.before_write();
        repository::update(&first).await?;
    }
    Ok(())
}

pub async fn delete(id: Uuid) -> anyhow::Result<bool> {
    let Some(address) = repository::get_by_id(id).await? else {
        return Ok(false);
    };
    let deleted = repository::soft_delete(id).await?;
    if deleted && address.is_default {
        ensure_default(&address.account_ref).await?;
    }
    Ok(deleted)
}

/// Сделать адрес единственным адресом по умолчанию своего аккаунта
pub async fn set_default(id: Uuid) -> anyhow::Result<()> {
    let mut aggregate = repository::get_by_id(id)
        .await?
        .filter(|a| !a.base.metadata.is_deleted)
        .ok_or_else(|| anyhow::anyhow!("Address {} not found", id))?;

    repository::clear_other_default_flags(&aggregate.account_ref, Some(id)).await?;
    aggregate.is_default = true;
    aggregate.before_write();
    repository::update(&aggregate).await
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<JdDeliveryAddress>> {
    repository::get_by_id(id).await
}

pub async fn list_by_account(account_ref: &str) -> anyhow::Result<Vec<JdDeliveryAddress>> {
    repository::list_by_account(account_ref).await
}

pub async fn get_default(account_ref: &str) -> anyhow::Result<Option<JdDeliveryAddress>> {
    repository::get_default(account_ref).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::init_test_database;
    use contracts::domain::a004_jd_delivery_address::aggregate::JdArea;

    fn dto(account_id: &str, receiver: &str) -> JdDeliveryAddressDto {
        JdDeliveryAddressDto {
            id: None,
            account_id: account_id.to_string(),
            receiver_name: receiver.to_string(),
            mobile: "13800138000".into(),
            email: None,
            area: JdArea {
                province_id: 1,
                city_id: 72,
                county_id: 2819,
                town_id: 0,
            },
            province_name: None,
            city_name: None,
            county_name: None,
            town_name: None,
            detail_address: "Jianguo Road 88".into(),
            zip_code: None,
            is_default: false,
        }
    }

    fn account() -> String {
        format!("acc-{}", Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_edit_without_flag_keeps_default() {
        init_test_database().await;
        let acc = account();
        let id = save(dto(&acc, "Zhang San")).await.unwrap();
        assert_eq!(get_default(&acc).await.unwrap().unwrap().base.id.value(), id);

        let mut edit = dto(&acc, "Zhang San");
        edit.id = Some(id.to_string());
        edit.mobile = "13900139000".into();
        save(edit).await.unwrap();

        let default = get_default(&acc).await.unwrap().unwrap();
        assert_eq!(default.base.id.value(), id);
        assert_eq!(default.mobile, "13900139000");
    }

    #[tokio::test]
    async fn test_single_default_per_account() {
        init_test_database().await;
        let acc = account();
        let first = save(dto(&acc, "Zhang San")).await.unwrap();
        let second = save(dto(&acc, "Li Si")).await.unwrap();
        assert_eq!(get_default(&acc).await.unwrap().unwrap().base.id.value(), first);

        set_default(second).await.unwrap();
        let defaults: Vec<_> = list_by_account(&acc)
            .await
            .unwrap()
            .into_iter()
            .filter(|a| a.is_default)
            .collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].base.id.value(), second);
    }

    #[tokio::test]
    async fn test_moving_default_address_promotes_remaining_one() {
        init_test_database().await;
        let (from, to) = (account(), account());
        let moved = save(dto(&from, "Zhang San")).await.unwrap();
        let stays = save(dto(&from, "Li Si")).await.unwrap();

        let mut edit = dto(&to, "Zhang San");
        edit.id = Some(moved.to_string());
        save(edit).await.unwrap();

        assert_eq!(get_default(&from).await.unwrap().unwrap().base.id.value(), stays);
        assert_eq!(get_default(&to).await.unwrap().unwrap().base.id.value(), moved);
    }

    #[tokio::test]
    async fn test_deleting_default_promotes_next() {
        init_test_database().await;
        let acc = account();
        let first = save(dto(&acc, "Zhang San")).await.unwrap();
        let second = save(dto(&acc, "Li Si")).await.unwrap();

        assert!(delete(first).await.unwrap());
        assert_eq!(get_default(&acc).await.unwrap().unwrap().base.id.value(), second);
    }
}
