use super::repository;
use chrono::{DateTime, Utc};
use contracts::domain::a001_jd_account::aggregate::{JdAccount, JdAccountDto, TokenGrant};
use uuid::Uuid;

/// Создание нового аккаунта JD
pub async fn create(dto: JdAccountDto) -> anyhow::Result<Uuid> {
    let code = dto
        .code
        .clone()
        .unwrap_or_else(|| format!("JD-{}", &Uuid::new_v4().to_string()[..8]));
    let mut aggregate = JdAccount::new_for_insert(
        code,
        dto.description.clone(),
        dto.app_key.clone(),
        dto.app_secret.clone().unwrap_or_default(),
    );
    aggregate.base.comment = dto.comment.clone();
    aggregate.is_valid = dto.is_valid;

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;

    if repository::get_by_app_key(&aggregate.app_key).await?.is_some() {
        anyhow::bail!("Account with AppKey {} already exists", aggregate.app_key);
    }

    aggregate.before_write();
    repository::insert(&aggregate).await
}

/// Обновление существующего аккаунта
pub async fn update(dto: JdAccountDto) -> anyhow::Result<Uuid> {
    let id = dto
        .id
        .as_ref()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| anyhow::anyhow!("Invalid ID"))?;

    let mut aggregate = repository::get_by_id(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Account {} not found", id))?;

    aggregate.update(&dto);
    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;

    aggregate.before_write();
    aggregate.base.metadata.increment_version();
    repository::update(&aggregate).await?;
    Ok(id)
}

/// Создать или обновить, в зависимости от наличия id
pub async fn save(dto: JdAccountDto) -> anyhow::Result<Uuid> {
    if dto.id.is_some() {
        update(dto).await
    } else {
        create(dto).await
    }
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<JdAccount>> {
    repository::get_by_id(id).await
}

/// Аккаунт по строковому id; если нет, ошибка
pub async fn get_required(id: &str) -> anyhow::Result<JdAccount> {
    let uuid = Uuid::parse_str(id).map_err(|_| anyhow::anyhow!("Invalid account id: {}", id))?;
    repository::get_by_id(uuid)
        .await?
        .filter(|a| !a.base.metadata.is_deleted)
        .ok_or_else(|| anyhow::anyhow!("Account {} not found", id))
}

pub async fn list_all() -> anyhow::Result<Vec<JdAccount>> {
    repository::list_all().await
}

pub async fn list_valid() -> anyhow::Result<Vec<JdAccount>> {
    repository::list_valid().await
}

/// Сохранить выданный OAuth-сервером токен
pub async fn apply_token(
    account: &mut JdAccount,
    grant: &TokenGrant,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    account.apply_token(grant, now);
    account.before_write();
    repository::update(account).await?;
    tracing::info!(
        "Stored JD token for account {} (expires at {:?})",
        account.base.description,
        account.access_token_expires_at
    );
    Ok(())
}

/// Исключить аккаунт из синхронизации (refresh token отозван)
pub async fn mark_invalid(account: &mut JdAccount) -> anyhow::Result<()> {
    account.is_valid = false;
    account.before_write();
    repository::update(account).await
}

/// Сохраненный аккаунт с токеном, истекающим через `token_hours`
/// (отрицательное значение дает уже истекший токен)
#[cfg(test)]
pub(crate) async fn insert_test_account(token_hours: i64) -> JdAccount {
    let id = create(JdAccountDto {
        id: None,
        code: None,
        description: "Test shop".into(),
        comment: None,
        app_key: format!("KEY-{}", Uuid::new_v4()),
        app_secret: Some("SECRET".into()),
        is_valid: true,
    })
    .await
    .unwrap();
    let mut account = get_by_id(id).await.unwrap().unwrap();
    let grant = TokenGrant {
        access_token: "AT".into(),
        expires_in: token_hours * 3600,
        refresh_token: Some("RT".into()),
        refresh_expires_in: Some(30 * 24 * 3600),
        scope: None,
        open_id: None,
        uid: None,
    };
    apply_token(&mut account, &grant, Utc::now()).await.unwrap();
    account
}
