use super::repository;
use contracts::domain::a010_jd_comment::aggregate::JdComment;

/// Сохранить отзывы, полученные из JD; возвращает число новых
pub async fn store_remote(comments: &mut [JdComment]) -> anyhow::Result<usize> {
    let mut inserted = 0;
    for comment in comments.iter_mut() {
        comment.before_write();
        if repository::upsert(comment).await? {
            inserted += 1;
        }
    }
    Ok(inserted)
}
