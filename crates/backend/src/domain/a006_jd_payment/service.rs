use super::repository;
use contracts::domain::a006_jd_payment::aggregate::{JdPayment, JdPaymentState};

/// Зарегистрировать попытку оплаты до вызова JD
pub async fn start(
    order_ref: &str,
    jd_order_id: i64,
    pay_type: i32,
    amount: f64,
) -> anyhow::Result<JdPayment> {
    let mut payment = JdPayment::new_pending(order_ref.to_string(), jd_order_id, pay_type, amount);
    payment.before_write();
    repository::insert(&payment).await?;
    Ok(payment)
}

pub async fn save(payment: &mut JdPayment) -> anyhow::Result<()> {
    payment.before_write();
    repository::update(payment).await
}

/// Заказ уже оплачен успешно
pub async fn is_paid(order_ref: &str) -> anyhow::Result<bool> {
    Ok(repository::list_by_order(order_ref)
        .await?
        .iter()
        .any(|p| p.state == JdPaymentState::Paid))
}
