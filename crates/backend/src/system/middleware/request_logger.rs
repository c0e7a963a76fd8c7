use axum::body::Body;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::Response;

/// Middleware для логирования HTTP запросов
///
/// Пишет одну строку на запрос: метод, путь, статус, размер ответа
/// (из Content-Length) и длительность.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let status = response.status();
    let size = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let elapsed_ms = start.elapsed().as_millis();

    if status.is_success() {
        tracing::info!("{} {} -> {} ({} bytes, {} ms)", method, path, status.as_u16(), size, elapsed_ms);
    } else {
        tracing::warn!("{} {} -> {} ({} bytes, {} ms)", method, path, status.as_u16(), size, elapsed_ms);
    }

    response
}
