pub mod u501_sync_from_jd;
pub mod u502_refresh_tokens;
