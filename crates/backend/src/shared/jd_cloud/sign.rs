use chrono::{DateTime, FixedOffset, Utc};
use md5::{Digest, Md5};
use std::collections::BTreeMap;

/// JD timestamps are Beijing time (UTC+8)
const BEIJING_OFFSET_SECS: i32 = 8 * 3600;

/// Строка для подписи: secret + k1v1k2v2... + secret,
/// ключи по возрастанию, пустые значения и сам `sign` не участвуют
pub fn string_to_sign(app_secret: &str, params: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(app_secret.len() * 2 + 256);
    out.push_str(app_secret);
    for (key, value) in params {
        if key == "sign" || value.is_empty() {
            continue;
        }
        out.push_str(key);
        out.push_str(value);
    }
    out.push_str(app_secret);
    out
}

/// MD5 подпись запроса в верхнем регистре
pub fn sign(app_secret: &str, params: &BTreeMap<String, String>) -> String {
    let mut hasher = Md5::new();
    hasher.update(string_to_sign(app_secret, params).as_bytes());
    format!("{:X}", hasher.finalize())
}

pub fn timestamp(now: DateTime<Utc>) -> String {
    let offset = FixedOffset::east_opt(BEIJING_OFFSET_SECS).expect("valid UTC+8 offset");
    now.with_timezone(&offset)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_string_to_sign_sorted_and_filtered() {
        let p = params(&[
            ("v", "2.0"),
            ("app_key", "KEY"),
            ("sign", "IGNORED"),
            ("access_token", ""),
            ("method", "jingdong.x"),
        ]);
        assert_eq!(
            string_to_sign("SECRET", &p),
            "SECRETapp_keyKEYmethodjingdong.xv2.0SECRET"
        );
    }

    #[test]
    fn test_sign_is_uppercase_md5() {
        // md5("abc")
        let p = params(&[("a", "bc")]);
        assert_eq!(sign("", &p), "900150983CD24FB0D6963F7D28E17F72");
        // md5("")
        assert_eq!(sign("", &BTreeMap::new()), "D41D8CD98F00B204E9800998ECF8427E");
    }

    #[test]
    fn test_timestamp_is_beijing_time() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 20, 30, 5).unwrap();
        assert_eq!(timestamp(now), "2024-01-02 04:30:05");
    }
}
