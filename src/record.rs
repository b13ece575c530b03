// record.rs — 壁纸记录模型
// 一条记录就是一张壁纸：图片 URL + 作者

use crate::error::{Error, Result};
use crate::rewrite::strip_trailing_option;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use url::Url;

/// 单张壁纸
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundRecord {
    /// 图片的绝对 URL，路径中带有尺寸段
    pub url: String,
    /// 作者署名，可能为空
    #[serde(default, deserialize_with = "null_as_empty")]
    pub author: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl BackgroundRecord {
    pub fn new(url: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            author: author.into(),
        }
    }

    /// 去重用的身份键，见 [`identity_key`]
    pub fn identity_key(&self) -> String {
        identity_key(&self.url)
    }
}

/// 计算 URL 的身份键：解码后的最后一段路径（文件名）
///
/// 同一张图片换了尺寸段后身份键不变，所以合并时会被当成同一张。
pub fn identity_key(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last = path.rsplit('/').next().unwrap_or(path);
    percent_decode_str(strip_trailing_option(last))
        .decode_utf8_lossy()
        .into_owned()
}

/// 是否为带主机名的绝对 http(s) URL
pub fn is_absolute_http(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

/// 下载到本地时使用的文件名
pub fn file_name(url: &str) -> String {
    let name = identity_key(url).replace(['/', '\\'], "_");
    if name.is_empty() {
        "background.jpg".to_string()
    } else {
        name
    }
}

/// 将 JSON 文本解析为记录列表
///
/// 格式不对或 URL 不是绝对 http(s) 地址时返回 [`Error::Load`]，不做部分恢复。
pub fn parse_collection(text: &str, path: &Path) -> Result<Vec<BackgroundRecord>> {
    let records: Vec<BackgroundRecord> =
        serde_json::from_str(text).map_err(|e| Error::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if let Some(i) = records.iter().position(|r| !is_absolute_http(&r.url)) {
        return Err(Error::Load {
            path: path.to_path_buf(),
            reason: format!("record {i} url `{}` is not an absolute http(s) URL", records[i].url),
        });
    }

    Ok(records)
}

/// 读取之前保存的列表文件
pub async fn load_collection(path: &Path) -> Result<Vec<BackgroundRecord>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::io(path, e))?;
    let records = parse_collection(&text, path)?;
    tracing::debug!(path = %path.display(), count = records.len(), "loaded collection");
    Ok(records)
}

/// 序列化为保存用的 JSON 文本
pub fn to_json(records: &[BackgroundRecord]) -> String {
    // Vec<{String, String}> 序列化不会失败
    serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_key_ignores_dimension_segment() {
        assert_eq!(
            identity_key("https://img.example/s2560/photo1.jpg"),
            identity_key("https://img.example/s1280/photo1.jpg")
        );
        assert_eq!(identity_key("https://img.example/s2560/photo1.jpg"), "photo1.jpg");
    }

    #[test]
    fn identity_key_is_percent_decoded() {
        assert_eq!(
            identity_key("https://img.example/s2560/Lake%20Tahoe.jpg"),
            "Lake Tahoe.jpg"
        );
    }

    #[test]
    fn identity_key_ignores_query_and_trailing_option() {
        assert_eq!(identity_key("https://img.example/s1/photo.jpg?v=2"), "photo.jpg");
        assert_eq!(
            identity_key("https://lh5.googleusercontent.com/proxy/AbCd=s1280-w1280-h720"),
            identity_key("https://lh5.googleusercontent.com/proxy/AbCd=s2560")
        );
    }

    #[test]
    fn file_name_never_contains_separators() {
        assert_eq!(file_name("https://img.example/s1/a%2Fb.jpg"), "a_b.jpg");
        assert_eq!(file_name("https://img.example/s1/"), "background.jpg");
    }

    #[test]
    fn parses_saved_collection() {
        let text = r#"[{"url":"https://img.example/s1/a.jpg","author":"A"},
                       {"url":"https://img.example/s1/b.jpg","author":null},
                       {"url":"https://img.example/s1/c.jpg"}]"#;
        let records = parse_collection(text, Path::new("saved.json")).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], BackgroundRecord::new("https://img.example/s1/a.jpg", "A"));
        assert_eq!(records[1].author, "");
        assert_eq!(records[2].author, "");
    }

    #[test]
    fn malformed_collection_is_a_load_error() {
        for text in ["{}", "not json", r#"[{"author":"A"}]"#, r#"[{"url":"","author":"A"}]"#] {
            let err = parse_collection(text, Path::new("saved.json")).unwrap_err();
            assert!(matches!(err, Error::Load { .. }), "{text}: {err}");
        }
    }

    #[test]
    fn relative_urls_are_rejected_on_load() {
        for url in ["//s100.example/s1/a.jpg", "photo.jpg", "not a url", "ftp://img.example/s1/a.jpg"] {
            let text = format!(r#"[{{"url":"{url}","author":"A"}}]"#);
            let err = parse_collection(&text, Path::new("saved.json")).unwrap_err();
            assert!(matches!(err, Error::Load { .. }), "{url}: {err}");
        }
    }

    #[test]
    fn absolute_http_check() {
        assert!(is_absolute_http("https://img.example/s1/a.jpg"));
        assert!(is_absolute_http("http://img.example/a.jpg"));
        assert!(!is_absolute_http("//img.example/a.jpg"));
        assert!(!is_absolute_http("photo.jpg"));
        assert!(!is_absolute_http("not a url"));
        assert!(!is_absolute_http("data:image/png;base64,AAAA"));
    }

    #[test]
    fn json_round_trip_keeps_order() {
        let records = vec![
            BackgroundRecord::new("https://img.example/s1/b.jpg", "B"),
            BackgroundRecord::new("https://img.example/s1/a.jpg", "A"),
        ];
        let parsed = parse_collection(&to_json(&records), Path::new("x.json")).unwrap();
        assert_eq!(parsed, records);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join(format!("castwall-missing-{}.json", rand::random::<u64>()));
        let err = load_collection(&path).await.unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
