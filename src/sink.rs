// sink.rs — 输出模块
// 保存 JSON、写 Markdown 图片列表、批量下载图片

use crate::error::{Error, Result};
use crate::record::{self, BackgroundRecord};
use crate::source::BackgroundSource;
use futures::future::join_all;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 单张图片的下载结果
#[derive(Debug)]
pub struct DownloadOutcome {
    pub url: String,
    /// 成功时为保存后的完整路径
    pub result: Result<PathBuf>,
}

impl DownloadOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

async fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    fs::write(path, content).await.map_err(|e| Error::io(path, e))
}

/// 将列表保存为 JSON 文件
pub async fn save_json(path: &Path, records: &[BackgroundRecord]) -> Result<()> {
    write_file(path, record::to_json(records).as_bytes()).await?;
    tracing::debug!(path = %path.display(), count = records.len(), "saved collection");
    Ok(())
}

/// 每条记录一行 `![](url)`
pub fn render_markdown(records: &[BackgroundRecord]) -> String {
    records
        .iter()
        .map(|r| format!("![]({})\n", r.url))
        .collect()
}

/// 将列表写成内联图片的 Markdown 文件
pub async fn write_markdown(path: &Path, records: &[BackgroundRecord]) -> Result<()> {
    write_file(path, render_markdown(records).as_bytes()).await?;
    tracing::debug!(path = %path.display(), "wrote markdown");
    Ok(())
}

async fn download_one(source: &dyn BackgroundSource, url: &str, dir: &Path) -> Result<PathBuf> {
    let bytes = source.download(url).await?;
    let path = dir.join(record::file_name(url));
    write_file(&path, &bytes).await?;
    Ok(path)
}

/// 并发下载所有图片到指定目录
///
/// 每张图片独立下载，等全部结束后按输入顺序返回各自的结果；
/// 某一张失败不会影响其它图片。目录创建失败则整体失败。
/// 落到同一个文件名的记录只下载第一条，其余不会出现在结果里。
pub async fn download_all(
    source: &dyn BackgroundSource,
    records: &[BackgroundRecord],
    dir: &Path,
) -> Result<Vec<DownloadOutcome>> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::io(dir, e))?;

    let mut seen = HashSet::new();
    let unique = records.iter().filter(|r| {
        let fresh = seen.insert(record::file_name(&r.url));
        if !fresh {
            tracing::debug!(url = %r.url, "skipping download with duplicate file name");
        }
        fresh
    });

    let tasks = unique.map(|r| async move {
        let result = download_one(source, &r.url, dir).await;
        if let Err(e) = &result {
            tracing::warn!(url = %r.url, error = %e, "download failed");
        }
        DownloadOutcome {
            url: r.url.clone(),
            result,
        }
    });

    Ok(join_all(tasks).await)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// 内存中的壁纸来源，测试用
    pub(crate) struct FakeSource {
        pub page: String,
        pub images: HashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl BackgroundSource for FakeSource {
        async fn fetch_page(&self) -> Result<String> {
            Ok(self.page.clone())
        }

        async fn download(&self, url: &str) -> Result<Vec<u8>> {
            self.images.get(url).cloned().ok_or_else(|| Error::Download {
                url: url.to_string(),
                reason: "404 Not Found".to_string(),
            })
        }
    }

    pub(crate) fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("castwall-{label}-{}", rand::random::<u64>()))
    }

    #[test]
    fn markdown_has_one_image_per_line() {
        let records = vec![
            BackgroundRecord::new("https://img.example/s1/a.jpg", "A"),
            BackgroundRecord::new("https://img.example/s1/b.jpg", "B"),
        ];
        assert_eq!(
            render_markdown(&records),
            "![](https://img.example/s1/a.jpg)\n![](https://img.example/s1/b.jpg)\n"
        );
        assert_eq!(render_markdown(&[]), "");
    }

    #[tokio::test]
    async fn failed_downloads_do_not_stop_the_others() {
        let dir = temp_dir("download");
        let source = FakeSource {
            page: String::new(),
            images: HashMap::from([
                ("https://img.example/s1/a.jpg".to_string(), b"aaa".to_vec()),
                ("https://img.example/s1/Lake%20c.jpg".to_string(), b"ccc".to_vec()),
            ]),
        };
        let records = vec![
            BackgroundRecord::new("https://img.example/s1/a.jpg", "A"),
            BackgroundRecord::new("https://img.example/s1/missing.jpg", "B"),
            BackgroundRecord::new("https://img.example/s1/Lake%20c.jpg", "C"),
        ];

        let outcomes = download_all(&source, &records, &dir).await.unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert!(matches!(outcomes[1].result, Err(Error::Download { .. })));
        assert!(outcomes[2].is_ok());
        assert_eq!(std::fs::read(dir.join("a.jpg")).unwrap(), b"aaa");
        assert_eq!(std::fs::read(dir.join("Lake c.jpg")).unwrap(), b"ccc");
        assert!(!dir.join("missing.jpg").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn records_sharing_a_file_name_download_once() {
        let dir = temp_dir("dedup");
        let source = FakeSource {
            page: String::new(),
            images: HashMap::from([
                ("https://img.example/s2560/a.jpg".to_string(), b"big".to_vec()),
                ("https://img.example/s1280/a.jpg".to_string(), b"small".to_vec()),
            ]),
        };
        let records = vec![
            BackgroundRecord::new("https://img.example/s2560/a.jpg", "A"),
            BackgroundRecord::new("https://img.example/s1280/a.jpg", "A"),
        ];

        let outcomes = download_all(&source, &records, &dir).await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].url, "https://img.example/s2560/a.jpg");
        assert_eq!(std::fs::read(dir.join("a.jpg")).unwrap(), b"big");
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn saved_json_loads_back() {
        let dir = temp_dir("save");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("backgrounds.json");
        let records = vec![BackgroundRecord::new("https://img.example/s1/a.jpg", "A")];

        save_json(&path, &records).await.unwrap();
        assert_eq!(record::load_collection(&path).await.unwrap(), records);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
