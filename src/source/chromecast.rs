// chromecast.rs — Chromecast 主页 HTTP 客户端
// 负责抓取主页 HTML 和下载壁纸图片

use super::BackgroundSource;
use crate::error::{Error, Result};
use async_trait::async_trait;

/// 默认的 Chromecast 主页地址
pub const DEFAULT_HOME_URL: &str = "https://clients3.google.com/cast/chromecast/home";

/// Chromecast 主页异步客户端
///
/// `reqwest::Client` 内部维护连接池，抓取页面和所有下载共用一个。
pub struct ChromecastHomeClient {
    client: reqwest::Client,
    home_url: String,
}

impl ChromecastHomeClient {
    pub fn new(home_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            home_url: home_url.into(),
        }
    }

    /// GET 一个地址，非 2xx 状态码视为失败
    async fn get(&self, url: &str) -> std::result::Result<reqwest::Response, reqwest::Error> {
        self.client.get(url).send().await?.error_for_status()
    }
}

#[async_trait]
impl BackgroundSource for ChromecastHomeClient {
    async fn fetch_page(&self) -> Result<String> {
        tracing::debug!(url = %self.home_url, "fetching home page");
        let fetch_error = |source: reqwest::Error| Error::Fetch {
            url: self.home_url.clone(),
            source,
        };

        let response = self.get(&self.home_url).await.map_err(fetch_error)?;
        let body = response.text().await.map_err(fetch_error)?;
        tracing::debug!(bytes = body.len(), "home page fetched");
        Ok(body)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let download_error = |e: reqwest::Error| Error::Download {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.get(url).await.map_err(download_error)?;
        let bytes = response.bytes().await.map_err(download_error)?;
        Ok(bytes.to_vec())
    }
}
