// source/mod.rs — 壁纸来源抽象接口
// 抓取页面与下载图片都通过这个 Trait，测试时可以换成内存实现

pub mod chromecast;

use crate::error::Result;
use async_trait::async_trait;

/// 壁纸来源
///
/// # 异步 Trait 说明
/// 使用 `async_trait` 宏支持 Trait 中的异步方法，
/// 下载会并发进行，所以要求 `Send + Sync`。
#[async_trait]
pub trait BackgroundSource: Send + Sync {
    /// 抓取包含壁纸数据的页面，返回原始 HTML
    async fn fetch_page(&self) -> Result<String>;

    /// 下载单张图片，返回文件内容
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}
