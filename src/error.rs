// error.rs — 错误类型模块
// 整个流程的错误分类：抓取、解析、加载、读写、下载

use std::path::PathBuf;
use thiserror::Error;

/// 流程中所有可能出现的错误
#[derive(Debug, Error)]
pub enum Error {
    /// 网络错误或非 2xx 状态码
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// 页面中找不到内嵌数据，或数据格式不对
    #[error("failed to parse page: {0}")]
    Parse(#[from] ParseError),

    /// 之前保存的列表文件内容不是合法的记录列表
    #[error("failed to load {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    /// 文件读写、目录创建失败
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 单张图片下载失败，只会出现在 DownloadOutcome 里
    #[error("failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    /// 配置文件序列化或写入失败
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// 给 io::Error 附上出错的路径
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// 从 HTML 中提取内嵌数据时的错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("embedded JSON.parse(...) literal not found")]
    PatternNotFound,

    #[error("malformed string literal: {0}")]
    MalformedLiteral(String),

    #[error("malformed JSON payload: {0}")]
    MalformedPayload(String),

    #[error("unexpected payload shape at {path}: {reason}")]
    UnexpectedShape { path: String, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
