// pipeline.rs — 一次完整运行的流程编排
// 抓取 → 提取 → [改写尺寸] → [与旧列表合并] → 输出
//
// 这里不打印任何东西，进度通过事件回调交给入口处理

use crate::error::Result;
use crate::extract::{self, PayloadLayout};
use crate::merge;
use crate::record::{self, BackgroundRecord};
use crate::rewrite::{self, DimensionSpec, RewriteSummary};
use crate::sink::{self, DownloadOutcome};
use crate::source::BackgroundSource;
use std::path::{Path, PathBuf};

/// 本次运行要做哪些事
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dimensions: DimensionSpec,
    pub layout: PayloadLayout,
    pub load: Option<PathBuf>,
    pub save: Option<PathBuf>,
    pub writemd: Option<PathBuf>,
    pub download: Option<PathBuf>,
}

/// 运行过程中的进度事件
#[derive(Debug)]
pub enum Event<'a> {
    Fetching,
    Extracted { count: usize },
    Rewritten(&'a DimensionSpec, RewriteSummary),
    Loading(&'a Path),
    Merged { loaded: usize, net_new: usize },
    Saved(&'a Path),
    MarkdownWritten(&'a Path),
    Downloading { count: usize, dir: &'a Path },
    Downloaded(&'a DownloadOutcome),
}

/// 运行结果
#[derive(Debug)]
pub struct RunReport {
    pub records: Vec<BackgroundRecord>,
    /// 只有加载了旧列表时才有
    pub net_new: Option<usize>,
    pub downloads: Vec<DownloadOutcome>,
}

impl RunReport {
    pub fn failed_downloads(&self) -> usize {
        self.downloads.iter().filter(|d| !d.is_ok()).count()
    }
}

/// 执行一次完整流程
///
/// 抓取、解析和加载旧列表都在写任何文件之前完成，
/// 所以这几步失败时不会留下任何输出文件。
pub async fn run(
    source: &dyn BackgroundSource,
    options: &RunOptions,
    mut on_event: impl FnMut(Event<'_>),
) -> Result<RunReport> {
    on_event(Event::Fetching);
    let html = source.fetch_page().await?;
    let mut records = extract::extract_backgrounds(&html, &options.layout)?;
    on_event(Event::Extracted {
        count: records.len(),
    });

    if !options.dimensions.is_empty() {
        let summary = rewrite::rewrite_all(&mut records, &options.dimensions);
        on_event(Event::Rewritten(&options.dimensions, summary));
    }

    let mut net_new = None;
    if let Some(path) = &options.load {
        on_event(Event::Loading(path));
        let previous = record::load_collection(path).await?;
        let loaded = previous.len();
        let merged = merge::merge(records, previous);
        records = merged.records;
        net_new = Some(merged.net_new);
        on_event(Event::Merged {
            loaded,
            net_new: merged.net_new,
        });
    }

    if let Some(path) = &options.save {
        sink::save_json(path, &records).await?;
        on_event(Event::Saved(path));
    }

    if let Some(path) = &options.writemd {
        sink::write_markdown(path, &records).await?;
        on_event(Event::MarkdownWritten(path));
    }

    let mut downloads = Vec::new();
    if let Some(dir) = &options.download {
        on_event(Event::Downloading {
            count: records.len(),
            dir,
        });
        downloads = sink::download_all(source, &records, dir).await?;
        for outcome in &downloads {
            on_event(Event::Downloaded(outcome));
        }
    }

    Ok(RunReport {
        records,
        net_new,
        downloads,
    })
}
