// rewrite.rs — 图片尺寸改写模块
// 改写 googleusercontent 风格 URL 中表示尺寸/裁剪的那一段，例如:
//   https://lh3.googleusercontent.com/-xx/AAA/s1280-w1280-c-h720-k-no/photo.jpg
// 中的 `s1280-w1280-c-h720-k-no`
//
// 这里只做纯数据变换，不做任何 I/O，也不打印

use crate::record::BackgroundRecord;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// 调用方请求的尺寸参数
///
/// `size` 优先级最高：一旦给出，改写后的段里只剩 `s<size>`。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionSpec {
    pub size: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub crop: bool,
}

impl DimensionSpec {
    /// 没有任何参数时改写器什么都不做
    pub fn is_empty(&self) -> bool {
        self.size.is_none() && self.width.is_none() && self.height.is_none() && !self.crop
    }
}

/// 已知的尺寸段写法，按顺序尝试
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentGrammar {
    /// 文件名前面紧挨着的那一级目录: `/w1280-c-h720/photo.jpg`
    DirectoryBeforeFile,
    /// 路径里第一个以 `s<数字>` 开头的目录: `/s2560-rj/…`
    LegacySizeDirectory,
    /// 文件名末尾的选项: `/AbCd=s1280-w1280`
    TrailingOption,
}

static GRAMMARS: LazyLock<Vec<(SegmentGrammar, Regex)>> = LazyLock::new(|| {
    vec![
        (
            SegmentGrammar::DirectoryBeforeFile,
            Regex::new(r"/([swh]\d+(?:-[0-9a-z]+)*)/[^/]+$").unwrap(),
        ),
        (
            SegmentGrammar::LegacySizeDirectory,
            Regex::new(r"/(s\d+[^/]*)/").unwrap(),
        ),
        (
            SegmentGrammar::TrailingOption,
            Regex::new(r"=([swh]\d+(?:-[0-9a-z]+)*)$").unwrap(),
        ),
    ]
});

/// 在 URL 中定位到的尺寸段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionSegment {
    pub grammar: SegmentGrammar,
    /// 在整个 URL 字符串中的字节范围
    pub range: Range<usize>,
}

/// 单个 URL 的改写结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlRewrite {
    /// 新的 URL，以及命中的写法
    Rewritten { url: String, grammar: SegmentGrammar },
    /// 找到了尺寸段，但结果与原来一致
    Unchanged,
    /// 没有可识别的尺寸段，保持原样
    Skipped,
}

/// 一次批量改写的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    pub rewritten: usize,
    pub unchanged: usize,
    pub skipped: usize,
    /// 改写中有多少条是靠宽松的旧写法 `LegacySizeDirectory` 匹配的
    pub legacy: usize,
}

/// 返回 URL 中路径部分的范围（不含协议、主机、查询串和片段）
///
/// 没有 `://` 的地址无法区分主机和路径，返回 None。
fn path_range(url: &str) -> Option<Range<usize>> {
    let after_scheme = url.find("://")? + 3;
    let start = url[after_scheme..]
        .find('/')
        .map(|i| after_scheme + i)
        .unwrap_or(url.len());
    let end = url[start..]
        .find(['?', '#'])
        .map(|i| start + i)
        .unwrap_or(url.len());
    Some(start..end)
}

/// 用单个写法在 URL 的路径里查找尺寸段
pub fn match_grammar(url: &str, grammar: SegmentGrammar) -> Option<DimensionSegment> {
    let (_, re) = GRAMMARS.iter().find(|(g, _)| *g == grammar)?;
    let path = path_range(url)?;
    let caps = re.captures(&url[path.clone()])?;
    let seg = caps.get(1)?;
    Some(DimensionSegment {
        grammar,
        range: path.start + seg.start()..path.start + seg.end(),
    })
}

/// 依次尝试所有写法，返回第一个命中的尺寸段
pub fn find_segment(url: &str) -> Option<DimensionSegment> {
    GRAMMARS
        .iter()
        .find_map(|(grammar, _)| match_grammar(url, *grammar))
}

fn is_pixel_token(token: &str, marker: u8) -> bool {
    token.len() > 1
        && token.as_bytes()[0] == marker
        && token[1..].bytes().all(|b| b.is_ascii_digit())
}

fn is_dimension_token(token: &str) -> bool {
    token == "c" || [b's', b'w', b'h'].iter().any(|m| is_pixel_token(token, *m))
}

/// 按参数改写一个尺寸段
///
/// 给了 `size` 时直接返回 `s<size>`；否则只替换给出的字段，
/// 其余尺寸字段保留原值，非尺寸字段（如 `k`、`no`）按原顺序接在后面。
pub fn rewrite_segment(segment: &str, spec: &DimensionSpec) -> String {
    if let Some(size) = spec.size {
        return format!("s{size}");
    }

    let tokens: Vec<&str> = segment.split('-').collect();
    let existing = |marker: u8| {
        tokens
            .iter()
            .find(|t| is_pixel_token(t, marker))
            .map(|t| t.to_string())
    };

    let mut out: Vec<String> = Vec::new();
    out.extend(existing(b's'));
    match spec.width {
        Some(w) => out.push(format!("w{w}")),
        None => out.extend(existing(b'w')),
    }
    match spec.height {
        Some(h) => out.push(format!("h{h}")),
        None => out.extend(existing(b'h')),
    }
    if spec.crop || tokens.contains(&"c") {
        out.push("c".to_string());
    }
    out.extend(
        tokens
            .iter()
            .filter(|t| !t.is_empty() && !is_dimension_token(t))
            .map(|t| t.to_string()),
    );

    out.join("-")
}

/// 改写单个 URL
pub fn rewrite_url(url: &str, spec: &DimensionSpec) -> UrlRewrite {
    if spec.is_empty() {
        return UrlRewrite::Unchanged;
    }
    let Some(segment) = find_segment(url) else {
        return UrlRewrite::Skipped;
    };

    let replacement = rewrite_segment(&url[segment.range.clone()], spec);
    let mut rewritten = String::with_capacity(url.len() + replacement.len());
    rewritten.push_str(&url[..segment.range.start]);
    rewritten.push_str(&replacement);
    rewritten.push_str(&url[segment.range.end..]);

    if rewritten == url {
        UrlRewrite::Unchanged
    } else {
        UrlRewrite::Rewritten {
            url: rewritten,
            grammar: segment.grammar,
        }
    }
}

/// 原地改写每条记录的 `url` 字段
pub fn rewrite_all(records: &mut [BackgroundRecord], spec: &DimensionSpec) -> RewriteSummary {
    let mut summary = RewriteSummary::default();
    for record in records.iter_mut() {
        match rewrite_url(&record.url, spec) {
            UrlRewrite::Rewritten { url, grammar } => {
                record.url = url;
                summary.rewritten += 1;
                if grammar == SegmentGrammar::LegacySizeDirectory {
                    summary.legacy += 1;
                }
            }
            UrlRewrite::Unchanged => summary.unchanged += 1,
            UrlRewrite::Skipped => summary.skipped += 1,
        }
    }
    summary
}

/// 去掉文件名末尾的 `=<尺寸选项>`，用于计算记录的身份键
pub fn strip_trailing_option(file_name: &str) -> &str {
    let re = GRAMMARS
        .iter()
        .find(|(g, _)| *g == SegmentGrammar::TrailingOption)
        .map(|(_, re)| re);
    match re.and_then(|re| re.find(file_name)) {
        Some(m) => &file_name[..m.start()],
        None => file_name,
    }
}
