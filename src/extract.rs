// extract.rs — 从 Chromecast 主页 HTML 中提取壁纸列表
//
// 页面在脚本里用 `JSON.parse('...')` 初始化状态，字符串里是 JS 转义过的 JSON。
// 这里按 JS 字符串规则严格解码，再用 serde_json 解析，绝不执行页面代码。
// 页面格式变化时只需要改这个文件或配置里的 PayloadLayout。

use crate::error::ParseError;
use crate::record::{self, BackgroundRecord};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

/// `JSON.parse('<单引号字符串>')`
static INIT_STATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)JSON\.parse\('((?:[^'\\]|\\.)*)'\)"#).unwrap());

/// 壁纸列表在解析后的状态数组中的位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PayloadLayout {
    /// 从根数组到壁纸列表的下标路径
    #[serde(default = "default_list_path")]
    pub list_path: Vec<usize>,
    /// 每个条目中 URL 的下标
    #[serde(default)]
    pub url_index: usize,
    /// 每个条目中作者的下标
    #[serde(default = "default_author_index")]
    pub author_index: usize,
}

fn default_list_path() -> Vec<usize> {
    vec![0]
}
fn default_author_index() -> usize {
    1
}

impl Default for PayloadLayout {
    fn default() -> Self {
        Self {
            list_path: default_list_path(),
            url_index: 0,
            author_index: default_author_index(),
        }
    }
}

/// 页面中的原始条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBackground {
    pub url: String,
    pub author: String,
}

impl From<RawBackground> for BackgroundRecord {
    fn from(raw: RawBackground) -> Self {
        BackgroundRecord::new(raw.url, raw.author)
    }
}

fn format_path(path: &[usize]) -> String {
    path.iter().map(|i| format!("[{i}]")).collect()
}

fn shape_error(path: &[usize], reason: impl Into<String>) -> ParseError {
    ParseError::UnexpectedShape {
        path: format_path(path),
        reason: reason.into(),
    }
}

/// 提取页面里的原始 (url, author) 列表
pub fn extract_raw_list(html: &str, layout: &PayloadLayout) -> Result<Vec<RawBackground>, ParseError> {
    let caps = INIT_STATE.captures(html).ok_or(ParseError::PatternNotFound)?;
    let literal = decode_js_string(&caps[1])?;
    let state: Value =
        serde_json::from_str(&literal).map_err(|e| ParseError::MalformedPayload(e.to_string()))?;

    let mut node = &state;
    for (depth, &index) in layout.list_path.iter().enumerate() {
        node = node
            .as_array()
            .and_then(|items| items.get(index))
            .ok_or_else(|| shape_error(&layout.list_path[..=depth], "no such element"))?;
    }
    let entries = node
        .as_array()
        .ok_or_else(|| shape_error(&layout.list_path, "not an array"))?;

    let mut path = layout.list_path.clone();
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            path.truncate(layout.list_path.len());
            path.push(i);
            let fields = entry
                .as_array()
                .ok_or_else(|| shape_error(&path, "entry is not an array"))?;

            let url = match fields.get(layout.url_index) {
                Some(Value::String(url)) if record::is_absolute_http(url) => url.clone(),
                _ => {
                    path.push(layout.url_index);
                    return Err(shape_error(&path, "url is not an absolute http(s) URL"));
                }
            };
            let author = match fields.get(layout.author_index) {
                Some(Value::String(author)) => author.clone(),
                None | Some(Value::Null) => String::new(),
                Some(_) => {
                    path.push(layout.author_index);
                    return Err(shape_error(&path, "author is not a string"));
                }
            };
            Ok(RawBackground { url, author })
        })
        .collect()
}

/// 提取并转换为记录
pub fn extract_backgrounds(html: &str, layout: &PayloadLayout) -> Result<Vec<BackgroundRecord>, ParseError> {
    Ok(extract_raw_list(html, layout)?
        .into_iter()
        .map(BackgroundRecord::from)
        .collect())
}

fn hex_value(digits: &str) -> Result<u32, ParseError> {
    u32::from_str_radix(digits, 16)
        .map_err(|_| ParseError::MalformedLiteral(format!("invalid hex escape `{digits}`")))
}

/// 按 JS 字符串字面量规则解码转义
pub fn decode_js_string(literal: &str) -> Result<String, ParseError> {
    let mut units: Vec<u16> = Vec::with_capacity(literal.len());
    let mut chars = literal.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u16; 2];
            units.extend_from_slice(c.encode_utf16(&mut buf));
            continue;
        }

        let escaped = chars
            .next()
            .ok_or_else(|| ParseError::MalformedLiteral("dangling backslash".to_string()))?;
        let unit = match escaped {
            'n' => '\n' as u32,
            'r' => '\r' as u32,
            't' => '\t' as u32,
            'b' => 0x08,
            'f' => 0x0c,
            'v' => 0x0b,
            '0' => 0,
            'x' => {
                let digits: String = chars.by_ref().take(2).collect();
                if digits.len() != 2 {
                    return Err(ParseError::MalformedLiteral("truncated \\x escape".to_string()));
                }
                hex_value(&digits)?
            }
            'u' => {
                let rest = chars.as_str();
                if let Some(braced) = rest.strip_prefix('{') {
                    let end = braced.find('}').ok_or_else(|| {
                        ParseError::MalformedLiteral("unterminated \\u{...} escape".to_string())
                    })?;
                    let code = hex_value(&braced[..end])?;
                    let c = char::from_u32(code).ok_or_else(|| {
                        ParseError::MalformedLiteral(format!("invalid code point {code:#x}"))
                    })?;
                    let mut buf = [0u16; 2];
                    units.extend_from_slice(c.encode_utf16(&mut buf));
                    chars = braced[end + 1..].chars();
                    continue;
                }
                let digits: String = chars.by_ref().take(4).collect();
                if digits.len() != 4 {
                    return Err(ParseError::MalformedLiteral("truncated \\u escape".to_string()));
                }
                hex_value(&digits)?
            }
            // 续行
            '\n' => continue,
            '\r' => {
                if chars.as_str().starts_with('\n') {
                    chars.next();
                }
                continue;
            }
            // 其余转义（\' \" \\ \/ 等）就是字符本身
            other => {
                let mut buf = [0u16; 2];
                units.extend_from_slice(other.encode_utf16(&mut buf));
                continue;
            }
        };
        // 上面的分支都不超过 0xFFFF
        units.push(unit as u16);
    }

    String::from_utf16(&units)
        .map_err(|_| ParseError::MalformedLiteral("unpaired surrogate".to_string()))
}
