// cli.rs — 命令行接口定义模块
// 使用 clap 的 derive 模式定义参数和子命令

use clap::{Args, Parser, Subcommand}; // Parser: 解析命令行参数的 trait; Subcommand: 定义子命令的 trait
use clap_complete::Shell; // Shell 枚举：Bash, Zsh, Fish, Elvish, PowerShell

/// Chromecast 背景图抓取工具
///
/// 抓取 Chromecast 主页上的壁纸列表，可改写图片尺寸、
/// 与之前保存的列表合并，并保存为 JSON / Markdown 或直接下载。
#[derive(Parser)]
#[command(name = "castwall")]
#[command(version)] // 自动从 Cargo.toml 读取 version 字段
#[command(author)]
#[command(about = "Chromecast 背景图抓取工具 — 抓取、改写尺寸、合并、保存与下载")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunArgs,
}

/// 不带子命令时的运行参数
///
/// 用法示例:
///   castwall --size 2560 --load backgrounds.json --save backgrounds.json
///   castwall --width 1920 --height 1080 --crop --writemd README.md
///   castwall --download ~/Pictures/chromecast
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// 最大边长，如 2560 或 s2560；会清除宽、高和裁剪设置
    #[arg(long, value_name = "PIXELS", value_parser = parse_size)]
    pub size: Option<u32>,

    /// 图片宽度，如 1920 或 w1920
    #[arg(long, value_name = "PIXELS", value_parser = parse_width)]
    pub width: Option<u32>,

    /// 图片高度，如 1080 或 h1080
    #[arg(long, value_name = "PIXELS", value_parser = parse_height)]
    pub height: Option<u32>,

    /// 按宽高裁剪
    #[arg(long)]
    pub crop: bool,

    /// 之前保存的 JSON 列表，与本次结果合并
    #[arg(long, value_name = "FILE")]
    pub load: Option<String>,

    /// 将结果保存为 JSON
    #[arg(long, value_name = "FILE")]
    pub save: Option<String>,

    /// 将结果写成内联图片的 Markdown
    #[arg(long, value_name = "FILE")]
    pub writemd: Option<String>,

    /// 下载所有图片到目录（不指定则使用配置中的下载目录）
    #[arg(long, value_name = "DIR", num_args = 0..=1)]
    pub download: Option<Option<String>>,

    /// 打印完整的列表
    #[arg(short, long)]
    pub verbose: bool,

    /// 覆盖主页地址
    #[arg(long, value_name = "URL")]
    pub home_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 生成 shell 补全脚本（支持 bash, zsh, fish, elvish, powershell）
    ///
    /// 用法示例：
    ///   castwall completions zsh > ~/.zsh/completions/_castwall
    Completions {
        /// 目标 shell 类型
        shell: Shell,
    },

    /// 配置管理操作
    ///
    /// 用法示例:
    ///   castwall config show
    ///   castwall config set size 2560
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// 配置管理操作
#[derive(Subcommand)]
pub enum ConfigAction {
    /// 查看当前配置简报
    Show,
    /// 生成配置文件对应的 JSON Schema
    Schema,
    /// 以 TOML 格式打印当前完整配置内容
    Dump,
    /// 设置配置项 (支持: home_url, download_dir, size, width, height, crop)
    Set {
        /// 要设置的键
        key: String,
        /// 要设置的值
        value: String,
    },
}

/// 解析像素值，最多允许一个与参数对应的标记前缀（`--size s2560`、`--width w1920`）
pub fn parse_pixels(value: &str, marker: char) -> Result<u32, String> {
    let digits = value.strip_prefix(marker).unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("`{value}` is not a positive pixel count"));
    }
    match digits.parse::<u32>() {
        Ok(0) | Err(_) => Err(format!("`{value}` is not a positive pixel count")),
        Ok(n) => Ok(n),
    }
}

pub fn parse_size(value: &str) -> Result<u32, String> {
    parse_pixels(value, 's')
}

pub fn parse_width(value: &str) -> Result<u32, String> {
    parse_pixels(value, 'w')
}

pub fn parse_height(value: &str) -> Result<u32, String> {
    parse_pixels(value, 'h')
}
