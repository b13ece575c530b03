// main.rs — 程序入口
// 负责初始化日志与异步运行时、解析命令行参数、执行流程并输出进度

mod cli;
mod config;
mod error;
mod extract;
mod merge;
mod pipeline;
mod record;
mod rewrite;
mod sink;
mod source;

// 初始化多语言支持，嵌入 locales 目录下的所有翻译
rust_i18n::i18n!("locales");

use clap::{CommandFactory, Parser}; // CommandFactory 用于生成补全脚本
use clap_complete::generate;
use cli::{Cli, Commands, ConfigAction, RunArgs};
use config::{AppConfig, expand_path};
use pipeline::{Event, RunOptions};
use rust_i18n::t;
use source::chromecast::ChromecastHomeClient;
use tracing_subscriber::EnvFilter;

/// `#[tokio::main]` 宏将 async main 转换为同步 main + tokio 运行时
#[tokio::main]
async fn main() {
    // 自动检测系统语言并设置
    let locale = std::env::var("LANG").unwrap_or_else(|_| "en".to_string());
    if locale.starts_with("zh") {
        rust_i18n::set_locale("zh-CN");
    } else {
        rust_i18n::set_locale("en");
    }

    // 日志写到 stderr，级别由 CASTWALL_LOG 控制
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CASTWALL_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::new();

    let result = match cli.command {
        Some(Commands::Completions { shell }) => {
            generate(shell, &mut Cli::command(), "castwall", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Config { action }) => handle_config(&mut config, &action),
        None => handle_run(&config, &cli.run).await,
    };

    if let Err(e) = result {
        eprintln!("{}", t!("error", reason => e));
        std::process::exit(1);
    }
}

/// 合并命令行参数与配置，命令行优先
///
/// 命令行给了宽、高或裁剪而没给 size 时，忽略配置里的 size，
/// 否则 size 会覆盖掉命令行的设置。
fn run_options(config: &AppConfig, args: &RunArgs) -> RunOptions {
    let mut dimensions = config.rewrite.to_spec();
    if args.size.is_none() && (args.width.is_some() || args.height.is_some() || args.crop) {
        dimensions.size = None;
    }
    if args.size.is_some() {
        dimensions.size = args.size;
    }
    if args.width.is_some() {
        dimensions.width = args.width;
    }
    if args.height.is_some() {
        dimensions.height = args.height;
    }
    dimensions.crop |= args.crop;

    RunOptions {
        dimensions,
        layout: config.layout.clone(),
        load: args.load.as_deref().map(expand_path),
        save: args.save.as_deref().map(expand_path),
        writemd: args.writemd.as_deref().map(expand_path),
        download: args.download.as_ref().map(|dir| match dir {
            Some(dir) => expand_path(dir),
            None => config.download_dir.clone(),
        }),
    }
}

/// 把流程事件翻译成给用户看的输出
fn report(event: Event<'_>) {
    match event {
        Event::Fetching => println!("{}", t!("fetching")),
        Event::Extracted { count } => println!("{}", t!("extracted", count => count)),
        Event::Rewritten(spec, summary) => {
            println!("{}", t!("rewriting", spec => format!("{spec:?}")));
            println!(
                "  {}",
                t!(
                    "rewrite_summary",
                    rewritten => summary.rewritten,
                    unchanged => summary.unchanged,
                    skipped => summary.skipped,
                    legacy => summary.legacy
                )
            );
        }
        Event::Loading(path) => println!("{}", t!("loading", path => path.display())),
        Event::Merged { loaded, net_new } => {
            println!("  {}", t!("merged", loaded => loaded, count => net_new))
        }
        Event::Saved(path) => println!("{}", t!("saved", path => path.display())),
        Event::MarkdownWritten(path) => {
            println!("{}", t!("markdown_written", path => path.display()))
        }
        Event::Downloading { count, dir } => {
            println!("{}", t!("downloading", count => count, path => dir.display()))
        }
        Event::Downloaded(outcome) => match &outcome.result {
            Ok(path) => println!("  {}", path.display()),
            Err(e) => println!(
                "  {}",
                t!("download_failed", url => outcome.url, reason => e)
            ),
        },
    }
}

/// 默认流程：抓取、改写、合并、输出
async fn handle_run(config: &AppConfig, args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let home_url = args.home_url.as_deref().unwrap_or(&config.home_url);
    let client = ChromecastHomeClient::new(home_url);
    let options = run_options(config, args);

    let report_data = pipeline::run(&client, &options, report).await?;

    if args.verbose {
        println!("{}", record::to_json(&report_data.records));
    }

    let failed = report_data.failed_downloads();
    if failed > 0 {
        println!(
            "{}",
            t!("download_summary", failed => failed, total => report_data.downloads.len())
        );
    }
    match report_data.net_new {
        Some(net_new) => println!(
            "{}",
            t!("done_merged", count => report_data.records.len(), new => net_new)
        ),
        None => println!("{}", t!("done", count => report_data.records.len())),
    }
    Ok(())
}

/// 处理 config 子命令：查看或修改配置
fn handle_config(
    config: &mut AppConfig,
    action: &ConfigAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            println!("{}", t!("config_title"));
            println!("{}", t!("config_path", path => config.config_path.display()));
            println!("{}", t!("config_home_url", url => config.home_url));
            println!(
                "{}",
                t!("config_download_dir", path => config.download_dir.display())
            );
            println!(
                "{}",
                t!("config_rewrite", spec => format!("{:?}", config.rewrite.to_spec()))
            );
            println!(
                "{}",
                t!("config_layout", layout => format!("{:?}", config.layout))
            );
        }
        ConfigAction::Schema => {
            println!("{}", AppConfig::get_schema());
        }
        ConfigAction::Dump => {
            println!("{}", config.to_toml());
        }
        ConfigAction::Set { key, value } => {
            config
                .set(key, value)
                .map_err(|reason| t!("config_error", key => key, reason => reason).to_string())?;
            config.save()?;
            println!("{}", t!("config_updated", key => key, value => value));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_overrides_config_defaults() {
        let mut config = AppConfig::new();
        config.rewrite.size = None;
        config.rewrite.width = Some(1280);
        config.rewrite.height = Some(720);

        let cli = Cli::try_parse_from(["castwall", "--width", "1920", "--download"]).unwrap();
        let options = run_options(&config, &cli.run);

        assert_eq!(options.dimensions.width, Some(1920));
        assert_eq!(options.dimensions.height, Some(720));
        assert_eq!(options.download.as_ref(), Some(&config.download_dir));
        assert_eq!(options.load, None);
    }

    #[test]
    fn explicit_width_or_height_clears_configured_size() {
        let mut config = AppConfig::new();
        config.rewrite.size = Some(2560);
        config.rewrite.width = None;
        config.rewrite.height = None;
        config.rewrite.crop = false;

        let cli = Cli::try_parse_from(["castwall", "--width", "1920", "--height", "1080"]).unwrap();
        let options = run_options(&config, &cli.run);
        assert_eq!(options.dimensions.size, None);
        assert_eq!(options.dimensions.width, Some(1920));
        assert_eq!(options.dimensions.height, Some(1080));

        let cli = Cli::try_parse_from(["castwall", "--crop"]).unwrap();
        assert_eq!(run_options(&config, &cli.run).dimensions.size, None);

        // 没有任何尺寸参数时仍然使用配置里的 size
        let cli = Cli::try_parse_from(["castwall"]).unwrap();
        assert_eq!(run_options(&config, &cli.run).dimensions.size, Some(2560));

        let cli = Cli::try_parse_from(["castwall", "--size", "1280", "--width", "800"]).unwrap();
        assert_eq!(run_options(&config, &cli.run).dimensions.size, Some(1280));
    }
}
