// config.rs — 配置管理模块
// 遵循 Unix 风格：优先从 ~/.config/castwall/config.toml 读取配置

use crate::error::{Error, Result};
use crate::extract::PayloadLayout;
use crate::rewrite::DimensionSpec;
use crate::source::chromecast::DEFAULT_HOME_URL;
use schemars::JsonSchema; // 引入用于生成 JSON Schema 的 trait
use serde::{Deserialize, Serialize}; // 引入序列化与反序列化 trait
use shellexpand::tilde; // 用于展开 ~ 和环境变量
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// 展开路径中的 ~ (支持 ~/path)
pub fn expand_path(path_str: &str) -> PathBuf {
    PathBuf::from(tilde(path_str).into_owned())
}

/// 映射 config.toml 文件内容的嵌套结构体
#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct ConfigFile {
    #[serde(default)]
    common: CommonConfig,
    #[serde(default)]
    rewrite: RewriteDefaults,
    #[serde(default)]
    extract: PayloadLayout,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct CommonConfig {
    /// Chromecast 主页地址
    #[serde(default = "default_home_url")]
    home_url: String,
    /// `--download` 不带目录时使用的目录 (支持 ~，相对路径则相对于 $HOME)
    #[serde(default)]
    download_dir: Option<String>,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            home_url: default_home_url(),
            download_dir: None,
        }
    }
}

fn default_home_url() -> String {
    DEFAULT_HOME_URL.to_string()
}

/// 默认尺寸参数，命令行参数会覆盖这里的值
#[derive(Debug, Clone, Deserialize, Serialize, Default, JsonSchema)]
pub struct RewriteDefaults {
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub crop: bool,
}

impl RewriteDefaults {
    pub fn to_spec(&self) -> DimensionSpec {
        DimensionSpec {
            size: self.size,
            width: self.width,
            height: self.height,
            crop: self.crop,
        }
    }
}

/// 应用全局配置项
pub struct AppConfig {
    /// 主页地址 (优先级：ENV > TOML)
    pub home_url: String,
    /// 默认下载目录
    pub download_dir: PathBuf,
    /// 默认尺寸参数
    pub rewrite: RewriteDefaults,
    /// 页面数据布局
    pub layout: PayloadLayout,
    /// 配置文件所在路径
    pub config_path: PathBuf,
}

impl AppConfig {
    /// 初始化配置
    pub fn new() -> Self {
        let home_path = PathBuf::from(env::var("HOME").unwrap_or_else(|_| ".".to_string()));
        let config_path = home_path.join(".config").join("castwall").join("config.toml");
        let config_file = Self::load_config_from_file(&config_path).unwrap_or_default();
        Self::from_file(config_file, home_path, config_path)
    }

    fn from_file(config_file: ConfigFile, home_path: PathBuf, config_path: PathBuf) -> Self {
        // 优先级：环境变量 > 配置文件内容
        let home_url = env::var("CASTWALL_HOME_URL")
            .ok()
            .unwrap_or(config_file.common.home_url);

        // 下载目录：
        // 1. 配置了路径则展开 ~，相对路径相对于 $HOME
        // 2. 未配置则默认使用 $HOME/Pictures/castwall
        let download_dir = match config_file.common.download_dir {
            Some(dir_str) => {
                let p = expand_path(&dir_str);
                if p.is_absolute() { p } else { home_path.join(p) }
            }
            None => home_path.join("Pictures").join("castwall"),
        };

        Self {
            home_url,
            download_dir,
            rewrite: config_file.rewrite,
            layout: config_file.extract,
            config_path,
        }
    }

    /// 辅助函数：解析 TOML 配置文件，读不到或格式不对时返回 None
    fn load_config_from_file(path: &Path) -> Option<ConfigFile> {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| toml::from_str(&content).ok())
    }

    fn to_config_file(&self) -> ConfigFile {
        ConfigFile {
            common: CommonConfig {
                home_url: self.home_url.clone(),
                download_dir: Some(self.download_dir.to_string_lossy().to_string()),
            },
            rewrite: self.rewrite.clone(),
            extract: self.layout.clone(),
        }
    }

    /// 将配置保存回文件
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let toml_str = toml::to_string_pretty(&self.to_config_file())
            .map_err(|e| Error::Config(e.to_string()))?;
        fs::write(&self.config_path, toml_str).map_err(|e| Error::io(&self.config_path, e))
    }

    /// 修改一个配置项（不保存）
    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        let pixels = |v: &str, marker| crate::cli::parse_pixels(v, marker).map(Some);
        match key {
            "home_url" | "url" => self.home_url = value.to_string(),
            "download_dir" => self.download_dir = expand_path(value),
            "size" => self.rewrite.size = pixels(value, 's')?,
            "width" => self.rewrite.width = pixels(value, 'w')?,
            "height" => self.rewrite.height = pixels(value, 'h')?,
            "crop" => {
                self.rewrite.crop = value
                    .parse()
                    .map_err(|_| format!("expected true or false, got `{value}`"))?
            }
            _ => return Err(format!("unknown key `{key}`")),
        }
        Ok(())
    }

    /// 获取配置文件的 JSON Schema
    pub fn get_schema() -> String {
        let schema = schemars::schema_for!(ConfigFile);
        serde_json::to_string_pretty(&schema).unwrap_or_default()
    }

    /// 将当前配置转换为 TOML 字符串
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(&self.to_config_file())
            .unwrap_or_else(|_| "# Error serializing config".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(text: &str) -> AppConfig {
        let file: ConfigFile = toml::from_str(text).unwrap();
        AppConfig::from_file(file, PathBuf::from("/home/u"), PathBuf::from("/home/u/c.toml"))
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = from_toml("");
        assert_eq!(config.layout, PayloadLayout::default());
        assert!(config.rewrite.to_spec().is_empty());
        assert_eq!(config.download_dir, PathBuf::from("/home/u/Pictures/castwall"));
    }

    #[test]
    fn reads_every_section() {
        let config = from_toml(
            r#"
            [common]
            download_dir = "walls"

            [rewrite]
            size = 2560
            crop = true

            [extract]
            list_path = [1]
            url_index = 1
            author_index = 2
            "#,
        );
        assert_eq!(config.download_dir, PathBuf::from("/home/u/walls"));
        assert_eq!(config.rewrite.size, Some(2560));
        assert!(config.rewrite.crop);
        assert_eq!(
            config.layout,
            PayloadLayout {
                list_path: vec![1],
                url_index: 1,
                author_index: 2
            }
        );
    }

    #[test]
    fn set_validates_values() {
        let mut config = from_toml("");
        config.set("size", "s2048").unwrap();
        config.set("crop", "true").unwrap();
        assert_eq!(config.rewrite.size, Some(2048));
        assert!(config.rewrite.crop);
        assert!(config.set("width", "wide").is_err());
        assert!(config.set("size", "w1920").is_err());
        assert!(config.set("nope", "1").is_err());
    }

    #[test]
    fn dump_parses_back() {
        let mut config = from_toml("");
        config.set("height", "720").unwrap();
        let file: ConfigFile = toml::from_str(&config.to_toml()).unwrap();
        assert_eq!(file.rewrite.height, Some(720));
        assert_eq!(file.extract, PayloadLayout::default());
    }
}
