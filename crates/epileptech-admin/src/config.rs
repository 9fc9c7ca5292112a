//! 配置管理
//!
//! 提供统一的配置加载、验证和保存功能。配置来源依次为默认值、配置文件
//! 和 `EPILEPTECH_` 前缀的环境变量（层级分隔符为 `__`，例如
//! `EPILEPTECH_LOGGING__LEVEL=debug`）。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use epileptech_registry::IntakePolicy;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info};

/// 配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    /// 配置数据
    config: Arc<RwLock<EpileptechConfig>>,
    /// 配置文件路径
    config_path: Option<PathBuf>,
    /// 配置验证器
    validator: ConfigValidator,
}

/// 系统完整配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpileptechConfig {
    /// 登记表配置
    pub registry: RegistryConfig,
    /// 病例录入配置
    pub intake: IntakeConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 登记表配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// 启动时载入示例病例
    pub seed_sample_data: bool,
}

/// 病例录入配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// 允许的脑电文件扩展名
    pub allowed_extensions: Vec<String>,
    /// 自动编号的最大尝试次数
    pub max_id_attempts: u32,
}

impl IntakeConfig {
    pub fn policy(&self) -> IntakePolicy {
        IntakePolicy {
            allowed_extensions: self.allowed_extensions.clone(),
            max_id_attempts: self.max_id_attempts,
        }
    }
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别或过滤指令，例如 `info` 或 `epileptech_registry=debug`
    pub level: String,
    /// 输出格式
    pub format: LogFormat,
}

/// 配置验证器
#[derive(Debug)]
pub struct ConfigValidator {
    validation_rules: Vec<ValidationRule>,
}

/// 验证规则
#[derive(Debug)]
struct ValidationRule {
    field_path: String,
    validator: fn(&EpileptechConfig) -> Result<()>,
    error_message: String,
}

impl ConfigManager {
    /// 从配置文件加载配置，文件不存在时使用默认值
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Self::load_config(config_path)?;
        let validator = ConfigValidator::new();
        validator.validate(&config)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path: config_path.map(Path::to_path_buf),
            validator,
        })
    }

    /// 加载配置
    fn load_config(config_path: Option<&Path>) -> Result<EpileptechConfig> {
        let mut builder = Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("EPILEPTECH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: EpileptechConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        match config_path {
            Some(path) => info!("Configuration loaded from: {}", path.display()),
            None => info!("Configuration loaded from defaults and environment"),
        }
        Ok(config)
    }

    /// 获取当前配置
    pub async fn get_config(&self) -> EpileptechConfig {
        let config = self.config.read().await;
        config.clone()
    }

    /// 更新配置
    pub async fn update_config(&self, new_config: EpileptechConfig) -> Result<()> {
        self.validator.validate(&new_config)?;

        {
            let mut config = self.config.write().await;
            *config = new_config;
        }

        info!("Configuration updated successfully");
        Ok(())
    }

    /// 保存配置到文件
    pub async fn save_config(&self) -> Result<()> {
        let path = self
            .config_path
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No configuration file path configured"))?;

        let config = self.config.read().await;
        let config_str = Self::serialize_for(path, &config)?;

        tokio::fs::write(path, config_str)
            .await
            .context("Failed to write configuration file")?;

        info!("Configuration saved to: {}", path.display());
        Ok(())
    }

    /// 重新加载配置
    pub async fn reload_config(&self) -> Result<()> {
        let new_config = Self::load_config(self.config_path.as_deref())?;
        self.update_config(new_config).await
    }

    /// 按文件扩展名选择序列化格式，与加载时的格式推断保持一致
    fn serialize_for(path: &Path, config: &EpileptechConfig) -> Result<String> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("toml") => {
                toml::to_string_pretty(config).context("Failed to serialize configuration as TOML")
            }
            Some("json") => serde_json::to_string_pretty(config)
                .context("Failed to serialize configuration as JSON"),
            _ => Err(anyhow::anyhow!(
                "Unsupported configuration file format: {}",
                path.display()
            )),
        }
    }
}

impl ConfigValidator {
    /// 创建新的配置验证器
    pub fn new() -> Self {
        let validation_rules = vec![
            ValidationRule {
                field_path: "intake.max_id_attempts".to_string(),
                validator: |config| {
                    if config.intake.max_id_attempts == 0 {
                        Err(anyhow::anyhow!("Max id attempts cannot be 0"))
                    } else {
                        Ok(())
                    }
                },
                error_message: "Invalid intake max id attempts".to_string(),
            },
            ValidationRule {
                field_path: "intake.allowed_extensions".to_string(),
                validator: |config| {
                    let extensions = &config.intake.allowed_extensions;
                    if extensions.is_empty() {
                        return Err(anyhow::anyhow!("At least one extension must be allowed"));
                    }
                    match extensions.iter().find(|ext| !ext.starts_with('.') || ext.len() < 2) {
                        Some(ext) => Err(anyhow::anyhow!("Extension must look like \".edf\": {}", ext)),
                        None => Ok(()),
                    }
                },
                error_message: "Invalid intake allowed extensions".to_string(),
            },
            ValidationRule {
                field_path: "logging.level".to_string(),
                validator: |config| crate::logging::parse_filter(&config.logging.level).map(|_| ()),
                error_message: "Invalid logging level".to_string(),
            },
        ];

        Self { validation_rules }
    }

    /// 验证配置
    pub fn validate(&self, config: &EpileptechConfig) -> Result<()> {
        for rule in &self.validation_rules {
            if let Err(e) = (rule.validator)(config) {
                error!("Configuration validation failed for {}: {}", rule.field_path, e);
                return Err(anyhow::anyhow!("{}: {}", rule.error_message, e));
            }
        }

        info!("Configuration validation passed");
        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            seed_sample_data: true,
        }
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        let policy = IntakePolicy::default();
        Self {
            allowed_extensions: policy.allowed_extensions,
            max_id_attempts: policy.max_id_attempts,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
        }
    }
}
