//! 解析器构建器

use crate::pass::Resolver;
use infrastructure_common::{
    ConfigError, ConfigValidator, ResolverOptions, ResolverOptionsValidator, ResolverResult,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// 默认环境变量前缀
pub const DEFAULT_ENV_PREFIX: &str = "RESOLVER";

/// 解析器构建器
///
/// 选项按以下顺序叠加，后者覆盖前者：
/// 基础选项 → 配置文件（按添加顺序） → 环境变量
pub struct ResolverBuilder {
    /// 基础选项
    base: ResolverOptions,
    /// 配置文件列表
    config_files: Vec<PathBuf>,
    /// 环境变量前缀
    env_prefix: Option<String>,
    /// 替代进程环境变量的取值，测试中使用
    env_source: Option<HashMap<String, String>>,
    /// 是否启用选项校验
    validation_enabled: bool,
    /// 日志配置，为空时不初始化日志
    logging_config: Option<LoggingConfig>,
}

impl ResolverBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            base: ResolverOptions::default(),
            config_files: Vec::new(),
            env_prefix: None,
            env_source: None,
            validation_enabled: true,
            logging_config: None,
        }
    }

    /// 设置基础选项
    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.base = options;
        self
    }

    /// 添加配置文件（TOML 或 JSON，按扩展名识别）
    pub fn add_config_file<P: AsRef<Path>>(mut self, path: P) -> ResolverResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        info!("添加配置文件: {}", path.display());
        self.config_files.push(path.to_path_buf());
        Ok(self)
    }

    /// 添加环境变量配置源，例如前缀 `RESOLVER` 对应 `RESOLVER_MAX_ERRORS_COUNT`
    pub fn add_config_env_vars<S: Into<String>>(mut self, prefix: S) -> Self {
        let prefix = prefix.into();
        info!("添加环境变量配置源，前缀: {}", prefix);
        self.env_prefix = Some(prefix);
        self
    }

    /// 用给定的键值代替进程环境变量
    pub fn with_env_source(mut self, source: HashMap<String, String>) -> Self {
        self.env_source = Some(source);
        self
    }

    /// 启用或禁用选项校验
    pub fn enable_validation(mut self, enabled: bool) -> Self {
        self.validation_enabled = enabled;
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = Some(config);
        self
    }

    /// 只加载并校验选项
    pub fn load_options(&self) -> ResolverResult<ResolverOptions> {
        let base = config::Config::try_from(&self.base).map_err(parse_error)?;
        let mut builder = config::Config::builder().add_source(base);

        for path in &self.config_files {
            debug!("叠加配置文件: {}", path.display());
            builder = builder.add_source(config::File::from(path.as_path()));
        }

        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(
                config::Environment::with_prefix(prefix)
                    .try_parsing(true)
                    .source(self.env_source.clone()),
            );
        }

        let settings = builder.build().map_err(|e| {
            error!("配置构建失败: {}", e);
            parse_error(e)
        })?;
        let options: ResolverOptions = settings.try_deserialize().map_err(|e| {
            error!("解析器选项绑定失败: {}", e);
            parse_error(e)
        })?;

        if self.validation_enabled {
            let validator = ResolverOptionsValidator;
            debug!("执行选项校验: {}", validator.name());
            validator.validate(&options)?;
        }

        Ok(options)
    }

    /// 构建解析器
    pub fn build(self) -> ResolverResult<Resolver> {
        info!("开始构建解析器");

        if let Some(config) = &self.logging_config {
            initialize_logging(config);
        }

        let options = self.load_options()?;
        debug!("解析器选项: {:?}", options);

        info!("解析器构建完成");
        Ok(Resolver::new(options))
    }
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_error(error: config::ConfigError) -> ConfigError {
    ConfigError::ParseError {
        source: Box::new(error),
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别，`RUST_LOG` 存在时以其为准
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            json_format: false,
        }
    }

    /// 创建构建服务器使用的日志配置
    pub fn ci() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            json_format: true,
        }
    }
}

/// 初始化日志系统
///
/// 已经初始化过时返回 `false`
pub fn initialize_logging(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.show_target);

    let result = if config.json_format {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };

    match result {
        Ok(()) => {
            info!("日志系统初始化完成");
            true
        }
        Err(e) => {
            warn!("日志系统已初始化，跳过: {}", e);
            false
        }
    }
}
