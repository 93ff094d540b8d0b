use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite 数据库路径
    pub db_path: String,
    /// 被移除条目的记录文件
    pub failure_log_file: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 浏览器配置 ---
    /// 是否无头运行
    pub headless: bool,
    /// 浏览器可执行文件，为空时由 chromiumoxide 自动查找
    pub chrome_executable: Option<String>,
    /// 设置后连接到已在运行的浏览器，而不是启动新实例
    pub browser_debug_port: Option<u16>,
    // --- 季度配置 ---
    /// 季度 TOML 文件，为空时使用内置季度表
    pub quarter_file: Option<String>,
    /// 只提交该季度的条目，其他季度留待以后；为空时每个季度各开一个会话全部提交
    pub target_quarter: Option<String>,
    // --- 等待与重试 ---
    /// 任何单次等待的全局上限
    pub global_timeout_ms: u64,
    /// 轮询间隔
    pub poll_interval_ms: u64,
    /// DOM 稳定判定窗口
    pub dom_stable_window_ms: u64,
    /// 提交后等待确认的时长
    pub submit_timeout_ms: u64,
    /// 每行最多提交次数（含首次）
    pub max_submit_attempts: u32,
    /// 登录页导航重试次数
    pub navigation_retries: u32,
    #[serde(skip)]
    pub credentials: Option<Credentials>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "sheetpilot.sqlite".to_string(),
            failure_log_file: "failed_entries.txt".to_string(),
            output_log_file: "sheetpilot.log".to_string(),
            verbose_logging: false,
            headless: true,
            chrome_executable: None,
            browser_debug_port: None,
            quarter_file: None,
            target_quarter: None,
            global_timeout_ms: 60_000,
            poll_interval_ms: 250,
            dom_stable_window_ms: 750,
            submit_timeout_ms: 15_000,
            max_submit_attempts: 2,
            navigation_retries: 3,
            credentials: None,
        }
    }
}

/// 远端系统的登录凭据
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &crate::models::redact_email(&self.email))
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// 从 `SHEET_EMAIL` / `SHEET_PASSWORD` 读取
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env_lookup)
    }

    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let email = lookup("SHEET_EMAIL").ok_or(ConfigError::MissingCredentials("SHEET_EMAIL"))?;
        let password =
            lookup("SHEET_PASSWORD").ok_or(ConfigError::MissingCredentials("SHEET_PASSWORD"))?;
        Ok(Self { email, password })
    }
}

/// 会话控制器使用的等待参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    pub global: Duration,
    pub poll_interval: Duration,
    pub stable_window: Duration,
    pub submit: Duration,
    pub navigation_retries: u32,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Config::default().timeouts()
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_var<T: std::str::FromStr>(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|v| v.parse().ok())
}

impl Config {
    /// 默认值 + 环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().overlay(&env_lookup).validated()
    }

    /// 读取 TOML 配置文件，缺失的键使用默认值；环境变量最后覆盖
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            })?;
        config.overlay(&env_lookup).validated()
    }

    /// 用 `lookup` 给出的变量覆盖已有值
    fn overlay(self, lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        let d = self;
        Self {
            db_path: lookup("SHEET_DB_PATH").unwrap_or(d.db_path),
            failure_log_file: lookup("FAILURE_LOG_FILE").unwrap_or(d.failure_log_file),
            output_log_file: lookup("OUTPUT_LOG_FILE").unwrap_or(d.output_log_file),
            verbose_logging: parse_var(lookup, "VERBOSE_LOGGING").unwrap_or(d.verbose_logging),
            headless: parse_var(lookup, "HEADLESS").unwrap_or(d.headless),
            chrome_executable: lookup("CHROME_EXECUTABLE").or(d.chrome_executable),
            browser_debug_port: parse_var(lookup, "BROWSER_DEBUG_PORT").or(d.browser_debug_port),
            quarter_file: lookup("QUARTER_FILE").or(d.quarter_file),
            target_quarter: lookup("TARGET_QUARTER").or(d.target_quarter),
            global_timeout_ms: parse_var(lookup, "GLOBAL_TIMEOUT_MS").unwrap_or(d.global_timeout_ms),
            poll_interval_ms: parse_var(lookup, "POLL_INTERVAL_MS").unwrap_or(d.poll_interval_ms),
            dom_stable_window_ms: parse_var(lookup, "DOM_STABLE_WINDOW_MS")
                .unwrap_or(d.dom_stable_window_ms),
            submit_timeout_ms: parse_var(lookup, "SUBMIT_TIMEOUT_MS").unwrap_or(d.submit_timeout_ms),
            max_submit_attempts: parse_var(lookup, "MAX_SUBMIT_ATTEMPTS")
                .unwrap_or(d.max_submit_attempts),
            navigation_retries: parse_var(lookup, "NAVIGATION_RETRIES").unwrap_or(d.navigation_retries),
            credentials: Credentials::from_lookup(lookup).ok().or(d.credentials),
        }
    }

    fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_submit_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_submit_attempts",
                message: "must be at least 1".to_string(),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "poll_interval_ms",
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn timeouts(&self) -> SessionTimeouts {
        SessionTimeouts {
            global: Duration::from_millis(self.global_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            stable_window: Duration::from_millis(self.dom_stable_window_ms),
            submit: Duration::from_millis(self.submit_timeout_ms),
            navigation_retries: self.navigation_retries.max(1),
        }
    }
}
