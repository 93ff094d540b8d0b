use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器会话相关错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 业务逻辑错误
    #[error("业务错误: {0}")]
    Business(#[from] BusinessError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 浏览器会话错误
///
/// `NotStarted` 与其他变体分开，调用方可以区分"忘了 start()"和真正的页面故障。
#[derive(Debug, Error)]
pub enum SessionError {
    /// 在 start() 之前调用了页面操作
    #[error("session not started")]
    NotStarted,
    /// 状态机不允许当前操作
    #[error("invalid session state: cannot {action} while {state}")]
    InvalidState { action: &'static str, state: String },
    /// 启动或连接浏览器失败
    #[error("browser launch failed: {0}")]
    LaunchFailed(String),
    /// 导航失败
    #[error("navigation to {url} failed: {message}")]
    NavigationFailed { url: String, message: String },
    /// 找不到元素
    #[error("element not found: {0}")]
    ElementNotFound(String),
    /// 填写字段失败
    #[error("fill failed for '{field}': {message}")]
    FillFailed { field: String, message: String },
    /// 登录失败
    #[error("authentication failed at step '{step}': {message}")]
    AuthenticationFailed { step: String, message: String },
    /// 等待超时
    #[error("timed out after {waited_ms}ms waiting for {what}")]
    Timeout { what: String, waited_ms: u64 },
    /// 执行脚本失败
    #[error("script execution failed: {0}")]
    Script(String),
}

/// 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite 错误
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    /// 无法创建数据库目录
    #[error("cannot prepare database path {path}: {source}")]
    Path {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 数据库中的行无法解析
    #[error("corrupt row {id}: {message}")]
    CorruptRow { id: i64, message: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("cannot read config file {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("cannot parse {path}: {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 缺少凭据
    #[error("missing credentials: set {0}")]
    MissingCredentials(&'static str),
    /// 找不到季度
    #[error("no quarter configured for {0}")]
    UnknownQuarter(String),
    /// 配置值非法
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// 业务逻辑错误
#[derive(Debug, Error)]
pub enum BusinessError {
    /// 已经有一个提交任务在运行
    #[error("a submission run is already in progress")]
    SubmissionInProgress,
    /// 索引超出范围
    #[error("row index {index} out of range [0, {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for SessionError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        SessionError::Script(err.to_string())
    }
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Session(err.into())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Store(StoreError::Db(err))
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Script(format!("unexpected script result: {}", err))
    }
}

// ========== 便捷构造函数 ==========

impl SessionError {
    /// 创建导航失败错误
    pub fn navigation(url: impl Into<String>, message: impl ToString) -> Self {
        SessionError::NavigationFailed {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// 创建超时错误
    pub fn timeout(what: impl Into<String>, waited: std::time::Duration) -> Self {
        SessionError::Timeout {
            what: what.into(),
            waited_ms: waited.as_millis() as u64,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 会话操作结果类型
pub type SessionResult<T> = Result<T, SessionError>;

/// 存储操作结果类型
pub type StoreResult<T> = Result<T, StoreError>;
