//! 浏览器驱动接口 - 基础设施层
//!
//! 会话控制器只依赖这两个 trait，测试中可以替换成记录调用的假驱动。

use async_trait::async_trait;

use crate::error::SessionResult;

/// 页面上观察到的一次网络响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedResponse {
    pub url: String,
    pub status: u16,
    /// CORS 预检请求的响应
    pub preflight: bool,
}

impl ObservedResponse {
    pub fn new(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            status,
            preflight: false,
        }
    }

    pub fn preflight(url: impl Into<String>, status: u16) -> Self {
        Self {
            preflight: true,
            ..Self::new(url, status)
        }
    }

    /// 只有非预检的 2xx / 3xx 响应才能说明请求被接受
    pub fn is_accepted(&self) -> bool {
        !self.preflight && (200..400).contains(&self.status)
    }
}

/// 页面自动化能力
///
/// 所有选择器都是 CSS 字符串；定位策略的解析在上层完成。
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// 导航到指定 URL
    async fn goto(&self, url: &str) -> SessionResult<()>;

    /// 元素是否存在且可见
    async fn is_visible(&self, selector: &str) -> SessionResult<bool>;

    /// 清空并输入文本
    async fn fill(&self, selector: &str, value: &str) -> SessionResult<()>;

    /// 在元素上按键（如 `ArrowDown`、`Enter`）
    async fn press_key(&self, selector: &str, key: &str) -> SessionResult<()>;

    /// 点击元素
    async fn click(&self, selector: &str) -> SessionResult<()>;

    /// 当前页面 URL
    async fn current_url(&self) -> SessionResult<String>;

    /// DOM 签名；两次取值相同说明期间没有发生变化
    async fn dom_signature(&self) -> SessionResult<u64>;

    /// 取出自上次调用以来观察到的网络响应
    async fn drain_responses(&self) -> SessionResult<Vec<ObservedResponse>>;

    /// 释放驱动：自己启动的浏览器整个关闭，连接上的浏览器只关闭自己的页面
    async fn close(&self) -> SessionResult<()>;
}

/// 驱动的获取方式（启动新浏览器或连接已有浏览器）
#[async_trait]
pub trait DriverLauncher: Send + Sync {
    async fn launch(&self) -> SessionResult<Box<dyn AutomationDriver>>;
}
