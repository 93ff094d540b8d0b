//! chromiumoxide 驱动实现 - 基础设施层

use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{EventResponseReceived, ResourceType};
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{SessionError, SessionResult};
use crate::infrastructure::driver::{AutomationDriver, ObservedResponse};
use crate::infrastructure::js_executor::JsExecutor;

/// 浏览器是谁的
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserOwnership {
    /// 本进程启动的浏览器，结束时整个关闭
    Launched,
    /// 连接到用户已在运行的浏览器，结束时只关闭自己新建的页面
    Attached,
}

impl BrowserOwnership {
    pub fn closes_browser(self) -> bool {
        self == BrowserOwnership::Launched
    }
}

/// 基于 chromiumoxide 的驱动
///
/// 持有一个 Browser 和一个专用 Page；后台任务收集网络响应（URL + 状态码），
/// 供提交确认使用。
pub struct ChromeDriver {
    browser: Mutex<Option<Browser>>,
    ownership: BrowserOwnership,
    executor: JsExecutor,
    responses: Arc<Mutex<Vec<ObservedResponse>>>,
    tasks: Vec<JoinHandle<()>>,
}

impl ChromeDriver {
    /// 包装已创建的浏览器和页面
    ///
    /// `handler_task` 是驱动 chromiumoxide Handler 的后台任务，关闭时一并终止。
    pub async fn new(
        browser: Browser,
        page: Page,
        handler_task: JoinHandle<()>,
        ownership: BrowserOwnership,
    ) -> SessionResult<Self> {
        let responses = Arc::new(Mutex::new(Vec::new()));
        let mut events = page.event_listener::<EventResponseReceived>().await?;

        let sink = Arc::clone(&responses);
        let listener = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let observed = ObservedResponse {
                    url: event.response.url.clone(),
                    status: u16::try_from(event.response.status).unwrap_or(0),
                    preflight: event.r#type == ResourceType::Preflight,
                };
                sink.lock().await.push(observed);
            }
        });

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            ownership,
            executor: JsExecutor::new(page),
            responses,
            tasks: vec![handler_task, listener],
        })
    }

    fn page(&self) -> &Page {
        self.executor.page()
    }

    async fn find(&self, selector: &str) -> SessionResult<chromiumoxide::Element> {
        self.page()
            .find_element(selector)
            .await
            .map_err(|_| SessionError::ElementNotFound(selector.to_string()))
    }
}

#[async_trait]
impl AutomationDriver for ChromeDriver {
    async fn goto(&self, url: &str) -> SessionResult<()> {
        debug!("导航到: {}", url);
        self.page()
            .goto(url)
            .await
            .map_err(|e| SessionError::navigation(url, e))?;
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> SessionResult<bool> {
        self.executor.is_visible(selector).await
    }

    async fn fill(&self, selector: &str, value: &str) -> SessionResult<()> {
        let element = self.find(selector).await?;
        element.click().await?;
        self.executor.clear_value(selector).await?;
        element
            .type_str(value)
            .await
            .map_err(|e| SessionError::FillFailed {
                field: selector.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn press_key(&self, selector: &str, key: &str) -> SessionResult<()> {
        let element = self.find(selector).await?;
        element.press_key(key).await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> SessionResult<()> {
        let element = self.find(selector).await?;
        element.click().await?;
        Ok(())
    }

    async fn current_url(&self) -> SessionResult<String> {
        Ok(self.page().url().await?.unwrap_or_default())
    }

    async fn dom_signature(&self) -> SessionResult<u64> {
        self.executor.dom_signature().await
    }

    async fn drain_responses(&self) -> SessionResult<Vec<ObservedResponse>> {
        let mut guard = self.responses.lock().await;
        Ok(std::mem::take(&mut *guard))
    }

    async fn close(&self) -> SessionResult<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };
        if self.ownership.closes_browser() {
            if let Err(e) = browser.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
            let _ = browser.wait().await;
            debug!("浏览器已关闭");
        } else {
            // 用户的浏览器继续运行，只关掉本会话的标签页并断开连接
            if let Err(e) = self.page().clone().close().await {
                warn!("关闭页面失败: {}", e);
            }
            drop(browser);
            debug!("已断开与浏览器的连接");
        }
        for task in &self.tasks {
            task.abort();
        }
        Ok(())
    }
}
