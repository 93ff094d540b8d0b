//! 浏览器会话控制器 - 业务能力层
//!
//! 持有唯一的驱动，负责登录、等待表单就绪、填写字段、提交确认与恢复。
//! 只面向单个提交目标（一个季度的表单），不认识批次。

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{Credentials, SessionTimeouts};
use crate::error::{SessionError, SessionResult};
use crate::infrastructure::{AutomationDriver, DriverLauncher, ObservedResponse};
use crate::models::field::{FieldSpec, FieldTable, FieldType};
use crate::models::login::{login_steps, submit_button_locators, CredentialField, LoginAction, LoginStep};
use crate::models::{redact_email, DestinationIdentity};
use crate::utils::glob::{compile_all, UrlGlob};

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unstarted,
    Started,
    Authenticated,
    Ready,
    Submitting,
    SubmittedOk,
    SubmitFailed,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// 会话控制器
pub struct SessionController {
    launcher: Arc<dyn DriverLauncher>,
    driver: Option<Box<dyn AutomationDriver>>,
    destination: DestinationIdentity,
    landing_selector: String,
    success_globs: Vec<UrlGlob>,
    timeouts: SessionTimeouts,
    state: SessionState,
}

impl SessionController {
    pub fn new(
        launcher: Arc<dyn DriverLauncher>,
        destination: DestinationIdentity,
        fields: &FieldTable,
        timeouts: SessionTimeouts,
    ) -> Self {
        let landing_selector = fields
            .landing_locator()
            .map(|l| l.to_css())
            .unwrap_or_else(|| "form".to_string());
        let success_globs = compile_all(&destination.success_patterns);
        Self {
            launcher,
            driver: None,
            destination,
            landing_selector,
            success_globs,
            timeouts,
            state: SessionState::Unstarted,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn destination(&self) -> &DestinationIdentity {
        &self.destination
    }

    /// 获取驱动
    pub async fn start(&mut self) -> SessionResult<()> {
        if self.state != SessionState::Unstarted {
            return Err(self.invalid("start"));
        }
        info!("🌐 启动浏览器会话");
        let driver = self.launcher.launch().await?;
        self.driver = Some(driver);
        self.state = SessionState::Started;
        Ok(())
    }

    /// 登录并等待落地页出现
    pub async fn authenticate(&mut self, credentials: &Credentials) -> SessionResult<()> {
        self.driver()?;
        if self.state != SessionState::Started {
            return Err(self.invalid("authenticate"));
        }
        info!("🔐 开始登录: {}", redact_email(&credentials.email));

        let url = self.destination.form_url();
        self.navigate_with_retries(&url).await?;

        let steps = login_steps();
        let total = steps.len();
        for (i, step) in steps.iter().enumerate() {
            debug!("登录步骤 {}/{}: {}", i + 1, total, step.name);
            match self.run_login_step(step, credentials).await {
                Ok(()) => {}
                Err(e) if step.optional => {
                    debug!("可选登录步骤 '{}' 跳过: {}", step.name, e);
                }
                Err(e) => {
                    return Err(SessionError::AuthenticationFailed {
                        step: step.name.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        let landing = self.landing_selector.clone();
        self.wait_visible(&landing, self.timeouts.global)
            .await
            .map_err(|e| SessionError::AuthenticationFailed {
                step: "Wait for Form".to_string(),
                message: e.to_string(),
            })?;

        self.state = SessionState::Authenticated;
        info!("✅ 登录完成");
        Ok(())
    }

    /// 等待表单可以填写
    ///
    /// 上一次提交之后（无论是否确认）先导航回表单；之后轮询直到落地元素可见
    /// 或 DOM 在采样窗口内不再变化。
    pub async fn wait_for_form_ready(&mut self) -> SessionResult<()> {
        self.ensure_usable("wait for form")?;
        if matches!(
            self.state,
            SessionState::SubmittedOk | SessionState::SubmitFailed
        ) {
            let url = self.destination.form_url();
            debug!("返回表单: {}", url);
            self.driver()?.goto(&url).await?;
        }

        let driver = self.driver()?;
        let started = Instant::now();
        let mut last_signature = driver.dom_signature().await?;
        let mut stable_since = Instant::now();
        loop {
            if driver.is_visible(&self.landing_selector).await? {
                break;
            }
            let signature = driver.dom_signature().await?;
            if signature == last_signature {
                if stable_since.elapsed() >= self.timeouts.stable_window {
                    debug!("DOM 已稳定 {:?}", self.timeouts.stable_window);
                    break;
                }
            } else {
                last_signature = signature;
                stable_since = Instant::now();
            }
            if started.elapsed() >= self.timeouts.global {
                return Err(SessionError::timeout("form ready", self.timeouts.global));
            }
            sleep(self.timeouts.poll_interval).await;
        }

        self.state = SessionState::Ready;
        Ok(())
    }

    /// 填写单个字段
    ///
    /// 先用按项目解析出的定位，找不到时回退默认定位；下拉框输入后用 ArrowDown + Enter 确认。
    pub async fn inject_field(
        &mut self,
        spec: &FieldSpec,
        value: &str,
        project: Option<&str>,
    ) -> SessionResult<()> {
        self.ensure_usable("inject field")?;

        let preferred = spec.locator_for(project).to_css();
        let default = spec.locator.to_css();
        let wait = self.element_wait();

        let selector = match self.wait_visible(&preferred, wait).await {
            Ok(()) => preferred,
            Err(_) if preferred != default => {
                debug!("字段 {} 的项目定位 {} 不可见，回退默认定位", spec.key, preferred);
                self.wait_visible(&default, wait)
                    .await
                    .map_err(|_| SessionError::ElementNotFound(default.clone()))?;
                default
            }
            Err(_) => return Err(SessionError::ElementNotFound(preferred)),
        };

        let driver = self.driver()?;
        let fill_failed = |e: SessionError| SessionError::FillFailed {
            field: spec.key.to_string(),
            message: e.to_string(),
        };
        driver.fill(&selector, value).await.map_err(fill_failed)?;
        if spec.field_type == FieldType::Dropdown {
            driver
                .press_key(&selector, "ArrowDown")
                .await
                .map_err(fill_failed)?;
            driver.press_key(&selector, "Enter").await.map_err(fill_failed)?;
        }
        debug!("已填写 {} = {}", spec.key, value);
        Ok(())
    }

    /// 点击提交并等待确认
    ///
    /// 当前 URL 或任何被接受的网络响应（非预检、2xx/3xx）命中成功模式时返回 `Ok(true)`；
    /// 超时未确认返回 `Ok(false)`。
    pub async fn submit(&mut self) -> SessionResult<bool> {
        self.ensure_usable("submit")?;
        self.state = SessionState::Submitting;

        let driver = self.driver()?;
        // 丢弃填写期间的响应，只看点击之后的
        driver.drain_responses().await?;

        let mut clicked = false;
        for locator in submit_button_locators() {
            if driver.is_visible(locator).await.unwrap_or(false) {
                debug!("点击提交按钮: {}", locator);
                driver.click(locator).await?;
                clicked = true;
                break;
            }
        }
        if !clicked {
            self.state = SessionState::SubmitFailed;
            return Err(SessionError::ElementNotFound("submit button".to_string()));
        }

        if self.poll_confirmation(self.timeouts.submit).await? {
            self.state = SessionState::SubmittedOk;
            return Ok(true);
        }
        warn!("⚠️ {:?} 内未观察到提交确认", self.timeouts.submit);
        self.state = SessionState::SubmitFailed;
        Ok(false)
    }

    /// 未确认的提交之后再观察一个稳定窗口
    ///
    /// 远端可能在超时之后才落到确认页；此时返回 `Ok(true)` 并转为 `SubmittedOk`，
    /// 调用方不应再次提交。只在 `SubmitFailed` 状态下有意义。
    pub async fn confirm_late_submission(&mut self) -> SessionResult<bool> {
        self.ensure_usable("confirm late submission")?;
        if self.state != SessionState::SubmitFailed {
            return Ok(false);
        }
        if self.poll_confirmation(self.timeouts.stable_window).await? {
            info!("✓ 超时后观察到提交确认");
            self.state = SessionState::SubmittedOk;
            return Ok(true);
        }
        Ok(false)
    }

    /// 尽力回到表单页
    pub async fn recover(&mut self) -> SessionResult<()> {
        self.ensure_usable("recover")?;
        let url = self.destination.form_url();
        info!("🔄 恢复会话: {}", url);
        self.driver()?.goto(&url).await?;
        self.state = SessionState::Authenticated;
        Ok(())
    }

    /// 关闭会话，任何状态下都可调用，重复调用无副作用
    pub async fn close(&mut self) -> SessionResult<()> {
        let result = match self.driver.take() {
            Some(driver) => driver.close().await,
            None => Ok(()),
        };
        if self.state != SessionState::Closed {
            debug!("会话关闭 (之前状态: {})", self.state);
        }
        self.state = SessionState::Closed;
        result
    }

    /// 在 `limit` 内轮询当前 URL 和新到的网络响应
    async fn poll_confirmation(&self, limit: Duration) -> SessionResult<bool> {
        let started = Instant::now();
        loop {
            let driver = self.driver()?;
            let url = driver.current_url().await?;
            if self.is_confirmation(&url) {
                debug!("提交已确认: {}", url);
                return Ok(true);
            }
            let responses = driver.drain_responses().await?;
            if let Some(hit) = responses.iter().find(|r| self.is_confirming_response(r)) {
                debug!("提交已确认: {} ({})", hit.url, hit.status);
                return Ok(true);
            }
            for rejected in responses
                .iter()
                .filter(|r| !r.is_accepted() && self.is_confirmation(&r.url))
            {
                debug!("忽略提交端点的响应: {} ({})", rejected.url, rejected.status);
            }
            if started.elapsed() >= limit {
                return Ok(false);
            }
            sleep(self.timeouts.poll_interval).await;
        }
    }

    fn is_confirming_response(&self, response: &ObservedResponse) -> bool {
        response.is_accepted() && self.is_confirmation(&response.url)
    }

    fn is_confirmation(&self, url: &str) -> bool {
        if url.is_empty() {
            return false;
        }
        url.starts_with(&self.destination.submission_endpoint())
            || self.success_globs.iter().any(|g| g.is_match(url))
    }

    fn driver(&self) -> SessionResult<&dyn AutomationDriver> {
        self.driver.as_deref().ok_or(SessionError::NotStarted)
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidState {
            action,
            state: self.state.to_string(),
        }
    }

    /// 页面操作要求已启动且已登录、未关闭
    fn ensure_usable(&self, action: &'static str) -> SessionResult<()> {
        self.driver()?;
        match self.state {
            SessionState::Authenticated
            | SessionState::Ready
            | SessionState::Submitting
            | SessionState::SubmittedOk
            | SessionState::SubmitFailed => Ok(()),
            _ => Err(self.invalid(action)),
        }
    }

    /// 单个元素的等待上限：稳定窗口的 4 倍，不超过全局上限
    fn element_wait(&self) -> Duration {
        (self.timeouts.stable_window * 4)
            .max(self.timeouts.poll_interval)
            .min(self.timeouts.global)
    }

    async fn wait_visible(&self, selector: &str, limit: Duration) -> SessionResult<()> {
        let driver = self.driver()?;
        let started = Instant::now();
        loop {
            if driver.is_visible(selector).await? {
                return Ok(());
            }
            if started.elapsed() >= limit {
                return Err(SessionError::timeout(selector, limit));
            }
            sleep(self.timeouts.poll_interval).await;
        }
    }

    async fn navigate_with_retries(&self, url: &str) -> SessionResult<()> {
        let driver = self.driver()?;
        let retries = self.timeouts.navigation_retries.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match driver.goto(url).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= retries => {
                    return Err(SessionError::AuthenticationFailed {
                        step: "Navigate".to_string(),
                        message: e.to_string(),
                    })
                }
                Err(e) => {
                    warn!("导航失败 (第 {}/{} 次): {}", attempt, retries, e);
                    sleep(self.timeouts.poll_interval).await;
                }
            }
        }
    }

    async fn run_login_step(&self, step: &LoginStep, credentials: &Credentials) -> SessionResult<()> {
        let limit = if step.optional {
            self.element_wait()
        } else {
            self.timeouts.global
        };
        match step.action {
            LoginAction::Wait => self.wait_visible(step.locator, limit).await,
            LoginAction::Input => {
                let value = match step.value {
                    Some(CredentialField::Email) => credentials.email.as_str(),
                    Some(CredentialField::Password) => credentials.password.as_str(),
                    None => "",
                };
                debug!(
                    "输入 {}: {}",
                    step.locator,
                    if step.sensitive { "<redacted>" } else { value }
                );
                self.wait_visible(step.locator, limit).await?;
                self.driver()?.fill(step.locator, value).await
            }
            LoginAction::Click => {
                self.wait_visible(step.locator, limit).await?;
                self.driver()?.click(step.locator).await?;
                if step.expects_navigation {
                    sleep(self.timeouts.poll_interval).await;
                }
                Ok(())
            }
        }
    }
}
