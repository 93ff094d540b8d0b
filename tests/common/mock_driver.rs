//! Mock browser driver for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use timesheet_submit::error::{SessionError, SessionResult};
use timesheet_submit::infrastructure::{AutomationDriver, DriverLauncher, ObservedResponse};
use timesheet_submit::models::login::submit_button_locators;

/// 确认页 URL，命中默认的 `**/b/form/*/thank*` 模式
pub const CONFIRMATION_URL: &str = "https://app.smartsheet.com/b/form/mock/thankyou";

/// 驱动调用记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Goto(String),
    Fill { selector: String, value: String },
    PressKey { selector: String, key: String },
    Click(String),
    Close,
}

/// 所有驱动实例共享的状态
///
/// 驱动被装箱交给会话后，测试仍然通过这里检查调用和注入错误。
#[derive(Default)]
pub struct MockState {
    calls: Mutex<Vec<DriverCall>>,
    url: Mutex<String>,
    hidden: Mutex<HashSet<String>>,
    submit_outcomes: Mutex<VecDeque<bool>>,
    always_fail_submit: Mutex<bool>,
    fill_failures: Mutex<Vec<String>>,
    goto_error: Mutex<Option<String>>,
    /// (前 n 次导航成功, 之后的错误信息)
    goto_error_after: Mutex<Option<(usize, String)>>,
    launch_error: Mutex<Option<String>>,
    launches: AtomicUsize,
    signatures: Mutex<VecDeque<u64>>,
    last_signature: AtomicU64,
    churn_dom: Mutex<bool>,
    signature_reads: AtomicUsize,
    submit_responses: Mutex<Vec<ObservedResponse>>,
    responses: Mutex<Vec<ObservedResponse>>,
    late_confirmation_armed: Mutex<Option<Duration>>,
    late_confirmation: Mutex<Option<(Instant, Duration)>>,
}

impl MockState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // === Error injection / scripting ===

    /// 让选择器不可见
    pub fn hide(&self, selector: &str) {
        self.hidden.lock().unwrap().insert(selector.to_string());
    }

    /// 按顺序排好每次提交点击的结果；用完后默认成功
    pub fn script_submits(&self, outcomes: &[bool]) {
        self.submit_outcomes.lock().unwrap().extend(outcomes.iter().copied());
    }

    /// 所有提交都不会被确认
    pub fn fail_all_submits(&self) {
        *self.always_fail_submit.lock().unwrap() = true;
    }

    /// 下一次填写该选择器时失败（只生效一次）
    pub fn fail_next_fill(&self, selector: &str) {
        self.fill_failures.lock().unwrap().push(selector.to_string());
    }

    pub fn fail_goto(&self, msg: &str) {
        *self.goto_error.lock().unwrap() = Some(msg.to_string());
    }

    /// 前 `succeed` 次导航成功，之后全部失败
    pub fn fail_gotos_after(&self, succeed: usize, msg: &str) {
        *self.goto_error_after.lock().unwrap() = Some((succeed, msg.to_string()));
    }

    pub fn fail_launch(&self, msg: &str) {
        *self.launch_error.lock().unwrap() = Some(msg.to_string());
    }

    /// 按顺序返回的 DOM 签名；用完后保持最后一个值
    pub fn script_dom_signatures(&self, signatures: &[u64]) {
        self.signatures.lock().unwrap().extend(signatures.iter().copied());
    }

    /// DOM 永远在变化
    pub fn churn_dom(&self) {
        *self.churn_dom.lock().unwrap() = true;
    }

    /// 每次点击提交按钮后页面收到的网络响应
    pub fn respond_to_submit(&self, responses: &[ObservedResponse]) {
        *self.submit_responses.lock().unwrap() = responses.to_vec();
    }

    /// 下一次点击提交按钮后，确认页在 `delay` 之后才出现
    pub fn confirm_next_submit_after(&self, delay: Duration) {
        *self.late_confirmation_armed.lock().unwrap() = Some(delay);
    }

    // === Call inspection ===

    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// 提交按钮被点击的次数
    pub fn submit_clicks(&self) -> usize {
        let submit = submit_button_locators();
        self.calls()
            .iter()
            .filter(|c| matches!(c, DriverCall::Click(s) if submit.contains(&s.as_str())))
            .count()
    }

    /// 表单字段的填写（排除登录页以 `#` 开头的输入框）
    pub fn form_fills(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                DriverCall::Fill { selector, value } if !selector.starts_with('#') => {
                    Some((selector, value))
                }
                _ => None,
            })
            .collect()
    }

    pub fn gotos(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                DriverCall::Goto(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn signature_reads(&self) -> usize {
        self.signature_reads.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == DriverCall::Close)
            .count()
    }

    fn record(&self, call: DriverCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_submit_ok(&self) -> bool {
        if *self.always_fail_submit.lock().unwrap() {
            return false;
        }
        self.submit_outcomes.lock().unwrap().pop_front().unwrap_or(true)
    }
}

/// 记录调用的假驱动
pub struct MockDriver {
    state: Arc<MockState>,
}

#[async_trait]
impl AutomationDriver for MockDriver {
    async fn goto(&self, url: &str) -> SessionResult<()> {
        self.state.record(DriverCall::Goto(url.to_string()));
        if let Some(msg) = self.state.goto_error.lock().unwrap().clone() {
            return Err(SessionError::navigation(url, msg));
        }
        if let Some((succeed, msg)) = self.state.goto_error_after.lock().unwrap().clone() {
            if self.state.gotos().len() > succeed {
                return Err(SessionError::navigation(url, msg));
            }
        }
        *self.state.url.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> SessionResult<bool> {
        Ok(!self.state.hidden.lock().unwrap().contains(selector))
    }

    async fn fill(&self, selector: &str, value: &str) -> SessionResult<()> {
        self.state.record(DriverCall::Fill {
            selector: selector.to_string(),
            value: value.to_string(),
        });
        let mut failures = self.state.fill_failures.lock().unwrap();
        if let Some(pos) = failures.iter().position(|s| s == selector) {
            failures.remove(pos);
            return Err(SessionError::FillFailed {
                field: selector.to_string(),
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    async fn press_key(&self, selector: &str, key: &str) -> SessionResult<()> {
        self.state.record(DriverCall::PressKey {
            selector: selector.to_string(),
            key: key.to_string(),
        });
        Ok(())
    }

    async fn click(&self, selector: &str) -> SessionResult<()> {
        self.state.record(DriverCall::Click(selector.to_string()));
        if !submit_button_locators().contains(&selector) {
            return Ok(());
        }
        let submitted = self.state.submit_responses.lock().unwrap().clone();
        self.state.responses.lock().unwrap().extend(submitted);
        if let Some(delay) = self.state.late_confirmation_armed.lock().unwrap().take() {
            *self.state.late_confirmation.lock().unwrap() = Some((Instant::now(), delay));
        } else if self.state.next_submit_ok() {
            *self.state.url.lock().unwrap() = CONFIRMATION_URL.to_string();
        }
        Ok(())
    }

    async fn current_url(&self) -> SessionResult<String> {
        let mut late = self.state.late_confirmation.lock().unwrap();
        if let Some((clicked, delay)) = *late {
            if clicked.elapsed() >= delay {
                *self.state.url.lock().unwrap() = CONFIRMATION_URL.to_string();
                *late = None;
            }
        }
        Ok(self.state.url.lock().unwrap().clone())
    }

    async fn dom_signature(&self) -> SessionResult<u64> {
        self.state.signature_reads.fetch_add(1, Ordering::SeqCst);
        if *self.state.churn_dom.lock().unwrap() {
            return Ok(self.state.last_signature.fetch_add(1, Ordering::SeqCst) + 1);
        }
        if let Some(next) = self.state.signatures.lock().unwrap().pop_front() {
            self.state.last_signature.store(next, Ordering::SeqCst);
        }
        Ok(self.state.last_signature.load(Ordering::SeqCst))
    }

    async fn drain_responses(&self) -> SessionResult<Vec<ObservedResponse>> {
        Ok(std::mem::take(&mut *self.state.responses.lock().unwrap()))
    }

    async fn close(&self) -> SessionResult<()> {
        self.state.record(DriverCall::Close);
        Ok(())
    }
}

/// 每次启动都返回共享同一状态的假驱动
pub struct MockLauncher {
    state: Arc<MockState>,
}

impl MockLauncher {
    pub fn new(state: Arc<MockState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl DriverLauncher for MockLauncher {
    async fn launch(&self) -> SessionResult<Box<dyn AutomationDriver>> {
        tokio::task::yield_now().await;
        self.state.launches.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = self.state.launch_error.lock().unwrap().clone() {
            return Err(SessionError::LaunchFailed(msg));
        }
        Ok(Box::new(MockDriver {
            state: Arc::clone(&self.state),
        }))
    }
}
