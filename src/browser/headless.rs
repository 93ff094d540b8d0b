use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{SessionError, SessionResult};

/// 启动本地浏览器并打开一个空白页
///
/// `executable` 为空时由 chromiumoxide 自动查找 Chrome / Chromium。
pub async fn launch_browser(
    headless: bool,
    executable: Option<&str>,
) -> SessionResult<(Browser, Page, JoinHandle<()>)> {
    info!("🚀 启动浏览器 (headless: {})...", headless);

    let mut builder = BrowserConfig::builder();
    builder = if headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = executable {
        debug!("浏览器路径: {}", path);
        builder = builder.chrome_executable(Path::new(path));
    }

    let config = builder
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
        ])
        .build()
        .map_err(|e| {
            error!("配置浏览器失败: {}", e);
            SessionError::LaunchFailed(format!("配置浏览器失败: {}", e))
        })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        SessionError::LaunchFailed(format!("启动浏览器失败: {}", e))
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        SessionError::LaunchFailed(format!("创建页面失败: {}", e))
    })?;

    info!("✅ 浏览器已就绪");
    Ok((browser, page, handler_task))
}
