use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{SessionError, SessionResult};

/// 连接到已开启远程调试端口的浏览器，并新建一个专用页面
///
/// 不复用已有标签页，避免和用户手动操作的页面互相干扰。
pub async fn connect_to_browser(port: u16) -> SessionResult<(Browser, Page, JoinHandle<()>)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        SessionError::LaunchFailed(format!("连接 {} 失败: {}", browser_url, e))
    })?;
    debug!("浏览器连接成功");

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

    let pages = browser.pages().await?;
    debug!("浏览器中已有 {} 个页面", pages.len());

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建新页面失败: {}", e);
        SessionError::LaunchFailed(format!("创建新页面失败: {}", e))
    })?;

    Ok((browser, page, handler_task))
}
