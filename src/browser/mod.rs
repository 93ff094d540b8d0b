pub mod connection;
pub mod headless;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::SessionResult;
use crate::infrastructure::{AutomationDriver, BrowserOwnership, ChromeDriver, DriverLauncher};

pub use connection::connect_to_browser;
pub use headless::launch_browser;

/// 浏览器的获取方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChromeLauncher {
    /// 启动新的浏览器进程
    Launch {
        headless: bool,
        executable: Option<String>,
    },
    /// 连接到已在运行的浏览器
    Connect { port: u16 },
}

impl ChromeLauncher {
    /// 配置了调试端口时连接，否则启动
    pub fn from_config(config: &Config) -> Self {
        match config.browser_debug_port {
            Some(port) => ChromeLauncher::Connect { port },
            None => ChromeLauncher::Launch {
                headless: config.headless,
                executable: config.chrome_executable.clone(),
            },
        }
    }

    /// 启动的浏览器归本进程所有，连接的浏览器属于用户
    pub fn ownership(&self) -> BrowserOwnership {
        match self {
            ChromeLauncher::Launch { .. } => BrowserOwnership::Launched,
            ChromeLauncher::Connect { .. } => BrowserOwnership::Attached,
        }
    }
}

#[async_trait]
impl DriverLauncher for ChromeLauncher {
    async fn launch(&self) -> SessionResult<Box<dyn AutomationDriver>> {
        let (browser, page, handler_task) = match self {
            ChromeLauncher::Launch {
                headless,
                executable,
            } => launch_browser(*headless, executable.as_deref()).await?,
            ChromeLauncher::Connect { port } => connect_to_browser(*port).await?,
        };
        let driver = ChromeDriver::new(browser, page, handler_task, self.ownership()).await?;
        Ok(Box::new(driver))
    }
}
