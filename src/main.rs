use std::path::Path;

use anyhow::{Context, Result};
use timesheet_submit::utils::logging;
use timesheet_submit::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = match std::env::var("SHEET_CONFIG") {
        Ok(path) => Config::from_file(Path::new(&path))
            .with_context(|| format!("加载配置失败: {}", path))?,
        Err(_) => Config::from_env().context("环境变量中的配置无效")?,
    };

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::init_log_file(&config.output_log_file)?;

    // 初始化并运行应用
    let app = App::initialize(config).await?;
    let result = app.submit_pending().await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
