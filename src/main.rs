use anyhow::Result;
use quick_apply::utils::logging;
use quick_apply::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载 .env（不存在时忽略）
    let _ = dotenvy::dotenv();

    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let _summary = App::initialize(config).await?.run().await?;

    Ok(())
}
