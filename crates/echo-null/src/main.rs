use echo_null_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), echo_null_core::Error> {
    echo_null_core::logging::init("echo_null")?;

    let cfg = Config::load()?;

    echo_null_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| echo_null_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
