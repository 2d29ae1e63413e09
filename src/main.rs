use neuma_fader::core::FaderConfig;
use neuma_fader::host::{run_session, SessionScript};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match FaderConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Failed to load config, using defaults: {}", e);
            FaderConfig::default()
        }
    };

    let script = match std::env::args().nth(1) {
        Some(path) => SessionScript::load(&PathBuf::from(path))?,
        None => {
            log::info!("No session script given, running the built-in demo");
            SessionScript::demo()
        }
    };

    let report = run_session(&config, &script);
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| anyhow::anyhow!("Failed to serialize report: {}", e))?;
    println!("{}", json);

    Ok(())
}
