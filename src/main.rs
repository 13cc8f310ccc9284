use anyhow::Result;
use arcadia::engine::core::EngineConfig;
use arcadia::engine::EngineApp;
use arcadia::game::Showcase;

const CONFIG_PATH: &str = "arcadia.ron";

fn main() -> Result<()> {
    init_tracing();

    let config = EngineConfig::load_or_default(CONFIG_PATH);
    let app = EngineApp::new(config, Showcase::new());
    app.run()
}

fn init_tracing() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already set");
    }
}
