mod api;
mod app;
mod components;
mod config;
mod models;
mod notice;
mod pages;
mod relay;
mod routes;
mod storage;


use app::App;
use config::FrontendConfig;
use yew::Renderer;

fn main() {
    // Disable truncation of panic payloads to debug any panics
    std::panic::set_hook(Box::new(|info| {
        if let Some(s) = info.payload().downcast_ref::<String>() {
            web_sys::console::error_1(&format!("Panic: {s}").into());
        } else if let Some(s) = info.payload().downcast_ref::<&str>() {
            web_sys::console::error_1(&format!("Panic: {s}").into());
        } else {
            web_sys::console::error_1(&"Unknown panic".into());
        }
        if let Some(location) = info.location() {
            web_sys::console::error_1(
                &format!(
                    "  at {}:{}:{}",
                    location.file(),
                    location.line(),
                    location.column()
                )
                .into(),
            );
        }
    }));

    let config = FrontendConfig::new();
    let level = config.log_level().parse().unwrap_or(log::Level::Info);
    if let Err(err) = console_log::init_with_level(level) {
        web_sys::console::warn_1(&format!("console logger unavailable: {err}").into());
    }
    log::info!(
        "starting Ayna Chat (api {}, relay {})",
        config.api_base_url(),
        config.relay_url()
    );

    Renderer::<App>::new().render();
}
