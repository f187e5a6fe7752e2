/// Shows a blocking notice and records it in the console log.
pub fn notify(message: &str) {
    log::info!("notice: {message}");
    let shown = web_sys::window().map(|window| window.alert_with_message(message));
    if !matches!(shown, Some(Ok(()))) {
        log::warn!("could not display notice: {message}");
    }
}
