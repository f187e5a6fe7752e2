use crate::config::FrontendConfig;
use once_cell::unsync::OnceCell;
use shared::api::ChatApiClient;

thread_local! {
    static SHARED_CLIENT: OnceCell<ChatApiClient> = OnceCell::new();
}

/// The page-wide backend client, built from the build-time configuration.
pub fn shared_client() -> ChatApiClient {
    SHARED_CLIENT.with(|cell| {
        cell.get_or_init(|| ChatApiClient::new(FrontendConfig::new().api_base_url()))
            .clone()
    })
}
