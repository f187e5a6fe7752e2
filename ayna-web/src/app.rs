use crate::api::shared_client;
use crate::models::app_state::AppState;
use crate::routes::{MainRoute, switch};
use crate::storage::session_store;
use shared::session::validate_session;
use wasm_bindgen_futures::spawn_local;
use yew::{Html, function_component, html, use_effect_with};
use yew_router::prelude::*;
use yewdux::YewduxRoot;
use yewdux::prelude::use_store;

#[function_component(App)]
pub fn app() -> Html {
    html! {
        <YewduxRoot>
            <Shell />
        </YewduxRoot>
    }
}

/// Re-validates the stored session whenever the token changes, then routes.
#[function_component(Shell)]
fn shell() -> Html {
    let (state, dispatch) = use_store::<AppState>();
    let token = state.token().map(str::to_string);

    use_effect_with(token, move |token| {
        let checked = token.clone();
        spawn_local(async move {
            let validity = validate_session(&session_store(), &shared_client()).await;
            log::debug!("session validity: {validity:?}");
            dispatch.reduce_mut(|state| state.settle(checked.as_deref(), validity));
        });
        || ()
    });

    html! {
        <BrowserRouter>
            <Switch<MainRoute> render={switch} />
        </BrowserRouter>
    }
}
