use crate::{
    api::shared_client, models::app_state::AppState, notice::notify, routes::MainRoute,
    storage::session_store,
};
use shared::auth::{LOGIN_SUCCESS_NOTICE, sign_in};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;
use yew_router::prelude::{Link, use_navigator};
use yewdux::prelude::use_dispatch;

#[function_component(LoginPage)]
pub fn login_page() -> Html {
    let identifier = use_state(String::new);
    let password = use_state(String::new);
    let loading = use_state(|| false);
    let navigator = use_navigator();
    let dispatch = use_dispatch::<AppState>();

    let onsubmit = {
        let identifier_handle = identifier.clone();
        let password_handle = password.clone();
        let loading_handle = loading.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            let identifier_value = (*identifier_handle).clone();
            let password_value = (*password_handle).clone();
            loading_handle.set(true);
            let loading_ref = loading_handle.clone();
            let navigator_handle = navigator.clone();
            let dispatch = dispatch.clone();
            spawn_local(async move {
                let result = sign_in(
                    &session_store(),
                    &shared_client(),
                    &identifier_value,
                    &password_value,
                )
                .await;
                loading_ref.set(false);
                match result {
                    Ok(session) => {
                        notify(LOGIN_SUCCESS_NOTICE);
                        dispatch.reduce_mut(|state| state.signed_in(session));
                        if let Some(nav) = navigator_handle {
                            nav.push(&MainRoute::Chat);
                        }
                    }
                    Err(err) => notify(&err.login_notice()),
                }
            });
        })
    };

    let on_identifier_change = {
        let identifier = identifier.clone();
        Callback::from(move |event: InputEvent| {
            if let Some(input) = event.target_dyn_into::<HtmlInputElement>() {
                identifier.set(input.value());
            }
        })
    };

    let on_password_change = {
        let password = password.clone();
        Callback::from(move |event: InputEvent| {
            if let Some(input) = event.target_dyn_into::<HtmlInputElement>() {
                password.set(input.value());
            }
        })
    };

    let is_busy = *loading;

    html! {
        <form class="auth-card" onsubmit={onsubmit}>
            <h2>{"Login"}</h2>
            <input
                id="identifier"
                type="text"
                placeholder="Username or email"
                required=true
                value={(*identifier).clone()}
                oninput={on_identifier_change}
            />
            <input
                id="password"
                type="password"
                placeholder="Password"
                required=true
                value={(*password).clone()}
                oninput={on_password_change}
            />
            <button type="submit" disabled={is_busy}>
                {if is_busy { "Logging in..." } else { "Login" }}
            </button>
            <p>
                {"Don't have an account? "}
                <Link<MainRoute> to={MainRoute::SignUp}>{"Sign up"}</Link<MainRoute>>
            </p>
        </form>
    }
}
