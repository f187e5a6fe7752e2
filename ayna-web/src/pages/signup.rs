use crate::{api::shared_client, notice::notify, routes::MainRoute};
use shared::auth::{SIGNUP_SUCCESS_NOTICE, sign_up};
use shared::models::RegisterRequest;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;
use yew_router::prelude::{Link, use_navigator};

fn bind(handle: &UseStateHandle<String>) -> Callback<InputEvent> {
    let handle = handle.clone();
    Callback::from(move |event: InputEvent| {
        if let Some(input) = event.target_dyn_into::<HtmlInputElement>() {
            handle.set(input.value());
        }
    })
}

#[function_component(SignUpPage)]
pub fn sign_up_page() -> Html {
    let username = use_state(String::new);
    let email = use_state(String::new);
    let password = use_state(String::new);
    let loading = use_state(|| false);
    let navigator = use_navigator();

    let onsubmit = {
        let username = username.clone();
        let email = email.clone();
        let password = password.clone();
        let loading = loading.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            let request = RegisterRequest {
                username: (*username).clone(),
                email: (*email).clone(),
                password: (*password).clone(),
            };
            loading.set(true);
            let loading = loading.clone();
            let navigator = navigator.clone();
            spawn_local(async move {
                let result = sign_up(&shared_client(), &request).await;
                loading.set(false);
                match result {
                    Ok(()) => {
                        notify(SIGNUP_SUCCESS_NOTICE);
                        if let Some(nav) = navigator {
                            nav.push(&MainRoute::Login);
                        }
                    }
                    Err(err) => notify(&err.signup_notice()),
                }
            });
        })
    };

    let is_busy = *loading;

    html! {
        <form class="auth-card" onsubmit={onsubmit}>
            <h2>{"Sign up"}</h2>
            <input
                id="username"
                type="text"
                placeholder="Username"
                required=true
                value={(*username).clone()}
                oninput={bind(&username)}
            />
            <input
                id="email"
                type="email"
                placeholder="Email"
                required=true
                value={(*email).clone()}
                oninput={bind(&email)}
            />
            <input
                id="password"
                type="password"
                placeholder="Password"
                required=true
                value={(*password).clone()}
                oninput={bind(&password)}
            />
            <button type="submit" disabled={is_busy}>
                {if is_busy { "Signing up..." } else { "Sign up" }}
            </button>
            <p>
                {"Already have an account? "}
                <Link<MainRoute> to={MainRoute::Login}>{"Login"}</Link<MainRoute>>
            </p>
        </form>
    }
}
