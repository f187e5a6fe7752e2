use crate::{
    api::shared_client,
    components::{Composer, MessageList},
    config::FrontendConfig,
    models::{
        app_state::AppState,
        chat_feed::{ChatFeed, FeedAction},
    },
    notice::notify,
    relay::{LiveChannel, Offline},
    routes::MainRoute,
    storage::session_store,
};
use shared::auth::sign_out;
use shared::chat::{HISTORY_FAILURE_NOTICE, MessageRelay, deliver, prepare_send};
use shared::models::MessageRecord;
use shared::session::{SessionStorage, SessionStore};
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;
use yew_router::Routable;
use yewdux::prelude::{use_selector, use_store};

/// Clears the stored session and closes the live channel. Returns the route
/// to load next; a full page load drops any in-memory state.
fn log_out<S: SessionStorage>(store: &SessionStore<S>, live: Option<Rc<LiveChannel>>) -> MainRoute {
    sign_out(store);
    if let Some(live) = live {
        live.close();
    }
    MainRoute::Login
}

/// Attributes fetched history to whoever is stored when the fetch lands.
fn history_update<S: SessionStorage>(records: Vec<MessageRecord>, store: &SessionStore<S>) -> FeedAction {
    FeedAction::History {
        records,
        viewer: store.load().map(|session| session.username),
    }
}

#[function_component(ChatPage)]
pub fn chat_page() -> Html {
    let session = use_selector(|state: &AppState| state.session.clone());
    let (feed, feed_dispatch) = use_store::<ChatFeed>();
    let draft = use_state(String::new);
    let sending = use_state(|| false);
    let channel = use_mut_ref(|| None::<Rc<LiveChannel>>);
    let viewer = session.as_ref().as_ref().map(|session| session.username.clone());

    // History is fetched once and attributed to whoever is stored when it lands.
    {
        let feed = feed_dispatch.clone();
        use_effect_with((), move |_| {
            feed.set(ChatFeed::default());
            spawn_local(async move {
                match shared_client().list_messages().await {
                    Ok(records) => {
                        let update = history_update(records, &session_store());
                        feed.reduce_mut(|state| state.apply(update));
                    }
                    Err(err) => {
                        log::error!("error fetching messages: {err}");
                        notify(HISTORY_FAILURE_NOTICE);
                    }
                }
            });
            || ()
        });
    }

    {
        let feed = feed_dispatch.clone();
        let channel = channel.clone();
        use_effect_with((), move |_| {
            let on_message = Callback::from(move |event| {
                feed.reduce_mut(|state| state.apply(FeedAction::Live(event)));
            });
            match LiveChannel::open(FrontendConfig::new().relay_url(), on_message) {
                Ok(live) => *channel.borrow_mut() = Some(Rc::new(live)),
                Err(err) => log::error!("live updates unavailable: {err}"),
            }
            move || {
                if let Some(live) = channel.borrow_mut().take() {
                    live.close();
                }
            }
        });
    }

    let on_text_change = {
        let draft = draft.clone();
        Callback::from(move |text: String| draft.set(text))
    };

    let on_submit = {
        let draft = draft.clone();
        let sending = sending.clone();
        let feed = feed_dispatch.clone();
        let channel = channel.clone();
        let session = session.clone();
        Callback::from(move |()| {
            if *sending {
                return;
            }
            let outgoing = match prepare_send(&draft, session.as_ref().as_ref()) {
                Ok(outgoing) => outgoing,
                Err(rejected) => {
                    if let Some(message) = rejected.notice() {
                        notify(message);
                    }
                    return;
                }
            };
            sending.set(true);
            let live = channel.borrow().clone();
            let draft = draft.clone();
            let sending = sending.clone();
            let feed = feed.clone();
            spawn_local(async move {
                let relay: &dyn MessageRelay = match &live {
                    Some(live) => live.as_ref(),
                    None => &Offline,
                };
                match deliver(outgoing, relay, &shared_client()).await {
                    Ok(message) => {
                        feed.reduce_mut(|state| state.apply(FeedAction::Sent(message)));
                        draft.set(String::new());
                    }
                    Err(err) => notify(&err.notice()),
                }
                sending.set(false);
            });
        })
    };

    let on_logout = {
        let channel = channel.clone();
        Callback::from(move |_: MouseEvent| {
            let target = log_out(&session_store(), channel.borrow_mut().take()).to_path();
            if let Some(window) = web_sys::window() {
                if let Err(err) = window.location().set_href(&target) {
                    log::error!("navigation to {target} failed: {err:?}");
                }
            }
        })
    };

    html! {
        <div class="chat">
            <header class="chat-header">
                <span>{ viewer.clone().unwrap_or_default() }</span>
                <button type="button" onclick={on_logout}>{"Logout"}</button>
            </header>
            <MessageList messages={feed.timeline.messages().to_vec()} viewer={viewer} />
            <Composer
                text={(*draft).clone()}
                {on_text_change}
                {on_submit}
                disabled={*sending}
            />
        </div>
    }
}
