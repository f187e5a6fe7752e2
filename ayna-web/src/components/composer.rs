use web_sys::HtmlInputElement;
use yew::{Callback, Html, Properties, TargetCast, function_component, html};

#[derive(Properties, PartialEq, Clone)]
pub struct ComposerProps {
    pub text: String,
    pub on_text_change: Callback<String>,
    pub on_submit: Callback<()>,
    #[prop_or(false)]
    pub disabled: bool,
}

/// Single-line input that sends on Enter or on the Send button.
#[function_component(Composer)]
pub fn composer(props: &ComposerProps) -> Html {
    let on_input = {
        let on_text_change = props.on_text_change.clone();
        Callback::from(move |event: yew::events::InputEvent| {
            let target: HtmlInputElement = event.target_unchecked_into();
            on_text_change.emit(target.value());
        })
    };

    let on_keydown = {
        let on_submit = props.on_submit.clone();
        let disabled = props.disabled;
        Callback::from(move |event: yew::events::KeyboardEvent| {
            if event.key() == "Enter" && !disabled {
                event.prevent_default();
                on_submit.emit(());
            }
        })
    };

    let on_click = {
        let on_submit = props.on_submit.clone();
        Callback::from(move |_| on_submit.emit(()))
    };

    html! {
        <div class="composer">
            <input
                type="text"
                placeholder="Type a message..."
                value={props.text.clone()}
                oninput={on_input}
                onkeydown={on_keydown}
                disabled={props.disabled}
            />
            <button type="button" onclick={on_click} disabled={props.disabled}>
                {"Send"}
            </button>
        </div>
    }
}
