use yew::{Html, function_component, html};

#[function_component(Loading)]
pub fn loading() -> Html {
    html! {
        <div class="loading">
            <span>{"Loading..."}</span>
        </div>
    }
}
