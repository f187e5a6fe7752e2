use crate::{components::Loading, models::app_state::AppState, pages::*};
use shared::session::SessionValidity;
use yew::prelude::*;
use yew_router::prelude::*;
use yewdux::prelude::use_selector;

/// The main routes
#[derive(Debug, Clone, PartialEq, Eq, Routable)]
pub enum MainRoute {
    #[at("/")]
    Root,
    #[at("/login")]
    Login,
    #[at("/signup")]
    SignUp,
    #[at("/chat")]
    Chat,
    #[not_found]
    #[at("/404")]
    NotFound,
}

/// What a route should do given the current session validity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Render,
    Redirect(MainRoute),
    /// Validation is still running; show a placeholder.
    Wait,
}

/// Access rules, re-evaluated on every render.
pub fn guard(route: &MainRoute, validity: SessionValidity) -> RouteDecision {
    match (route, validity) {
        (MainRoute::Root | MainRoute::NotFound, _)
        | (MainRoute::Chat, SessionValidity::Invalid) => RouteDecision::Redirect(MainRoute::Login),
        (MainRoute::SignUp, _)
        | (MainRoute::Chat, SessionValidity::Valid)
        | (MainRoute::Login, SessionValidity::Invalid) => RouteDecision::Render,
        (MainRoute::Login, SessionValidity::Valid) => RouteDecision::Redirect(MainRoute::Chat),
        (MainRoute::Chat | MainRoute::Login, SessionValidity::Pending) => RouteDecision::Wait,
    }
}

#[derive(Properties, PartialEq)]
pub struct MainRouteViewProps {
    pub route: MainRoute,
}

#[function_component(MainRouteView)]
fn main_route_view(props: &MainRouteViewProps) -> Html {
    let validity = use_selector(|state: &AppState| state.validity);

    match guard(&props.route, *validity) {
        RouteDecision::Wait => html! { <Loading /> },
        RouteDecision::Redirect(to) => html! { <Redirect<MainRoute> {to} /> },
        RouteDecision::Render => match props.route {
            MainRoute::Login => html! { <LoginPage /> },
            MainRoute::SignUp => html! { <SignUpPage /> },
            MainRoute::Chat => html! { <ChatPage /> },
            MainRoute::Root | MainRoute::NotFound => html! {},
        },
    }
}

/// Switch function for the main routes.
pub fn switch(route: MainRoute) -> Html {
    log::debug!("switching to route {route:?}");
    html! { <MainRouteView {route} /> }
}
