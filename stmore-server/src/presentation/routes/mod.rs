use axum::Router;

use super::AppState;
use crate::domain::post::PostKind;

pub(crate) mod auth;
pub(crate) mod posts;
pub(crate) mod users;

pub(crate) fn router(state: AppState) -> Router<AppState> {
    let router = Router::new()
        .merge(auth::router())
        .merge(users::router(state.clone()));

    PostKind::ALL.into_iter().fold(router, |router, kind| {
        router.nest(
            &format!("/{}", kind.as_str()),
            posts::router(state.clone(), kind),
        )
    })
}
