use axum::Router;
use axum::middleware;
use axum::routing::{get, patch};

use crate::presentation::AppState;
use crate::presentation::handlers::users::{
    change_nickname, change_password, delete_account, list_authors, list_users, me, update_roles,
};
use crate::presentation::middleware::auth::jwt_auth_middleware;

pub(crate) fn router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/authors", get(list_authors));

    let protected = Router::new()
        .route("/users", get(list_users))
        .route("/users/me", get(me).delete(delete_account))
        .route("/users/me/password", patch(change_password))
        .route("/users/me/nickname", patch(change_nickname))
        .route("/users/{email}", patch(update_roles))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware));

    public.merge(protected)
}
