use axum::{
    Router,
    routing::{get, post},
};

use crate::presentation::AppState;
use crate::presentation::handlers::auth::{
    activate, confirm_password_reset, password_reset_page, request_password_reset, sign_in,
    sign_up,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", post(sign_in))
        .route("/activate/{token}", get(activate))
        .route(
            "/password-reset",
            get(password_reset_page).post(request_password_reset),
        )
        .route("/password-reset/confirm", post(confirm_password_reset))
}
