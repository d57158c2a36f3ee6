use axum::routing::{get, patch, post, put};
use axum::{Extension, Router, middleware};

use crate::domain::post::PostKind;
use crate::presentation::AppState;
use crate::presentation::handlers::posts::{
    count_author_posts, count_posts, create_post, delete_post, get_post, list_author_posts,
    list_own_posts, list_posts, set_published, update_post, upload_thumbnail,
};
use crate::presentation::middleware::auth::{jwt_auth_middleware, optional_auth_middleware};

/// Routes for one post kind, meant to be nested under `/{kind}`. Handlers
/// read the kind from the request extensions. Auth is a route layer so a
/// method no route serves still answers 405.
pub(crate) fn router(state: AppState, kind: PostKind) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_posts))
        .route("/count", get(count_posts))
        .route("/author/{author_id}", get(list_author_posts))
        .route("/author/{author_id}/count", get(count_author_posts))
        .route("/{id}", get(get_post))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    let protected = Router::new()
        .route("/", post(create_post))
        .route("/mine", get(list_own_posts))
        .route("/{id}", patch(update_post).delete(delete_post))
        .route("/{id}/publish", patch(set_published))
        .route("/{id}/thumbnail", put(upload_thumbnail))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware));

    public.merge(protected).layer(Extension(kind))
}
