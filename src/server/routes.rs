use axum::{
  extract::DefaultBodyLimit,
  middleware,
  routing::{get, post},
  Router,
};
use tower_http::services::ServeDir;

use super::auth::require_login;
use super::handlers::*;
use super::state::AppState;

/// The full route table. Only the recipe write routes sit behind the login
/// gate; every read route is open.
pub fn build_router(state: AppState) -> Router {
  let gated = Router::new()
    .route("/submit-recipe", get(submit_recipe_page).post(submit_recipe))
    .route("/edit-recipe/{id}", get(edit_recipe_page).post(edit_recipe))
    .route_layer(middleware::from_fn_with_state(state.clone(), require_login));

  Router::new()
    .route("/", get(homepage))
    .route("/categories", get(explore_categories))
    .route("/categories/{name}", get(explore_category))
    .route("/recipe/{id}", get(explore_recipe))
    .route("/search", post(search_recipe))
    .route("/explore-latest", get(explore_latest))
    .route("/explore-random", get(explore_random))
    .route("/about", get(about))
    .route("/register", get(register_page).post(register))
    .route("/login", get(login_page).post(login))
    .route("/logout", get(logout))
    .route("/contact", get(contact_page).post(contact))
    .merge(gated)
    .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
    .fallback(not_found)
    .layer(DefaultBodyLimit::max(state.config.limits.max_upload_size))
    .with_state(state)
}
