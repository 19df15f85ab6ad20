use anyhow::{Context, Result};
use std::time::Duration;

use tracing::{debug, error, info};

use axum_extra::extract::cookie::{Cookie, SameSite};
use tower_http::services::ServeDir;

use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::content_routes::make_content_routes;
use super::search::make_search_routes;
use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::user_routes::make_user_routes;
use super::{log_requests, state::*, ServerConfig};
use crate::user::auth::AuthTokenValue;
use crate::user::RegistrationError;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub session_token: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize)]
struct LoginBody {
    pub user_handle: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
}

#[derive(Serialize)]
struct RegisterSuccessResponse {
    user_id: usize,
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        session_token: session.map(|s| s.token),
    };
    Json(stats)
}

async fn register(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<LoginBody>,
) -> Response {
    debug!("register() called for {}", body.user_handle);
    match user_manager.register(&body.user_handle, &body.password) {
        Ok(user_id) => (
            StatusCode::CREATED,
            Json(RegisterSuccessResponse { user_id }),
        )
            .into_response(),
        Err(err @ (RegistrationError::EmptyHandle | RegistrationError::EmptyPassword)) => {
            (StatusCode::BAD_REQUEST, err.to_string()).into_response()
        }
        Err(err @ RegistrationError::HandleTaken(_)) => {
            (StatusCode::CONFLICT, err.to_string()).into_response()
        }
        Err(RegistrationError::Storage(err)) => {
            error!("Error registering user: {:#}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<LoginBody>,
) -> Response {
    debug!("login() called for {}", body.user_handle);
    match user_manager.login(&body.user_handle, &body.password) {
        Ok(Some(auth_token)) => {
            let cookie = Cookie::build(Cookie::new(
                COOKIE_SESSION_TOKEN_KEY,
                auth_token.value.0.clone(),
            ))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
            (
                StatusCode::CREATED,
                [(header::SET_COOKIE, cookie.to_string())],
                Json(LoginSuccessResponse {
                    token: auth_token.value.0,
                }),
            )
                .into_response()
        }
        Ok(None) => StatusCode::UNAUTHORIZED.into_response(),
        Err(err) => {
            error!("Error with auth token generation: {:#}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn logout(State(user_manager): State<GuardedUserManager>, session: Session) -> Response {
    match user_manager.delete_auth_token(session.user_id, &AuthTokenValue(session.token)) {
        Ok(()) => {
            let cookie = Cookie::build(Cookie::new(COOKIE_SESSION_TOKEN_KEY, ""))
                .path("/")
                .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
                .same_site(SameSite::Lax)
                .build();

            (StatusCode::OK, [(header::SET_COOKIE, cookie.to_string())]).into_response()
        }
        Err(err) => {
            debug!("Logout failed: {:#}", err);
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    music_store: GuardedMusicStore,
    user_manager: GuardedUserManager,
) -> Router {
    let state = ServerState::new(config.clone(), music_store, user_manager);

    let auth_routes: Router = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    home_router
        .nest("/v1/auth", auth_routes)
        .nest("/v1/content", make_content_routes(state.clone()))
        .nest("/v1/user", make_user_routes(state.clone()))
        .nest("/v1/search", make_search_routes(state.clone()))
        .layer(middleware::from_fn_with_state(state, log_requests))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

pub async fn run_server(
    config: ServerConfig,
    music_store: GuardedMusicStore,
    user_manager: GuardedUserManager,
) -> Result<()> {
    let address = format!("{}:{}", config.bind_address, config.port);
    let app = make_app(config, music_store, user_manager);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music_store::{MusicStore, SqliteMusicStore};
    use crate::sqlite_persistence::open_database;
    use crate::user::{SqliteUserStore, UserManager};
    use axum::{body::Body, http::Request};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_app(temp_dir: &TempDir) -> Router {
        let conn = open_database(temp_dir.path().join("music.db")).unwrap();
        let music_store = Arc::new(SqliteMusicStore::new(conn.clone()));
        let user_manager = Arc::new(UserManager::new(Arc::new(SqliteUserStore::new(conn))));
        make_app(ServerConfig::default(), music_store, user_manager)
    }

    #[test]
    fn formats_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(
            format_uptime(Duration::from_secs(2 * 86_400 + 3 * 3600 + 4 * 60 + 5)),
            "2d 03:04:05"
        );
    }

    #[tokio::test]
    async fn responds_forbidden_on_protected_routes() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_app(&temp_dir);

        let protected_routes = vec![
            ("GET", "/v1/auth/logout"),
            ("GET", "/v1/user/profile"),
            ("POST", "/v1/user/rate"),
            ("POST", "/v1/user/artist"),
            ("POST", "/v1/user/album"),
            ("POST", "/v1/user/song"),
            ("POST", "/v1/user/note/song/1"),
            ("GET", "/v1/search/artists?q=a"),
            ("GET", "/v1/search/albums?q=a"),
            ("GET", "/v1/search/songs?q=a"),
            ("GET", "/v1/search/hashtags?q=a"),
        ];

        for (method, route) in protected_routes.into_iter() {
            println!("Trying route {} {}", method, route);
            let request = Request::builder()
                .method(method)
                .uri(route)
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }
    }

    #[tokio::test]
    async fn serves_public_content_without_session() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_app(&temp_dir);

        for route in ["/", "/v1/content/songs", "/v1/content/charts"] {
            let request = Request::builder().uri(route).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "route {}", route);
        }

        let request = Request::builder()
            .uri("/v1/content/song/42")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn content_responses_are_cacheable() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_app(&temp_dir);

        let request = Request::builder()
            .uri("/v1/content/songs")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "max-age=60"
        );
    }

    #[tokio::test]
    async fn note_bearing_views_are_not_cached() {
        let temp_dir = TempDir::new().unwrap();
        let conn = open_database(temp_dir.path().join("music.db")).unwrap();
        let music_store = Arc::new(SqliteMusicStore::new(conn.clone()));
        let artist_id = music_store.add_artist("Nirvana", "").unwrap();
        let user_manager = Arc::new(UserManager::new(Arc::new(SqliteUserStore::new(conn))));
        let app = make_app(ServerConfig::default(), music_store, user_manager);

        for route in [
            format!("/v1/content/artist/{}", artist_id),
            "/v1/content/hashtag/grunge".to_string(),
        ] {
            let request = Request::builder().uri(&route).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "route {}", route);
            assert!(
                response.headers().get(header::CACHE_CONTROL).is_none(),
                "route {}",
                route
            );
        }
    }

    #[tokio::test]
    async fn rejects_login_with_wrong_password() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_app(&temp_dir);

        let register = Request::builder()
            .method("POST")
            .uri("/v1/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"user_handle":"alice","password":"secret"}"#))
            .unwrap();
        let response = app.clone().oneshot(register).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let login = Request::builder()
            .method("POST")
            .uri("/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"user_handle":"alice","password":"wrong"}"#))
            .unwrap();
        let response = app.clone().oneshot(login).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let login = Request::builder()
            .method("POST")
            .uri("/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"user_handle":"alice","password":"secret"}"#))
            .unwrap();
        let response = app.oneshot(login).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie = response.headers().get(header::SET_COOKIE).unwrap();
        assert!(cookie.to_str().unwrap().starts_with("session_token="));
    }
}
