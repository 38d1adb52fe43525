use rocket::http::Method;
use rocket_cors::{AllowedHeaders, AllowedOrigins, Cors, CorsOptions};
use tracing::info;

use crate::config::env_or;

fn allowed_origins() -> Vec<String> {
    env_or("CORS_ALLOWED_ORIGINS", "http://localhost:5173".to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Browser front-ends only need to create games and open sockets.
pub fn create_cors() -> Cors {
    let origins = allowed_origins();
    info!("CORS allowed origins: {}", origins.join(", "));

    CorsOptions {
        allowed_origins: AllowedOrigins::some_exact(&origins),
        allowed_methods: [Method::Get, Method::Post, Method::Options]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: AllowedHeaders::some(&["Accept", "Content-Type", "X-Requested-With"]),
        allow_credentials: false,
        ..Default::default()
    }
    .to_cors()
    .expect("Failed to create CORS configuration")
}
