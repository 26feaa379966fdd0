// Forbid unwrap() in production code.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::net::SocketAddr;
use std::sync::Arc;

use authwire::auth::{
    ApiKeyStore, InMemoryApiKeyStore, InMemoryUserStore, JwtConfig, NewUser, UserStore,
};
use authwire::{
    AppState, RouteTable, Settings, StackConfig, build_router, configure, register_auth_routes,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authwire=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match StackConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: base_dir={}, listen_port={}",
        config.base_dir.display(),
        config.listen_port
    );

    let mut settings = Settings::new(config.base_dir.clone());
    if let Err(e) = configure(&mut settings, &config.configure_options()) {
        tracing::error!("Failed to configure settings: {e}");
        std::process::exit(1);
    }
    let settings = Arc::new(settings);

    let jwt_config = match JwtConfig::new_hs256(config.secret_key.clone().into_bytes()) {
        Ok(jwt_config) => jwt_config,
        Err(e) => {
            tracing::error!("Invalid JWT configuration: {e}");
            std::process::exit(1);
        }
    };

    let users = Arc::new(InMemoryUserStore::new());
    if let Some(admin) = &config.admin {
        let new_user = NewUser {
            is_staff: true,
            is_superuser: true,
            ..NewUser::new(admin.username.clone(), admin.password.clone())
        };
        match users.create_user(new_user) {
            Ok(user) => tracing::info!("Created admin user '{}'", user.username()),
            Err(e) => {
                tracing::error!("Failed to create admin user: {e}");
                std::process::exit(1);
            }
        }
    }

    let state = match AppState::new(
        Arc::clone(&settings),
        jwt_config,
        users as Arc<dyn UserStore>,
        Arc::new(InMemoryApiKeyStore::new()) as Arc<dyn ApiKeyStore>,
    ) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to build application state: {e}");
            std::process::exit(1);
        }
    };

    let mut routes = RouteTable::new();
    register_auth_routes(&mut routes);

    let app = match build_router(&settings, routes, state) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("Failed to build router: {e}");
            std::process::exit(1);
        }
    };

    let addr = SocketAddr::from(([127, 0, 0, 1], config.listen_port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}
