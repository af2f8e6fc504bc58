//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{BucketMediaStore, DbAdapter, GoogleIdentityAdapter, NoopMailer, SmtpMailer},
    config::Config,
    error::ApiError,
    web::{
        auth, middleware as auth_middleware, public, session::SessionSigner, staff,
        state::AppState, student, superadmin, ApiDoc,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use placement_core::ports::MailService;
use placement_core::roles::RolePolicy;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter
        .run_migrations()
        .await
        .map_err(|e| ApiError::Internal(format!("migrations failed: {}", e)))?;
    info!("Database migrations complete.");

    // --- 3. Initialize Collaborator Adapters ---
    let identity = Arc::new(GoogleIdentityAdapter::new(
        config.oauth_client_id.clone(),
        config.oauth_client_secret.clone(),
        config.oauth_redirect_url.clone(),
    ));

    let mailer: Arc<dyn MailService> = match (
        &config.smtp_host,
        &config.smtp_username,
        &config.smtp_password,
        &config.mail_from,
    ) {
        (Some(host), Some(user), Some(pass), Some(from)) => Arc::new(
            SmtpMailer::new(host, user.clone(), pass.clone(), from)
                .map_err(|e| ApiError::Internal(e.to_string()))?,
        ),
        _ => Arc::new(NoopMailer),
    };

    let media = Arc::new(BucketMediaStore::new(config.media_bucket_url.clone()));

    let policy = Arc::new(RolePolicy::new(
        config.super_admin_emails.clone(),
        config.approved_staff_emails.clone(),
        &config.institution_domain,
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db: db_adapter,
        identity,
        mailer,
        media,
        sessions: SessionSigner::new(&config.session_secret),
        policy,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .frontend_url
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("bad FRONTEND_URL: {}", e)))?,
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/auth/google", get(auth::oauth_start_handler))
        .route("/auth/google/callback", get(auth::oauth_callback_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/staff/login", post(staff::login_handler))
        .route("/student/login", post(student::login_handler))
        .route("/superadmin/login", post(superadmin::login_handler))
        .route("/get-jobs", get(public::get_jobs_handler))
        .route("/get-events", get(public::get_events_handler))
        .route("/get-placed-students", get(public::get_placed_students_handler))
        .route("/check-session", get(public::check_session_handler));

    // Staff routes (staff session required)
    let staff_routes = Router::new()
        .route(
            "/staff/students",
            post(staff::register_students_handler).get(staff::list_students_handler),
        )
        .route("/staff/students/{id}", delete(staff::delete_student_handler))
        .route(
            "/staff/drives",
            post(staff::create_drive_handler).get(staff::list_drives_handler),
        )
        .route("/staff/drives/{id}", delete(staff::delete_drive_handler))
        .route("/staff/mark-placed", post(staff::mark_placed_handler))
        .route("/staff/password", post(staff::change_password_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware::require_staff,
        ));

    // Student routes (student session required)
    let student_routes = Router::new()
        .route("/student/drives", get(student::list_drives_handler))
        .route(
            "/student/applications",
            post(student::apply_handler).get(student::list_applications_handler),
        )
        .route(
            "/student/applications/{drive_id}",
            delete(student::withdraw_handler),
        )
        .route("/student/password", post(student::change_password_handler))
        .route("/student/photo", post(student::upload_photo_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware::require_student,
        ));

    // Super-admin routes (admin session required)
    let superadmin_routes = Router::new()
        .route(
            "/superadmin/staff",
            post(superadmin::create_staff_handler).get(superadmin::list_staff_handler),
        )
        .route(
            "/superadmin/staff/{id}",
            delete(superadmin::delete_staff_handler),
        )
        .route("/superadmin/drives", post(superadmin::create_drive_handler))
        .route(
            "/superadmin/drives/{id}",
            delete(superadmin::delete_drive_handler),
        )
        .route("/superadmin/events", post(superadmin::create_event_handler))
        .route(
            "/superadmin/events/{id}",
            delete(superadmin::delete_event_handler),
        )
        .route(
            "/superadmin/events/{id}/poster",
            post(superadmin::upload_event_poster_handler),
        )
        .route(
            "/superadmin/password",
            post(superadmin::change_password_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware::require_super_admin,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(staff_routes)
        .merge(student_routes)
        .merge(superadmin_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
