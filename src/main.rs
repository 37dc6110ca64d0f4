// Threadstore Server - comment storage with ranked, cursor-paginated reads

use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::info;

use threadstore::{app_state::AppState, config::Config, http::create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state (store + services)
    let app_state = AppState::new(config.clone()).await?;

    let app = create_router(app_state)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    let addr = config.server_address();
    info!("Threadstore server starting on http://{}", addr);
    println!("📋 API:");
    println!("  POST   /api/videos/{{video_id}}/comments         - Create comment");
    println!("  GET    /api/videos/{{video_id}}/comments         - List comments (paginated, ranked)");
    println!("  GET    /api/videos/{{video_id}}/threads          - List comments with top replies");
    println!("  POST   /api/comments/{{id}}/replies              - Create reply");
    println!("  GET    /api/comments/{{id}}/replies              - List replies (paginated, ranked)");
    println!("  POST   /api/comments/{{id}}/likes|dislikes       - Vote on comment");
    println!("  DELETE /api/comments/{{id}}                      - Delete comment (cascades)");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
