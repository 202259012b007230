use std::net::SocketAddr;

use dotenvy::dotenv;
use rollcall::logging::init_tracing;
use rollcall::router::init_router;
use rollcall::state::init_app_state;

#[tokio::main]
async fn main() {
    dotenv().ok();

    init_tracing();

    let state = init_app_state().await;
    let app = init_router(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
    println!("🚀 Server running on http://localhost:8000");
    println!("📚 Swagger UI available at http://localhost:8000/swagger-ui");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
