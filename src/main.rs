use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:data/pantry.db".to_string());
    let media_root = PathBuf::from(std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".into()));

    let pool = pantry::db::init_pool(&database_url).await;

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("create-superuser") {
        let (Some(email), Some(password)) = (args.get(2), args.get(3)) else {
            eprintln!("usage: pantry create-superuser <email> <password>");
            std::process::exit(1);
        };
        if let Err(e) = pantry::cli::create_superuser(&pool, email, password).await {
            eprintln!("Failed to create superuser: {e}");
            std::process::exit(1);
        }
        return;
    }

    let app = pantry::build_app(pool, media_root);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    let listener = TcpListener::bind(addr).await.unwrap();

    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await.unwrap();
}
