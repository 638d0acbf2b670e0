#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    volunet_backend::account::INSTANCE.refresh_all();

    // use an external function here so this won't be in a proc macro,
    // also for tests
    let app = volunet_backend::router();

    let addr: std::net::SocketAddr = volunet_backend::config::INSTANCE
        .listen
        .parse()
        .expect("malformed listen address in config");

    tracing::info!("listening on {addr}");

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .unwrap();
}
