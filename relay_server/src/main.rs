use relay_server::frameworks::server;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    server::run_with_config().await
}
