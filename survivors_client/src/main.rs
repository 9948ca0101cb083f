use survivors_client::frameworks::runtime;

#[tokio::main]
async fn main() {
    runtime::run_with_config().await;
}
