#[tokio::main]
async fn main() {
    if oauth2_debug::provider::main().await.is_err() {
        std::process::exit(1);
    }
}
