#[tokio::main]
async fn main() -> anyhow::Result<()> {
    user_lookup::run_server().await
}
