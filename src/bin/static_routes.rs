#[tokio::main]
async fn main() -> anyhow::Result<()> {
    static_routes::cli::run_cli().await
}
