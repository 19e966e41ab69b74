#[tokio::main]
async fn main() -> anyhow::Result<()> {
    docscribe::run().await
}
