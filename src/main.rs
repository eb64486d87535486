#[tokio::main]
async fn main() -> anyhow::Result<()> {
    veridai_lib::run().await
}
