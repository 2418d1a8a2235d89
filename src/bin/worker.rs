#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = classmark::run_worker().await {
        eprintln!("classmark-worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
