#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = classmark::run().await {
        eprintln!("classmark fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
