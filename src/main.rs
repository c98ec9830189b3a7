#[tokio::main]
async fn main() {
    if let Err(e) = copdcare_lib::run().await {
        eprintln!("copdcare: {e}");
        std::process::exit(1);
    }
}
