#[tokio::main]
async fn main() -> Result<(), catalog_server::ServerError> {
    catalog_server::start_server().await
}
