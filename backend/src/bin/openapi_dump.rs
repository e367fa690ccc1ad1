//! Print the OpenAPI document as JSON.

use khidma::doc::ApiDoc;
use utoipa::OpenApi;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let document = ApiDoc::openapi().to_pretty_json()?;
    println!("{document}");
    Ok(())
}
