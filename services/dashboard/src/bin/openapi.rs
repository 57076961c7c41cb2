//! services/dashboard/src/bin/openapi.rs
//!
//! Dumps the OpenAPI document for the `/api/auth` endpoints.
//!
//! Usage: `openapi [PATH]`. Writes to `openapi.json` when no path is given.

use dashboard_lib::web::ApiDoc;
use std::path::PathBuf;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("openapi.json"));

    let document = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(&path, document)?;
    println!("Wrote OpenAPI document to {}", path.display());
    Ok(())
}
