#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Binary entry point for the salescraft API server.

#[actix_web::main]
async fn main() {
    if let Err(e) = salescraft_server::run_server().await {
        eprintln!("Fatal: {e}");
        std::process::exit(1);
    }
}
