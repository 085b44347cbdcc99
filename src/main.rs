//! DMG Bundler - packages a macOS .app into a drag-to-install DMG.
//!
//! Composes the volume icon from the app icon and a disk icon template, then
//! builds the disk image with hdiutil.

use std::process;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Run CLI and get exit code
    let exit_code = match dmg_bundler::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
