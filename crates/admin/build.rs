//! Build script for admin crate.
//!
//! Generates content-based hashes for static assets (CSS and JS) so the
//! templates can cache-bust them with a query string.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let static_dir = Path::new(&manifest_dir).join("static");

    hash_asset(&static_dir.join("css/admin.css"), "CSS_HASH");
    hash_asset(&static_dir.join("js/admin.js"), "JS_HASH");
}

/// Hash an asset and expose the first 8 hex chars as a compile-time env var.
fn hash_asset(path: &Path, var: &str) {
    println!("cargo:rerun-if-changed={}", path.display());

    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read {}: {e}", path.display());
            println!("cargo:rustc-env={var}=");
            return;
        }
    };

    let mut hasher = Sha256::new();
    hasher.update(&content);
    let hash = format!("{:x}", hasher.finalize());
    println!("cargo:rustc-env={var}={}", &hash[..8]);
}
