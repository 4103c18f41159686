//! Build script for the storefront crate.
//!
//! Computes a content hash of the stylesheet so templates can emit a
//! cache-busting query parameter and the CSS can be served with a long
//! max-age.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    hash_css();
}

/// Hash `static/css/main.css` and expose the first 8 hex chars as the
/// `CSS_HASH` environment variable for `env!("CSS_HASH")`.
fn hash_css() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let css_path = Path::new(&manifest_dir).join("static/css/main.css");

    println!("cargo:rerun-if-changed={}", css_path.display());

    let Ok(content) = fs::read(&css_path) else {
        // Stylesheet may be absent in stripped-down builds; templates fall
        // back to an unversioned URL.
        println!("cargo:rustc-env=CSS_HASH=");
        return;
    };

    let mut hasher = Sha256::new();
    hasher.update(&content);
    let hash = format!("{:x}", hasher.finalize());
    let short_hash = hash.get(..8).unwrap_or_default();

    println!("cargo:rustc-env=CSS_HASH={short_hash}");
}
