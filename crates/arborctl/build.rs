fn main() {
    // Release builds may stamp their own version.
    let version = match std::env::var("ARBOR_VERSION") {
        Ok(v) if !v.trim().is_empty() => v,
        _ => std::env::var("CARGO_PKG_VERSION").unwrap_or_default(),
    };

    println!("cargo:rustc-env=ARBOR_VERSION={}", version);
    println!("cargo:rerun-if-env-changed=ARBOR_VERSION");
}
