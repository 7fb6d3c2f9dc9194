use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=LEAF_DOCTOR_VERSION");
    let version = env::var("LEAF_DOCTOR_VERSION")
        .unwrap_or_else(|_| env::var("CARGO_PKG_VERSION").unwrap());
    println!("cargo:rustc-env=LEAF_DOCTOR_VERSION={version}");
}
