use std::env;

const DEFAULT_ENDPOINT: &str = "http://192.168.0.143:8000/plants/detect";

fn main() {
    println!("cargo:rerun-if-env-changed=LEAF_DOCTOR_ENDPOINT");
    let endpoint =
        env::var("LEAF_DOCTOR_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
    println!("cargo:rustc-env=LEAF_DOCTOR_ENDPOINT={endpoint}");
}
