use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-env-changed=WORKLOAD_LIB_DIR");

    // only the firmware image needs a memory layout and the workload
    if env::var_os("CARGO_FEATURE_BINARY").is_none() {
        return;
    }

    let out = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    fs::write(out.join("memory.x"), include_bytes!("memory.x")).expect("failed to write memory.x");
    println!("cargo:rustc-link-search={}", out.display());
    println!("cargo:rustc-link-arg-bins=-Tmemory.x");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");

    // libworkload.a provides `execute_cw`
    if let Some(dir) = env::var_os("WORKLOAD_LIB_DIR") {
        println!("cargo:rustc-link-search={}", PathBuf::from(dir).display());
        println!("cargo:rustc-link-lib=static=workload");
    }
}
