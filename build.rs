// Cargo build script: the embedded C runtime files must trigger a rebuild
// when they change (include_str! alone is not tracked by Cargo's
// dependency fingerprinting).

fn main() {
    println!("cargo:rerun-if-changed=src/runtime/lazyc_runtime.c");
    println!("cargo:rerun-if-changed=src/runtime/lazyc_runtime.h");
}
