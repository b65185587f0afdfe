// Exposes the workspace's `shq` and `shqd` binaries to integration tests via
// the same CARGO_BIN_EXE_<name> convention assert_cmd relies on. Cargo only
// sets that variable for bins of the package under test itself; since those
// binaries live in sibling workspace members (shq-cli, shq-daemon) with no
// lib target to depend on, we compute their build output path ourselves.
use std::env;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let profile_dir = out_dir
        .ancestors()
        .nth(3)
        .expect("unexpected OUT_DIR layout")
        .to_path_buf();
    for bin in ["shq", "shqd"] {
        let path = profile_dir.join(bin);
        println!("cargo:rustc-env=CARGO_BIN_EXE_{bin}={}", path.display());
    }
}
