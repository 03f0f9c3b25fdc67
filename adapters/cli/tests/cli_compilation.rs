use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "rail-shooter"])
        .status()
        .expect("failed to invoke cargo check for rail-shooter CLI binary");

    assert!(status.success(), "cargo check --bin rail-shooter should succeed");
}
