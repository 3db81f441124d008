/// Expose the compilation target triple as an environment variable at build time.
///
/// `patchwise version` prints it via `constants::TARGET`.
fn main() {
    println!(
        "cargo:rustc-env=TARGET={}",
        std::env::var("TARGET").unwrap_or_default()
    );
}
