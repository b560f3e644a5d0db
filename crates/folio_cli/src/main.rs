//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `folio_core` linkage.
//! - Print the slug a title would be stored under.

fn main() {
    println!("folio_core ping={}", folio_core::ping());
    println!("folio_core version={}", folio_core::core_version());

    let title = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if !title.is_empty() {
        println!("folio_core slug={}", folio_core::generate_slug(&title));
    }
}
