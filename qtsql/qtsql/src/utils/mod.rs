mod id_gen;

use std::io::stderr;

use anstream::adapter::strip_str;
pub use id_gen::{IdGenerator, NameGenerator};

/// Case-insensitive comparison for names in the platform's vocabulary, which
/// are mostly not ASCII.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

fn should_use_color() -> bool {
    match anstream::AutoStream::choice(&stderr()) {
        anstream::ColorChoice::Auto => true,
        anstream::ColorChoice::Always => true,
        anstream::ColorChoice::AlwaysAnsi => true,
        anstream::ColorChoice::Never => false,
    }
}

/// Strip colors, for external libraries which don't yet strip themselves, and
/// for insta snapshot tests. This will respond to environment variables such as
/// `CLI_COLOR`.
pub(crate) fn maybe_strip_colors(s: &str) -> String {
    if !should_use_color() {
        strip_str(s).to_string()
    } else {
        s.to_string()
    }
}

#[test]
fn test_eq_ignore_case() {
    assert!(eq_ignore_case("Наименование", "НАИМЕНОВАНИЕ"));
    assert!(eq_ignore_case("src", "SRC"));
    assert!(!eq_ignore_case("Код", "Коды"));
}
