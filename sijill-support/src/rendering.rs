//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to shorten type names and to suggest close
//! matches when a service, parameter or type lookup fails.

/// Drops module paths from every type in `full_name`, keeping the
/// generic, reference and tuple punctuation around them. Typed service
/// ids are `std::any::type_name` strings, so this is how they read in
/// "did you mean" hints.
///
/// ```
/// use sijill_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("app::mail::SmtpTransport"), "SmtpTransport");
/// assert_eq!(
///     shorten_type_name("alloc::sync::Arc<dyn app::mail::Transport>"),
///     "Arc<dyn Transport>"
/// );
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut short = String::with_capacity(full_name.len());
    let mut start = 0;

    let is_punct = |c: char| matches!(c, '<' | '>' | ',' | ' ' | '&' | '(' | ')' | '[' | ']' | ';');

    for (at, punct) in full_name.match_indices(is_punct) {
        short.push_str(last_segment(&full_name[start..at]));
        short.push_str(punct);
        start = at + punct.len();
    }

    short.push_str(last_segment(&full_name[start..]));
    short
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Suggests registered names close to `requested`.
///
/// Case and `_`/`.` separators are ignored when comparing, so
/// `fooservice` still finds `foo_service`. Best matches come first.
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    let requested_flat = flatten(requested);
    let requested_short = flatten(&shorten_type_name(requested));

    if requested_flat.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter_map(|&name| {
            let name_flat = flatten(name);
            let name_short = flatten(&shorten_type_name(name));

            if name_flat == requested_flat {
                return Some((name, 120));
            }

            if name_flat.contains(&requested_flat) || requested_flat.contains(&name_flat) {
                return Some((name, 100));
            }

            if name_short.contains(&requested_short) || requested_short.contains(&name_short) {
                return Some((name, 80));
            }

            let common = name_short
                .chars()
                .zip(requested_short.chars())
                .take_while(|(a, b)| a == b)
                .count();

            if common >= 3 {
                return Some((name, common * 10));
            }

            None
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored.dedup_by(|a, b| a.0 == b.0);
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Renders a list of names as `a, b, c` (or `<none>`).
pub fn render_list<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        return "<none>".to_string();
    }

    items.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", ")
}

fn flatten(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '.' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}
