static INIT_ONCE: std::sync::Once = std::sync::Once::new();

/// Install a fmt subscriber filtered by `RUST_LOG` (default `info`). Later calls are no-ops.
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// Split a comma/semicolon/whitespace separated list of codes, dropping empties.
/// Order is preserved and duplicates are kept; callers collect into a set.
pub fn split_code_list(s: &str) -> Vec<String> {
    s.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join codes with the flat-record item separator.
pub fn join_items<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push(crate::flatten::ITEM_SEPARATOR);
        }
        out.push_str(item.as_ref());
    }
    out
}
