// Query-string assembly for Helix requests

/// Encode ordered (key, value) pairs as `key1=value1&key2=value2&...`.
///
/// Output order matches input order and duplicate keys pass through
/// untouched, so request logs stay readable and deterministic.
pub fn encode_query(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
