use std::sync::OnceLock;

use regex::Regex;

static ORDER_REF_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Strict format check for order identifiers arriving as the provider's `external_reference`.
///
/// Order ids are client-generated UUIDs. Anything that does not match the UUID shape is refused before it gets
/// anywhere near a database write; a foreign id in this field is either a misrouted notification or someone probing.
pub fn is_valid_order_ref(value: &str) -> bool {
    let re = ORDER_REF_PATTERN.get_or_init(|| {
        Regex::new(r"^(?i)[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
            .expect("order ref pattern is valid")
    });
    re.is_match(value)
}
