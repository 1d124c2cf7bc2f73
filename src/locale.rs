//! User-facing labels

/// en-US translations, keyed by lookup id
const EN_US: &[(&str, &str)] = &[
    ("JACKInput", "JACK Input Client"),
    ("Channels", "Number of Channels"),
    ("StartJACKServer", "Start JACK Server"),
];

/// Look up a label, falling back to the key itself
pub fn text(key: &str) -> &str {
    EN_US
        .iter()
        .find(|(id, _)| *id == key)
        .map(|(_, label)| *label)
        .unwrap_or(key)
}
