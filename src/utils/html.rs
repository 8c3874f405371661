/// Strips unsafe markup from free-text fields (descriptions, explanations)
/// before they are stored. Safe inline tags survive; `<script>` and event
/// handler attributes do not.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// `clean_html` over an optional field.
pub fn clean_optional(input: Option<String>) -> Option<String> {
    input.map(|text| clean_html(&text))
}
