//! Prompt composition.

use crate::types::{ItemCount, ResponseFormat};

/// Clause constraining the number of items; empty for [`ItemCount::All`].
fn count_clause(count: ItemCount) -> String {
    match count {
        ItemCount::All => String::new(),
        ItemCount::Exactly(n) => format!("Return exactly {n} items."),
    }
}

/// Directive asking for a list in the requested format.
fn format_directive(format: &ResponseFormat) -> String {
    format!(
        "Output the result in {format} format as a list, even if it contains a single item. \
         Always wrap strings in double quotes."
    )
}

/// Compose the instruction sent with the image.
pub fn build_prompt(template: &str, count: ItemCount, format: &ResponseFormat) -> String {
    let template = template.trim_end();
    let count = count_clause(count);
    let directive = format_directive(format);
    if count.is_empty() {
        format!("{template} {directive}")
    } else {
        format!("{template} {count} {directive}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "Return all animals in this image, including name and description.";

    #[test]
    fn test_all_items_has_no_count_clause() {
        for format in [ResponseFormat::Json, ResponseFormat::Yaml] {
            let prompt = build_prompt(TEMPLATE, ItemCount::All, &format);
            assert!(prompt.starts_with(TEMPLATE));
            assert!(!prompt.contains("exactly"));
            assert!(!prompt.contains("-1"));
        }
    }

    #[test]
    fn test_explicit_count_states_exact_count() {
        for n in [1, 5, 10, 20] {
            let prompt = build_prompt(TEMPLATE, ItemCount::Exactly(n), &ResponseFormat::Json);
            assert!(prompt.contains(&format!("Return exactly {n} items.")));
        }
    }

    #[test]
    fn test_format_directive_always_present() {
        let prompt = build_prompt(TEMPLATE, ItemCount::Exactly(3), &ResponseFormat::Yaml);
        assert!(prompt.contains("in yaml format as a list"));
        assert!(prompt.contains("single item"));

        let literal = ResponseFormat::Literal("markdown".to_string());
        let prompt = build_prompt(TEMPLATE, ItemCount::All, &literal);
        assert!(prompt.contains("in markdown format"));
    }

    #[test]
    fn test_build_prompt_is_deterministic() {
        let a = build_prompt(TEMPLATE, ItemCount::Exactly(5), &ResponseFormat::Json);
        let b = build_prompt(TEMPLATE, ItemCount::Exactly(5), &ResponseFormat::Json);
        assert_eq!(a, b);
        assert!(!a.contains("  "));
    }
}
