//! Locator chains for the known catalog layout variants
//!
//! Every heuristic the harvester applies is expressed here as a literal
//! ordered list, probed strictly in order with first-success semantics.
//! Supporting a new site template means appending to these lists, not
//! touching control flow.

use once_cell::sync::Lazy;
use regex::Regex;

/// Single attribute holding serialized per-item JSON on some templates.
pub const BUNDLED_INFO_ATTR: &str = "data-info";

/// Structural query tiers for card discovery, most specific first.
///
/// The last tier ("any list item") is deliberately broad; the classifier
/// filters out list items that carry no product signals.
pub const CARD_TIERS: &[&str] = &[
    "[data-info]",
    "a.prd-item",
    "li.prd-item",
    "ul.prd-list > li",
    ".prd-list li",
    "li",
];

/// Name locators, priority order. The first match with non-empty text wins
/// and also supplies the product link when it carries one.
pub const NAME_SELECTORS: &[&str] = &[
    "dt.prd-name",
    ".prd-name",
    ".prd-tit a",
    ".item-title",
    "[class*='name'] a",
    "[class*='title']",
];

/// Price locators, priority order.
pub const PRICE_SELECTORS: &[&str] = &[
    "dd.price-info .set-price strong",
    ".set-price strong",
    ".price-info strong",
    ".price strong",
    "[class*='price']",
];

/// Image locators, priority order.
pub const IMAGE_SELECTORS: &[&str] = &["div.prd-img img", ".prd-img img", "img"];

/// Attribute names that carry the catalog identifier, card root first.
/// Identifiers are sometimes attached to nested action elements instead,
/// so the same candidates are replayed against descendants.
pub const CODE_ATTRIBUTES: &[&str] = &[
    "data-goodsno",
    "data-goods-no",
    "data-prdid",
    "data-product-id",
    "data-goodscode",
    "data-code",
];

/// Camel-cased dataset key variants, the last-resort code source.
pub const CODE_DATASET_KEYS: &[&str] = &[
    "goodsno",
    "goodsNo",
    "prdid",
    "productId",
    "productid",
    "goodsCode",
    "code",
];

/// Button texts that trigger more content, exact phrase match first.
pub const LOAD_MORE_EXACT: &[&str] = &["상품 더보기", "더보기", "더 보기"];

/// Substring fallbacks for load-more controls (matched case-insensitively).
pub const LOAD_MORE_SUBSTRINGS: &[&str] = &["더보기", "more"];

/// Elements worth probing for a load-more control.
pub const CLICKABLE_SELECTOR: &str = "button, a.btn-more, a[role='button'], a";

/// Digit group with optional embedded commas, e.g. "12,345".
pub static PRICE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+[\d,]*)").expect("price pattern is valid"));

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Collapse whitespace runs and trim, the normal form for all card text.
pub fn normalize_whitespace(value: &str) -> String {
    WHITESPACE.replace_all(value.trim(), " ").into_owned()
}

/// Union of all discovery tiers, used for the initial "content appeared"
/// wait right after navigation.
pub fn initial_content_selector() -> String {
    CARD_TIERS.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_run_from_specific_to_generic() {
        assert_eq!(CARD_TIERS.first(), Some(&"[data-info]"));
        assert_eq!(CARD_TIERS.last(), Some(&"li"));
    }

    #[test]
    fn whitespace_normalization_collapses_runs() {
        assert_eq!(
            normalize_whitespace("  The \n Singleton\t12Y  "),
            "The Singleton 12Y"
        );
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn price_pattern_captures_digit_groups() {
        let m = PRICE_PATTERN.find("판매가 12,345원").unwrap();
        assert_eq!(m.as_str(), "12,345");
        assert!(PRICE_PATTERN.find("무료").is_none());
    }

    #[test]
    fn initial_content_selector_unions_all_tiers() {
        let selector = initial_content_selector();
        assert!(selector.starts_with("[data-info]"));
        assert!(selector.ends_with("li"));
    }
}
