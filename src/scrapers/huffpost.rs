//! HuffPost front page layout.
//!
//! This module scrapes article teasers from the [HuffPost](https://www.huffpost.com/)
//! front page. Only left-column cards (`.card--left`) are read; each yields a
//! headline, a teaser image and the article link.
//!
//! The same map ships as `selectors/huffpost.yaml` for anyone who wants to
//! tweak it without rebuilding.

use crate::scrapers::selectors::{FieldSpec, SelectorMap};

/// Default page to scrape.
pub const SOURCE_URL: &str = "https://www.huffpost.com/";

const HEADLINE: [&str; 5] = [
    ".card__content",
    ".card__details",
    ".card__headlines",
    ".card__headline",
    "a",
];

/// Selector map for the front page cards.
pub fn selector_map() -> SelectorMap {
    let mut title = HEADLINE.to_vec();
    title.push(".card__headline__text");

    SelectorMap {
        card: ".card--left".to_string(),
        title: FieldSpec::text(title),
        image: FieldSpec::attr(
            [
                ".card__content",
                ".card__image__wrapper",
                ".card__image",
                "img",
            ],
            "src",
        ),
        link: FieldSpec::attr(HEADLINE, "href"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::{Extractor, SelectorExtractor};
    use url::Url;

    const FRONT_PAGE: &str = include_str!("../../tests/fixtures/huffpost_front.html");

    fn extract_fixture() -> Vec<crate::models::ArticleRecord> {
        let extractor = SelectorExtractor::new(&selector_map()).unwrap();
        extractor.extract(FRONT_PAGE, &Url::parse(SOURCE_URL).unwrap())
    }

    #[test]
    fn test_one_record_per_left_card_in_order() {
        let records = extract_fixture();
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            [
                "Senate Passes Spending Bill",
                "Storm Warning Issued For Coast",
                "12 Weeknight Recipes",
            ]
        );
    }

    #[test]
    fn test_reads_image_and_link() {
        let records = extract_fixture();
        assert_eq!(
            records[0].image,
            "https://img.huffingtonpost.com/asset/senate-vote.jpg"
        );
        assert_eq!(
            records[0].link,
            "https://www.huffpost.com/entry/senate-vote_n_1"
        );
    }

    #[test]
    fn test_card_without_image_has_empty_image() {
        let records = extract_fixture();
        assert_eq!(records[1].image, "");
        assert_eq!(
            records[1].link,
            "https://www.huffpost.com/entry/storm-warning_n_2"
        );
    }

    #[test]
    fn test_relative_image_is_resolved() {
        let records = extract_fixture();
        assert_eq!(records[2].image, "https://www.huffpost.com/asset/recipes.jpg");
    }

    #[test]
    fn test_shipped_yaml_matches_built_in_map() {
        let yaml = include_str!("../../selectors/huffpost.yaml");
        assert_eq!(SelectorMap::from_yaml(yaml).unwrap(), selector_map());
    }
}
