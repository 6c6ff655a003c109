//! Quote card markup.
//!
//! The card is a self-contained HTML document rendered with [maud]; the
//! capture exporter loads it and rasterizes the `#poster-card` element.

use maud::{html, Markup, DOCTYPE};

use crate::model::{Category, GeneratedContent, ImageRef};

/// Element id the capture exporter screenshots.
pub const CARD_ELEMENT_ID: &str = "poster-card";

const CARD_CSS: &str = include_str!("../static/card.css");

/// Render the full card document for one generated poster.
pub fn render_card(category: Category, content: &GeneratedContent, image: &ImageRef) -> String {
    let card = html! {
        div id=(CARD_ELEMENT_ID) {
            img id="poster-bg" src=(image.to_src()) alt=(content.theme);
            div.overlay {}
            div.content {
                span.badge { (category.icon()) " " (category.label()) }
                h1.title { (content.title) }
                p.body { (content.body) }
                div.brand { "PRERNA AI" }
            }
        }
    };
    document(&content.title, card).into_string()
}

fn document(title: &str, card: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="hi" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (CARD_CSS) }
            }
            body {
                (card)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content() -> GeneratedContent {
        GeneratedContent {
            title: "धैर्य ही कुंजी".into(),
            body: "बाजार <धैर्य> का इनाम देता है".into(),
            theme: "chart".into(),
        }
    }

    #[test]
    fn card_contains_content_and_image() {
        let doc = render_card(
            Category::Trading,
            &content(),
            &ImageRef::Remote("https://img.example/bg.jpg".into()),
        );
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("id=\"poster-card\""));
        assert!(doc.contains("धैर्य ही कुंजी"));
        assert!(doc.contains("src=\"https://img.example/bg.jpg\""));
        assert!(doc.contains("Trading"));
        assert!(doc.contains("PRERNA AI"));
    }

    #[test]
    fn card_escapes_text() {
        let doc = render_card(
            Category::Love,
            &content(),
            &ImageRef::Remote("https://img.example/bg.jpg".into()),
        );
        assert!(doc.contains("&lt;धैर्य&gt;"));
        assert!(!doc.contains("<धैर्य>"));
    }

    #[test]
    fn card_embeds_inline_image() {
        let doc = render_card(
            Category::Love,
            &content(),
            &ImageRef::Inline {
                mime_type: "image/png".into(),
                data_base64: "iVBOR".into(),
            },
        );
        assert!(doc.contains("src=\"data:image/png;base64,iVBOR\""));
    }
}
