//! HTML fragments for the non-streamed study content.

use itertools::Itertools;

use crate::markdown::escape_html;
use crate::model::{Flashcard, MindMapNode, PyqYear, Pyqs, Resources};

const MIND_MAP_INDENT_PX: usize = 20;

pub fn placeholder(message: &str) -> String {
    format!("<p class=\"placeholder\">{}</p>", escape_html(message))
}

pub fn render_flashcards(cards: &[Flashcard]) -> String {
    cards
        .iter()
        .enumerate()
        .map(|(index, card)| {
            format!(
                "<div class=\"flashcard\" data-index=\"{index}\">\
                 <div class=\"flashcard-question\">Q: {}</div>\
                 <div class=\"flashcard-answer\" id=\"answer-{index}\">A: {}</div>\
                 </div>",
                escape_html(&card.question),
                escape_html(&card.answer)
            )
        })
        .join("")
}

pub fn render_mind_map(root: &MindMapNode) -> String {
    let mut html = String::new();
    render_node(root, 0, &mut html);
    html
}

fn render_node(node: &MindMapNode, level: usize, html: &mut String) {
    html.push_str(&format!(
        "<div class=\"mindmap-node\" style=\"margin-left: {}px;\"><div class=\"mindmap-topic\">{}</div>",
        level * MIND_MAP_INDENT_PX,
        escape_html(&node.topic)
    ));
    for child in &node.subtopics {
        render_node(child, level + 1, html);
    }
    html.push_str("</div>");
}

pub fn render_pyqs(pyqs: Option<&Pyqs>) -> String {
    let Some(pyqs) = pyqs.filter(|p| !p.is_empty()) else {
        return placeholder("No PYQs available");
    };

    let body = match pyqs {
        Pyqs::ByExam(groups) => groups
            .iter()
            .map(|(exam_type, years)| {
                format!(
                    "<h4>{}</h4>{}",
                    escape_html(&exam_type.to_uppercase()),
                    years.iter().map(|y| render_year(y, "h5")).join("")
                )
            })
            .join(""),
        Pyqs::Years(years) => years.iter().map(|y| render_year(y, "h4")).join(""),
    };
    format!("<div class=\"pyq-section\">{body}</div>")
}

fn render_year(year: &PyqYear, heading: &str) -> String {
    let questions = year
        .questions
        .iter()
        .map(|q| format!("<div class=\"pyq-question\">{}</div>", escape_html(q)))
        .join("");
    format!(
        "<div class=\"pyq-year\"><{heading}>Year: {}</{heading}>{questions}</div>",
        escape_html(&year.year)
    )
}

pub fn render_resources(resources: &Resources) -> (String, String) {
    let links = resources
        .links
        .iter()
        .map(|link| {
            format!(
                "<div class=\"resource-item\"><a href=\"{}\" target=\"_blank\">{}</a>\
                 <span class=\"resource-category\">{}</span></div>",
                escape_html(&link.url),
                escape_html(&link.title),
                escape_html(&link.category)
            )
        })
        .join("");
    let certifications = resources
        .certifications
        .iter()
        .map(|cert| {
            format!(
                "<div class=\"resource-item\"><strong>{}</strong><br><small>Provider: {}</small>\
                 <span class=\"resource-category\">{}</span></div>",
                escape_html(&cert.name),
                escape_html(&cert.provider),
                escape_html(&cert.category)
            )
        })
        .join("");
    (links, certifications)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_flashcards_are_escaped() {
        let html = render_flashcards(&[Flashcard {
            question: "Is <T> generic?".to_string(),
            answer: "Yes".to_string(),
        }]);
        assert!(html.contains("Q: Is &lt;T&gt; generic?"));
        assert!(html.contains("id=\"answer-0\""));
    }

    #[test]
    fn test_mind_map_nesting() {
        let map = MindMapNode {
            topic: "DBMS".to_string(),
            subtopics: vec![MindMapNode {
                topic: "Normalization".to_string(),
                subtopics: vec![MindMapNode {
                    topic: "3NF".to_string(),
                    subtopics: vec![],
                }],
            }],
        };
        let html = render_mind_map(&map);
        assert!(html.contains("margin-left: 0px;\"><div class=\"mindmap-topic\">DBMS"));
        assert!(html.contains("margin-left: 40px;\"><div class=\"mindmap-topic\">3NF"));
        assert_eq!(html.matches("<div").count(), html.matches("</div>").count());
    }

    #[test]
    fn test_pyqs_grouped_and_empty() {
        assert_eq!(render_pyqs(None), placeholder("No PYQs available"));
        assert_eq!(
            render_pyqs(Some(&Pyqs::ByExam(BTreeMap::new()))),
            placeholder("No PYQs available")
        );

        let pyqs = Pyqs::ByExam(BTreeMap::from([(
            "internal1".to_string(),
            vec![PyqYear {
                year: "2024".to_string(),
                questions: vec!["Explain paging.".to_string()],
            }],
        )]));
        let html = render_pyqs(Some(&pyqs));
        assert!(html.starts_with("<div class=\"pyq-section\"><h4>INTERNAL1</h4>"));
        assert!(html.contains("<h5>Year: 2024</h5><div class=\"pyq-question\">Explain paging.</div>"));
    }
}
