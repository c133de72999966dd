//! Run-preserving placeholder substitution
//!
//! A token found inside a single run only rewrites that run's text. A token
//! split across runs (Word does this when a tag was edited in place) forces
//! the paragraph to collapse: the flat text with the token replaced goes
//! into the first run and every other run is emptied, so formatting of the
//! later runs is lost for that paragraph.

use crate::docx::{Document, Paragraph};
use regex::Regex;
use std::sync::OnceLock;

/// Ordered token -> value mapping. Inserting an existing token overwrites its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceholderMap {
    entries: Vec<(String, String)>,
}

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) {
        let token = token.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(t, _)| *t == token) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((token, value)),
        }
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PlaceholderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (token, value) in iter {
            map.insert(token, value);
        }
        map
    }
}

/// Replace every token of `placeholders` in one paragraph.
/// Returns how many tokens were found.
pub fn substitute_paragraph(paragraph: &mut Paragraph, placeholders: &PlaceholderMap) -> usize {
    let mut found = 0;

    for (token, value) in placeholders.iter() {
        if token.is_empty() || !paragraph.text().contains(token) {
            continue;
        }
        found += 1;

        for run in paragraph.runs_mut() {
            let text = run.text();
            if text.contains(token) {
                run.set_text(&text.replace(token, value));
            }
        }

        let remaining = paragraph.text();
        if remaining.contains(token) {
            log::debug!("Placeholder {} spans runs; collapsing paragraph", token);
            paragraph.set_text(&remaining.replace(token, value));
        }
    }

    found
}

/// Substitute in every paragraph of the document, table cells included
pub fn substitute_document(document: &mut Document, placeholders: &PlaceholderMap) -> usize {
    let mut found = 0;
    document.for_each_paragraph_mut(|p| found += substitute_paragraph(p, placeholders));
    found
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{[^{}]+\}\}").expect("valid placeholder pattern"))
}

/// Distinct `{{...}}` tokens still present in `text`, in order of appearance
pub fn find_placeholders(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for m in placeholder_pattern().find_iter(text) {
        if !tokens.iter().any(|t| t == m.as_str()) {
            tokens.push(m.as_str().to_string());
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::model::tests::document_xml;
    use crate::docx::{Run, RunFormat};
    use crate::docx::xml::XmlElement;

    fn bold() -> RunFormat {
        RunFormat::new(XmlElement::new("w:rPr").with_child(XmlElement::new("w:b")))
    }

    fn paragraph(runs: &[&str]) -> Paragraph {
        let mut p = Paragraph::new();
        for text in runs {
            p.push_run(Run::new(*text).with_format(bold()));
        }
        p
    }

    fn run_texts(p: &Paragraph) -> Vec<String> {
        p.runs().map(Run::text).collect()
    }

    #[test]
    fn test_token_in_own_run() {
        let mut p = paragraph(&["Dear ", "{{Candidate Name}}", ","]);
        let map: PlaceholderMap = [("{{Candidate Name}}", "Jane Doe")].into_iter().collect();

        assert_eq!(substitute_paragraph(&mut p, &map), 1);
        assert_eq!(p.text(), "Dear Jane Doe,");
        assert_eq!(run_texts(&p), vec!["Dear ", "Jane Doe", ","]);
    }

    #[test]
    fn test_token_inside_single_run_keeps_run() {
        let mut p = Paragraph::new();
        p.push_run(Run::new("Salary: {{Probation Monthly Salary}}/mo").with_format(bold()));
        let map: PlaceholderMap = [("{{Probation Monthly Salary}}", "50,000")].into_iter().collect();

        substitute_paragraph(&mut p, &map);
        assert_eq!(run_texts(&p), vec!["Salary: 50,000/mo"]);
        assert_eq!(p.runs().next().unwrap().format(), &bold());
    }

    #[test]
    fn test_other_runs_untouched() {
        let mut p = Paragraph::new();
        p.push_run(Run::new("Joining on "));
        p.push_run(Run::new("{{Joining Date}}").with_format(bold()));
        p.push_run(Run::new(" sharp"));
        let before = p.clone();

        let map: PlaceholderMap = [("{{Joining Date}}", "1 May")].into_iter().collect();
        substitute_paragraph(&mut p, &map);

        let after: Vec<&Run> = p.runs().collect();
        let original: Vec<&Run> = before.runs().collect();
        assert_eq!(after[0], original[0]);
        assert_eq!(after[2], original[2]);
        assert_eq!(after[1].format(), original[1].format());
        assert_eq!(after[1].text(), "1 May");
    }

    #[test]
    fn test_token_split_across_runs_collapses_into_first() {
        let mut p = paragraph(&["Dear {{Cand", "idate Na", "me}}, welcome"]);
        let map: PlaceholderMap = [("{{Candidate Name}}", "Jane Doe")].into_iter().collect();

        substitute_paragraph(&mut p, &map);
        assert_eq!(p.text(), "Dear Jane Doe, welcome");
        assert_eq!(run_texts(&p), vec!["Dear Jane Doe, welcome", "", ""]);
    }

    #[test]
    fn test_split_token_any_split_point() {
        let original = "Start {{Job Title}} end";
        let map: PlaceholderMap = [("{{Job Title}}", "Architect")].into_iter().collect();

        for i in 1..original.len() {
            for j in i + 1..original.len() {
                let mut p = paragraph(&[&original[..i], &original[i..j], &original[j..]]);
                substitute_paragraph(&mut p, &map);
                assert_eq!(p.text(), "Start Architect end", "split at {} / {}", i, j);
            }
        }
    }

    #[test]
    fn test_repeated_token_in_run() {
        let mut p = paragraph(&["{{Job Title}} / {{Job Title}}"]);
        let map: PlaceholderMap = [("{{Job Title}}", "Designer")].into_iter().collect();
        substitute_paragraph(&mut p, &map);
        assert_eq!(p.text(), "Designer / Designer");
    }

    #[test]
    fn test_absent_token_is_noop() {
        let mut p = paragraph(&["No placeholders here"]);
        let before = p.clone();
        let map: PlaceholderMap = [("{{Candidate Name}}", "Jane"), ("{{Job Title}}", "X")]
            .into_iter()
            .collect();

        assert_eq!(substitute_paragraph(&mut p, &map), 0);
        assert_eq!(p, before);
    }

    #[test]
    fn test_last_write_wins() {
        let mut map = PlaceholderMap::new();
        map.insert("{{Acceptance Date}}", "x");
        map.insert("{{Acceptance Date}}", "");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("{{Acceptance Date}}"), Some(""));
    }

    #[test]
    fn test_document_tables_are_substituted_per_cell() {
        let xml = document_xml(concat!(
            r#"<w:p><w:r><w:t>Dear {{Candidate Name}},</w:t></w:r></w:p>"#,
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>{{Candidate</w:t></w:r></w:p></w:tc>"#,
            r#"<w:tc><w:p><w:r><w:t> Name}}</w:t></w:r></w:p></w:tc></w:tr>"#,
            r#"<w:tr><w:tc><w:p><w:r><w:t>Role: {{Job Title}}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        ));
        let mut doc = Document::from_xml(&xml).unwrap();
        let map: PlaceholderMap = [("{{Candidate Name}}", "Jane"), ("{{Job Title}}", "Architect")]
            .into_iter()
            .collect();

        substitute_document(&mut doc, &map);
        // no cross-cell replacement
        assert_eq!(doc.full_text(), "Dear Jane,\n{{Candidate\n Name}}\nRole: Architect");
    }

    #[test]
    fn test_find_placeholders() {
        let found = find_placeholders("{{A}} and {{B C}} and {{A}} but not {single}");
        assert_eq!(found, vec!["{{A}}".to_string(), "{{B C}}".to_string()]);
        assert!(find_placeholders("plain").is_empty());
    }
}
