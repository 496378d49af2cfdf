//! Run merging for fragmented placeholders
//!
//! Editors split paragraph text into runs on every formatting or
//! revision boundary, so an alias like `${Main.qty}` routinely arrives
//! as three or more fragments. The merger slides a window over the
//! text fragments of a paragraph's direct runs and, whenever the
//! accumulated window text matches the target pattern, collapses the
//! window into its first fragment. The merged text takes the first
//! fragment's run formatting.

use regex::Regex;

use crate::document::{Paragraph, ParagraphChild, RunChild, TextFragment};

/// Merges text fragments until every pattern match lies in one fragment
pub struct TextMerger<'a> {
    pattern: &'a Regex,
    /// First two literal characters of the pattern, e.g. "${" or "##"
    trigger: String,
}

impl<'a> TextMerger<'a> {
    /// Create a merger for the given pattern. The window opens on the
    /// first fragment containing the pattern's leading two literal
    /// characters.
    pub fn new(pattern: &'a Regex) -> Self {
        let literal: String = pattern.as_str().replace('\\', "");
        let trigger = literal.chars().take(2).collect();
        Self { pattern, trigger }
    }

    /// Merge fragmented matches in a paragraph, returning the number
    /// of merges performed.
    pub fn merge(&self, paragraph: &mut Paragraph) -> usize {
        let positions = fragment_positions(paragraph);

        let mut merges = 0;
        let mut window_start: Option<(usize, usize)> = None;
        let mut accumulated = String::new();
        let mut pending: Vec<(usize, usize)> = Vec::new();
        let mut to_remove: Vec<(usize, usize)> = Vec::new();

        for &pos in &positions {
            let text = fragment(paragraph, pos).text.clone();
            match window_start {
                None => {
                    if text.contains(&self.trigger) {
                        window_start = Some(pos);
                        accumulated = text;
                    } else {
                        continue;
                    }
                }
                Some(_) => {
                    accumulated.push_str(&text);
                    pending.push(pos);
                }
            }

            if self.pattern.is_match(&accumulated) {
                if let Some(start) = window_start {
                    let start_fragment = fragment_mut(paragraph, start);
                    start_fragment.text = accumulated.clone();
                    start_fragment.preserve_space = true;
                    if !pending.is_empty() {
                        merges += 1;
                    }
                    to_remove.append(&mut pending);
                }
                // Text after the last complete match may open the next
                // alias; keep the window on the same fragment then.
                let remainder = self.pattern.replace_all(&accumulated, "");
                if !remainder.contains(&self.trigger) {
                    window_start = None;
                    accumulated.clear();
                }
            }
        }

        remove_fragments(paragraph, to_remove);
        merges
    }
}

/// Positions of text fragments in direct runs, in document order
fn fragment_positions(paragraph: &Paragraph) -> Vec<(usize, usize)> {
    let mut positions = Vec::new();
    for (run_idx, child) in paragraph.children.iter().enumerate() {
        if let ParagraphChild::Run(run) = child {
            for (child_idx, content) in run.content.iter().enumerate() {
                if matches!(content, RunChild::Text(_)) {
                    positions.push((run_idx, child_idx));
                }
            }
        }
    }
    positions
}

fn fragment(paragraph: &Paragraph, (run_idx, child_idx): (usize, usize)) -> &TextFragment {
    match &paragraph.children[run_idx] {
        ParagraphChild::Run(run) => match &run.content[child_idx] {
            RunChild::Text(t) => t,
            RunChild::Raw(_) => unreachable!("position points at a text fragment"),
        },
        ParagraphChild::Raw(_) => unreachable!("position points at a run"),
    }
}

fn fragment_mut(
    paragraph: &mut Paragraph,
    (run_idx, child_idx): (usize, usize),
) -> &mut TextFragment {
    match &mut paragraph.children[run_idx] {
        ParagraphChild::Run(run) => match &mut run.content[child_idx] {
            RunChild::Text(t) => t,
            RunChild::Raw(_) => unreachable!("position points at a text fragment"),
        },
        ParagraphChild::Raw(_) => unreachable!("position points at a run"),
    }
}

/// Remove absorbed fragments, per run in descending child order so
/// earlier indices stay valid
fn remove_fragments(paragraph: &mut Paragraph, mut positions: Vec<(usize, usize)>) {
    positions.sort();
    positions.reverse();
    for (run_idx, child_idx) in positions {
        if let ParagraphChild::Run(run) = &mut paragraph.children[run_idx] {
            run.content.remove(child_idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::universal_pattern;
    use crate::document::{Block, Document};

    fn paragraph_of(fragments: &[&str]) -> Paragraph {
        let runs: String = fragments
            .iter()
            .map(|t| format!("<w:r><w:t>{t}</w:t></w:r>"))
            .collect();
        let xml = format!(
            r#"<?xml version="1.0"?><w:document xmlns:w="ns"><w:body><w:p>{runs}</w:p></w:body></w:document>"#
        );
        let doc = Document::parse(xml.as_bytes()).unwrap();
        match doc.blocks.into_iter().next().unwrap() {
            Block::Paragraph(p) => p,
            _ => panic!("Expected paragraph"),
        }
    }

    fn texts(paragraph: &Paragraph) -> Vec<String> {
        paragraph.fragments().map(|f| f.text.clone()).collect()
    }

    #[test]
    fn test_merges_three_way_split() {
        let mut p = paragraph_of(&["${", "Main.qty", "}"]);
        let merger = TextMerger::new(universal_pattern());
        let merges = merger.merge(&mut p);
        assert_eq!(merges, 1);
        assert_eq!(texts(&p), vec!["${Main.qty}"]);
        assert!(p.fragments().next().unwrap().preserve_space);
    }

    #[test]
    fn test_merged_text_keeps_first_fragment_formatting() {
        let xml = r#"<?xml version="1.0"?><w:document xmlns:w="ns"><w:body><w:p>
            <w:r><w:rPr><w:b/></w:rPr><w:t>${Main</w:t></w:r>
            <w:r><w:rPr><w:i/></w:rPr><w:t>.qty}</w:t></w:r>
        </w:p></w:body></w:document>"#;
        let doc = Document::parse(xml.as_bytes()).unwrap();
        let mut p = match doc.blocks.into_iter().next().unwrap() {
            Block::Paragraph(p) => p,
            _ => panic!("Expected paragraph"),
        };
        TextMerger::new(universal_pattern()).merge(&mut p);
        let ParagraphChild::Run(first) = &p.children[0] else {
            panic!("Expected run");
        };
        assert_eq!(first.props.as_deref(), Some("<w:rPr><w:b/></w:rPr>"));
        assert_eq!(first.plain_text(), "${Main.qty}");
        // the absorbed fragment is gone, its run stays
        let ParagraphChild::Run(second) = &p.children[1] else {
            panic!("Expected run");
        };
        assert_eq!(second.plain_text(), "");
    }

    #[test]
    fn test_untriggered_text_untouched() {
        let mut p = paragraph_of(&["plain ", "text ", "here"]);
        let merges = TextMerger::new(universal_pattern()).merge(&mut p);
        assert_eq!(merges, 0);
        assert_eq!(texts(&p), vec!["plain ", "text ", "here"]);
    }

    #[test]
    fn test_whole_alias_in_one_fragment_untouched() {
        let mut p = paragraph_of(&["before ", "${qty}", " after"]);
        let merges = TextMerger::new(universal_pattern()).merge(&mut p);
        assert_eq!(merges, 0);
        assert_eq!(texts(&p), vec!["before ", "${qty}", " after"]);
    }

    #[test]
    fn test_window_reopens_after_complete_match() {
        let mut p = paragraph_of(&["${a}", " mid ${b", "}"]);
        let merges = TextMerger::new(universal_pattern()).merge(&mut p);
        assert_eq!(merges, 1);
        assert_eq!(texts(&p), vec!["${a}", " mid ${b}"]);
    }

    #[test]
    fn test_second_alias_opening_in_matched_window_kept() {
        // the fragment completing ${a} also opens ${b}
        let mut p = paragraph_of(&["${a", "} and ${b", ".x}", " tail"]);
        let merges = TextMerger::new(universal_pattern()).merge(&mut p);
        assert_eq!(merges, 2);
        assert_eq!(texts(&p), vec!["${a} and ${b.x}", " tail"]);
    }

    #[test]
    fn test_surrounding_text_absorbed_into_window() {
        let mut p = paragraph_of(&["qty: ${", "n", "} pcs"]);
        TextMerger::new(universal_pattern()).merge(&mut p);
        assert_eq!(texts(&p), vec!["qty: ${n} pcs"]);
    }
}
