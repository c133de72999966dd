//! WordprocessingML document model
//!
//! A `Document` is the body of `word/document.xml` split into blocks
//! (paragraphs, tables, anything else kept opaque). Runs keep their `w:rPr`
//! element untouched; only their text is editable.

use super::xml::{XmlDocument, XmlElement, XmlNode};
use crate::error::{OfferError, Result};

pub const W_BODY: &str = "w:body";
pub const W_P: &str = "w:p";
pub const W_PPR: &str = "w:pPr";
pub const W_R: &str = "w:r";
pub const W_RPR: &str = "w:rPr";
pub const W_T: &str = "w:t";
pub const W_BR: &str = "w:br";
pub const W_CR: &str = "w:cr";
pub const W_TAB: &str = "w:tab";
pub const W_TBL: &str = "w:tbl";
pub const W_TR: &str = "w:tr";
pub const W_TC: &str = "w:tc";
pub const W_SECT_PR: &str = "w:sectPr";

/// A known child or markup carried through untouched
#[derive(Debug, Clone, PartialEq)]
pub enum Item<T> {
    Node(T),
    Raw(XmlNode),
}

/// Opaque run formatting (`w:rPr`)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunFormat(Option<XmlElement>);

impl RunFormat {
    pub fn new(properties: XmlElement) -> Self {
        Self(Some(properties))
    }

    pub fn is_plain(&self) -> bool {
        self.0.is_none()
    }

    pub fn properties(&self) -> Option<&XmlElement> {
        self.0.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunContent {
    Text(String),
    Raw(XmlNode),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Run {
    attrs: Vec<(String, String)>,
    format: RunFormat,
    content: Vec<RunContent>,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let content = if text.is_empty() {
            Vec::new()
        } else {
            vec![RunContent::Text(text)]
        };
        Self {
            attrs: Vec::new(),
            format: RunFormat::default(),
            content,
        }
    }

    pub fn with_format(mut self, format: RunFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> &RunFormat {
        &self.format
    }

    /// Append non-text run content such as a `w:drawing`
    pub fn push_raw(&mut self, element: XmlElement) {
        self.content.push(RunContent::Raw(XmlNode::Element(element)));
    }

    /// Run text with `w:br`/`w:cr` read as `\n` and `w:tab` as `\t`
    pub fn text(&self) -> String {
        let mut out = String::new();
        for c in &self.content {
            match c {
                RunContent::Text(t) => out.push_str(t),
                RunContent::Raw(node) => out.extend(separator_char(node)),
            }
        }
        out
    }

    /// Replace the run's text, keeping formatting and non-text content.
    ///
    /// When `text` has the same breaks and tabs as the current text, each
    /// `w:t` between them is rewritten in place. Otherwise the text is rebuilt
    /// as `w:t` segments around the existing break elements (new ones are
    /// created as needed); other raw content keeps its place at the start or
    /// moves to the end.
    pub fn set_text(&mut self, text: &str) {
        let wanted: Vec<char> = text.chars().filter(|c| is_separator(*c)).collect();
        let current: Vec<char> = self
            .content
            .iter()
            .filter_map(|c| match c {
                RunContent::Raw(node) => separator_char(node),
                RunContent::Text(_) => None,
            })
            .collect();

        if wanted == current {
            self.fill_segments(text);
        } else {
            self.rebuild(text);
        }
    }

    fn fill_segments(&mut self, text: &str) {
        let mut segments = text.split(is_separator);
        let mut pending = segments.next();
        let mut content = Vec::with_capacity(self.content.len());

        for c in std::mem::take(&mut self.content) {
            match c {
                RunContent::Text(_) => {
                    if let Some(segment) = pending.take() {
                        content.push(RunContent::Text(segment.to_string()));
                    }
                }
                RunContent::Raw(node) if separator_char(&node).is_some() => {
                    push_segment(&mut content, pending.take());
                    content.push(RunContent::Raw(node));
                    pending = segments.next();
                }
                raw => content.push(raw),
            }
        }
        push_segment(&mut content, pending.take());
        self.content = content;
    }

    fn rebuild(&mut self, text: &str) {
        let mut leading = Vec::new();
        let mut trailing = Vec::new();
        let mut breaks = Vec::new();
        let mut tabs = Vec::new();
        let mut seen_text = false;

        for c in std::mem::take(&mut self.content) {
            match c {
                RunContent::Text(_) => seen_text = true,
                RunContent::Raw(node) => match separator_char(&node) {
                    Some('\t') => {
                        seen_text = true;
                        tabs.push(node);
                    }
                    Some(_) => {
                        seen_text = true;
                        breaks.push(node);
                    }
                    None if seen_text => trailing.push(RunContent::Raw(node)),
                    None => leading.push(RunContent::Raw(node)),
                },
            }
        }
        breaks.reverse();
        tabs.reverse();

        let mut content = leading;
        let mut segment = String::new();
        for ch in text.chars() {
            if !is_separator(ch) {
                segment.push(ch);
                continue;
            }
            if !segment.is_empty() {
                content.push(RunContent::Text(std::mem::take(&mut segment)));
            }
            let node = if ch == '\t' {
                tabs.pop().unwrap_or_else(|| XmlNode::Element(XmlElement::new(W_TAB)))
            } else {
                breaks.pop().unwrap_or_else(|| XmlNode::Element(XmlElement::new(W_BR)))
            };
            content.push(RunContent::Raw(node));
        }
        if !segment.is_empty() {
            content.push(RunContent::Text(segment));
        }
        content.extend(trailing);
        self.content = content;
    }

    fn from_element(element: XmlElement) -> Self {
        let mut format = RunFormat::default();
        let mut content = Vec::new();

        for child in element.children {
            match child {
                XmlNode::Element(e) if e.name == W_RPR && format.is_plain() => {
                    format = RunFormat::new(e);
                }
                XmlNode::Element(e) if e.name == W_T => content.push(RunContent::Text(e.text_content())),
                other => content.push(RunContent::Raw(other)),
            }
        }

        Self {
            attrs: element.attrs,
            format,
            content,
        }
    }

    fn into_element(self) -> XmlElement {
        let mut element = XmlElement::new(W_R);
        element.attrs = self.attrs;

        if let RunFormat(Some(properties)) = self.format {
            element.children.push(XmlNode::Element(properties));
        }

        for c in self.content {
            match c {
                RunContent::Text(text) => element.children.push(XmlNode::Element(text_element(text))),
                RunContent::Raw(node) => element.children.push(node),
            }
        }
        element
    }
}

fn is_separator(c: char) -> bool {
    c == '\n' || c == '\t'
}

/// The character a break or tab element stands for in run text
fn separator_char(node: &XmlNode) -> Option<char> {
    match node {
        XmlNode::Element(e) if e.name == W_BR || e.name == W_CR => Some('\n'),
        XmlNode::Element(e) if e.name == W_TAB => Some('\t'),
        _ => None,
    }
}

fn push_segment(content: &mut Vec<RunContent>, segment: Option<&str>) {
    if let Some(segment) = segment.filter(|s| !s.is_empty()) {
        content.push(RunContent::Text(segment.to_string()));
    }
}

fn text_element(text: String) -> XmlElement {
    let mut t = XmlElement::new(W_T);
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        t.set_attr("xml:space", "preserve");
    }
    if !text.is_empty() {
        t.children.push(XmlNode::Text(text));
    }
    t
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    attrs: Vec<(String, String)>,
    pub content: Vec<Item<Run>>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paragraph with a single unformatted run
    pub fn from_text(text: &str) -> Self {
        let mut paragraph = Self::new();
        paragraph.push_run(Run::new(text));
        paragraph
    }

    pub fn push_run(&mut self, run: Run) {
        self.content.push(Item::Node(run));
    }

    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.content.iter().filter_map(|item| match item {
            Item::Node(run) => Some(run),
            Item::Raw(_) => None,
        })
    }

    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.content.iter_mut().filter_map(|item| match item {
            Item::Node(run) => Some(run),
            Item::Raw(_) => None,
        })
    }

    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        self.runs().map(Run::text).collect()
    }

    /// Write `text` into the first run and clear every other run.
    /// Formatting of the first run is kept; that of the others is effectively lost.
    pub fn set_text(&mut self, text: &str) {
        {
            let mut runs = self.runs_mut();
            if let Some(first) = runs.next() {
                first.set_text(text);
                runs.for_each(|run| run.set_text(""));
                return;
            }
        }

        if !text.is_empty() {
            self.push_run(Run::new(text));
        }
    }

    fn from_element(element: XmlElement) -> Self {
        let content = element
            .children
            .into_iter()
            .map(|child| match child {
                XmlNode::Element(e) if e.name == W_R => Item::Node(Run::from_element(e)),
                other => Item::Raw(other),
            })
            .collect();

        Self {
            attrs: element.attrs,
            content,
        }
    }

    fn into_element(self) -> XmlElement {
        let mut element = XmlElement::new(W_P);
        element.attrs = self.attrs;
        element.children = self
            .content
            .into_iter()
            .map(|item| match item {
                Item::Node(run) => XmlNode::Element(run.into_element()),
                Item::Raw(node) => node,
            })
            .collect();
        element
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    Raw(XmlNode),
}

impl Block {
    fn from_node(node: XmlNode) -> Self {
        match node {
            XmlNode::Element(e) if e.name == W_P => Block::Paragraph(Paragraph::from_element(e)),
            XmlNode::Element(e) if e.name == W_TBL => Block::Table(Table::from_element(e)),
            other => Block::Raw(other),
        }
    }

    fn into_node(self) -> XmlNode {
        match self {
            Block::Paragraph(p) => XmlNode::Element(p.into_element()),
            Block::Table(t) => XmlNode::Element(t.into_element()),
            Block::Raw(node) => node,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    attrs: Vec<(String, String)>,
    pub blocks: Vec<Block>,
}

impl Cell {
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Paragraph texts joined by newlines
    pub fn text(&self) -> String {
        self.paragraphs()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace the cell's content with `text` in its first paragraph.
    /// Further paragraphs and nested tables are removed; cell properties stay.
    pub fn set_text(&mut self, text: &str) {
        let mut seen_paragraph = false;
        self.blocks.retain_mut(|block| match block {
            Block::Paragraph(p) if !seen_paragraph => {
                p.set_text(text);
                seen_paragraph = true;
                true
            }
            Block::Paragraph(_) | Block::Table(_) => false,
            Block::Raw(_) => true,
        });

        if !seen_paragraph {
            self.blocks.push(Block::Paragraph(Paragraph::from_text(text)));
        }
    }

    fn from_element(element: XmlElement) -> Self {
        Self {
            attrs: element.attrs,
            blocks: element.children.into_iter().map(Block::from_node).collect(),
        }
    }

    fn into_element(self) -> XmlElement {
        let mut element = XmlElement::new(W_TC);
        element.attrs = self.attrs;
        element.children = self.blocks.into_iter().map(Block::into_node).collect();
        element
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    attrs: Vec<(String, String)>,
    pub content: Vec<Item<Cell>>,
}

impl Row {
    pub fn cells(&self) -> Vec<&Cell> {
        self.content
            .iter()
            .filter_map(|item| match item {
                Item::Node(cell) => Some(cell),
                Item::Raw(_) => None,
            })
            .collect()
    }

    pub fn cells_mut(&mut self) -> Vec<&mut Cell> {
        self.content
            .iter_mut()
            .filter_map(|item| match item {
                Item::Node(cell) => Some(cell),
                Item::Raw(_) => None,
            })
            .collect()
    }

    fn from_element(element: XmlElement) -> Self {
        let content = element
            .children
            .into_iter()
            .map(|child| match child {
                XmlNode::Element(e) if e.name == W_TC => Item::Node(Cell::from_element(e)),
                other => Item::Raw(other),
            })
            .collect();
        Self {
            attrs: element.attrs,
            content,
        }
    }

    fn into_element(self) -> XmlElement {
        let mut element = XmlElement::new(W_TR);
        element.attrs = self.attrs;
        element.children = self
            .content
            .into_iter()
            .map(|item| match item {
                Item::Node(cell) => XmlNode::Element(cell.into_element()),
                Item::Raw(node) => node,
            })
            .collect();
        element
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    attrs: Vec<(String, String)>,
    pub content: Vec<Item<Row>>,
}

impl Table {
    pub fn rows(&self) -> Vec<&Row> {
        self.content
            .iter()
            .filter_map(|item| match item {
                Item::Node(row) => Some(row),
                Item::Raw(_) => None,
            })
            .collect()
    }

    pub fn rows_mut(&mut self) -> Vec<&mut Row> {
        self.content
            .iter_mut()
            .filter_map(|item| match item {
                Item::Node(row) => Some(row),
                Item::Raw(_) => None,
            })
            .collect()
    }

    fn from_element(element: XmlElement) -> Self {
        let content = element
            .children
            .into_iter()
            .map(|child| match child {
                XmlNode::Element(e) if e.name == W_TR => Item::Node(Row::from_element(e)),
                other => Item::Raw(other),
            })
            .collect();
        Self {
            attrs: element.attrs,
            content,
        }
    }

    fn into_element(self) -> XmlElement {
        let mut element = XmlElement::new(W_TBL);
        element.attrs = self.attrs;
        element.children = self
            .content
            .into_iter()
            .map(|item| match item {
                Item::Node(row) => XmlNode::Element(row.into_element()),
                Item::Raw(node) => node,
            })
            .collect();
        element
    }
}

/// Visit every paragraph in `blocks`, descending into table cells
pub fn visit_paragraphs_mut<F: FnMut(&mut Paragraph)>(blocks: &mut [Block], f: &mut F) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => f(p),
            Block::Table(table) => {
                for row in table.rows_mut() {
                    for cell in row.cells_mut() {
                        visit_paragraphs_mut(&mut cell.blocks, f);
                    }
                }
            }
            Block::Raw(_) => {}
        }
    }
}

fn visit_paragraphs<F: FnMut(&Paragraph)>(blocks: &[Block], f: &mut F) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => f(p),
            Block::Table(table) => {
                for row in table.rows() {
                    for cell in row.cells() {
                        visit_paragraphs(&cell.blocks, f);
                    }
                }
            }
            Block::Raw(_) => {}
        }
    }
}

/// The body of `word/document.xml`
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    part: XmlDocument,
    body_index: usize,
    body_attrs: Vec<(String, String)>,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut part = XmlDocument::parse(xml)?;

        let body_index = part
            .root
            .children
            .iter()
            .position(|n| matches!(n, XmlNode::Element(e) if e.name == W_BODY))
            .ok_or_else(|| OfferError::Document("document part has no w:body".to_string()))?;

        let body = match std::mem::replace(
            &mut part.root.children[body_index],
            XmlNode::Text(String::new()),
        ) {
            XmlNode::Element(body) => body,
            _ => unreachable!("position matched an element"),
        };

        Ok(Self {
            part,
            body_index,
            body_attrs: body.attrs,
            blocks: body.children.into_iter().map(Block::from_node).collect(),
        })
    }

    pub fn to_xml(&self) -> String {
        let mut body = XmlElement::new(W_BODY);
        body.attrs = self.body_attrs.clone();
        body.children = self.blocks.iter().cloned().map(Block::into_node).collect();

        let mut part = self.part.clone();
        part.root.children[self.body_index] = XmlNode::Element(body);
        part.to_xml()
    }

    /// Top-level paragraphs (not inside tables)
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Top-level tables in document order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn table_mut(&mut self, index: usize) -> Option<&mut Table> {
        self.blocks
            .iter_mut()
            .filter_map(|b| match b {
                Block::Table(t) => Some(t),
                _ => None,
            })
            .nth(index)
    }

    pub fn for_each_paragraph_mut<F: FnMut(&mut Paragraph)>(&mut self, mut f: F) {
        visit_paragraphs_mut(&mut self.blocks, &mut f);
    }

    /// Text of every paragraph, tables included, one per line
    pub fn full_text(&self) -> String {
        let mut lines = Vec::new();
        visit_paragraphs(&self.blocks, &mut |p: &Paragraph| lines.push(p.text()));
        lines.join("\n")
    }

    /// Block index of the first top-level paragraph matching `predicate`
    pub fn find_paragraph<P: Fn(&Paragraph) -> bool>(&self, predicate: P) -> Option<usize> {
        self.blocks
            .iter()
            .position(|b| matches!(b, Block::Paragraph(p) if predicate(p)))
    }

    pub fn insert_blocks_after(&mut self, index: usize, blocks: Vec<Block>) {
        let at = (index + 1).min(self.blocks.len());
        self.blocks.splice(at..at, blocks);
    }

    /// Append at the end of the body, ahead of the trailing section properties
    pub fn append_blocks(&mut self, blocks: Vec<Block>) {
        let at = match self.blocks.last() {
            Some(Block::Raw(XmlNode::Element(e))) if e.name == W_SECT_PR => self.blocks.len() - 1,
            _ => self.blocks.len(),
        };
        self.blocks.splice(at..at, blocks);
    }
}
