//! Editable document content (word/document.xml and footer parts)
//!
//! Body content is lifted into typed blocks (paragraphs, tables) while any
//! markup the editor does not touch is carried as opaque nodes. Blocks live
//! in a [`DocumentTree`] arena addressed by stable [`BlockId`] handles so
//! content can be spliced in after an anchor while other handles stay valid.

use crate::error::{OoxmlError, Result};
use crate::xml::{XmlDocument, XmlElement, XmlNode};

/// Block-level content
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// A paragraph (`w:p`)
    Paragraph(Paragraph),
    /// A table (`w:tbl`)
    Table(Table),
    /// Anything else at block level, kept verbatim
    Other(XmlNode),
}

/// A paragraph with its properties and inline children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    /// Attributes of the `w:p` element (rsids, paraId)
    pub attrs: Vec<(String, String)>,
    /// Paragraph properties (`w:pPr`)
    pub properties: Option<XmlElement>,
    /// Runs and other inline content in document order
    pub children: Vec<ParagraphChild>,
}

/// Inline content of a paragraph
#[derive(Debug, Clone, PartialEq)]
pub enum ParagraphChild {
    /// A text run
    Run(Run),
    /// Bookmarks, hyperlinks, content controls and the like
    Other(XmlNode),
}

/// A run of text sharing one set of run properties
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Run {
    /// Attributes of the `w:r` element
    pub attrs: Vec<(String, String)>,
    /// Run properties (`w:rPr`)
    pub properties: Option<XmlElement>,
    /// Run content in document order
    pub content: Vec<RunContent>,
}

/// Content items of a run
#[derive(Debug, Clone, PartialEq)]
pub enum RunContent {
    /// Literal text (`w:t`)
    Text(String),
    /// A tab character (`w:tab`)
    Tab,
    /// A line break (`w:br` without a type, or `w:cr`)
    Break,
    /// Drawings, field characters, page breaks and so on
    Other(XmlNode),
}

/// A table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Attributes of the `w:tbl` element
    pub attrs: Vec<(String, String)>,
    /// Rows plus table properties and grid
    pub children: Vec<TableChild>,
}

/// Children of a table
#[derive(Debug, Clone, PartialEq)]
pub enum TableChild {
    /// A row
    Row(TableRow),
    /// `w:tblPr`, `w:tblGrid` and other table-level markup
    Other(XmlNode),
}

/// A table row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRow {
    /// Attributes of the `w:tr` element
    pub attrs: Vec<(String, String)>,
    /// Cells plus row properties
    pub children: Vec<RowChild>,
}

/// Children of a table row
#[derive(Debug, Clone, PartialEq)]
pub enum RowChild {
    /// A cell
    Cell(TableCell),
    /// `w:trPr` and other row-level markup
    Other(XmlNode),
}

/// A table cell holding a nested block list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableCell {
    /// Attributes of the `w:tc` element
    pub attrs: Vec<(String, String)>,
    /// Cell content (`w:tcPr` is kept as an opaque block)
    pub blocks: Vec<Block>,
}

impl Block {
    /// Lift an XML node into a block
    pub fn from_node(node: XmlNode) -> Self {
        match node {
            XmlNode::Element(e) if e.is("p") => Block::Paragraph(Paragraph::from_element(e)),
            XmlNode::Element(e) if e.is("tbl") => Block::Table(Table::from_element(e)),
            other => Block::Other(other),
        }
    }

    /// Lower the block back to XML
    pub fn to_node(&self) -> XmlNode {
        match self {
            Block::Paragraph(p) => XmlNode::Element(p.to_element()),
            Block::Table(t) => XmlNode::Element(t.to_element()),
            Block::Other(node) => node.clone(),
        }
    }

    /// The paragraph, if this block is one
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    /// The paragraph, mutably
    pub fn as_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    /// Visit every paragraph in this block, descending into table cells
    pub fn for_each_paragraph_mut(&mut self, f: &mut dyn FnMut(&mut Paragraph)) {
        match self {
            Block::Paragraph(p) => f(p),
            Block::Table(t) => t.for_each_paragraph_mut(f),
            Block::Other(_) => {}
        }
    }
}

fn blocks_from_nodes(nodes: Vec<XmlNode>) -> Vec<Block> {
    nodes.into_iter().map(Block::from_node).collect()
}

impl Paragraph {
    /// An empty paragraph
    pub fn new() -> Self {
        Self::default()
    }

    /// A paragraph holding a single run
    pub fn with_run(run: Run) -> Self {
        Self {
            children: vec![ParagraphChild::Run(run)],
            ..Self::default()
        }
    }

    /// Parse a `w:p` element
    pub fn from_element(element: XmlElement) -> Self {
        let mut paragraph = Paragraph {
            attrs: element.attrs,
            ..Self::default()
        };
        for node in element.children {
            match node {
                XmlNode::Element(e) if e.is("pPr") => paragraph.properties = Some(e),
                XmlNode::Element(e) if e.is("r") => {
                    paragraph.children.push(ParagraphChild::Run(Run::from_element(e)))
                }
                other => paragraph.children.push(ParagraphChild::Other(other)),
            }
        }
        paragraph
    }

    /// Serialize as a `w:p` element
    pub fn to_element(&self) -> XmlElement {
        let mut element = XmlElement::new("w:p");
        element.attrs = self.attrs.clone();
        if let Some(ppr) = &self.properties {
            element.children.push(XmlNode::Element(ppr.clone()));
        }
        for child in &self.children {
            match child {
                ParagraphChild::Run(run) => element.children.push(XmlNode::Element(run.to_element())),
                ParagraphChild::Other(node) => element.children.push(node.clone()),
            }
        }
        element
    }

    /// Append a run
    pub fn push_run(&mut self, run: Run) {
        self.children.push(ParagraphChild::Run(run));
    }

    /// Direct runs of the paragraph
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.children.iter().filter_map(|c| match c {
            ParagraphChild::Run(r) => Some(r),
            _ => None,
        })
    }

    /// Direct runs of the paragraph, mutably
    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.children.iter_mut().filter_map(|c| match c {
            ParagraphChild::Run(r) => Some(r),
            _ => None,
        })
    }

    /// Concatenated text of the direct runs
    pub fn text(&self) -> String {
        self.runs().map(|r| r.text()).collect()
    }

    /// Paragraph properties, created when absent
    pub fn properties_mut(&mut self) -> &mut XmlElement {
        self.properties.get_or_insert_with(|| XmlElement::new("w:pPr"))
    }

    /// Referenced paragraph style id
    pub fn style_id(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|ppr| ppr.child("pStyle"))
            .and_then(|style| style.attr("w:val"))
    }

    /// Section properties carried by this paragraph (ends a section)
    pub fn section_properties_mut(&mut self) -> Option<&mut XmlElement> {
        self.properties.as_mut().and_then(|ppr| ppr.child_mut("sectPr"))
    }
}

impl Run {
    /// A plain run with the given text
    pub fn new(text: &str) -> Self {
        let mut run = Self::default();
        run.set_text(text);
        run
    }

    /// A run wrapping arbitrary inline markup (drawings, field characters)
    pub fn from_content(node: XmlNode) -> Self {
        Self {
            content: vec![RunContent::Other(node)],
            ..Self::default()
        }
    }

    /// Parse a `w:r` element
    pub fn from_element(element: XmlElement) -> Self {
        let mut run = Run {
            attrs: element.attrs,
            ..Self::default()
        };
        for node in element.children {
            let item = match node {
                XmlNode::Element(e) if e.is("rPr") => {
                    run.properties = Some(e);
                    continue;
                }
                XmlNode::Element(e) if e.is("t") => RunContent::Text(e.text()),
                XmlNode::Element(e) if e.is("tab") => RunContent::Tab,
                XmlNode::Element(e) if e.is("cr") => RunContent::Break,
                XmlNode::Element(e)
                    if e.is("br") && matches!(e.attr("w:type"), None | Some("textWrapping")) =>
                {
                    RunContent::Break
                }
                other => RunContent::Other(other),
            };
            run.content.push(item);
        }
        run
    }

    /// Serialize as a `w:r` element
    pub fn to_element(&self) -> XmlElement {
        let mut element = XmlElement::new("w:r");
        element.attrs = self.attrs.clone();
        if let Some(rpr) = &self.properties {
            element.children.push(XmlNode::Element(rpr.clone()));
        }
        for item in &self.content {
            let node = match item {
                RunContent::Text(text) if text.is_empty() => continue,
                RunContent::Text(text) => XmlNode::Element(
                    XmlElement::new("w:t")
                        .with_attr("xml:space", "preserve")
                        .with_text(text.clone()),
                ),
                RunContent::Tab => XmlNode::Element(XmlElement::new("w:tab")),
                RunContent::Break => XmlNode::Element(XmlElement::new("w:br")),
                RunContent::Other(node) => node.clone(),
            };
            element.children.push(node);
        }
        element
    }

    /// Visible text; tabs map to `\t` and line breaks to `\n`
    pub fn text(&self) -> String {
        let mut out = String::new();
        for item in &self.content {
            match item {
                RunContent::Text(t) => out.push_str(t),
                RunContent::Tab => out.push('\t'),
                RunContent::Break => out.push('\n'),
                RunContent::Other(_) => {}
            }
        }
        out
    }

    /// Replace the run's text, keeping its properties and non-text content.
    ///
    /// New text goes where the first text item was. `\n`, `\r` and `\r\n`
    /// become line breaks, `\t` becomes a tab.
    pub fn set_text(&mut self, text: &str) {
        let at = self
            .content
            .iter()
            .position(RunContent::is_textual)
            .unwrap_or(self.content.len());
        self.content.retain(|item| !item.is_textual());
        let items = text_to_content(text);
        self.content.splice(at..at, items);
    }

    /// Run properties, created when absent
    pub fn properties_mut(&mut self) -> &mut XmlElement {
        self.properties.get_or_insert_with(|| XmlElement::new("w:rPr"))
    }
}

impl RunContent {
    fn is_textual(&self) -> bool {
        matches!(self, RunContent::Text(_) | RunContent::Tab | RunContent::Break)
    }
}

fn text_to_content(text: &str) -> Vec<RunContent> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        let item = match ch {
            '\t' => RunContent::Tab,
            '\n' => RunContent::Break,
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                RunContent::Break
            }
            _ => {
                current.push(ch);
                continue;
            }
        };
        if !current.is_empty() {
            items.push(RunContent::Text(std::mem::take(&mut current)));
        }
        items.push(item);
    }
    if !current.is_empty() || items.is_empty() {
        items.push(RunContent::Text(current));
    }
    items
}

impl Table {
    /// Parse a `w:tbl` element
    pub fn from_element(element: XmlElement) -> Self {
        let children = element
            .children
            .into_iter()
            .map(|node| match node {
                XmlNode::Element(e) if e.is("tr") => TableChild::Row(TableRow::from_element(e)),
                other => TableChild::Other(other),
            })
            .collect();
        Table {
            attrs: element.attrs,
            children,
        }
    }

    /// Serialize as a `w:tbl` element
    pub fn to_element(&self) -> XmlElement {
        let mut element = XmlElement::new("w:tbl");
        element.attrs = self.attrs.clone();
        element.children = self
            .children
            .iter()
            .map(|child| match child {
                TableChild::Row(row) => XmlNode::Element(row.to_element()),
                TableChild::Other(node) => node.clone(),
            })
            .collect();
        element
    }

    /// Rows of the table
    pub fn rows(&self) -> impl Iterator<Item = &TableRow> {
        self.children.iter().filter_map(|c| match c {
            TableChild::Row(r) => Some(r),
            _ => None,
        })
    }

    /// Visit every paragraph in every cell, recursively
    pub fn for_each_paragraph_mut(&mut self, f: &mut dyn FnMut(&mut Paragraph)) {
        for child in &mut self.children {
            let TableChild::Row(row) = child else { continue };
            for cell in &mut row.children {
                let RowChild::Cell(cell) = cell else { continue };
                for block in &mut cell.blocks {
                    block.for_each_paragraph_mut(f);
                }
            }
        }
    }
}

impl TableRow {
    fn from_element(element: XmlElement) -> Self {
        let children = element
            .children
            .into_iter()
            .map(|node| match node {
                XmlNode::Element(e) if e.is("tc") => RowChild::Cell(TableCell {
                    attrs: e.attrs,
                    blocks: blocks_from_nodes(e.children),
                }),
                other => RowChild::Other(other),
            })
            .collect();
        TableRow {
            attrs: element.attrs,
            children,
        }
    }

    fn to_element(&self) -> XmlElement {
        let mut element = XmlElement::new("w:tr");
        element.attrs = self.attrs.clone();
        element.children = self
            .children
            .iter()
            .map(|child| match child {
                RowChild::Cell(cell) => {
                    let mut tc = XmlElement::new("w:tc");
                    tc.attrs = cell.attrs.clone();
                    tc.children = cell.blocks.iter().map(Block::to_node).collect();
                    XmlNode::Element(tc)
                }
                RowChild::Other(node) => node.clone(),
            })
            .collect();
        element
    }

    /// Cells of the row
    pub fn cells(&self) -> impl Iterator<Item = &TableCell> {
        self.children.iter().filter_map(|c| match c {
            RowChild::Cell(cell) => Some(cell),
            _ => None,
        })
    }
}

/// Stable handle to a block in a [`DocumentTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(usize);

/// Where a block came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Present in the template
    Template,
    /// Inserted while composing
    Generated,
}

#[derive(Debug, Clone)]
struct Slot {
    block: Block,
    origin: Origin,
    prev: Option<BlockId>,
    next: Option<BlockId>,
}

/// Ordered block sequence backed by an arena.
///
/// Handles never move: inserting after a block only relinks neighbours.
/// Trailing section properties of a body are held apart so appended content
/// always precedes them.
#[derive(Debug, Clone, Default)]
pub struct DocumentTree {
    slots: Vec<Slot>,
    head: Option<BlockId>,
    tail: Option<BlockId>,
    section_properties: Option<XmlElement>,
}

impl DocumentTree {
    /// Build a tree from container children; all blocks are template-originated
    pub fn from_nodes(nodes: Vec<XmlNode>) -> Self {
        let mut tree = DocumentTree::default();
        for node in nodes {
            match node {
                XmlNode::Element(e) if e.is("sectPr") => tree.section_properties = Some(e),
                other => {
                    tree.push_back(Block::from_node(other), Origin::Template);
                }
            }
        }
        tree
    }

    /// Lower the tree back to container children
    pub fn to_nodes(&self) -> Vec<XmlNode> {
        let mut nodes: Vec<XmlNode> = self.iter().map(|(_, block)| block.to_node()).collect();
        if let Some(sect) = &self.section_properties {
            nodes.push(XmlNode::Element(sect.clone()));
        }
        nodes
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the tree holds no blocks
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Handles in document order
    pub fn ids(&self) -> Vec<BlockId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Blocks in document order
    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let id = cursor?;
            let slot = &self.slots[id.0];
            cursor = slot.next;
            Some((id, &slot.block))
        })
    }

    /// Look up a block
    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.slots.get(id.0).map(|s| &s.block)
    }

    /// Look up a block mutably
    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.slots.get_mut(id.0).map(|s| &mut s.block)
    }

    /// Origin of a block
    pub fn origin(&self, id: BlockId) -> Option<Origin> {
        self.slots.get(id.0).map(|s| s.origin)
    }

    /// Append a block at the end of the body
    pub fn push_back(&mut self, block: Block, origin: Origin) -> BlockId {
        let id = BlockId(self.slots.len());
        self.slots.push(Slot {
            block,
            origin,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => self.slots[tail.0].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    /// Insert blocks, in order, directly after `after`.
    ///
    /// Returns the handle of the last inserted block, or `after` itself when
    /// `blocks` is empty, so successive calls keep appending in sequence.
    pub fn insert_after(
        &mut self,
        after: BlockId,
        blocks: Vec<Block>,
        origin: Origin,
    ) -> Result<BlockId> {
        if after.0 >= self.slots.len() {
            return Err(OoxmlError::InvalidStructure(format!(
                "unknown block handle {}",
                after.0
            )));
        }
        let mut cursor = after;
        for block in blocks {
            let id = BlockId(self.slots.len());
            let next = self.slots[cursor.0].next;
            self.slots.push(Slot {
                block,
                origin,
                prev: Some(cursor),
                next,
            });
            self.slots[cursor.0].next = Some(id);
            match next {
                Some(next) => self.slots[next.0].prev = Some(id),
                None => self.tail = Some(id),
            }
            cursor = id;
        }
        Ok(cursor)
    }

    /// Visit every paragraph, including those nested in tables
    pub fn for_each_paragraph_mut(&mut self, f: &mut dyn FnMut(&mut Paragraph)) {
        for id in self.ids() {
            self.slots[id.0].block.for_each_paragraph_mut(f);
        }
    }

    /// Trailing section properties of the body
    pub fn section_properties(&self) -> Option<&XmlElement> {
        self.section_properties.as_ref()
    }

    /// Section properties of the first section, created on the body when
    /// the document declares none
    pub fn first_section_mut(&mut self) -> &mut XmlElement {
        let carrier = self.ids().into_iter().find(|id| {
            self.slots[id.0]
                .block
                .as_paragraph()
                .and_then(|p| p.properties.as_ref())
                .is_some_and(|ppr| ppr.child("sectPr").is_some())
        });

        if let Some(id) = carrier {
            if let Some(sect) = self.slots[id.0]
                .block
                .as_paragraph_mut()
                .and_then(Paragraph::section_properties_mut)
            {
                return sect;
            }
        }
        self.section_properties
            .get_or_insert_with(|| XmlElement::new("w:sectPr"))
    }
}

/// A story part (main document or footer) with its content lifted into a tree
#[derive(Debug, Clone)]
pub struct StoryPart {
    prolog: String,
    root: XmlElement,
    /// Index of the content container within the root, `None` when the root
    /// is the container itself (headers and footers)
    body_index: Option<usize>,
    /// Editable content
    pub tree: DocumentTree,
}

impl StoryPart {
    /// Parse `word/document.xml`
    pub fn parse_document(xml: &[u8]) -> Result<Self> {
        let XmlDocument { prolog, mut root } = XmlDocument::parse(xml)?;
        let body_index = root
            .children
            .iter()
            .position(|n| matches!(n, XmlNode::Element(e) if e.is("body")))
            .ok_or_else(|| OoxmlError::InvalidStructure("document has no w:body".to_string()))?;
        let nodes = match &mut root.children[body_index] {
            XmlNode::Element(body) => std::mem::take(&mut body.children),
            _ => Vec::new(),
        };
        Ok(Self {
            prolog,
            root,
            body_index: Some(body_index),
            tree: DocumentTree::from_nodes(nodes),
        })
    }

    /// Parse a header or footer part
    pub fn parse_footer(xml: &[u8]) -> Result<Self> {
        let XmlDocument { prolog, mut root } = XmlDocument::parse(xml)?;
        let nodes = std::mem::take(&mut root.children);
        Ok(Self {
            prolog,
            root,
            body_index: None,
            tree: DocumentTree::from_nodes(nodes),
        })
    }

    /// Serialize the part
    pub fn to_xml(&self) -> String {
        let mut root = self.root.clone();
        let nodes = self.tree.to_nodes();
        match self.body_index {
            Some(index) => {
                if let Some(XmlNode::Element(body)) = root.children.get_mut(index) {
                    body.children = nodes;
                }
            }
            None => root.children = nodes,
        }
        XmlDocument {
            prolog: self.prolog.clone(),
            root,
        }
        .to_xml()
    }

    /// True when the root element declares `xmlns:<prefix>`
    pub fn declares_namespace(&self, prefix: &str) -> bool {
        let key = format!("xmlns:{prefix}");
        self.root.attrs.iter().any(|(k, _)| *k == key)
    }

    /// Highest drawing object id (`wp:docPr/@id`) used in the part
    pub fn max_drawing_id(&self) -> u32 {
        let mut max = 0;
        for node in self.tree.to_nodes() {
            if let XmlNode::Element(e) = node {
                e.for_each_element(&mut |el| {
                    if el.is("docPr") {
                        if let Some(id) = el.attr("id").and_then(|v| v.parse::<u32>().ok()) {
                            max = max.max(id);
                        }
                    }
                });
            }
        }
        max
    }
}
