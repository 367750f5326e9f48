use crate::segment::{Placeholder, ProtectedTable};

pub type InlineSeq = Vec<Inline>;

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
    /// Rendered code segments addressed by the placeholders in `blocks`.
    pub protected: ProtectedTable,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    /// Lines separated by single newlines; rendered joined by `<br/>`.
    Paragraph { lines: Vec<InlineSeq> },
    Heading { level: u8, content: InlineSeq },
    List { items: Vec<ListItem> },
    /// A fenced block that sits alone on its line.
    CodeBlock(Placeholder),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListItem {
    pub marker: ListMarker,
    pub content: InlineSeq,
}

/// The marker a list item was written with. Both kinds render as `<ul>`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ListMarker {
    Bullet(char),
    Ordered(u64),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Inline {
    Text(String),
    Strong(InlineSeq),
    Emph(InlineSeq),
    Link { url: String, children: InlineSeq },
    AutoLink { url: String },
    Code(Placeholder),
}
