use crate::dom::Document;
use crate::dom::node::NodeId;

#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("failed to parse document markup: {0}")]
    Parse(#[from] roxmltree::Error),
}

impl Document {
    /// Build a mutable document from XHTML source.
    ///
    /// The conversion pipeline emits well-formed XHTML, so the stricter XML
    /// parse is sufficient here. Comments and processing instructions are
    /// dropped; they carry no anchorable text.
    pub fn parse_xhtml(source: &str) -> Result<Self, DomError> {
        let parsed = roxmltree::Document::parse(source)?;
        let src_root = parsed.root_element();

        let mut doc = Document::new(src_root.tag_name().name());
        let root = doc.root();
        copy_attrs(&mut doc, root, &src_root);
        for child in src_root.children() {
            convert_node(&mut doc, root, &child);
        }
        Ok(doc)
    }
}

fn convert_node(doc: &mut Document, parent: NodeId, node: &roxmltree::Node) {
    match node.node_type() {
        roxmltree::NodeType::Element => {
            let element = doc.create_element(node.tag_name().name());
            copy_attrs(doc, element, node);
            doc.append_child(parent, element);
            for child in node.children() {
                convert_node(doc, element, &child);
            }
        }
        roxmltree::NodeType::Text => {
            if let Some(text) = node.text() {
                let text_node = doc.create_text(text);
                doc.append_child(parent, text_node);
            }
        }
        roxmltree::NodeType::Root | roxmltree::NodeType::Comment | roxmltree::NodeType::PI => {}
    }
}

fn copy_attrs(doc: &mut Document, element: NodeId, node: &roxmltree::Node) {
    for attr in node.attributes() {
        doc.set_attr(element, attr.name(), attr.value());
    }
}
