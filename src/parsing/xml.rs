//! Namespace-agnostic helpers over `roxmltree` documents.

use std::str::FromStr;

use roxmltree::{Document, Node};

use super::types::{ParseError, ParseResult, decode_text, parse_number};

pub fn parse_document(bytes: &[u8]) -> ParseResult<Document<'_>> {
    let text = decode_text(bytes)?;
    Document::parse(text)
        .map_err(|err| ParseError::malformed("content is not well-formed XML").with_cause(err))
}

pub fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}

pub fn children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |c| c.is_element() && c.tag_name().name() == name)
}

/// Follow a chain of child element names.
pub fn path<'a, 'input>(node: Node<'a, 'input>, names: &[&str]) -> Option<Node<'a, 'input>> {
    names.iter().try_fold(node, |current, name| child(current, name))
}

/// First descendant element with the given local name.
pub fn descendant<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.descendants()
        .find(|d| d.is_element() && d.tag_name().name() == name)
}

pub fn text<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.text().map(str::trim).filter(|t| !t.is_empty())
}

pub fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name).and_then(text)
}

pub fn required_child<'a, 'input>(
    node: Node<'a, 'input>,
    name: &str,
) -> ParseResult<Node<'a, 'input>> {
    child(node, name).ok_or_else(|| {
        ParseError::malformed(format!(
            "missing element <{name}> in <{}>",
            node.tag_name().name()
        ))
    })
}

pub fn required_text<'a>(node: Node<'a, '_>, name: &str) -> ParseResult<&'a str> {
    child_text(node, name).ok_or_else(|| {
        ParseError::malformed(format!(
            "missing value <{name}> in <{}>",
            node.tag_name().name()
        ))
    })
}

/// Optional numeric child. Present but unparsable values are an error.
pub fn child_number<T>(node: Node<'_, '_>, name: &str) -> ParseResult<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    child_text(node, name)
        .map(|raw| parse_number(raw, name))
        .transpose()
}

pub fn required_number<T>(node: Node<'_, '_>, name: &str) -> ParseResult<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_number(required_text(node, name)?, name)
}
