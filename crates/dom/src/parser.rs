//! Markup Parser - XML text to element arena
//!
//! Events come from `quick_xml`'s namespace-aware reader and are folded into
//! the ElementTree view of a document: elements, attributes, text and tail.
//! Comments and processing instructions are skipped. General entities
//! declared in the DOCTYPE internal subset are expanded.
//!
//! Every namespaced element or attribute name is stored in Clark notation
//! (`{uri}local`). The `xmlns` attributes themselves are not kept.

use std::borrow::Cow;

use ahash::AHashMap;
use quick_xml::escape::{resolve_predefined_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::service::DomServiceConfig;
use crate::types::NodeId;
use crate::utils::{self, XML_NAMESPACE};

/// Markup parser over one input string
pub struct MarkupParser<'a> {
    input: Cow<'a, str>,
    keep_whitespace_text: bool,
    max_depth: usize,
    /// Internal-subset general entities, already expanded
    entities: AHashMap<String, String>,
}

impl<'a> MarkupParser<'a> {
    pub fn new(input: &'a str, config: &DomServiceConfig) -> Self {
        let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
        // Line-end normalization
        let input = if input.contains('\r') {
            Cow::Owned(input.replace("\r\n", "\n").replace('\r', "\n"))
        } else {
            Cow::Borrowed(input)
        };

        Self {
            input,
            keep_whitespace_text: config.keep_whitespace_text,
            max_depth: config.max_depth,
            entities: AHashMap::new(),
        }
    }

    /// Parse the whole document into `arena`, returning the document element
    pub fn parse_into(mut self, arena: &mut DomArena) -> Result<NodeId> {
        let input = std::mem::take(&mut self.input);
        let mut reader = NsReader::from_str(&input);
        let config = reader.config_mut();
        config.trim_text(false);
        config.expand_empty_elements = false;
        config.check_end_names = true;
        config.check_comments = true;

        let mut stack: Vec<NodeId> = Vec::new();
        let mut root: Option<NodeId> = None;

        loop {
            let offset = reader.buffer_position();
            let fail = |message: String| parse_error(&input, offset, message);

            let (namespace, event) = match reader.read_resolved_event() {
                Ok(resolved) => resolved,
                Err(e) => {
                    return Err(parse_error(
                        &input,
                        reader.error_position(),
                        format!("malformed markup: {}", e),
                    ))
                }
            };
            let namespace = namespace_uri(namespace).map_err(&fail)?;

            match event {
                Event::Start(start) | Event::Empty(start)
                    if stack.is_empty() && root.is_some() =>
                {
                    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                    return Err(fail(format!("content after root element <{}>", name)));
                }
                Event::Start(start) => {
                    let node_id = self
                        .open_element(arena, &reader, namespace, &start, stack.len() + 1)
                        .map_err(|e| e.or_position(&fail))?;
                    attach(arena, &stack, &mut root, node_id)?;
                    stack.push(node_id);
                }
                Event::Empty(start) => {
                    let node_id = self
                        .open_element(arena, &reader, namespace, &start, stack.len() + 1)
                        .map_err(|e| e.or_position(&fail))?;
                    attach(arena, &stack, &mut root, node_id)?;
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(text) => {
                    let raw = utf8(&text).map_err(&fail)?;
                    if raw.contains("]]>") {
                        return Err(fail("']]>' is not allowed in character data".to_string()));
                    }
                    let decoded = self.expand(raw).map_err(&fail)?;
                    match stack.last() {
                        Some(&parent_id) => push_text(arena, parent_id, &decoded)?,
                        None if decoded.trim().is_empty() => {}
                        None if root.is_some() => {
                            return Err(fail("content after root element".to_string()))
                        }
                        None => return Err(fail("text before root element".to_string())),
                    }
                }
                Event::CData(cdata) => {
                    let text = utf8(&cdata).map_err(&fail)?;
                    check_chars(text).map_err(&fail)?;
                    match stack.last() {
                        Some(&parent_id) => push_text(arena, parent_id, text)?,
                        None => return Err(fail("CDATA section outside the root element".to_string())),
                    }
                }
                Event::DocType(doctype) => {
                    if root.is_some() {
                        return Err(fail("DOCTYPE after the root element".to_string()));
                    }
                    let body = utf8(&doctype).map_err(&fail)?;
                    self.declare_entities(body).map_err(&fail)?;
                }
                Event::Decl(_) | Event::PI(_) | Event::Comment(_) => {}
                Event::Eof => break,
            }
        }

        if let Some(&open_id) = stack.last() {
            let open = arena.get(open_id)?.tag.clone();
            return Err(parse_error(
                &input,
                reader.buffer_position(),
                format!("unexpected end of input inside <{}>", open),
            ));
        }
        let root = root.ok_or_else(|| parse_error(&input, 0usize, "missing root element".to_string()))?;

        if !self.keep_whitespace_text {
            drop_whitespace_runs(arena, root)?;
        }

        tracing::debug!(
            "Parsed markup into {} elements ({} declared entities)",
            arena.len(),
            self.entities.len()
        );
        Ok(root)
    }

    /// Create the element for a start (or empty-element) tag
    fn open_element(
        &self,
        arena: &mut DomArena,
        reader: &NsReader<&[u8]>,
        namespace: Option<String>,
        start: &BytesStart<'_>,
        depth: usize,
    ) -> std::result::Result<NodeId, TagError> {
        if depth > self.max_depth {
            return Err(TagError::Dom(DomError::MaxDepthExceeded {
                current: depth,
                max: self.max_depth,
            }));
        }

        let local = utf8(start.local_name().into_inner())?;
        check_name(local)?;
        let tag = utils::clark_name(namespace.as_deref(), local);

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| format!("malformed attribute: {}", e))?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }

            let (resolved, local) = reader.resolve_attribute(attr.key);
            let uri = match namespace_uri(resolved) {
                Err(_) if attr.key.as_ref().starts_with(b"xml:") => {
                    Some(XML_NAMESPACE.to_string())
                }
                uri => uri?,
            };
            let local = utf8(local.into_inner())?;
            check_name(local)?;

            // Literal whitespace in attribute values reads as a space
            let raw = utf8(&attr.value)?.replace(['\t', '\n'], " ");
            let value = self.expand(&raw)?;
            attributes.push((utils::clark_name(uri.as_deref(), local), value));
        }

        Ok(arena.make_node(tag, attributes))
    }

    /// Replace entity and character references, then check the result is XML text
    fn expand(&self, raw: &str) -> std::result::Result<String, String> {
        let decoded = unescape_with(raw, |name| resolve_entity(name, &self.entities))
            .map_err(|e| format!("invalid reference: {}", e))?;
        check_chars(&decoded)?;
        Ok(decoded.into_owned())
    }

    /// Record the `<!ENTITY name "value">` declarations of an internal subset
    ///
    /// Parameter entities and external (SYSTEM/PUBLIC) entities are ignored.
    /// The first declaration of a name wins.
    fn declare_entities(&mut self, doctype: &str) -> std::result::Result<(), String> {
        let mut rest = doctype;
        while let Some(found) = rest.find("<!ENTITY") {
            let decl = rest[found + "<!ENTITY".len()..].trim_start();
            rest = decl;
            if decl.starts_with('%') {
                continue;
            }

            let name_end = decl
                .find(|c: char| c.is_whitespace())
                .ok_or_else(|| "unterminated entity declaration".to_string())?;
            let name = &decl[..name_end];
            check_name(name)?;

            let body = decl[name_end..].trim_start();
            let Some(quote) = body.chars().next().filter(|&c| c == '"' || c == '\'') else {
                continue;
            };
            let body = &body[1..];
            let end = body
                .find(quote)
                .ok_or_else(|| format!("unterminated value for entity '{}'", name))?;

            let value = self.expand(&body[..end])?;
            self.entities.entry(name.to_string()).or_insert(value);
            rest = &body[end + 1..];
        }
        Ok(())
    }
}

/// Failure while building one element
enum TagError {
    Dom(DomError),
    Message(String),
}

impl TagError {
    fn or_position(self, fail: impl Fn(String) -> DomError) -> DomError {
        match self {
            TagError::Dom(e) => e,
            TagError::Message(message) => fail(message),
        }
    }
}

impl From<String> for TagError {
    fn from(message: String) -> Self {
        TagError::Message(message)
    }
}

fn attach(
    arena: &mut DomArena,
    stack: &[NodeId],
    root: &mut Option<NodeId>,
    node_id: NodeId,
) -> Result<()> {
    match stack.last() {
        Some(&parent_id) => arena.append(parent_id, node_id),
        None => {
            *root = Some(node_id);
            Ok(())
        }
    }
}

fn namespace_uri(resolved: ResolveResult<'_>) -> std::result::Result<Option<String>, String> {
    match resolved {
        ResolveResult::Bound(namespace) => Ok(Some(utf8(namespace.as_ref())?.to_string())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(format!(
            "undeclared namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        )),
    }
}

fn resolve_entity<'e>(name: &str, entities: &'e AHashMap<String, String>) -> Option<&'e str> {
    resolve_predefined_entity(name).or_else(|| entities.get(name).map(String::as_str))
}

fn utf8(bytes: &[u8]) -> std::result::Result<&str, String> {
    std::str::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {}", e))
}

fn check_name(name: &str) -> std::result::Result<(), String> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(utils::is_name_start_char) && chars.all(utils::is_name_char);
    if valid {
        Ok(())
    } else {
        Err(format!("invalid name '{}'", name))
    }
}

fn check_chars(text: &str) -> std::result::Result<(), String> {
    match text.chars().find(|&c| !utils::is_xml_char(c)) {
        Some(c) => Err(format!("character U+{:04X} is not allowed", c as u32)),
        None => Ok(()),
    }
}

/// Parse error with the line and column of byte `offset`
fn parse_error<O: TryInto<usize>>(input: &str, offset: O, message: String) -> DomError {
    let offset = offset.try_into().unwrap_or(usize::MAX).min(input.len());
    let consumed = &input.as_bytes()[..offset];
    let line = consumed.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = consumed.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
    let column = String::from_utf8_lossy(&consumed[line_start..]).chars().count() + 1;
    DomError::Parse {
        line,
        column,
        message,
    }
}

/// Add character data to `parent`: its text before any child, else the last child's tail
fn push_text(arena: &mut DomArena, parent_id: NodeId, text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    let last_child = arena.children(parent_id)?.last().copied();
    let slot = match last_child {
        Some(last_child) => &mut arena.get_mut(last_child)?.tail,
        None => &mut arena.get_mut(parent_id)?.text,
    };
    match slot {
        Some(existing) => existing.push_str(text),
        None => *slot = Some(text.to_string()),
    }
    Ok(())
}

fn drop_whitespace_runs(arena: &mut DomArena, root: NodeId) -> Result<()> {
    let mut ids = Vec::new();
    arena.traverse_df(root, |node| {
        ids.push(node.node_id);
        Ok(())
    })?;

    let is_blank = |run: &Option<String>| run.as_deref().is_some_and(|s| s.trim().is_empty());
    for id in ids {
        let node = arena.get_mut(id)?;
        if is_blank(&node.text) {
            node.text = None;
        }
        if is_blank(&node.tail) {
            node.tail = None;
        }
    }
    Ok(())
}
