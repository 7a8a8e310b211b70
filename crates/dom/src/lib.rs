//! Element tree library
//!
//! Arena-backed ElementTree model: elements with a tag, attributes, text,
//! tail and ordered children. Namespaced names use Clark notation
//! (`{uri}local`).
//!
//! ## Core Design
//!
//! ```text
//! markup / JSON → DomService → DomArena (owned) → DomSerializer → markup
//!                                   ↓
//!                             NodeId (u32)
//! ```

pub mod arena;
pub mod error;
pub mod parser;
pub mod serializer;
pub mod service;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use error::{DomError, Result};
pub use serializer::{DomSerializer, SerializerConfig};
pub use service::{DomService, DomServiceConfig};
pub use types::*;

/// Parse markup with the default configuration
pub fn parse(input: &str) -> Result<DomArena> {
    let mut service = DomService::new();
    service.parse_markup(input)?;
    Ok(service.into_arena())
}

/// Serialize the root element of an arena with the default configuration
pub fn to_string(arena: &DomArena) -> Result<String> {
    DomSerializer::new().serialize(arena)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize() {
        let arena = parse("<a><b>text</b></a>").unwrap();
        assert_eq!(arena.root().unwrap().tag, "a");
        assert_eq!(to_string(&arena).unwrap(), "<a><b>text</b></a>");
    }
}
