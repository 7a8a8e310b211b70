//! Dynamic member access and tree mutation by name

use dom::{utils, DomError};

use crate::error::{ObjectifyError, Result};
use crate::members::{Member, Property};
use crate::node::ObjNode;
use crate::value::Value;

impl<'t> ObjNode<'t> {
    /// Read a member by name
    pub fn lookup(&self, name: &str) -> Result<Value<'t>> {
        match self.member(name) {
            Member::Property(property) => self.property(property),
            Member::Extension => self.extension().get(self, name),
            Member::Child => self.child(name).map(Value::Node),
        }
    }

    pub fn property(&self, property: Property) -> Result<Value<'t>> {
        let value = match property {
            Property::Tag => Value::Text(self.tag()?),
            Property::Text => self.text()?.into(),
            Property::Tail => self.tail()?.into(),
            Property::Attributes => Value::Attributes(self.attributes()?),
            Property::Parent => self.parent().map(Value::Node).unwrap_or(Value::None),
            Property::Elem => Value::Raw(self.elem()),
        };
        Ok(value)
    }

    /// Write a member by name
    ///
    /// Properties pass through to the element, extension members to the
    /// extension. Any other name replaces the first matching child (or
    /// appends one) with the element built from `value`.
    pub fn assign(&self, name: &str, value: impl Into<Value<'t>>) -> Result<()> {
        let value = value.into();
        match self.member(name) {
            Member::Property(property) => self.set_property(property, value),
            Member::Extension => {
                tracing::trace!("Extension {} sets '{}'", self.extension().name(), name);
                self.extension().set(self, name, value)
            }
            Member::Child => self.set_child(name, value).map(|_| ()),
        }
    }

    fn set_property(&self, property: Property, value: Value<'t>) -> Result<()> {
        let invalid = |expected| ObjectifyError::InvalidValue {
            member: property.name().to_string(),
            expected,
        };
        match (property, value) {
            (Property::Tag, Value::Text(tag)) => self.set_tag(tag),
            (Property::Tag, _) => Err(invalid("text")),
            (Property::Text, Value::Text(text)) => self.set_text(Some(&text)),
            (Property::Text, Value::None) => self.set_text(None),
            (Property::Tail, Value::Text(tail)) => self.set_tail(Some(&tail)),
            (Property::Tail, Value::None) => self.set_tail(None),
            (Property::Text | Property::Tail, _) => Err(invalid("text or none")),
            (Property::Attributes, Value::Attributes(attributes)) => self.set_attributes(attributes),
            (Property::Attributes, _) => Err(invalid("attribute map")),
            (Property::Parent | Property::Elem, _) => Err(ObjectifyError::ForbiddenMutation {
                member: property.name().to_string(),
            }),
        }
    }

    /// Put `value` in place of the first child called `name`, or append it
    ///
    /// The element ends up tagged with the qualified `name`. An element of
    /// this tree is moved; a node over another tree is deep-copied in.
    /// Returns the facade for the element now in place.
    pub fn set_child(&self, name: &str, value: impl Into<Value<'t>>) -> Result<ObjNode<'t>> {
        let value = value.into();
        let parent_id = self.elem();
        let mut arena = self.tree().borrow_mut();
        let qualified = utils::qualify(&arena.get(parent_id)?.tag, name);

        let new_id = match value {
            Value::Raw(id) => {
                arena.get(id)?;
                id
            }
            Value::Node(node) if node.same_tree(self) => node.elem(),
            Value::Node(node) => {
                let other = node.tree().borrow();
                arena.import_subtree(&other, node.elem())?
            }
            Value::Text(text) => {
                let id = arena.make_node(qualified.clone(), Vec::new());
                arena.get_mut(id)?.text = Some(text);
                id
            }
            Value::None => arena.make_node(qualified.clone(), Vec::new()),
            Value::Attributes(_) => {
                return Err(ObjectifyError::InvalidValue {
                    member: name.to_string(),
                    expected: "node, text or none",
                })
            }
        };

        if new_id == parent_id || arena.is_ancestor(new_id, parent_id) {
            return Err(DomError::WouldCreateCycle {
                parent: parent_id,
                child: new_id,
            }
            .into());
        }

        let existing = arena.find_child(parent_id, &qualified)?;
        let element = arena.get_mut(new_id)?;
        if element.tag != qualified {
            tracing::trace!("Retagging node {} <{}> as <{}>", new_id, element.tag, qualified);
            element.tag = qualified.clone();
        }
        match existing {
            Some(existing) => {
                let index = arena.index_of(parent_id, existing)?;
                arena.replace_at(parent_id, index, new_id)?;
            }
            None => arena.append(parent_id, new_id)?,
        }
        drop(arena);

        tracing::debug!("Set child <{}> of node {} to node {}", qualified, parent_id, new_id);
        Ok(self.derive(new_id))
    }

    /// Delete a member by name
    ///
    /// Structural properties cannot be deleted. Any other name removes the
    /// first matching child.
    pub fn delete(&self, name: &str) -> Result<()> {
        match self.member(name) {
            Member::Property(property) => Err(ObjectifyError::ForbiddenMutation {
                member: property.name().to_string(),
            }),
            Member::Extension => self.extension().delete(self, name),
            Member::Child => self.delete_child(name),
        }
    }

    pub fn delete_child(&self, name: &str) -> Result<()> {
        let parent_id = self.elem();
        let mut arena = self.tree().borrow_mut();
        let qualified = utils::qualify(&arena.get(parent_id)?.tag, name);
        let Some(child_id) = arena.find_child(parent_id, &qualified)? else {
            return Err(self.missing(name));
        };
        arena.remove(parent_id, child_id)?;
        Ok(())
    }
}
