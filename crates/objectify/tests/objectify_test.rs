use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use dom::{DomArena, DomError};
use objectify::{
    objectify, objectify_with, Extension, Member, MissingChildKind, ObjNode, ObjectifyConfig,
    ObjectifyError, Property, SharedTree, Value,
};

fn xml(markup: &str) -> SharedTree {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    RefCell::new(dom::parse(markup).unwrap())
}

fn markup(tree: &SharedTree) -> String {
    dom::to_string(&tree.borrow()).unwrap()
}

#[test]
fn test_subelem() {
    let tree = xml("<a><b/></a>");
    let ob = objectify(&tree).unwrap();
    assert_eq!(ob.child("b").unwrap().tag().unwrap(), "b");
}

#[test]
fn test_subsubelem() {
    let tree = xml("<a><b><c/></b></a>");
    let ob = objectify(&tree).unwrap();
    assert_eq!(ob.child("b").unwrap().child("c").unwrap().tag().unwrap(), "c");
}

#[test]
fn test_root_attr() {
    let tree = xml(r#"<a n="zzz"><b/></a>"#);
    let ob = objectify(&tree).unwrap();
    assert_eq!(ob.get("n").unwrap().as_deref(), Some("zzz"));
}

#[test]
fn test_subelem_attr() {
    let tree = xml(r#"<a><b n="zzz"/></a>"#);
    let ob = objectify(&tree).unwrap();
    let b = ob.child("b").unwrap();

    assert_eq!(b.get("n").unwrap().as_deref(), Some("zzz"));
    assert_eq!(b.get("p").unwrap(), None);
}

#[test]
fn test_subelem_missing() {
    let tree = xml("<a><b><c/></b></a>");
    let ob = objectify(&tree).unwrap();

    let err = ob.child("p").unwrap_err();
    assert!(matches!(
        err,
        ObjectifyError::MissingChild { kind: MissingChildKind::NoSuchAttribute, .. }
    ));
    // Only direct children are searched
    assert!(ob.child("c").unwrap_err().is_missing_child());
    assert!(ob.lookup("p").unwrap_err().is_missing_child());
}

#[test]
fn test_subelem_index() {
    let tree = xml(r#"<a><b n="1"/><b n="2"/></a>"#);
    let ob = objectify(&tree).unwrap();
    let b = ob.child("b").unwrap();

    assert_eq!(b.tag().unwrap(), "b");
    assert_eq!(b.at(0).unwrap().get("n").unwrap().as_deref(), Some("1"));
    assert_eq!(b.at(1).unwrap().get("n").unwrap().as_deref(), Some("2"));
}

#[test]
fn test_subelem_iter() {
    let tree = xml(r#"<a><b n="1"/><b n="2"/></a>"#);
    let ob = objectify(&tree).unwrap();

    let values: Vec<String> = ob
        .child("b")
        .unwrap()
        .iter()
        .map(|b| b.get("n").unwrap().unwrap_or_default())
        .collect();
    assert_eq!(values, vec!["1", "2"]);
}

#[test]
fn test_group_excludes_other_tags() {
    let tree = xml("<r><i>1</i><j>x</j><i>2</i></r>");
    let ob = objectify(&tree).unwrap();
    let i = ob.child("i").unwrap();

    assert_eq!(i.len().unwrap(), 2);
    assert!(i.at(1).unwrap() == "2");
    assert_eq!(ob.child("j").unwrap().len().unwrap(), 1);
}

#[test]
fn test_nodes_reached_by_index_keep_parent() {
    let tree = xml("<r><i><v>1</v></i><i><v>2</v></i></r>");
    let ob = objectify(&tree).unwrap();
    let second = ob.child("i").unwrap().at(1).unwrap();

    assert_eq!(second.parent().unwrap().elem(), ob.elem());
    assert_eq!(second.len().unwrap(), 2);
    assert!(second.child("v").unwrap() == "2");
}

#[test]
fn test_changes_visible_through_every_facade() {
    let tree = xml("<a><b>old</b></a>");
    let first = objectify(&tree).unwrap().child("b").unwrap();
    let second = objectify(&tree).unwrap().child("b").unwrap();

    first.set_text(Some("new")).unwrap();
    assert!(second == "new");

    first.set_tag("c").unwrap();
    assert_eq!(second.tag().unwrap(), "c");
    assert_eq!(markup(&tree), "<a><c>new</c></a>");
}

#[test]
fn test_group_follows_renamed_tag() {
    let tree = xml("<r><i/><j/><j/></r>");
    let ob = objectify(&tree).unwrap();
    let node = ob.child("i").unwrap();

    assert_eq!(node.len().unwrap(), 1);
    node.set_tag("j").unwrap();
    assert_eq!(node.len().unwrap(), 3);
}

#[test]
fn test_removed_node_leaves_empty_group() {
    let tree = xml("<r><i/></r>");
    let ob = objectify(&tree).unwrap();
    let node = ob.child("i").unwrap();

    ob.delete("i").unwrap();
    assert!(node.is_empty().unwrap());
    assert_eq!(node.iter().count(), 0);
    assert_eq!(node.tag().unwrap(), "i");
}

#[test]
fn test_namespaced_document() {
    let tree = xml(r#"<o:order xmlns:o="urn:orders"><o:item>1</o:item><o:item>2</o:item></o:order>"#);
    let ob = objectify(&tree).unwrap();

    let item = ob.child("item").unwrap();
    assert_eq!(item.tag().unwrap(), "{urn:orders}item");
    assert_eq!(item.len().unwrap(), 2);

    ob.assign("total", "3").unwrap();
    assert_eq!(ob.child("total").unwrap().tag().unwrap(), "{urn:orders}total");
    assert_eq!(
        markup(&tree),
        r#"<ns0:order xmlns:ns0="urn:orders"><ns0:item>1</ns0:item><ns0:item>2</ns0:item><ns0:total>3</ns0:total></ns0:order>"#
    );
}

#[test]
fn test_assignment_replaces_only_first_match() {
    let tree = xml("<r><i>1</i><i>2</i></r>");
    let ob = objectify(&tree).unwrap();

    ob.assign("i", 9.5).unwrap();
    assert_eq!(markup(&tree), "<r><i>9.5</i><i>2</i></r>");

    // The replaced element is detached but still readable
    let tree = xml("<r><i>1</i></r>");
    let ob = objectify(&tree).unwrap();
    let old = ob.child("i").unwrap();
    ob.assign("i", "new").unwrap();
    assert!(old == "1");
    assert!(ob.child("i").unwrap() == "new");
}

#[test]
fn test_assign_same_node_is_noop() {
    let tree = xml("<r><i>1</i><j/></r>");
    let ob = objectify(&tree).unwrap();
    let i = ob.child("i").unwrap();

    ob.assign("i", &i).unwrap();
    assert_eq!(markup(&tree), "<r><i>1</i><j /></r>");
}

#[test]
fn test_assign_raw_element() {
    let tree = xml("<r/>");
    let raw = {
        let mut arena = tree.borrow_mut();
        let id = arena.make_node("anything", vec![("k".to_string(), "v".to_string())]);
        arena.get_mut(id).unwrap().text = Some("t".to_string());
        id
    };
    let ob = objectify(&tree).unwrap();

    let placed = ob.set_child("x", Value::Raw(raw)).unwrap();
    assert_eq!(placed.elem(), raw);
    assert_eq!(markup(&tree), r#"<r><x k="v">t</x></r>"#);

    let err = ob.assign("y", Value::Raw(999)).unwrap_err();
    assert!(matches!(err, ObjectifyError::Dom(DomError::NodeNotFound(999))));
}

#[test]
fn test_assign_self_is_cycle() {
    let tree = xml("<r><a/></r>");
    let ob = objectify(&tree).unwrap();
    let a = ob.child("a").unwrap();

    let err = a.assign("again", &a).unwrap_err();
    assert!(matches!(err, ObjectifyError::Dom(DomError::WouldCreateCycle { .. })));
    let err = a.assign("root", &ob).unwrap_err();
    assert!(matches!(err, ObjectifyError::Dom(DomError::WouldCreateCycle { .. })));
}

#[test]
fn test_structural_members_shadow_children() {
    let tree = xml("<r><tag>child</tag><text>t</text></r>");
    let ob = objectify(&tree).unwrap();

    assert_eq!(ob.member("tag"), Member::Property(Property::Tag));
    assert_eq!(ob.lookup("tag").unwrap().as_text(), Some("r"));
    assert!(ob.lookup("text").unwrap().is_none());
    assert!(ob.child("tag").unwrap() == "child");
}

#[test]
fn test_custom_missing_child_kind_inherited() {
    let tree = xml("<a><b><c/></b></a>");
    let config = ObjectifyConfig {
        missing_child: MissingChildKind::Custom("no element".to_string()),
    };
    let ob = objectify_with(&tree, config).unwrap();
    let c = ob.child("b").unwrap().child("c").unwrap();

    let err = c.child("d").unwrap_err();
    assert_eq!(err.to_string(), "no element: d");
    assert_eq!(c.at(0).unwrap().missing_child_kind(), ob.missing_child_kind());
}

#[test]
fn test_root_and_ancestors() {
    let tree = xml("<a><b><c><d/></c></b></a>");
    let ob = objectify(&tree).unwrap();
    let d = ob.child("b").unwrap().child("c").unwrap().child("d").unwrap();

    assert_eq!(d.root().elem(), ob.elem());
    assert_eq!(d.ancestors().count(), 3);
    assert_eq!(d.ancestors().nth(1).unwrap().tag().unwrap(), "b");
    assert_eq!(d.ancestors().last().unwrap().elem(), ob.elem());
    assert!(ob.ancestors().next().is_none());
    assert_eq!(ob.root().elem(), ob.elem());
}

#[test]
fn test_construct_subtree_root() {
    let tree = xml("<a><b><c/></b></a>");
    let b_id = tree.borrow().find_child(0, "b").unwrap().unwrap();

    let b = ObjNode::construct(&tree, b_id, None, Some(MissingChildKind::NoSuchKey)).unwrap();
    assert!(b.is_root());
    assert_eq!(b.len().unwrap(), 1);
    assert_eq!(b.child("c").unwrap().parent().unwrap().elem(), b_id);
}

#[test]
fn test_structural_equality() {
    let left = xml(r#"<a x="1" y="2"><b>t</b>tail</a>"#);
    let right = xml(r#"<a y="2" x="1"><b>t</b>tail</a>"#);
    let other = xml(r#"<a x="1" y="2"><b>u</b>tail</a>"#);

    let l = objectify(&left).unwrap();
    assert_eq!(l, objectify(&right).unwrap());
    assert_ne!(l, objectify(&other).unwrap());
    assert!(l.child("b").unwrap() == String::from("t"));
    assert_eq!(l.deep_signature().unwrap(), objectify(&right).unwrap().deep_signature().unwrap());
}

#[test]
fn test_signature_serializes() {
    let tree = xml(r#"<a k="v">x<b/></a>"#);
    let ob = objectify(&tree).unwrap();

    let json = serde_json::to_value(ob.deep_signature().unwrap()).unwrap();
    assert_eq!(json["tag"], "a");
    assert_eq!(json["attributes"]["k"], "v");
    assert_eq!(json["children"][0]["tag"], "b");
    assert!(json["tail"].is_null());
}

#[test]
fn test_objectify_empty_arena() {
    let tree = RefCell::new(DomArena::new());
    assert!(matches!(
        objectify(&tree).unwrap_err(),
        ObjectifyError::Dom(DomError::NoRoot)
    ));
}

struct Counter;

impl Extension for Counter {
    fn name(&self) -> &str {
        "counter"
    }

    fn members(&self) -> &[&'static str] {
        &["count", "label"]
    }

    fn get<'t>(&self, node: &ObjNode<'t>, member: &str) -> objectify::Result<Value<'t>> {
        match member {
            "count" => Ok(Value::from(node.children()?.len())),
            _ => Ok(Value::from(node.get_or("label", "")?)),
        }
    }

    fn set<'t>(&self, node: &ObjNode<'t>, member: &str, value: Value<'t>) -> objectify::Result<()> {
        match (member, value) {
            ("label", Value::Text(text)) => node.set("label", text),
            _ => Err(ObjectifyError::ForbiddenMutation {
                member: member.to_string(),
            }),
        }
    }
}

#[test]
fn test_extension_members_shadow_children() {
    let tree = xml("<a><count>child</count><b><x/><y/></b></a>");
    let ob = ObjNode::with_extension(&tree, 0, ObjectifyConfig::default(), Rc::new(Counter)).unwrap();
    let b = ob.child("b").unwrap();

    assert_eq!(ob.member("count"), Member::Extension);
    assert_eq!(ob.lookup("count").unwrap().as_text(), Some("2"));
    assert_eq!(b.lookup("count").unwrap().as_text(), Some("2"));
    assert!(ob.child("count").unwrap() == "child");
    assert_eq!(b.extension_name(), "counter");

    b.assign("label", "bee").unwrap();
    assert_eq!(b.get("label").unwrap().as_deref(), Some("bee"));
    assert!(matches!(
        b.assign("count", 3).unwrap_err(),
        ObjectifyError::ForbiddenMutation { .. }
    ));
    assert!(matches!(
        b.delete("label").unwrap_err(),
        ObjectifyError::ForbiddenMutation { .. }
    ));
}

#[test]
fn test_set_attributes_replaces_all() {
    let tree = xml(r#"<a old="1"/>"#);
    let ob = objectify(&tree).unwrap();

    let mut attributes = BTreeMap::new();
    attributes.insert("new".to_string(), "2".to_string());
    ob.set_attributes(attributes.clone()).unwrap();

    assert_eq!(ob.attributes().unwrap(), attributes);
    assert_eq!(markup(&tree), r#"<a new="2" />"#);
}

#[test]
fn test_root_sequence_identity() {
    let tree = xml("<a><b/></a>");
    let ob = objectify(&tree).unwrap();

    assert_eq!(ob.len().unwrap(), 1);
    assert_eq!(ob.at(0).unwrap(), ob);
    assert!(matches!(
        ob.at(1).unwrap_err(),
        ObjectifyError::OutOfRange { index: 1, len: 1 }
    ));
}

#[test]
fn test_slicing_never_fails() {
    let tree = xml("<r><i/><i/><i/></r>");
    let i = objectify(&tree).unwrap().child("i").unwrap();

    assert!(i.slice(Some(3), Some(8)).unwrap().is_empty());
    assert_eq!(i.slice(Some(1), Some(8)).unwrap().len(), 2);
    assert!(i.at(3).is_err());
}

#[test]
fn test_assign_then_read_back() {
    let tree = xml("<r/>");
    let ob = objectify(&tree).unwrap();

    ob.assign("price", 12).unwrap();
    assert_eq!(ob.child("price").unwrap().text().unwrap().as_deref(), Some("12"));
    ob.assign("flag", true).unwrap();
    assert!(ob.child("flag").unwrap() == "true");
}

#[test]
fn test_replace_first_of_three() {
    let tree = xml("<r><i>1</i><i>2</i><i>3</i></r>");
    let ob = objectify(&tree).unwrap();

    ob.assign("i", "x").unwrap();
    let texts: Vec<String> = ob
        .child("i")
        .unwrap()
        .iter()
        .map(|i| i.text().unwrap().unwrap_or_default())
        .collect();
    assert_eq!(texts, vec!["x", "2", "3"]);
}

#[test]
fn test_delete_one_at_a_time() {
    let tree = xml("<r><i>1</i><j/><i>2</i><i>3</i></r>");
    let ob = objectify(&tree).unwrap();

    ob.delete("i").unwrap();
    assert!(ob.child("i").unwrap() == "2");
    ob.delete("i").unwrap();
    assert!(ob.child("i").unwrap() == "3");
    ob.delete("i").unwrap();

    let err = ob.delete("i").unwrap_err();
    assert_eq!(err.missing_name(), Some("i"));
    assert_eq!(markup(&tree), "<r><j /></r>");
}

#[test]
fn test_deep_signature_matches_reparse() {
    let source = r#"<a k="v"><b>1</b>tail<c><d x="y"/></c></a>"#;
    let tree = xml(source);
    let ob = objectify(&tree).unwrap();
    let reparsed = xml(&markup(&tree));

    assert_eq!(
        ob.deep_signature().unwrap(),
        objectify(&reparsed).unwrap().deep_signature().unwrap()
    );
    assert_eq!(
        ob.deep_signature().unwrap(),
        objectify(&xml(source)).unwrap().deep_signature().unwrap()
    );
}

#[test]
fn test_property_assignment_creates_no_child() {
    let tree = xml("<r/>");
    let ob = objectify(&tree).unwrap();

    ob.assign("text", "t").unwrap();
    ob.assign("tail", "x").unwrap();
    ob.assign("tag", "s").unwrap();
    assert!(ob.children().unwrap().is_empty());
    assert_eq!(ob.to_markup().unwrap(), "<s>t</s>");
}
