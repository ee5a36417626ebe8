use std::{cell::Cell, rc::Rc};
use vnode_dom::{
	diff::{check_depth, materialize, reconcile, sync_props},
	memory::{MemoryDom, Mutation},
	props, Element, Error, Handler, PropValue, Props, VNode,
};


const DEPTH_LIMIT: usize = 64;

fn counter() -> (Rc<Cell<u32>>, Handler) {
	let count = Rc::new(Cell::new(0));
	let handler = Handler::new({
		let count = Rc::clone(&count);
		move |_| count.set(count.get() + 1)
	});
	(count, handler)
}

fn element(vnode: &VNode) -> &Element {
	vnode.as_element().expect("element VNode")
}

fn with_props(name: &str, props: &Props) -> VNode {
	VNode::Element(Element {
		name: name.to_owned(),
		props: props.clone(),
		children: Vec::new(),
	})
}

/// Renders `old` into a fresh container and clears the journal.
fn mount(old: &VNode) -> (MemoryDom, vnode_dom::memory::NodeId) {
	logging_::init();
	let mut dom = MemoryDom::new();
	let container = dom.create_container("main");
	reconcile(&mut dom, &container, Some(old), None, 0, DEPTH_LIMIT).unwrap();
	dom.take_mutations();
	(dom, container)
}

#[test]
fn materialize_then_sync_is_idempotent() {
	logging_::init();
	let (_, clicked) = counter();
	let vnode: VNode = Element::new("input")
		.prop("id", "a")
		.prop("className", "x")
		.prop("value", "v")
		.prop("tabindex", 3)
		.prop("disabled", false)
		.prop("title", PropValue::Null)
		.prop("onInput", clicked)
		.child("label")
		.into();

	let mut dom = MemoryDom::new();
	let node = materialize(&mut dom, &vnode, DEPTH_LIMIT).unwrap();
	dom.take_mutations();

	let props = &element(&vnode).props;
	sync_props(&mut dom, &node, props, props);
	assert!(dom.mutations().is_empty(), "{:#?}", dom.mutations());
}

#[test]
fn materialize_maps_props() {
	logging_::init();
	let (count, clicked) = counter();
	let vnode: VNode = Element::new("input")
		.prop("id", "a")
		.prop("className", "x")
		.prop("value", "v")
		.prop("tabindex", 3)
		.prop("required", true)
		.prop("disabled", false)
		.prop("title", PropValue::Null)
		.prop("onClick", clicked)
		.into();

	let mut dom = MemoryDom::new();
	let node = materialize(&mut dom, &vnode, DEPTH_LIMIT).unwrap();

	assert_eq!(dom.name(node), Some("input"));
	assert_eq!(dom.attribute(node, "id"), Some("a"));
	assert_eq!(dom.attribute(node, "class"), Some("x"));
	assert_eq!(dom.attribute(node, "className"), None);
	assert_eq!(dom.value(node), Some("v"));
	assert_eq!(dom.attribute(node, "value"), None);
	assert_eq!(dom.attribute(node, "tabindex"), Some("3"));
	assert_eq!(dom.attribute(node, "required"), Some("true"));
	assert_eq!(dom.attribute(node, "disabled"), None);
	assert_eq!(dom.attribute(node, "title"), None);
	assert_eq!(dom.attribute(node, "onClick"), None);
	assert_eq!(dom.listener_count(node, "click"), 1);

	assert_eq!(dom.dispatch(node, "click", &()), 1);
	assert_eq!(count.get(), 1);
}

#[test]
fn materialize_appends_children_in_order() {
	logging_::init();
	let vnode: VNode = Element::new("p").child("a").child(1.5).child(Element::new("b").child("c")).into();

	let mut dom = MemoryDom::new();
	let node = materialize(&mut dom, &vnode, DEPTH_LIMIT).unwrap();

	assert_eq!(dom.to_html(node), "<p>a1.5<b>c</b></p>");
	assert!(dom.children(node).iter().all(|&child| dom.parent(child) == Some(node)));
}

#[test]
fn reserved_children_prop_is_not_an_attribute() {
	logging_::init();
	let mut vnode = Element::new("div");
	vnode.props.insert("children".to_owned(), "oops".into());
	let vnode = VNode::Element(vnode);

	let mut dom = MemoryDom::new();
	let node = materialize(&mut dom, &vnode, DEPTH_LIMIT).unwrap();
	assert!(dom.attributes(node).is_empty());

	let mut without = element(&vnode).props.clone();
	without.remove("children");
	dom.take_mutations();
	sync_props(&mut dom, &node, &without, &element(&vnode).props);
	assert!(dom.mutations().is_empty(), "{:#?}", dom.mutations());
}

#[test]
fn stray_handlers_are_ignored() {
	logging_::init();
	let (_, handler) = counter();
	let vnode: VNode = Element::new("div").prop("title", handler.clone()).prop("on", handler).into();

	let mut dom = MemoryDom::new();
	let node = materialize(&mut dom, &vnode, DEPTH_LIMIT).unwrap();

	assert!(dom.attributes(node).is_empty());
	assert_eq!(dom.listener_count(node, ""), 0);
	assert_eq!(dom.listener_count(node, "title"), 0);
}

#[test]
fn text_change_replaces_the_text_node() {
	let (mut dom, container) = mount(&VNode::text("a"));
	let original = dom.children(container)[0];

	reconcile(&mut dom, &container, Some(&VNode::text("b")), Some(&VNode::text("a")), 0, DEPTH_LIMIT).unwrap();

	let replacement = dom.children(container)[0];
	assert_eq!(dom.children(container).len(), 1);
	assert_ne!(replacement, original);
	assert_eq!(dom.text(replacement), Some("b"));
	assert_eq!(dom.parent(original), None);
	assert_eq!(
		dom.mutations().last(),
		Some(&Mutation::ReplaceChild {
			parent: container,
			index: 0,
			child: replacement
		})
	);
}

#[test]
fn equal_primitives_are_left_alone() {
	let (mut dom, container) = mount(&VNode::Number(1.0));

	reconcile(&mut dom, &container, Some(&VNode::Number(1.0)), Some(&VNode::Number(1.0)), 0, DEPTH_LIMIT).unwrap();
	assert!(dom.mutations().is_empty(), "{:#?}", dom.mutations());

	// Same text, different kind.
	reconcile(&mut dom, &container, Some(&VNode::text("1")), Some(&VNode::Number(1.0)), 0, DEPTH_LIMIT).unwrap();
	assert_eq!(dom.mutations().len(), 2, "{:#?}", dom.mutations());
	assert_eq!(dom.text_content(container), "1");
}

#[test]
fn type_change_replaces_wholesale() {
	let old: VNode = Element::new("div").prop("id", "old").child(Element::new("b")).into();
	let new: VNode = Element::new("span").child(Element::new("b")).into();
	let (mut dom, container) = mount(&old);
	let div = dom.children(container)[0];
	let b = dom.children(div)[0];

	reconcile(&mut dom, &container, Some(&new), Some(&old), 0, DEPTH_LIMIT).unwrap();

	let span = dom.children(container)[0];
	assert_ne!(span, div);
	assert_eq!(dom.name(span), Some("span"));
	assert_eq!(dom.attribute(span, "id"), None);
	assert_ne!(dom.children(span)[0], b, "descendants must not be reused");
	assert_eq!(dom.to_html(container), "<main><span><b></b></span></main>");
}

#[test]
fn minimal_attribute_diff() {
	logging_::init();
	let old = props! { "id" => "a", "class" => "x" };
	let new = props! { "id" => "a" };

	let mut dom = MemoryDom::new();
	let node = materialize(&mut dom, &with_props("div", &old), DEPTH_LIMIT).unwrap();
	dom.take_mutations();

	sync_props(&mut dom, &node, &new, &old);

	assert_eq!(
		dom.mutations(),
		&[Mutation::RemoveAttribute {
			node,
			name: "class".to_owned()
		}][..]
	);
	assert_eq!(dom.attribute(node, "id"), Some("a"));
	assert_eq!(dom.attribute(node, "class"), None);
}

#[test]
fn changed_attributes_are_overwritten_in_place() {
	logging_::init();
	let old = props! { "className" => "x", "value" => "1", "title" => "t" };
	let new = props! { "className" => "y", "value" => "2", "title" => "t" };

	let mut dom = MemoryDom::new();
	let node = materialize(&mut dom, &with_props("input", &old), DEPTH_LIMIT).unwrap();
	dom.take_mutations();

	sync_props(&mut dom, &node, &new, &old);

	let mut mutations = dom.take_mutations();
	mutations.sort_by_key(|mutation| format!("{:?}", mutation));
	assert_eq!(
		mutations,
		vec![
			Mutation::SetAttribute {
				node,
				name: "class".to_owned(),
				value: "y".to_owned()
			},
			Mutation::SetValue { node, value: "2".to_owned() },
		]
	);
}

#[test]
fn suppressed_values_remove_attributes() {
	logging_::init();
	let old = props! { "title" => "t", "hidden" => "yes", "className" => "x", "value" => "v" };
	let new = props! { "title" => false, "hidden" => PropValue::Null, "className" => false, "value" => PropValue::Null };

	let mut dom = MemoryDom::new();
	let node = materialize(&mut dom, &with_props("input", &old), DEPTH_LIMIT).unwrap();

	sync_props(&mut dom, &node, &new, &old);
	assert!(dom.attributes(node).is_empty(), "{:?}", dom.attributes(node));
	assert_eq!(dom.value(node), Some(""));

	// Staying suppressed, or switching between kinds of suppression, touches nothing.
	dom.take_mutations();
	let still = props! { "title" => PropValue::Null, "hidden" => false, "className" => false, "value" => PropValue::Null };
	sync_props(&mut dom, &node, &still, &new);
	assert!(dom.mutations().is_empty(), "{:#?}", dom.mutations());
}

#[test]
fn removed_props_are_unbound() {
	logging_::init();
	let (_, clicked) = counter();
	let old = props! { "className" => "x", "value" => "v", "lang" => "en", "hidden" => false, "onClick" => clicked.clone() };

	let mut dom = MemoryDom::new();
	let node = materialize(&mut dom, &with_props("input", &old), DEPTH_LIMIT).unwrap();
	dom.take_mutations();

	sync_props(&mut dom, &node, &props! {}, &old);

	assert!(dom.attributes(node).is_empty(), "{:?}", dom.attributes(node));
	assert_eq!(dom.value(node), Some(""));
	assert_eq!(dom.listener_count(node, "click"), 0);
	assert!(dom.mutations().contains(&Mutation::RemoveListener {
		node,
		event: "click".to_owned(),
		handler: clicked,
	}));
	// Nothing for `hidden`, which was never applied.
	assert_eq!(dom.mutations().len(), 4, "{:#?}", dom.mutations());
}

#[test]
fn listener_replacement_uses_exact_handlers() {
	logging_::init();
	let (count_a, a) = counter();
	let (count_b, b) = counter();
	let old = props! { "onClick" => a.clone() };
	let new = props! { "onClick" => b.clone() };

	let mut dom = MemoryDom::new();
	let node = materialize(&mut dom, &with_props("button", &old), DEPTH_LIMIT).unwrap();
	dom.take_mutations();

	// Unchanged (a clone is the same handler).
	sync_props(&mut dom, &node, &props! { "onClick" => a.clone() }, &old);
	assert!(dom.mutations().is_empty(), "{:#?}", dom.mutations());

	sync_props(&mut dom, &node, &new, &old);
	assert_eq!(
		dom.mutations(),
		&[
			Mutation::RemoveListener {
				node,
				event: "click".to_owned(),
				handler: a,
			},
			Mutation::AddListener {
				node,
				event: "click".to_owned(),
				handler: b,
			},
		][..]
	);

	assert_eq!(dom.listener_count(node, "click"), 1);
	dom.dispatch(node, "click", &());
	assert_eq!((count_a.get(), count_b.get()), (0, 1));
}

#[test]
fn listener_to_attribute_and_back() {
	logging_::init();
	let (_, handler) = counter();
	let as_listener = props! { "onBlur" => handler.clone() };
	let as_attribute = props! { "onBlur" => "alert(1)" };

	let mut dom = MemoryDom::new();
	let node = materialize(&mut dom, &with_props("a", &as_listener), DEPTH_LIMIT).unwrap();

	sync_props(&mut dom, &node, &as_attribute, &as_listener);
	assert_eq!(dom.listener_count(node, "blur"), 0);
	assert_eq!(dom.attribute(node, "onBlur"), Some("alert(1)"));

	sync_props(&mut dom, &node, &as_listener, &as_attribute);
	assert_eq!(dom.listener_count(node, "blur"), 1);
	assert_eq!(dom.attribute(node, "onBlur"), None);
}

#[test]
fn shrinking_children_removes_the_tail_only() {
	let a = || Element::new("li").prop("id", "a").child("A");
	let old: VNode = Element::new("ul").child(a()).child(Element::new("li").child("B")).into();
	let new: VNode = Element::new("ul").child(a()).into();
	let (mut dom, container) = mount(&old);
	let ul = dom.children(container)[0];
	let li_a = dom.children(ul)[0];

	reconcile(&mut dom, &container, Some(&new), Some(&old), 0, DEPTH_LIMIT).unwrap();

	assert_eq!(dom.mutations(), &[Mutation::RemoveChild { parent: ul, index: 1 }][..]);
	assert_eq!(dom.children(ul), &[li_a][..]);
}

#[test]
fn shrinking_by_several_children_removes_back_to_front() {
	let li = |text: &str| Element::new("li").child(text);
	let old: VNode = Element::new("ul").child(li("A")).child(li("B")).child(li("C")).into();
	let new: VNode = Element::new("ul").child(li("A")).into();
	let (mut dom, container) = mount(&old);
	let ul = dom.children(container)[0];

	reconcile(&mut dom, &container, Some(&new), Some(&old), 0, DEPTH_LIMIT).unwrap();

	assert_eq!(
		dom.mutations(),
		&[Mutation::RemoveChild { parent: ul, index: 2 }, Mutation::RemoveChild { parent: ul, index: 1 }][..]
	);
	assert_eq!(dom.text_content(ul), "A");
}

#[test]
fn growing_children_appends() {
	let li = |text: &str| Element::new("li").child(text);
	let old: VNode = Element::new("ul").child(li("A")).into();
	let new: VNode = Element::new("ul").child(li("A")).child(li("B")).into();
	let (mut dom, container) = mount(&old);
	let ul = dom.children(container)[0];
	let li_a = dom.children(ul)[0];

	reconcile(&mut dom, &container, Some(&new), Some(&old), 0, DEPTH_LIMIT).unwrap();

	let li_b = dom.children(ul)[1];
	assert_eq!(dom.children(ul)[0], li_a);
	assert_eq!(dom.mutations().last(), Some(&Mutation::AppendChild { parent: ul, child: li_b }));
	assert_eq!(dom.to_html(ul), "<ul><li>A</li><li>B</li></ul>");
}

#[test]
fn swapped_children_are_patched_by_position() {
	let old: VNode = Element::new("div").child(Element::new("a")).child(Element::new("b")).into();
	let new: VNode = Element::new("div").child(Element::new("b")).child(Element::new("a")).into();
	let (mut dom, container) = mount(&old);
	let div = dom.children(container)[0];
	let (a, b) = (dom.children(div)[0], dom.children(div)[1]);

	reconcile(&mut dom, &container, Some(&new), Some(&old), 0, DEPTH_LIMIT).unwrap();

	// No moves: both positions are recreated.
	assert_eq!(dom.to_html(div), "<div><b></b><a></a></div>");
	assert!(!dom.children(div).contains(&a));
	assert!(!dom.children(div).contains(&b));
}

#[test]
fn missing_live_children_are_reported() {
	logging_::init();
	let mut dom = MemoryDom::new();
	let container = dom.create_container("main");

	assert_eq!(
		reconcile(&mut dom, &container, Some(&VNode::text("b")), Some(&VNode::text("a")), 0, DEPTH_LIMIT),
		Err(Error::IndexOutOfRange { index: 0, len: 0 })
	);
	assert_eq!(
		reconcile(&mut dom, &container, None, Some(&VNode::text("a")), 3, DEPTH_LIMIT),
		Err(Error::IndexOutOfRange { index: 3, len: 0 })
	);
	let div: VNode = Element::new("div").into();
	assert_eq!(
		reconcile(&mut dom, &container, Some(&div), Some(&div), 0, DEPTH_LIMIT),
		Err(Error::IndexOutOfRange { index: 0, len: 0 })
	);
	assert!(dom.mutations().is_empty(), "{:#?}", dom.mutations());
}

#[test]
fn depth_limit_is_enforced() {
	logging_::init();
	let deep: VNode = Element::new("a").child(Element::new("b").child("c")).into();
	let mut dom = MemoryDom::new();

	assert_eq!(materialize(&mut dom, &deep, 2), Err(Error::DepthLimitReached));
	assert!(materialize(&mut dom, &deep, 3).is_ok());

	let container = dom.create_container("main");
	reconcile(&mut dom, &container, Some(&deep), None, 0, 3).unwrap();
	assert_eq!(reconcile(&mut dom, &container, Some(&deep), Some(&deep), 0, 2), Err(Error::DepthLimitReached));
}

#[test]
fn nan_props_compare_equal() {
	logging_::init();
	let props = props! { "data-ratio" => f64::NAN, "value" => f64::NAN };

	let mut dom = MemoryDom::new();
	let node = materialize(&mut dom, &with_props("input", &props), DEPTH_LIMIT).unwrap();
	dom.take_mutations();

	sync_props(&mut dom, &node, &props, &props.clone());
	assert!(dom.mutations().is_empty(), "{:#?}", dom.mutations());
}

#[test]
fn negative_zero_is_a_different_number() {
	let (mut dom, container) = mount(&VNode::Number(0.0));

	reconcile(&mut dom, &container, Some(&VNode::Number(-0.0)), Some(&VNode::Number(0.0)), 0, DEPTH_LIMIT).unwrap();
	assert_eq!(dom.text_content(container), "-0");

	let old = props! { "tabindex" => 0.0 };
	let new = props! { "tabindex" => -0.0 };
	let node = materialize(&mut dom, &with_props("div", &old), DEPTH_LIMIT).unwrap();
	sync_props(&mut dom, &node, &new, &old);
	assert_eq!(dom.attribute(node, "tabindex"), Some("-0"));
}

#[test]
fn replaced_subtrees_release_their_listeners() {
	let (_, clicked) = counter();
	let (_, stray) = counter();
	let old: VNode = Element::new("div")
		.prop("title", stray)
		.child(Element::new("button").prop("onClick", clicked.clone()))
		.into();
	let (mut dom, container) = mount(&old);
	let button = dom.children(dom.children(container)[0])[0];

	reconcile(&mut dom, &container, Some(&Element::new("span").into()), Some(&old), 0, DEPTH_LIMIT).unwrap();

	let span = dom.children(container)[0];
	assert_eq!(
		&dom.mutations()[dom.mutations().len() - 2..],
		&[
			Mutation::ReplaceChild {
				parent: container,
				index: 0,
				child: span
			},
			Mutation::ReleaseListener {
				event: "click".to_owned(),
				handler: clicked,
			},
		][..]
	);
	// Detached nodes are left as they are.
	assert_eq!(dom.listener_count(button, "click"), 1);
}

#[test]
fn removed_children_release_their_listeners() {
	let (_, a) = counter();
	let (_, b) = counter();
	let li = |handler: &Handler| Element::new("li").prop("onClick", handler.clone()).prop("onFocus", handler.clone());
	let old: VNode = Element::new("ul").child(li(&a)).child(li(&b)).into();
	let new: VNode = Element::new("ul").child(li(&a)).into();
	let (mut dom, container) = mount(&old);
	let ul = dom.children(container)[0];

	reconcile(&mut dom, &container, Some(&new), Some(&old), 0, DEPTH_LIMIT).unwrap();

	let mut mutations = dom.take_mutations();
	assert_eq!(mutations.remove(0), Mutation::RemoveChild { parent: ul, index: 1 });
	mutations.sort_by_key(|mutation| format!("{:?}", mutation));
	assert_eq!(
		mutations,
		vec![
			Mutation::ReleaseListener {
				event: "click".to_owned(),
				handler: b.clone(),
			},
			Mutation::ReleaseListener {
				event: "focus".to_owned(),
				handler: b,
			},
		]
	);
}

#[test]
fn invalid_tag_names_are_host_errors() {
	logging_::init();
	let mut dom = MemoryDom::new();

	assert!(matches!(
		materialize(&mut dom, &Element::new("no spaces").into(), DEPTH_LIMIT),
		Err(Error::Host { operation: "createElement", .. })
	));
	assert!(matches!(materialize(&mut dom, &Element::new("").into(), DEPTH_LIMIT), Err(Error::Host { .. })));
	assert!(dom.mutations().is_empty(), "{:#?}", dom.mutations());
}

#[test]
fn depth_can_be_checked_up_front() {
	let deep: VNode = Element::new("a").child(Element::new("b").child("c")).into();

	assert_eq!(check_depth(&deep, 2), Err(Error::DepthLimitReached));
	assert_eq!(check_depth(&deep, 3), Ok(()));
	assert_eq!(check_depth(&VNode::text("leaf"), 1), Ok(()));
	assert_eq!(check_depth(&VNode::text("leaf"), 0), Err(Error::DepthLimitReached));
}
