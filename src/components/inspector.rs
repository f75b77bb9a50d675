use std::sync::Arc;

use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use serde_json::Value;

use crate::api::NodePayload;
use crate::components::graph_canvas::{
	GraphSnapshot, Link, LinkId, Node, NodeId, Properties, PropertyValue, Selection,
};
use crate::error::EditorError;

/// Edits requested from the inspector; the page runs them against the API.
#[derive(Clone, Debug, PartialEq)]
pub enum InspectorAction {
	DeleteNode(NodeId),
	DeleteLink(LinkId),
	DeleteProperty { node: NodeId, key: String },
	SetProperty {
		node: NodeId,
		key: String,
		value: PropertyValue,
	},
	AddLabel { node: NodeId, label: String },
	RemoveLabel { node: NodeId, label: String },
	RetypeLink { id: LinkId, rel_type: String },
	SetLinkProperty {
		link: LinkId,
		key: String,
		value: PropertyValue,
	},
	DeleteLinkProperty { link: LinkId, key: String },
}

/// JSON literals are taken as-is, anything else is a string.
pub fn parse_property_input(raw: &str) -> PropertyValue {
	let raw = raw.trim();
	serde_json::from_str::<Value>(raw)
		.map(PropertyValue::from)
		.unwrap_or_else(|_| PropertyValue::String(raw.to_string()))
}

/// The link behind `id`, if it can be addressed in the database.
pub fn editable_link<'a>(snapshot: &'a GraphSnapshot, id: &str) -> Result<&'a Link, EditorError> {
	let link = snapshot.link(id).ok_or_else(|| {
		EditorError::Validation(format!("relationship {id} is no longer in the graph"))
	})?;
	if link.synthetic {
		return Err(EditorError::Validation(format!(
			"relationship {id} has no database id and cannot be edited"
		)));
	}
	Ok(link)
}

/// `labels` plus `label`, rejecting blanks and duplicates.
pub fn labels_with(labels: &[String], label: &str) -> Result<Vec<String>, EditorError> {
	let label = label.trim();
	if label.is_empty() {
		return Err(EditorError::Validation("label cannot be empty".into()));
	}
	if labels.iter().any(|l| l == label) {
		return Err(EditorError::Validation(format!("label {label} already exists")));
	}
	let mut out = labels.to_vec();
	out.push(label.to_string());
	Ok(out)
}

pub fn labels_without(labels: &[String], label: &str) -> Vec<String> {
	labels.iter().filter(|l| *l != label).cloned().collect()
}

/// Payload for a new node from comma separated labels and an optional name.
pub fn new_node_payload(labels: &str, name: &str) -> Result<NodePayload, EditorError> {
	let mut parsed: Vec<String> = Vec::new();
	for label in labels.split([',', ':']).map(str::trim).filter(|l| !l.is_empty()) {
		if !parsed.iter().any(|l| l == label) {
			parsed.push(label.to_string());
		}
	}
	let name = name.trim();
	if parsed.is_empty() && name.is_empty() {
		return Err(EditorError::Validation("a new node needs a label or a name".into()));
	}
	let mut properties = Properties::new();
	if !name.is_empty() {
		properties.insert("name".into(), PropertyValue::String(name.to_string()));
	}
	Ok(NodePayload {
		labels: parsed,
		properties,
	})
}

fn property_rows(
	properties: Vec<(String, PropertyValue)>,
	on_delete: Option<Callback<String>>,
) -> impl IntoView {
	properties
		.into_iter()
		.map(|(key, value)| {
			let delete = on_delete.map(|cb| {
				let key = key.clone();
				view! {
					<button class="danger small" on:click=move |_| cb.run(key.clone())>
						"x"
					</button>
				}
			});
			view! {
				<tr>
					<th>{key}</th>
					<td>{value.display()}</td>
					<td>{delete}</td>
				</tr>
			}
		})
		.collect_view()
}

/// Key/value inputs; blank keys are ignored.
fn property_form(on_set: Callback<(String, PropertyValue)>) -> impl IntoView {
	let (key, value) = (RwSignal::new(String::new()), RwSignal::new(String::new()));
	let submit = move |ev: SubmitEvent| {
		ev.prevent_default();
		let k = key.get_untracked().trim().to_string();
		if k.is_empty() {
			return;
		}
		on_set.run((k, parse_property_input(&value.get_untracked())));
		key.set(String::new());
		value.set(String::new());
	};

	view! {
		<form class="add-property" on:submit=submit>
			<input
				placeholder="key"
				prop:value=move || key.get()
				on:input=move |ev| key.set(event_target_value(&ev))
			/>
			<input
				placeholder="value"
				prop:value=move || value.get()
				on:input=move |ev| value.set(event_target_value(&ev))
			/>
			<button type="submit">"Set"</button>
		</form>
	}
}

fn node_panel(node: Node, incident: usize, on_action: Callback<InspectorAction>) -> impl IntoView {
	let new_label = RwSignal::new(String::new());
	let id = node.id.clone();

	let id_prop = id.clone();
	let on_delete_property = Callback::new(move |key: String| {
		on_action.run(InspectorAction::DeleteProperty {
			node: id_prop.clone(),
			key,
		})
	});
	let id_set = id.clone();
	let on_set_property = Callback::new(move |(key, value): (String, PropertyValue)| {
		on_action.run(InspectorAction::SetProperty {
			node: id_set.clone(),
			key,
			value,
		})
	});
	let id_label = id.clone();
	let add_label = move |ev: SubmitEvent| {
		ev.prevent_default();
		on_action.run(InspectorAction::AddLabel {
			node: id_label.clone(),
			label: new_label.get_untracked(),
		});
		new_label.set(String::new());
	};
	let chips = node
		.labels
		.iter()
		.map(|label| {
			let (node, label) = (id.clone(), label.clone());
			let text = label.clone();
			view! {
				<span class="label-chip">
					{text}
					<button
						class="small"
						on:click=move |_| {
							on_action
								.run(InspectorAction::RemoveLabel {
									node: node.clone(),
									label: label.clone(),
								})
						}
					>
						"x"
					</button>
				</span>
			}
		})
		.collect_view();
	let id_del = id.clone();

	view! {
		<h3>{node.caption()}</h3>
		<div class="inspector-labels">{chips}</div>
		<form class="add-label" on:submit=add_label>
			<input
				placeholder="new label"
				prop:value=move || new_label.get()
				on:input=move |ev| new_label.set(event_target_value(&ev))
			/>
			<button type="submit">"Add label"</button>
		</form>
		<p class="inspector-meta">{format!("id {} - {incident} relationships", node.id)}</p>
		<table class="properties">
			{property_rows(node.properties.into_iter().collect(), Some(on_delete_property))}
		</table>
		{property_form(on_set_property)}
		<button
			class="danger"
			on:click=move |_| on_action.run(InspectorAction::DeleteNode(id_del.clone()))
		>
			"Delete node"
		</button>
	}
}

fn link_panel(
	link: Link,
	endpoints: (String, String),
	on_action: Callback<InspectorAction>,
) -> impl IntoView {
	let header = view! {
		<h3>{link.rel_type.clone()}</h3>
		<p class="inspector-meta">{format!("{} -> {}", endpoints.0, endpoints.1)}</p>
	};
	let properties: Vec<_> = link.properties.clone().into_iter().collect();
	if link.synthetic {
		return view! {
			{header}
			<table class="properties">{property_rows(properties, None)}</table>
			<p class="inspector-note">
				"No database id was loaded for this relationship; it is read-only."
			</p>
		}
		.into_any();
	}

	let new_type = RwSignal::new(link.rel_type.clone());
	let id_retype = link.id.clone();
	let retype = move |ev: SubmitEvent| {
		ev.prevent_default();
		on_action.run(InspectorAction::RetypeLink {
			id: id_retype.clone(),
			rel_type: new_type.get_untracked(),
		});
	};
	let id_prop = link.id.clone();
	let on_delete_property = Callback::new(move |key: String| {
		on_action.run(InspectorAction::DeleteLinkProperty {
			link: id_prop.clone(),
			key,
		})
	});
	let id_set = link.id.clone();
	let on_set_property = Callback::new(move |(key, value): (String, PropertyValue)| {
		on_action.run(InspectorAction::SetLinkProperty {
			link: id_set.clone(),
			key,
			value,
		})
	});
	let id_del = link.id.clone();

	view! {
		{header}
		<table class="properties">{property_rows(properties, Some(on_delete_property))}</table>
		{property_form(on_set_property)}
		<form class="retype" on:submit=retype>
			<input
				prop:value=move || new_type.get()
				on:input=move |ev| new_type.set(event_target_value(&ev))
			/>
			<button type="submit">"Change type"</button>
		</form>
		<button
			class="danger"
			on:click=move |_| on_action.run(InspectorAction::DeleteLink(id_del.clone()))
		>
			"Delete relationship"
		</button>
	}
	.into_any()
}

#[component]
pub fn Inspector(
	#[prop(into)] snapshot: Signal<Arc<GraphSnapshot>>,
	#[prop(into)] selection: Signal<Selection>,
	#[prop(into)] on_action: Callback<InspectorAction>,
	#[prop(into)] on_close: Callback<()>,
) -> impl IntoView {
	let body = move || {
		let snap = snapshot.get();
		match selection.get() {
			Selection::Node(id) => snap.node(&id).cloned().map(|node| {
				let incident = snap.incident_links(&id).count();
				node_panel(node, incident, on_action).into_any()
			}),
			Selection::Link(id) => snap.link(&id).cloned().map(|link| {
				let caption = |id: &str| {
					snap.node(id)
						.map(Node::caption)
						.unwrap_or_else(|| id.to_string())
				};
				let endpoints = (caption(&link.source), caption(&link.target));
				link_panel(link, endpoints, on_action).into_any()
			}),
			Selection::None => None,
		}
	};

	view! {
		<Show when=move || selection.with(|s| *s != Selection::None)>
			<aside class="inspector">
				<button class="close" on:click=move |_| on_close.run(())>
					"Close"
				</button>
				{body}
			</aside>
		</Show>
	}
}

/// Modal form for creating a node.
#[component]
pub fn NewNodeForm(
	#[prop(into)] on_create: Callback<NodePayload>,
	#[prop(into)] on_cancel: Callback<()>,
	#[prop(into)] on_invalid: Callback<EditorError>,
) -> impl IntoView {
	let (labels, name) = (RwSignal::new(String::new()), RwSignal::new(String::new()));
	let submit = move |ev: SubmitEvent| {
		ev.prevent_default();
		match new_node_payload(&labels.get_untracked(), &name.get_untracked()) {
			Ok(payload) => on_create.run(payload),
			Err(err) => on_invalid.run(err),
		}
	};

	view! {
		<div class="modal">
			<form class="new-node" on:submit=submit>
				<label>"Labels"</label>
				<input
					placeholder="Person, Actor"
					prop:value=move || labels.get()
					on:input=move |ev| labels.set(event_target_value(&ev))
				/>
				<label>"Name"</label>
				<input
					prop:value=move || name.get()
					on:input=move |ev| name.set(event_target_value(&ev))
				/>
				<button type="submit">"Create"</button>
				<button type="button" on:click=move |_| on_cancel.run(())>
					"Cancel"
				</button>
			</form>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn property_input_parses_json_literals() {
		assert_eq!(parse_property_input("42"), PropertyValue::Number(42.into()));
		assert_eq!(parse_property_input(" true "), PropertyValue::Bool(true));
		assert_eq!(
			parse_property_input("[1, 2]"),
			PropertyValue::Array(vec![
				PropertyValue::Number(1.into()),
				PropertyValue::Number(2.into())
			])
		);
		assert_eq!(parse_property_input("\"quoted\""), PropertyValue::String("quoted".into()));
	}

	#[test]
	fn property_input_falls_back_to_text() {
		assert_eq!(
			parse_property_input("Buenos Aires"),
			PropertyValue::String("Buenos Aires".into())
		);
		assert_eq!(parse_property_input(""), PropertyValue::String(String::new()));
	}

	#[test]
	fn links_without_database_ids_are_read_only() {
		let snap: GraphSnapshot = serde_json::from_str(
			r#"{"links": [
				{"source": 1, "target": 2, "type": "KNOWS"},
				{"id": 8, "source": 2, "target": 1, "type": "KNOWS"}
			]}"#,
		)
		.unwrap();
		assert!(matches!(editable_link(&snap, "link-0"), Err(EditorError::Validation(_))));
		assert!(matches!(editable_link(&snap, "99"), Err(EditorError::Validation(_))));
		assert_eq!(editable_link(&snap, "8").map(|l| l.id.as_str()), Ok("8"));
	}

	#[test]
	fn labels_are_added_once_and_removed() {
		let labels = vec!["Person".to_string()];
		assert_eq!(labels_with(&labels, " Actor ").unwrap(), vec!["Person", "Actor"]);
		assert!(matches!(labels_with(&labels, "Person"), Err(EditorError::Validation(_))));
		assert!(matches!(labels_with(&labels, "  "), Err(EditorError::Validation(_))));
		assert!(labels_without(&labels, "Person").is_empty());
		assert_eq!(labels_without(&labels, "City"), labels);
	}

	#[test]
	fn new_nodes_need_a_label_or_a_name() {
		let payload = new_node_payload("Person, Actor:Person", " Ana ").unwrap();
		assert_eq!(payload.labels, vec!["Person", "Actor"]);
		assert_eq!(
			payload.properties.get("name"),
			Some(&PropertyValue::String("Ana".into()))
		);
		assert!(new_node_payload("City", "").unwrap().properties.is_empty());
		assert!(matches!(new_node_payload(" , ", " "), Err(EditorError::Validation(_))));
	}
}
