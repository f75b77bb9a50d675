use std::sync::Arc;

use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{info, warn};

use crate::api::{ApiClient, GraphWriter, NodePayload, RelationshipPayload};
use crate::chat::ChatLog;
use crate::components::chat_panel::ChatPanel;
use crate::components::graph_canvas::{
	GraphCanvas, GraphSnapshot, LabelColors, Node, NodeId, Properties, PropertyValue, Selection,
	SelectionEvent,
};
use crate::components::inspector::{
	Inspector, InspectorAction, NewNodeForm, editable_link, labels_with, labels_without,
};
use crate::components::notices::{NoticeTray, Notices};
use crate::config::AppConfig;
use crate::error::EditorError;
use crate::highlight::{HighlightState, HighlightSynchronizer};
use crate::search::{NodeSearch, SearchField};
use crate::stream::{StreamConnection, StreamEvent, StreamSignal};

/// Search results listed under the search box.
const MAX_SEARCH_RESULTS: usize = 10;

fn stored_node<'a>(snapshot: &'a GraphSnapshot, id: &str) -> Result<&'a Node, EditorError> {
	snapshot
		.node(id)
		.ok_or_else(|| EditorError::Validation(format!("node {id} is no longer in the graph")))
}

/// Runs one inspector edit and describes what changed.
async fn run_action(
	api: &ApiClient,
	snapshot: &GraphSnapshot,
	action: InspectorAction,
) -> Result<String, EditorError> {
	match action {
		InspectorAction::DeleteNode(id) => {
			api.delete_node(&id).await?;
			Ok(format!("Deleted node {id}"))
		}
		InspectorAction::DeleteLink(id) => {
			editable_link(snapshot, &id)?;
			api.delete_relationship(&id).await?;
			Ok(format!("Deleted relationship {id}"))
		}
		InspectorAction::DeleteProperty { node, key } => {
			api.delete_node_property(&node, &key).await?;
			Ok(format!("Removed {key} from node {node}"))
		}
		InspectorAction::SetProperty { node, key, value } => {
			let current = stored_node(snapshot, &node)?;
			let mut properties = current.properties.clone();
			properties.insert(key.clone(), value);
			let payload = NodePayload {
				labels: current.labels.clone(),
				properties,
			};
			api.update_node(&node, &payload).await?;
			Ok(format!("Set {key} on node {node}"))
		}
		InspectorAction::AddLabel { node, label } => {
			let current = stored_node(snapshot, &node)?;
			let payload = NodePayload {
				labels: labels_with(&current.labels, &label)?,
				properties: current.properties.clone(),
			};
			api.update_node(&node, &payload).await?;
			Ok(format!("Added label {} to node {node}", label.trim()))
		}
		InspectorAction::RemoveLabel { node, label } => {
			let current = stored_node(snapshot, &node)?;
			let payload = NodePayload {
				labels: labels_without(&current.labels, &label),
				properties: current.properties.clone(),
			};
			api.update_node(&node, &payload).await?;
			Ok(format!("Removed label {label} from node {node}"))
		}
		InspectorAction::RetypeLink { id, rel_type } => {
			editable_link(snapshot, &id)?;
			api.update_relationship_type(&id, &rel_type).await?;
			Ok(format!("Relationship {id} is now {}", rel_type.trim()))
		}
		InspectorAction::SetLinkProperty { link, key, value } => {
			editable_link(snapshot, &link)?;
			let changes = Properties::from([(key.clone(), value)]);
			api.update_relationship_properties(&link, &changes).await?;
			Ok(format!("Set {key} on relationship {link}"))
		}
		InspectorAction::DeleteLinkProperty { link, key } => {
			editable_link(snapshot, &link)?;
			let changes = Properties::from([(key.clone(), PropertyValue::Null)]);
			api.update_relationship_properties(&link, &changes).await?;
			Ok(format!("Removed {key} from relationship {link}"))
		}
	}
}

/// Routes stream signals into the chat log and highlight rounds.
fn stream_handler(
	snapshot: RwSignal<Arc<GraphSnapshot>>,
	sync: RwSignal<HighlightSynchronizer>,
	chat: RwSignal<ChatLog>,
	connected: RwSignal<bool>,
	api: ApiClient,
	notices: Notices,
) -> impl FnMut(StreamSignal) + 'static {
	move |signal| match signal {
		StreamSignal::Opened => connected.set(true),
		StreamSignal::Closed => connected.set(false),
		StreamSignal::Message(text) => {
			let event = match StreamEvent::parse(&text) {
				Ok(event) => event,
				Err(err) => {
					warn!("dropping stream frame: {err}");
					return;
				}
			};
			if let Some(reply) = event.assistant_text() {
				chat.update(|c| c.push_assistant(reply));
			}
			let pending = snapshot
				.with_untracked(|snap| sync.try_update(|s| s.begin(&event, snap)))
				.flatten();
			let Some(pending) = pending else {
				return;
			};
			let api = api.clone();
			spawn_local(async move {
				let resolved = pending.resolve(&api).await;
				if let Some(Err(err)) = sync.try_update(|s| s.commit(resolved)) {
					notices.error(&err);
				}
			});
		}
	}
}

/// The graph editor: canvas, inspector and chat wired to the API and the event stream.
#[component]
pub fn Editor() -> impl IntoView {
	let config = use_context::<AppConfig>().unwrap_or_default();
	let notices = use_context::<Notices>().unwrap_or_default();
	let api = ApiClient::new(&config.api_base_url);
	let api_store = StoredValue::new(api.clone());

	let snapshot = RwSignal::new(Arc::new(GraphSnapshot::default()));
	let sync = RwSignal::new(HighlightSynchronizer::default());
	let chat = RwSignal::new(ChatLog::default());
	let connected = RwSignal::new(false);
	let selection = RwSignal::new(Selection::None);
	let connection_mode = RwSignal::new(false);
	let pending_link = RwSignal::new(None::<(NodeId, NodeId)>);
	let link_type = RwSignal::new(String::new());
	let show_labels = RwSignal::new(true);
	let creating = RwSignal::new(false);
	let search_field = RwSignal::new(SearchField::default());
	let search_text = RwSignal::new(String::new());

	let search = Memo::new(move |_| search_text.with(|t| NodeSearch::new(search_field.get(), t)));
	let search_hits = Memo::new(move |_| {
		search.with(|q| {
			snapshot.with(|snap| {
				snap.nodes()
					.iter()
					.filter(|n| q.is_active() && q.matches(n))
					.map(|n| (n.id.clone(), n.caption()))
					.collect::<Vec<_>>()
			})
		})
	});
	// An active search replaces the live highlight set; the round counter stays.
	let highlight = Memo::new(move |_| {
		let live = sync.with(|s| s.state().clone());
		search.with(|q| {
			if !q.is_active() {
				return live;
			}
			HighlightState {
				round: live.round,
				nodes: snapshot.with(|snap| q.matching_ids(snap)),
			}
		})
	});
	let label_colors = Memo::new(move |_| snapshot.with(|s| LabelColors::from_snapshot(s)));
	let legend = Memo::new(move |_| {
		label_colors.with(|colors| {
			let mut entries: Vec<(String, String)> = colors
				.iter()
				.map(|(label, color)| (label.to_string(), color.to_string()))
				.collect();
			entries.sort();
			entries
		})
	});

	let refresh = move || {
		let api = api_store.get_value();
		spawn_local(async move {
			match api.fetch_graph().await {
				Ok(graph) => {
					info!("loaded {} nodes and {} links", graph.nodes().len(), graph.links().len());
					snapshot.set(Arc::new(graph));
				}
				Err(err) => notices.error(&err),
			}
		});
	};
	refresh();

	let stream = StoredValue::new_local(StreamConnection::new(config.stream_url.clone()));
	let connect = move || {
		let api = api_store.get_value();
		let handler = stream_handler(snapshot, sync, chat, connected, api, notices);
		if let Some(Err(err)) = stream.try_update_value(|c| c.connect(handler)) {
			notices.error(&err);
		}
	};
	connect();
	on_cleanup(move || {
		stream.try_update_value(StreamConnection::close);
	});

	let on_send = Callback::new(move |text: String| {
		let mut frame = None;
		chat.update(|c| sync.update(|s| frame = c.submit(&text, s)));
		let Some(frame) = frame else {
			return;
		};
		let sent = stream
			.try_with_value(|c| c.send(&frame))
			.unwrap_or(Err(EditorError::Disconnected));
		if let Err(err) = sent {
			notices.error(&err);
		}
	});

	let caption_of = move |id: NodeId| {
		snapshot
			.with_untracked(|s| s.node(&id).map(Node::caption))
			.unwrap_or(id)
	};
	let on_select = Callback::new(move |event: SelectionEvent| match event {
		SelectionEvent::Node(id) => selection.set(Selection::Node(id)),
		SelectionEvent::Link(id) => selection.set(Selection::Link(id)),
		SelectionEvent::ConnectionSource(id) => {
			notices.info(format!("Source {} chosen, now pick the target", caption_of(id)));
		}
		SelectionEvent::ConnectionTarget { source, target } => {
			link_type.set(String::new());
			pending_link.set(Some((source, target)));
		}
	});

	let create_link = move |ev: SubmitEvent| {
		ev.prevent_default();
		let Some((source, target)) = pending_link.get_untracked() else {
			return;
		};
		let rel = match RelationshipPayload::new(&source, &target, &link_type.get_untracked()) {
			Ok(rel) => rel,
			Err(err) => {
				notices.error(&err);
				return;
			}
		};
		let api = api_store.get_value();
		spawn_local(async move {
			match api.create_relationship(&rel).await {
				Ok(()) => {
					notices.info(format!("Created {} relationship", rel.rel_type));
					pending_link.set(None);
					connection_mode.set(false);
					refresh();
				}
				Err(err) => notices.error(&err),
			}
		});
	};

	let on_action = Callback::new(move |action: InspectorAction| {
		let clears_selection = matches!(
			action,
			InspectorAction::DeleteNode(_)
				| InspectorAction::DeleteLink(_)
				| InspectorAction::RetypeLink { .. }
		);
		let api = api_store.get_value();
		let snap = snapshot.get_untracked();
		spawn_local(async move {
			match run_action(&api, &snap, action).await {
				Ok(done) => {
					notices.info(done);
					if clears_selection {
						selection.set(Selection::None);
					}
					refresh();
				}
				Err(err) => notices.error(&err),
			}
		});
	});

	let on_create = Callback::new(move |payload: NodePayload| {
		let api = api_store.get_value();
		spawn_local(async move {
			match api.create_node(&payload).await {
				Ok(id) => {
					notices.info(format!("Created node {id}"));
					creating.set(false);
					selection.set(Selection::Node(id));
					refresh();
				}
				Err(err) => notices.error(&err),
			}
		});
	});

	let toggle_connection = move |_: leptos::ev::MouseEvent| {
		connection_mode.update(|on| *on = !*on);
		if !connection_mode.get_untracked() {
			pending_link.set(None);
		}
	};

	view! {
		<div class="editor">
			<header class="toolbar">
				<h1>"Graph Editor"</h1>
				<button on:click=move |_| refresh()>"Refresh"</button>
				<button on:click=move |_| creating.set(true)>"New node"</button>
				<button class:active=move || connection_mode.get() on:click=toggle_connection>
					{move || {
						if connection_mode.get() { "Cancel connection" } else { "Connect nodes" }
					}}
				</button>
				<label class="toggle">
					<input
						type="checkbox"
						prop:checked=move || show_labels.get()
						on:change=move |ev| show_labels.set(event_target_checked(&ev))
					/>
					"Relationship labels"
				</label>
				<span class="round-indicator">
					{move || {
						if search.with(NodeSearch::is_active) {
							return Some(format!("{} matching", search_hits.with(Vec::len)));
						}
						highlight
							.with(|h| {
								h.is_active()
									.then(|| {
										format!("Round {}: {} highlighted", h.round, h.nodes.len())
									})
							})
					}}
				</span>
				<div class="search">
					<select on:change=move |ev| {
						search_field.set(SearchField::parse(&event_target_value(&ev)))
					}>
						{SearchField::ALL
							.into_iter()
							.map(|f| view! { <option value=f.as_str()>{f.as_str()}</option> })
							.collect_view()}
					</select>
					<input
						type="search"
						placeholder="Search nodes"
						prop:value=move || search_text.get()
						on:input=move |ev| search_text.set(event_target_value(&ev))
					/>
					<ul class="search-results">
						{move || {
							search_hits
								.get()
								.into_iter()
								.take(MAX_SEARCH_RESULTS)
								.map(|(id, caption)| {
									view! {
										<li on:click=move |_| {
											selection.set(Selection::Node(id.clone()))
										}>{caption}</li>
									}
								})
								.collect_view()
						}}
					</ul>
				</div>
			</header>
			<main class="workspace">
				<div class="canvas-area">
					<GraphCanvas
						snapshot=snapshot
						highlight=highlight
						label_colors=label_colors
						show_relationship_labels=show_labels
						connection_mode=connection_mode
						selection=selection
						on_select=on_select
						writer=api.clone()
						on_graph_changed=Callback::new(move |_: ()| refresh())
					/>
					<Show when=move || snapshot.with(|s| s.is_empty())>
						<p class="empty-hint">
							"No nodes yet. Refresh once the graph API is reachable."
						</p>
					</Show>
					<ul class="label-legend">
						{move || {
							legend
								.get()
								.into_iter()
								.map(|(label, color)| {
									let swatch = format!("background: {color};");
									view! {
										<li>
											<span class="swatch" style=swatch />
											{label}
										</li>
									}
								})
								.collect_view()
						}}
					</ul>
				</div>
				<Inspector
					snapshot=snapshot
					selection=selection
					on_action=on_action
					on_close=Callback::new(move |_: ()| selection.set(Selection::None))
				/>
				<ChatPanel
					log=chat
					connected=connected
					on_send=on_send
					on_reconnect=Callback::new(move |_: ()| connect())
				/>
			</main>
			<Show when=move || pending_link.with(Option::is_some)>
				<div class="modal">
					<form class="relationship-prompt" on:submit=create_link>
						<label>"Relationship type"</label>
						<input
							placeholder="KNOWS"
							prop:value=move || link_type.get()
							on:input=move |ev| link_type.set(event_target_value(&ev))
						/>
						<button type="submit">"Create"</button>
						<button type="button" on:click=move |_| pending_link.set(None)>
							"Cancel"
						</button>
					</form>
				</div>
			</Show>
			<Show when=move || creating.get()>
				<NewNodeForm
					on_create=on_create
					on_cancel=Callback::new(move |_: ()| creating.set(false))
					on_invalid=Callback::new(move |err: EditorError| notices.error(&err))
				/>
			</Show>
			<NoticeTray />
		</div>
	}
}
