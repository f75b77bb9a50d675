use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, error};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, Event, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent,
};

use super::clipboard::{self, Shortcut};
use super::color::LabelColors;
use super::render::{self, FrameStyle};
use super::state::{CanvasState, ConnectionMode, HoverCard, Selection, SelectionEvent};
use super::types::GraphSnapshot;
use crate::api::ApiClient;
use crate::components::notices::Notices;
use crate::error::EditorError;
use crate::highlight::HighlightState;

type SharedState = Rc<RefCell<Option<CanvasState>>>;
type WindowListener = (&'static str, Closure<dyn FnMut(Event)>);

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn parent_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
	canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.filter(|(w, h)| *w > 0.0 && *h > 0.0)
		.unwrap_or((800.0, 600.0))
}

fn is_typing() -> bool {
	web_sys::window()
		.and_then(|w| w.document())
		.and_then(|d| d.active_element())
		.is_some_and(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA"))
}

fn cursor_for(state: &CanvasState) -> &'static str {
	if state.is_grabbing() {
		"grabbing"
	} else if state.connection != ConnectionMode::Off {
		"crosshair"
	} else if state.hover.node.is_some() || state.hover.link.is_some() {
		"pointer"
	} else {
		"grab"
	}
}

fn view_action(
	state: SharedState,
	action: fn(&mut CanvasState),
) -> impl FnMut(MouseEvent) + 'static {
	move |_| {
		if let Some(s) = state.borrow_mut().as_mut() {
			action(s);
		}
	}
}

#[component]
pub fn GraphCanvas(
	#[prop(into)] snapshot: Signal<Arc<GraphSnapshot>>,
	#[prop(into)] highlight: Signal<HighlightState>,
	#[prop(into)] label_colors: Signal<LabelColors>,
	#[prop(into)] show_relationship_labels: Signal<bool>,
	#[prop(into)] connection_mode: Signal<bool>,
	#[prop(into)] selection: Signal<Selection>,
	#[prop(into)] on_select: Callback<SelectionEvent>,
	/// Enables paste; without it Ctrl/Cmd+V only reports that editing is unavailable.
	#[prop(optional)]
	writer: Option<ApiClient>,
	#[prop(into)] on_graph_changed: Callback<()>,
) -> impl IntoView {
	let notices = use_context::<Notices>().unwrap_or_default();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
	let listeners = StoredValue::new_local(Vec::<WindowListener>::new());
	let running = Arc::new(AtomicBool::new(true));
	let hover_card = RwSignal::new(None::<HoverCard>);
	let cursor = RwSignal::new("grab");
	let writer = StoredValue::new(writer);

	let (state_init, animate_init, running_init) =
		(state.clone(), animate.clone(), running.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};
		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			error!("canvas has no 2d context");
			return;
		};

		let (w, h) = parent_size(&canvas);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		let mut initial = CanvasState::new(w, h);
		let placed = initial.set_snapshot(snapshot.get_untracked());
		initial.set_connection_mode(connection_mode.get_untracked());
		initial.set_selection(selection.get_untracked());
		debug!("canvas {w}x{h}, placed {placed} nodes");
		*state_init.borrow_mut() = Some(initial);

		let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
		let on_resize = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
			let (nw, nh) = parent_size(&canvas_resize);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(s) = state_resize.borrow_mut().as_mut() {
				s.resize(nw, nh);
			}
		});

		let state_keys = state_init.clone();
		let on_keydown = Closure::<dyn FnMut(Event)>::new(move |ev: Event| {
			let Some(ev) = ev.dyn_ref::<KeyboardEvent>() else {
				return;
			};
			let typing = is_typing();
			let Some(shortcut) =
				clipboard::shortcut_for(&ev.key(), ev.ctrl_key(), ev.meta_key(), typing)
			else {
				return;
			};
			match shortcut {
				Shortcut::Copy => {
					let copied = state_keys
						.borrow_mut()
						.as_mut()
						.and_then(|s| s.copy_selected().map(|c| c.source_id.clone()));
					if let Some(id) = copied {
						ev.prevent_default();
						notices.info(format!("Copied node {id}"));
					}
				}
				Shortcut::Paste => {
					let plan = state_keys.borrow().as_ref().and_then(CanvasState::paste_plan);
					let Some(plan) = plan else {
						return;
					};
					ev.prevent_default();
					let Some(api) = writer.try_get_value().flatten() else {
						let err = EditorError::Validation("pasting needs the graph API".into());
						notices.error(&err);
						return;
					};
					let state_paste = state_keys.clone();
					spawn_local(async move {
						match clipboard::paste(&api, &plan).await {
							Ok(outcome) => {
								if let Some(s) = state_paste.borrow_mut().as_mut() {
									s.apply_paste(&outcome);
								}
								let mut msg = format!(
									"Pasted node {} with {} relationships",
									outcome.node_id, outcome.relinked
								);
								if outcome.relink_failures > 0 {
									msg.push_str(&format!(" ({} failed)", outcome.relink_failures));
								}
								notices.info(msg);
								on_graph_changed.run(());
							}
							Err(err) => notices.error(&err),
						}
					});
				}
			}
		});

		for (name, cb) in [("resize", on_resize), ("keydown", on_keydown)] {
			let _ = window.add_event_listener_with_callback(name, cb.as_ref().unchecked_ref());
			listeners.update_value(|l| l.push((name, cb)));
		}

		let (state_anim, animate_inner, running_anim) =
			(state_init.clone(), animate_init.clone(), running_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move |time_ms: f64| {
			if !running_anim.load(Ordering::Relaxed) {
				return;
			}
			if let Some(s) = state_anim.borrow().as_ref() {
				let show_labels = show_relationship_labels.try_get_untracked().unwrap_or(true);
				let drawn = highlight.try_with_untracked(|highlight| {
					label_colors.try_with_untracked(|label_colors| {
						let style = FrameStyle {
							highlight,
							label_colors,
							show_relationship_labels: show_labels,
							time_ms,
						};
						render::render(s, &style, &ctx);
					})
				});
				if drawn.flatten().is_none() {
					return;
				}
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(cb) = animate_init.borrow().as_ref() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_snap = state.clone();
	Effect::new(move |_| {
		let snap = snapshot.get();
		if let Some(s) = state_snap.borrow_mut().as_mut() {
			let placed = s.set_snapshot(snap);
			debug!("snapshot swapped in, placed {placed} new nodes");
		}
		hover_card.set(state_snap.borrow().as_ref().and_then(CanvasState::hover_card));
	});

	let state_conn = state.clone();
	Effect::new(move |_| {
		let on = connection_mode.get();
		if let Some(s) = state_conn.borrow_mut().as_mut() {
			s.set_connection_mode(on);
			cursor.set(cursor_for(s));
		}
	});

	let state_sel = state.clone();
	Effect::new(move |_| {
		let current = selection.get();
		if let Some(s) = state_sel.borrow_mut().as_mut() {
			s.set_selection(current);
		}
	});

	on_cleanup(move || {
		running.store(false, Ordering::Relaxed);
		let Some(window) = web_sys::window() else {
			return;
		};
		listeners.try_update_value(|l| {
			for (name, cb) in l.drain(..) {
				let _ =
					window.remove_event_listener_with_callback(name, cb.as_ref().unchecked_ref());
			}
		});
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		let event = match state_md.borrow_mut().as_mut() {
			Some(s) => {
				let event = s.pointer_down(x, y);
				cursor.set(cursor_for(s));
				event
			}
			None => None,
		};
		if let Some(event) = event {
			on_select.run(event);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(s) = state_mm.borrow_mut().as_mut() {
			if s.pointer_move(x, y) {
				hover_card.set(s.hover_card());
			}
			cursor.set(cursor_for(s));
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(s) = state_mu.borrow_mut().as_mut() {
			s.pointer_up();
			cursor.set(cursor_for(s));
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(s) = state_ml.borrow_mut().as_mut() {
			s.pointer_leave();
			cursor.set(cursor_for(s));
		}
		hover_card.set(None);
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(s) = state_wh.borrow_mut().as_mut() {
			s.wheel(x, y, ev.delta_y());
		}
	};

	view! {
		<div class="graph-canvas">
			<canvas
				node_ref=canvas_ref
				class="graph-canvas-surface"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style=move || format!("display: block; cursor: {};", cursor.get())
			/>
			<div class="graph-controls">
				<button title="Zoom in" on:click=view_action(state.clone(), CanvasState::zoom_in)>
					"+"
				</button>
				<button title="Zoom out" on:click=view_action(state.clone(), CanvasState::zoom_out)>
					"-"
				</button>
				<button
					title="Reset view"
					on:click=view_action(state.clone(), CanvasState::reset_view)
				>
					"Reset"
				</button>
			</div>
			<Show when=move || connection_mode.get()>
				<div class="connection-banner">"Click a source node, then a target node"</div>
			</Show>
			{move || {
				hover_card
					.get()
					.map(|card| {
						view! {
							<div class="hover-card">
								<strong>{card.caption}</strong>
								<span class="hover-card-labels">
									{format!("({})", card.labels)}
								</span>
								<span class="hover-card-id">{format!("id: {}", card.id)}</span>
							</div>
						}
					})
			}}
		</div>
	}
}
