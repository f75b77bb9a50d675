//! Transient toasts. Errors never take the page down; they end up here.

use std::time::Duration;

use leptos::prelude::*;
use log::{error, info, warn};

use crate::error::EditorError;

const NOTICE_TTL: Duration = Duration::from_secs(4);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
	Info,
	Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
	id: u64,
	pub kind: NoticeKind,
	pub text: String,
}

/// Handle to the notice list, provided through context by the app root.
#[derive(Clone, Copy)]
pub struct Notices {
	list: RwSignal<Vec<Notice>>,
	next_id: StoredValue<u64>,
}

impl Notices {
	pub fn new() -> Self {
		Self {
			list: RwSignal::new(Vec::new()),
			next_id: StoredValue::new(0),
		}
	}

	pub fn info(&self, text: impl Into<String>) {
		let text = text.into();
		info!("{text}");
		self.push(NoticeKind::Info, text);
	}

	pub fn error(&self, err: &EditorError) {
		match err {
			EditorError::Network(_) => error!("{err}"),
			_ => warn!("{err}"),
		}
		self.push(NoticeKind::Error, err.to_string());
	}

	fn push(&self, kind: NoticeKind, text: String) {
		let Some(id) = self.next_id.try_update_value(|n| {
			*n += 1;
			*n
		}) else {
			return;
		};
		self.list.update(|l| l.push(Notice { id, kind, text }));
		let list = self.list;
		set_timeout(
			move || {
				list.try_update(|l| l.retain(|n| n.id != id));
			},
			NOTICE_TTL,
		);
	}

	fn dismiss(&self, id: u64) {
		self.list.update(|l| l.retain(|n| n.id != id));
	}
}

impl Default for Notices {
	fn default() -> Self {
		Self::new()
	}
}

/// Renders the notice stack from the [`Notices`] in context.
#[component]
pub fn NoticeTray() -> impl IntoView {
	let notices = expect_context::<Notices>();

	view! {
		<div class="notice-tray">
			<For
				each=move || notices.list.get()
				key=|n| n.id
				children=move |n| {
					let class = match n.kind {
						NoticeKind::Info => "notice notice-info",
						NoticeKind::Error => "notice notice-error",
					};
					let id = n.id;
					view! {
						<div class=class on:click=move |_| notices.dismiss(id)>
							{n.text}
						</div>
					}
				}
			/>
		</div>
	}
}
