use leptos::prelude::*;

use crate::chat::{ChatLog, Sender};

#[component]
pub fn ChatPanel(
	#[prop(into)] log: Signal<ChatLog>,
	#[prop(into)] connected: Signal<bool>,
	#[prop(into)] on_send: Callback<String>,
	#[prop(into)] on_reconnect: Callback<()>,
) -> impl IntoView {
	let draft = RwSignal::new(String::new());

	let send = move || {
		let text = draft.get_untracked();
		if !text.trim().is_empty() {
			on_send.run(text);
			draft.set(String::new());
		}
	};

	view! {
		<aside class="chat-panel">
			<header class="chat-header">
				<span class=move || {
					if connected.get() { "status online" } else { "status offline" }
				}>
					{move || if connected.get() { "Connected" } else { "Disconnected" }}
				</span>
				<Show when=move || !connected.get()>
					<button on:click=move |_| on_reconnect.run(())>"Reconnect"</button>
				</Show>
			</header>
			<div class="chat-messages">
				{move || {
					log.with(|log| {
						log.messages()
							.iter()
							.map(|m| {
								let class = match m.sender {
									Sender::User => "chat-message user",
									Sender::Assistant => "chat-message assistant",
								};
								view! { <div class=class>{m.content.clone()}</div> }
							})
							.collect_view()
					})
				}}
			</div>
			<form
				class="chat-input"
				on:submit=move |ev| {
					ev.prevent_default();
					send();
				}
			>
				<textarea
					placeholder="Ask about the graph"
					prop:value=move || draft.get()
					on:input=move |ev| draft.set(event_target_value(&ev))
					on:keydown=move |ev| {
						if ev.key() == "Enter" && !ev.shift_key() {
							ev.prevent_default();
							send();
						}
					}
				/>
				<button type="submit">"Send"</button>
			</form>
		</aside>
	}
}
