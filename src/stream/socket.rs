use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

use crate::error::EditorError;

/// What the connection reports to its owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamSignal {
	Opened,
	Message(String),
	Closed,
}

type Handler = Rc<RefCell<Box<dyn FnMut(StreamSignal)>>>;

/// Closures kept alive for as long as they are attached to the socket.
struct Listeners {
	on_open: Closure<dyn FnMut(Event)>,
	on_message: Closure<dyn FnMut(MessageEvent)>,
	on_close: Closure<dyn FnMut(CloseEvent)>,
	on_error: Closure<dyn FnMut(Event)>,
}

/// One websocket to the event stream, owned by whoever mounted it.
pub struct StreamConnection {
	url: String,
	socket: Option<WebSocket>,
	listeners: Option<Listeners>,
}

impl StreamConnection {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			socket: None,
			listeners: None,
		}
	}

	fn is_live(&self) -> bool {
		self.socket.as_ref().is_some_and(|s| {
			matches!(s.ready_state(), WebSocket::CONNECTING | WebSocket::OPEN)
		})
	}

	/// Opens the socket unless one is already connecting or open.
	pub fn connect(
		&mut self,
		handler: impl FnMut(StreamSignal) + 'static,
	) -> Result<(), EditorError> {
		if self.is_live() {
			return Ok(());
		}
		self.close();

		let socket = WebSocket::new(&self.url)
			.map_err(|e| EditorError::Network(format!("opening {}: {e:?}", self.url)))?;
		let boxed: Box<dyn FnMut(StreamSignal)> = Box::new(handler);
		let handler: Handler = Rc::new(RefCell::new(boxed));

		let (h_open, h_msg, h_close) = (handler.clone(), handler.clone(), handler);
		let url = self.url.clone();
		let listeners = Listeners {
			on_open: Closure::new(move |_: Event| {
				info!("event stream connected to {url}");
				(*h_open.borrow_mut())(StreamSignal::Opened);
			}),
			on_message: Closure::new(move |ev: MessageEvent| match ev.data().as_string() {
				Some(text) => (*h_msg.borrow_mut())(StreamSignal::Message(text)),
				None => debug!("ignoring non-text stream frame"),
			}),
			on_close: Closure::new(move |ev: CloseEvent| {
				info!("event stream closed (code {})", ev.code());
				(*h_close.borrow_mut())(StreamSignal::Closed);
			}),
			on_error: Closure::new(move |_: Event| {
				warn!("event stream error");
			}),
		};
		socket.set_onopen(Some(listeners.on_open.as_ref().unchecked_ref()));
		socket.set_onmessage(Some(listeners.on_message.as_ref().unchecked_ref()));
		socket.set_onclose(Some(listeners.on_close.as_ref().unchecked_ref()));
		socket.set_onerror(Some(listeners.on_error.as_ref().unchecked_ref()));

		self.socket = Some(socket);
		self.listeners = Some(listeners);
		Ok(())
	}

	/// Writes a raw text frame.
	pub fn send(&self, text: &str) -> Result<(), EditorError> {
		match &self.socket {
			Some(socket) if socket.ready_state() == WebSocket::OPEN => socket
				.send_with_str(text)
				.map_err(|e| EditorError::Network(format!("sending frame: {e:?}"))),
			_ => Err(EditorError::Disconnected),
		}
	}

	/// Detaches handlers and closes the socket. Safe to call repeatedly.
	pub fn close(&mut self) {
		if let Some(socket) = self.socket.take() {
			socket.set_onopen(None);
			socket.set_onmessage(None);
			socket.set_onclose(None);
			socket.set_onerror(None);
			if socket.ready_state() != WebSocket::CLOSED {
				let _ = socket.close();
			}
			debug!("event stream to {} closed locally", self.url);
		}
		self.listeners = None;
	}
}

impl Drop for StreamConnection {
	fn drop(&mut self) {
		self.close();
	}
}
