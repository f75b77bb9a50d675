pub mod chat_panel;
pub mod graph_canvas;
pub mod inspector;
pub mod notices;
