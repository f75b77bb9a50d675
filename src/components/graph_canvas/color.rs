use std::collections::HashMap;

use super::types::GraphSnapshot;

/// Fill for nodes whose primary label has no mapped color.
pub const DEFAULT_NODE_COLOR: &str = "#8B5CF6";
const DEFAULT_RGB: (u8, u8, u8) = (139, 92, 246);

pub const LABEL_PALETTE: &[&str] = &[
	"#9b87f5", "#F57DBD", "#7DF57D", "#F5D67D", "#7DD6F5", "#D67DF5", "#F57D7D", "#7DF5D6",
	"#D6F57D", "#7D7DF5",
];

/// Rotating colors for highlight rounds.
pub const HIGHLIGHT_PALETTE: &[&str] = &["yellow", "green", "blue", "red", "purple"];

fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
	let hex = color.strip_prefix('#')?;
	if hex.len() < 6 || !hex.is_ascii() {
		return None;
	}
	let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
	Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Adds `amount` to every channel, clamped to 255. Malformed input brightens the default violet.
pub fn brighten(color: &str, amount: u8) -> String {
	let (r, g, b) = parse_hex(color).unwrap_or(DEFAULT_RGB);
	format!(
		"#{:02x}{:02x}{:02x}",
		r.saturating_add(amount),
		g.saturating_add(amount),
		b.saturating_add(amount)
	)
}

/// `rgba(...)` form of `color`. Malformed input yields the default violet at `alpha`.
pub fn transparent(color: &str, alpha: f64) -> String {
	let (r, g, b) = parse_hex(color).unwrap_or(DEFAULT_RGB);
	format!("rgba({r}, {g}, {b}, {alpha})")
}

/// Label to fill color, assigned from [`LABEL_PALETTE`] in first-seen order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelColors(HashMap<String, String>);

impl LabelColors {
	pub fn from_snapshot(snapshot: &GraphSnapshot) -> Self {
		let mut map = HashMap::new();
		for label in snapshot.nodes().iter().flat_map(|n| n.labels.iter()) {
			if !map.contains_key(label) {
				let color = LABEL_PALETTE[map.len() % LABEL_PALETTE.len()];
				map.insert(label.clone(), color.to_string());
			}
		}
		Self(map)
	}

	/// Fill for a node given its primary label.
	pub fn fill_for(&self, primary_label: Option<&str>) -> &str {
		primary_label
			.and_then(|l| self.0.get(l))
			.map(String::as_str)
			.unwrap_or(DEFAULT_NODE_COLOR)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_canvas::types::Node;

	#[test]
	fn brighten_clamps_channels() {
		assert_eq!(brighten("#8B5CF6", 40), "#b384ff");
		assert_eq!(brighten("#ffffff", 25), "#ffffff");
	}

	#[test]
	fn malformed_colors_use_fallback() {
		assert_eq!(brighten("violet", 0), "#8b5cf6");
		assert_eq!(brighten("#12", 10), "#9566ff");
		assert_eq!(brighten("#zz0000", 0), "#8b5cf6");
		assert_eq!(transparent("#ab", 0.2), "rgba(139, 92, 246, 0.2)");
		assert_eq!(brighten("#1é2345", 10), "#9566ff");
		assert_eq!(transparent("#ffé0000", 1.0), "rgba(139, 92, 246, 1)");
		assert_eq!(transparent("#ff0000", 0.5), "rgba(255, 0, 0, 0.5)");
	}

	#[test]
	fn labels_get_palette_colors_in_order() {
		let snap = GraphSnapshot::new(
			vec![Node::new("1", &["Person", "Actor"]), Node::new("2", &["City"])],
			vec![],
		);
		let colors = LabelColors::from_snapshot(&snap);
		assert_eq!(colors.fill_for(Some("Person")), LABEL_PALETTE[0]);
		assert_eq!(colors.fill_for(Some("Actor")), LABEL_PALETTE[1]);
		assert_eq!(colors.fill_for(Some("City")), LABEL_PALETTE[2]);
		assert_eq!(colors.fill_for(Some("Unknown")), DEFAULT_NODE_COLOR);
		assert_eq!(colors.fill_for(None), DEFAULT_NODE_COLOR);
	}
}
