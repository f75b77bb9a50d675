use std::collections::{BTreeMap, HashMap, HashSet};

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

pub type NodeId = String;
pub type LinkId = String;

/// Property keys that are never treated as user properties of a node.
const RESERVED_NODE_KEYS: &[&str] = &["elementId", "id", "labels", "x", "y"];

/// A node or relationship property value. Numbers keep their JSON form so
/// integers are written back as integers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
	Null,
	Bool(bool),
	Number(Number),
	String(String),
	Array(Vec<PropertyValue>),
	Object(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
	pub fn as_str(&self) -> Option<&str> {
		match self {
			PropertyValue::String(s) => Some(s),
			_ => None,
		}
	}

	/// True for arrays made only of numbers (embeddings and similar vectors).
	pub fn is_numeric_vector(&self) -> bool {
		match self {
			PropertyValue::Array(items) => {
				!items.is_empty() && items.iter().all(|v| matches!(v, PropertyValue::Number(_)))
			}
			_ => false,
		}
	}

	/// Human readable rendering for inspectors.
	pub fn display(&self) -> String {
		match self {
			PropertyValue::Null => "null".into(),
			PropertyValue::Bool(b) => b.to_string(),
			PropertyValue::Number(n) => n.to_string(),
			PropertyValue::String(s) => s.clone(),
			PropertyValue::Array(_) | PropertyValue::Object(_) => {
				serde_json::to_string(self).unwrap_or_default()
			}
		}
	}
}

impl From<Value> for PropertyValue {
	fn from(value: Value) -> Self {
		match value {
			Value::Null => PropertyValue::Null,
			Value::Bool(b) => PropertyValue::Bool(b),
			Value::Number(n) => PropertyValue::Number(n),
			Value::String(s) => PropertyValue::String(s),
			Value::Array(items) => {
				PropertyValue::Array(items.into_iter().map(Into::into).collect())
			}
			Value::Object(map) => {
				PropertyValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
			}
		}
	}
}

pub type Properties = BTreeMap<String, PropertyValue>;

/// Normalise a JSON string or number into an identifier.
fn id_from_value(value: Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

pub(crate) fn de_id<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
	id_from_value(Value::deserialize(de)?)
		.ok_or_else(|| serde::de::Error::custom("identifier must be a string or a number"))
}

fn de_id_or_empty<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
	Ok(Option::<Value>::deserialize(de)?
		.and_then(id_from_value)
		.unwrap_or_default())
}

fn de_properties<'de, D: Deserializer<'de>>(de: D) -> Result<Properties, D::Error> {
	Ok(Option::<Properties>::deserialize(de)?.unwrap_or_default())
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Node {
	pub id: NodeId,
	pub labels: Vec<String>,
	pub properties: Properties,
}

impl TryFrom<Map<String, Value>> for Node {
	type Error = String;

	fn try_from(mut raw: Map<String, Value>) -> Result<Self, Self::Error> {
		let element_id = raw.remove("elementId").and_then(id_from_value);
		let plain_id = raw.remove("id").and_then(id_from_value);
		let id = element_id
			.or(plain_id)
			.ok_or_else(|| "node without elementId or id".to_string())?;

		let labels = match raw.remove("labels") {
			None | Some(Value::Null) => Vec::new(),
			Some(Value::Array(items)) => items
				.into_iter()
				.filter_map(|v| match v {
					Value::String(s) => Some(s),
					_ => None,
				})
				.collect(),
			Some(other) => return Err(format!("node {id}: labels must be a list, got {other}")),
		};

		let properties = raw
			.into_iter()
			.filter(|(k, _)| !RESERVED_NODE_KEYS.contains(&k.as_str()))
			.map(|(k, v)| (k, v.into()))
			.collect();

		Ok(Self {
			id,
			labels,
			properties,
		})
	}
}

impl Node {
	pub fn new(id: impl Into<NodeId>, labels: &[&str]) -> Self {
		Self {
			id: id.into(),
			labels: labels.iter().map(|l| l.to_string()).collect(),
			properties: Properties::new(),
		}
	}

	pub fn with_property(mut self, key: &str, value: PropertyValue) -> Self {
		self.properties.insert(key.into(), value);
		self
	}

	/// First label, used for layout clustering and default coloring.
	pub fn primary_label(&self) -> Option<&str> {
		self.labels.first().map(String::as_str)
	}

	/// The `nombre` property, falling back to `name`.
	pub fn display_name(&self) -> Option<&str> {
		["nombre", "name"]
			.iter()
			.find_map(|key| self.properties.get(*key).and_then(PropertyValue::as_str))
	}

	pub fn caption(&self) -> String {
		self.display_name()
			.map(str::to_string)
			.unwrap_or_else(|| format!("Node {}", self.id))
	}

	pub fn label_text(&self) -> String {
		self.labels.join(":")
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Link {
	#[serde(default, deserialize_with = "de_id_or_empty")]
	pub id: LinkId,
	#[serde(deserialize_with = "de_id")]
	pub source: NodeId,
	#[serde(deserialize_with = "de_id")]
	pub target: NodeId,
	#[serde(rename = "type", default)]
	pub rel_type: String,
	#[serde(default, deserialize_with = "de_properties")]
	pub properties: Properties,
	/// The id was assigned on load and names nothing in the database.
	#[serde(skip)]
	pub synthetic: bool,
}

impl Link {
	pub fn new(id: &str, source: &str, target: &str, rel_type: &str) -> Self {
		Self {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			rel_type: rel_type.into(),
			properties: Properties::new(),
			synthetic: false,
		}
	}

	pub fn touches(&self, node: &str) -> bool {
		self.source == node || self.target == node
	}
}

#[derive(Deserialize)]
struct WireGraph {
	#[serde(default)]
	nodes: Vec<Node>,
	#[serde(default)]
	links: Vec<Link>,
}

/// Immutable node and link set as last fetched from the collaborator.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "WireGraph")]
pub struct GraphSnapshot {
	nodes: Vec<Node>,
	links: Vec<Link>,
	index: HashMap<NodeId, usize>,
}

impl From<WireGraph> for GraphSnapshot {
	fn from(wire: WireGraph) -> Self {
		Self::new(wire.nodes, wire.links)
	}
}

impl GraphSnapshot {
	pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
		let mut index = HashMap::with_capacity(nodes.len());
		let mut unique = Vec::with_capacity(nodes.len());
		for node in nodes {
			if index.contains_key(&node.id) {
				warn!("dropping duplicate node id {}", node.id);
				continue;
			}
			index.insert(node.id.clone(), unique.len());
			unique.push(node);
		}

		let mut seen_links = HashSet::new();
		let links = links
			.into_iter()
			.enumerate()
			.map(|(i, mut link)| {
				if link.id.is_empty() || !seen_links.insert(link.id.clone()) {
					link.id = format!("link-{i}");
					link.synthetic = true;
				}
				link
			})
			.collect();

		Self {
			nodes: unique,
			links,
			index,
		}
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn links(&self) -> &[Link] {
		&self.links
	}

	pub fn node(&self, id: &str) -> Option<&Node> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	pub fn link(&self, id: &str) -> Option<&Link> {
		self.links.iter().find(|l| l.id == id)
	}

	pub fn contains(&self, id: &str) -> bool {
		self.index.contains_key(id)
	}

	pub fn incident_links<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
		self.links.iter().filter(move |l| l.touches(node))
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

impl Position {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Node id to world coordinates. The only layout state kept across snapshot refreshes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionMap(HashMap<NodeId, Position>);

impl PositionMap {
	pub fn get(&self, id: &str) -> Option<Position> {
		self.0.get(id).copied()
	}

	pub fn contains(&self, id: &str) -> bool {
		self.0.contains_key(id)
	}

	pub fn insert(&mut self, id: impl Into<NodeId>, pos: Position) {
		self.0.insert(id.into(), pos);
	}

	/// Moves a known node; unknown ids are ignored.
	pub fn translate(&mut self, id: &str, dx: f64, dy: f64) -> bool {
		match self.0.get_mut(id) {
			Some(pos) => {
				pos.x += dx;
				pos.y += dy;
				true
			}
			None => false,
		}
	}
}
