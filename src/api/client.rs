use log::debug;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::Serialize;
use serde_json::{Map, Value, json};

use super::{GraphWriter, NodePayload, RelationLookup, RelationshipPayload};
use crate::components::graph_canvas::{GraphSnapshot, Node, NodeId, Properties};
use crate::error::EditorError;

/// Thin client for the graph REST collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiClient {
	base_url: String,
}

/// Body of `POST /api/post`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryRequest {
	pub query: String,
	#[serde(skip_serializing_if = "Map::is_empty")]
	pub params: Map<String, Value>,
}

/// `[A-Za-z_][A-Za-z0-9_]*`, the only relationship type names we splice into a query.
pub fn is_safe_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	chars
		.next()
		.is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
		&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Match clause for an element plus its parameter: numeric ids use `id()`,
/// anything else is treated as an `elementId()`.
fn id_match(var: &str, id: &str) -> (String, Value) {
	match id.parse::<i64>() {
		Ok(n) => (format!("id({var}) = $id"), json!(n)),
		Err(_) => (format!("elementId({var}) = $id"), json!(id)),
	}
}

fn with_id(query: String, id: Value) -> QueryRequest {
	let mut params = Map::new();
	params.insert("id".into(), id);
	QueryRequest { query, params }
}

pub fn delete_node_query(id: &str) -> QueryRequest {
	let (clause, param) = id_match("n", id);
	with_id(format!("MATCH (n) WHERE {clause} DETACH DELETE n"), param)
}

pub fn delete_relationship_query(id: &str) -> QueryRequest {
	let (clause, param) = id_match("r", id);
	with_id(format!("MATCH ()-[r]->() WHERE {clause} DELETE r"), param)
}

/// Replaces relationship `id` with one of `new_type`, keeping endpoints and properties.
pub fn retype_relationship_query(id: &str, new_type: &str) -> Result<QueryRequest, EditorError> {
	let new_type = new_type.trim();
	if !is_safe_identifier(new_type) {
		return Err(EditorError::Validation(format!(
			"relationship type {new_type:?} must be letters, digits or underscores"
		)));
	}
	let (clause, param) = id_match("r", id);
	Ok(with_id(
		format!(
			"MATCH (a)-[r]->(b) WHERE {clause} \
			 CREATE (a)-[r2:`{new_type}`]->(b) SET r2 = properties(r) DELETE r"
		),
		param,
	))
}

/// Merges `changes` into relationship `id`. A `Null` value removes that property.
pub fn merge_relationship_properties_query(
	id: &str,
	changes: &Properties,
) -> Result<QueryRequest, EditorError> {
	let (clause, param) = id_match("r", id);
	let mut request = with_id(format!("MATCH ()-[r]->() WHERE {clause} SET r += $props"), param);
	request.params.insert("props".into(), serde_json::to_value(changes)?);
	Ok(request)
}

/// Turns an `{error}` body into [`EditorError::Api`].
fn reject_error_body(body: Value) -> Result<Value, EditorError> {
	match body.get("error") {
		None | Some(Value::Null) => Ok(body),
		Some(Value::String(msg)) => Err(EditorError::Api(msg.clone())),
		Some(other) => Err(EditorError::Api(other.to_string())),
	}
}

fn element_id(body: &Value) -> Option<NodeId> {
	match body.get("elementId")? {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

impl ApiClient {
	pub fn new(base_url: &str) -> Self {
		Self {
			base_url: base_url.trim_end_matches('/').to_string(),
		}
	}

	fn endpoint(&self, segments: &[&str]) -> Result<Url, EditorError> {
		let mut url = Url::parse(&self.base_url)
			.map_err(|e| EditorError::Validation(format!("invalid API base url: {e}")))?;
		url.path_segments_mut()
			.map_err(|_| EditorError::Validation("API base url cannot carry a path".into()))?
			.pop_if_empty()
			.extend(segments);
		Ok(url)
	}

	fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, EditorError> {
		let url = self.endpoint(segments)?;
		debug!("{method} {url}");
		Ok(Client::new().request(method, url))
	}

	async fn send(&self, request: RequestBuilder) -> Result<Value, EditorError> {
		let response = request.send().await?;
		let status = response.status();
		let text = response.text().await?;
		let body = if text.trim().is_empty() {
			Value::Null
		} else {
			match serde_json::from_str(&text) {
				Ok(body) => body,
				Err(_) if !status.is_success() => Value::Null,
				Err(e) => return Err(e.into()),
			}
		};
		if !status.is_success() {
			return match reject_error_body(body) {
				Err(err) => Err(err),
				Ok(_) => Err(EditorError::Network(format!("HTTP {status}"))),
			};
		}
		reject_error_body(body)
	}

	/// `GET /api/graph-data`
	pub async fn fetch_graph(&self) -> Result<GraphSnapshot, EditorError> {
		let body = self.send(self.request(Method::GET, &["api", "graph-data"])?).await?;
		Ok(serde_json::from_value(body)?)
	}

	/// `PUT /api/nodes/{id}`
	pub async fn update_node(&self, id: &str, node: &NodePayload) -> Result<(), EditorError> {
		self.send(self.request(Method::PUT, &["api", "nodes", id])?.json(node))
			.await
			.map(drop)
	}

	/// `DELETE /api/nodes/{id}/properties/{key}`
	pub async fn delete_node_property(&self, id: &str, key: &str) -> Result<(), EditorError> {
		self.send(self.request(Method::DELETE, &["api", "nodes", id, "properties", key])?)
			.await
			.map(drop)
	}

	/// `POST /api/post`
	pub async fn run_query(&self, query: &QueryRequest) -> Result<Value, EditorError> {
		self.send(self.request(Method::POST, &["api", "post"])?.json(query))
			.await
	}

	pub async fn delete_node(&self, id: &str) -> Result<(), EditorError> {
		self.run_query(&delete_node_query(id)).await.map(drop)
	}

	pub async fn delete_relationship(&self, id: &str) -> Result<(), EditorError> {
		self.run_query(&delete_relationship_query(id)).await.map(drop)
	}

	pub async fn update_relationship_type(
		&self,
		id: &str,
		new_type: &str,
	) -> Result<(), EditorError> {
		self.run_query(&retype_relationship_query(id, new_type)?)
			.await
			.map(drop)
	}

	pub async fn update_relationship_properties(
		&self,
		id: &str,
		changes: &Properties,
	) -> Result<(), EditorError> {
		self.run_query(&merge_relationship_properties_query(id, changes)?)
			.await
			.map(drop)
	}
}

impl RelationLookup for ApiClient {
	/// `GET /api/graph-data/por-relacion/{type}`
	async fn nodes_by_relation(&self, rel_type: &str) -> Result<Vec<NodeId>, EditorError> {
		#[derive(serde::Deserialize)]
		struct Incident {
			nodes: Vec<Node>,
		}
		let body = self
			.send(self.request(Method::GET, &["api", "graph-data", "por-relacion", rel_type])?)
			.await?;
		let incident: Incident = serde_json::from_value(body)?;
		Ok(incident.nodes.into_iter().map(|n| n.id).collect())
	}
}

impl GraphWriter for ApiClient {
	/// `POST /api/nodes`
	async fn create_node(&self, node: &NodePayload) -> Result<NodeId, EditorError> {
		let body = self
			.send(self.request(Method::POST, &["api", "nodes"])?.json(node))
			.await?;
		element_id(&body)
			.ok_or_else(|| EditorError::Api("node created without an elementId".into()))
	}

	/// `POST /api/relationships`
	async fn create_relationship(&self, rel: &RelationshipPayload) -> Result<(), EditorError> {
		self.send(self.request(Method::POST, &["api", "relationships"])?.json(rel))
			.await
			.map(drop)
	}
}
