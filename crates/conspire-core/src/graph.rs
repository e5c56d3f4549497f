//! Graph documents: the nodes, edges and groups of a single board.
//!
//! A board's graph is persisted as one [`GraphSnapshot`] and overwritten
//! wholesale on every save. Node styling and position live in an opaque
//! `style` bag that persistence carries verbatim.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::{Error, Result, asset::AssetId};

/// Free-form JSON object carried through persistence untouched.
pub type Bag = Map<String, Value>;

// ─── Node kinds ──────────────────────────────────────────────────────────────

/// A person, organisation or any other thing on the board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityNode {
  #[serde(default)]
  pub name:  String,
  /// Free-form type tag, e.g. "person" or "shell company".
  #[serde(default, rename = "type")]
  pub tag:   String,
  #[serde(default)]
  pub icon:  String,
  #[serde(default)]
  pub notes: String,
}

/// A link to something on the web.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebReference {
  pub url:      String,
  #[serde(default)]
  pub mimetype: String,
}

/// The region of a source image shown by a node, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Crop {
  pub x0:     f64,
  pub y0:     f64,
  pub width:  f64,
  pub height: f64,
}

/// An image backed by an [`Asset`](crate::asset::Asset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageNode {
  pub source_id: AssetId,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name:      Option<String>,
  #[serde(default)]
  pub mimetype:  String,
  /// Present when this node shows a sub-region of its source image.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub crop:      Option<Crop>,
}

/// The variant part of a [`Node`]; persisted with a `"kind"` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
  Entity(EntityNode),
  WebReference(WebReference),
  Image(ImageNode),
}

impl NodeKind {
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::Entity(_) => "entity",
      Self::WebReference(_) => "web_reference",
      Self::Image(_) => "image",
    }
  }
}

// ─── Graph elements ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub id:    Uuid,
  #[serde(flatten)]
  pub kind:  NodeKind,
  #[serde(default, skip_serializing_if = "Map::is_empty")]
  pub style: Bag,
}

impl Node {
  pub fn new(kind: NodeKind) -> Self {
    Self { id: Uuid::new_v4(), kind, style: Bag::new() }
  }

  pub fn entity(name: impl Into<String>, tag: impl Into<String>) -> Self {
    Self::new(NodeKind::Entity(EntityNode {
      name: name.into(),
      tag: tag.into(),
      icon: "👤".into(),
      notes: String::new(),
    }))
  }

  pub fn web_reference(url: impl Into<String>, mimetype: impl Into<String>) -> Self {
    Self::new(NodeKind::WebReference(WebReference {
      url:      url.into(),
      mimetype: mimetype.into(),
    }))
  }

  pub fn image(source_id: AssetId, name: Option<String>, mimetype: impl Into<String>) -> Self {
    Self::new(NodeKind::Image(ImageNode {
      source_id,
      name,
      mimetype: mimetype.into(),
      crop: None,
    }))
  }

  /// The asset this node draws from, if it is an image.
  pub fn asset_ref(&self) -> Option<&AssetId> {
    match &self.kind {
      NodeKind::Image(img) => Some(&img.source_id),
      _ => None,
    }
  }
}

/// A directed relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:     Option<String>,
  pub source: Uuid,
  pub target: Uuid,
  #[serde(default, skip_serializing_if = "Map::is_empty")]
  pub data:   Bag,
}

impl Edge {
  pub fn new(source: Uuid, target: Uuid) -> Self {
    Self { id: None, source, target, data: Bag::new() }
  }
}

/// A visual grouping of nodes. Opaque to persistence beyond its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
  pub id:    String,
  #[serde(default, skip_serializing_if = "Map::is_empty")]
  pub style: Bag,
  #[serde(default, skip_serializing_if = "Map::is_empty")]
  pub data:  Bag,
}

// ─── Graph document ──────────────────────────────────────────────────────────

/// The complete node/edge/group state of one board.
///
/// Serialises as `{"nodes": [...], "edges": [...], "combos": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
  #[serde(default)]
  pub nodes:  Vec<Node>,
  #[serde(default)]
  pub edges:  Vec<Edge>,
  #[serde(default, rename = "combos")]
  pub groups: Vec<Group>,
}

impl GraphData {
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty() && self.edges.is_empty() && self.groups.is_empty()
  }

  pub fn node(&self, id: Uuid) -> Option<&Node> { self.nodes.iter().find(|n| n.id == id) }

  /// The live reference set: every distinct asset id drawn by an image node.
  pub fn asset_refs(&self) -> BTreeSet<AssetId> {
    self.nodes.iter().filter_map(Node::asset_ref).cloned().collect()
  }

  /// Edges whose source or target is not among the nodes.
  pub fn dangling_edges(&self) -> Vec<&Edge> {
    let ids: HashSet<Uuid> = self.nodes.iter().map(|n| n.id).collect();
    self
      .edges
      .iter()
      .filter(|e| !ids.contains(&e.source) || !ids.contains(&e.target))
      .collect()
  }

  /// Insert `node`, replacing any existing node with the same id in place.
  pub fn upsert_node(&mut self, node: Node) {
    match self.nodes.iter_mut().find(|n| n.id == node.id) {
      Some(existing) => *existing = node,
      None => self.nodes.push(node),
    }
  }

  /// Connect two existing nodes.
  pub fn add_edge(&mut self, source: Uuid, target: Uuid) -> Result<()> {
    for id in [source, target] {
      if self.node(id).is_none() {
        return Err(Error::NodeNotFound(id));
      }
    }
    self.edges.push(Edge::new(source, target));
    Ok(())
  }

  /// Remove a node together with every edge touching it.
  pub fn remove_node(&mut self, id: Uuid) -> Option<Node> {
    let pos = self.nodes.iter().position(|n| n.id == id)?;
    self.edges.retain(|e| e.source != id && e.target != id);
    Some(self.nodes.remove(pos))
  }

  /// Cut a region out of an image node.
  ///
  /// `crop` is relative to what the parent shows, so the new node's origin
  /// is offset by the parent's own crop. The new node references the same
  /// asset and is linked from the parent. Returns the new node's id.
  pub fn extract_crop(&mut self, parent: Uuid, crop: Crop) -> Result<Uuid> {
    if !(crop.width > 0.0 && crop.height > 0.0) {
      return Err(Error::InvalidCrop);
    }

    let image = match self.node(parent).map(|n| &n.kind) {
      Some(NodeKind::Image(img)) => img.clone(),
      Some(_) => return Err(Error::NotAnImage(parent)),
      None => return Err(Error::NodeNotFound(parent)),
    };

    let (base_x, base_y) = image.crop.map(|c| (c.x0, c.y0)).unwrap_or((0.0, 0.0));
    let mut node = Node::new(NodeKind::Image(ImageNode {
      source_id: image.source_id,
      name:      None,
      mimetype:  image.mimetype,
      crop:      Some(Crop {
        x0:     base_x + crop.x0,
        y0:     base_y + crop.y0,
        width:  crop.width,
        height: crop.height,
      }),
    }));
    node.style.insert("size".into(), json!([crop.width, crop.height]));

    let id = node.id;
    self.nodes.push(node);
    self.edges.push(Edge::new(parent, id));
    Ok(id)
  }
}

/// The stored form of a board's graph, keyed by the owning conspiracy's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
  pub id:   Uuid,
  pub data: GraphData,
}

impl GraphSnapshot {
  pub fn empty(id: Uuid) -> Self { Self { id, data: GraphData::default() } }
}
