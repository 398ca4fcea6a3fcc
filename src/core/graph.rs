/// Graph store and story book loading.
///
/// A [`StoryGraph`] is built once per spreadsheet load and never mutated;
/// a reload builds a fresh one and replaces the old one whole.

use rustc_hash::FxHashMap;

use crate::core::metadata_sheet::{is_layout_ambiguous, map_metadata_rows};
use crate::core::observer::{StoryEvent, StoryObserver};
use crate::core::story_sheet::map_story_rows;
use crate::core::tabular;
use crate::error::SheetError;
use crate::schema::metadata::Metadata;
use crate::schema::node::StoryNode;

/// Lookup table from node id to node.
#[derive(Debug, Clone, Default)]
pub struct StoryGraph {
    nodes: FxHashMap<String, StoryNode>,
    /// Node ids in sheet order, first occurrence.
    order: Vec<String>,
}

impl StoryGraph {
    /// Build a graph from mapped nodes. Returns the ids that appeared more
    /// than once; for those the later row replaces the earlier one.
    pub fn build(nodes: Vec<StoryNode>) -> (Self, Vec<String>) {
        let mut graph = StoryGraph::default();
        let mut duplicates = Vec::new();
        for node in nodes {
            let id = node.node_id.clone();
            if graph.nodes.insert(id.clone(), node).is_some() {
                duplicates.push(id);
            } else {
                graph.order.push(id);
            }
        }
        (graph, duplicates)
    }

    pub fn get(&self, node_id: &str) -> Option<&StoryNode> {
        self.nodes.get(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node from the first data row, if any.
    pub fn first_node_id(&self) -> Option<&str> {
        self.order.first().map(String::as_str)
    }

    /// Nodes in sheet order.
    pub fn iter(&self) -> impl Iterator<Item = &StoryNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }
}

/// A fully loaded, validated story: graph plus metadata with a start node
/// that is guaranteed to resolve.
#[derive(Debug, Clone)]
pub struct StoryBook {
    graph: StoryGraph,
    metadata: Metadata,
    start_node: String,
}

impl StoryBook {
    /// Parse and validate both tabs. All-or-nothing: on error nothing is
    /// returned.
    pub fn from_csv(
        story_text: &str,
        metadata_text: &str,
        observer: &mut dyn StoryObserver,
    ) -> Result<Self, SheetError> {
        let story_rows = tabular::parse(story_text);
        let metadata_rows = tabular::parse(metadata_text);

        let nodes = map_story_rows(&story_rows)?;
        if is_layout_ambiguous(&metadata_rows) {
            observer.on_event(&StoryEvent::AmbiguousMetadataLayout);
        }
        let metadata = map_metadata_rows(&metadata_rows)?;

        Self::assemble(nodes, metadata, observer)
    }

    /// Validate already-mapped parts. The start node defaults to the first
    /// node when the metadata omits it.
    pub fn assemble(
        nodes: Vec<StoryNode>,
        mut metadata: Metadata,
        observer: &mut dyn StoryObserver,
    ) -> Result<Self, SheetError> {
        let (graph, duplicates) = StoryGraph::build(nodes);
        for node_id in duplicates {
            observer.on_event(&StoryEvent::DuplicateNode { node_id });
        }

        let start_node = match metadata.start_node.clone() {
            Some(id) => id,
            None => {
                let first = graph.first_node_id().ok_or(SheetError::EmptyStory)?.to_string();
                observer.on_event(&StoryEvent::StartNodeDefaulted {
                    node_id: first.clone(),
                });
                metadata.start_node = Some(first.clone());
                first
            }
        };
        if !graph.contains(&start_node) {
            return Err(SheetError::UnknownStartNode(start_node));
        }

        observer.on_event(&StoryEvent::SheetLoaded {
            title: metadata.title.clone(),
            nodes: graph.len(),
            start_node: start_node.clone(),
        });

        Ok(Self {
            graph,
            metadata,
            start_node,
        })
    }

    pub fn graph(&self) -> &StoryGraph {
        &self.graph
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn start_node(&self) -> &str {
        &self.start_node
    }

    pub fn node(&self, node_id: &str) -> Option<&StoryNode> {
        self.graph.get(node_id)
    }
}
