use std::collections::HashMap;

/// Index of a node within a [`Tree`]'s arena. Stable across grafts: new nodes are
/// appended, existing indices are never reused or invalidated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub title: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub attrs: HashMap<String, String>,
    /// Length of the branch connecting this node to its parent; 0.0 for the root.
    pub branch_length: f64,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena-backed rooted tree. The root is always `NodeId(0)`.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<Node>,
    by_name: HashMap<String, NodeId>,
    postorder: Vec<NodeId>,
    preorder: Vec<NodeId>,
}

impl Tree {
    /// Build a tree from nodes already laid out with correct parent/children
    /// links; `nodes[0]` must be the root.
    pub fn new(nodes: Vec<Node>) -> Self {
        let by_name = nodes.iter().map(|n| (n.title.clone(), n.id)).collect();
        let mut tree = Tree {
            nodes,
            by_name,
            postorder: Vec::new(),
            preorder: Vec::new(),
        };
        tree.rebuild_orders();
        tree
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn postorder(&self) -> &[NodeId] {
        &self.postorder
    }

    pub fn preorder(&self) -> &[NodeId] {
        &self.preorder
    }

    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|n| n.is_leaf())
            .map(|n| n.id)
    }

    pub fn internals(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|n| !n.is_leaf())
            .map(|n| n.id)
    }

    /// All leaf descendants of `root`, in subtree preorder.
    pub fn leaf_descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut stack = vec![root];
        let mut out = Vec::new();
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if node.is_leaf() {
                out.push(id);
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// Append a new leaf node as a child of `parent`, returning its id.
    pub fn add_child(&mut self, parent: NodeId, title: String, branch_length: f64) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            title: title.clone(),
            parent: Some(parent),
            children: Vec::new(),
            attrs: HashMap::new(),
            branch_length,
        });
        self.nodes[parent.0].children.push(id);
        self.by_name.insert(title, id);
        id
    }

    /// Recompute the cached traversal orders. Must be called after any graft
    /// before the next traversal-dependent pass runs.
    pub fn rebuild_orders(&mut self) {
        self.postorder.clear();
        self.preorder.clear();
        if self.nodes.is_empty() {
            return;
        }
        self.preorder_from(self.root(), &mut Vec::new());
        self.postorder_from(self.root(), &mut Vec::new());
    }

    fn preorder_from(&mut self, root: NodeId, _scratch: &mut Vec<NodeId>) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            self.preorder.push(id);
            let children = &self.node(id).children;
            stack.extend(children.iter().rev());
        }
    }

    fn postorder_from(&mut self, root: NodeId, _scratch: &mut Vec<NodeId>) {
        // Two-stack postorder: reverse of a modified preorder that visits
        // children left-to-right.
        let mut stack = vec![root];
        let mut order = Vec::new();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter());
        }
        order.reverse();
        self.postorder = order;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: usize, title: &str, parent: usize) -> Node {
        Node {
            id: NodeId(id),
            title: title.to_string(),
            parent: Some(NodeId(parent)),
            children: vec![],
            attrs: HashMap::new(),
            branch_length: 0.1,
        }
    }

    fn small_tree() -> Tree {
        // root(0) -> [internal(1) -> [leaf(2), leaf(3)], leaf(4)]
        let nodes = vec![
            Node {
                id: NodeId(0),
                title: "root".into(),
                parent: None,
                children: vec![NodeId(1), NodeId(4)],
                attrs: HashMap::new(),
                branch_length: 0.0,
            },
            Node {
                id: NodeId(1),
                title: "internal".into(),
                parent: Some(NodeId(0)),
                children: vec![NodeId(2), NodeId(3)],
                attrs: HashMap::new(),
                branch_length: 0.2,
            },
            leaf(2, "L1", 1),
            leaf(3, "L2", 1),
            leaf(4, "L3", 0),
        ];
        Tree::new(nodes)
    }

    #[test]
    fn postorder_visits_children_before_parent() {
        let tree = small_tree();
        let post = tree.postorder();
        let pos = |name: &str| post.iter().position(|&id| tree.node(id).title == name).unwrap();
        assert!(pos("L1") < pos("internal"));
        assert!(pos("L2") < pos("internal"));
        assert!(pos("internal") < pos("root"));
        assert!(pos("L3") < pos("root"));
    }

    #[test]
    fn preorder_visits_parent_before_children() {
        let tree = small_tree();
        let pre = tree.preorder();
        assert_eq!(tree.node(pre[0]).title, "root");
    }

    #[test]
    fn leaf_descendants_of_internal_node() {
        let tree = small_tree();
        let leaves = tree.leaf_descendants(NodeId(1));
        let names: Vec<_> = leaves.iter().map(|&id| tree.node(id).title.clone()).collect();
        assert_eq!(names, vec!["L1", "L2"]);
    }

    #[test]
    fn add_child_appends_and_keeps_existing_ids_valid() {
        let mut tree = small_tree();
        let new_id = tree.add_child(NodeId(1), "New".into(), 0.05);
        assert_eq!(new_id, NodeId(5));
        assert!(tree.node(NodeId(1)).children.contains(&new_id));
        assert_eq!(tree.find_by_name("New"), Some(new_id));
        tree.rebuild_orders();
        assert_eq!(tree.postorder().len(), 6);
    }
}
