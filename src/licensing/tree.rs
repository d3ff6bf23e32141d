// Grouping tree for licensing output: groups keyed in insertion order, leaves carry cost
// plus a count or an hour total. Built by drill_down + leaf accumulate, then rolled up once.

pub const INDENT_SIZE: usize = 4;
pub const MAX_LINE_SIZE: usize = 79;

/// Padding character for group lines, indexed by depth parity.
const FILL: [char; 2] = [' ', ' '];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quantity {
    Count(u64),
    Hours(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub cost: f64,
    pub quantity: Quantity,
}

impl Leaf {
    pub fn empty_count() -> Self {
        Self {
            cost: 0.0,
            quantity: Quantity::Count(0),
        }
    }

    pub fn empty_hours() -> Self {
        Self {
            cost: 0.0,
            quantity: Quantity::Hours(0.0),
        }
    }

    pub fn count(&self) -> Option<u64> {
        match self.quantity {
            Quantity::Count(n) => Some(n),
            Quantity::Hours(_) => None,
        }
    }

    pub fn hours(&self) -> Option<f64> {
        match self.quantity {
            Quantity::Hours(h) => Some(h),
            Quantity::Count(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Group(Group),
    Leaf(Leaf),
}

impl Node {
    fn rollup(&mut self) -> f64 {
        match self {
            Node::Leaf(leaf) => leaf.cost,
            Node::Group(group) => group.rollup(),
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Group(g) => Some(g),
            Node::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Node::Leaf(l) => Some(l),
            Node::Group(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    children: Vec<(String, Node)>,
    total: Option<f64>,
}

impl Group {
    /// Child `key`, created with `make` if absent. Keeps first-seen order.
    fn entry(&mut self, key: &str, make: impl FnOnce() -> Node) -> &mut Node {
        let idx = match self.children.iter().position(|(k, _)| k == key) {
            Some(idx) => idx,
            None => {
                self.children.push((key.to_string(), make()));
                self.children.len() - 1
            }
        };
        &mut self.children[idx].1
    }

    /// Walks `path`, creating groups on the way and `empty` as the leaf at the end.
    /// None when `path` is empty or collides with an existing node of the other kind.
    pub fn drill_down(&mut self, path: &[String], empty: Leaf) -> Option<&mut Leaf> {
        let (key, rest) = path.split_first()?;
        if rest.is_empty() {
            match self.entry(key, || Node::Leaf(empty)) {
                Node::Leaf(leaf) => Some(leaf),
                Node::Group(_) => None,
            }
        } else {
            match self.entry(key, || Node::Group(Group::default())) {
                Node::Group(group) => group.drill_down(rest, empty),
                Node::Leaf(_) => None,
            }
        }
    }

    /// Depth-first total rollup. Returns this pass's subtree sum and adds it to every stored
    /// total, so a second call double-counts. Call exactly once, after the last row.
    pub fn rollup(&mut self) -> f64 {
        let sum: f64 = self.children.iter_mut().map(|(_, node)| node.rollup()).sum();
        self.total = Some(self.total.unwrap_or(0.0) + sum);
        sum
    }

    /// Rolled-up total; None before `rollup`.
    pub fn total(&self) -> Option<f64> {
        self.total
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, node)| node)
    }

    /// Node at `path` below this group.
    pub fn find(&self, path: &[&str]) -> Option<&Node> {
        let (key, rest) = path.split_first()?;
        let node = self.get(key)?;
        if rest.is_empty() {
            return Some(node);
        }
        node.as_group()?.find(rest)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(k, node)| (k.as_str(), node))
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Indented lines for every node below this group, depth-first in insertion order.
    pub fn render_lines(&self, out: &mut Vec<String>) {
        for (name, node) in self.children() {
            render_node(name, node, 0, out);
        }
    }
}

fn render_node(name: &str, node: &Node, depth: usize, out: &mut Vec<String>) {
    match node {
        Node::Leaf(leaf) => out.push(format_leaf(name, leaf, depth)),
        Node::Group(group) => {
            out.push(format_group(name, group, depth));
            for (child_name, child) in group.children() {
                render_node(child_name, child, depth + 1, out);
            }
        }
    }
}

fn format_group(name: &str, group: &Group, depth: usize) -> String {
    let indent = " ".repeat(depth * INDENT_SIZE);
    let number = format!("{:10.2}", group.total.unwrap_or(0.0));
    let width = MAX_LINE_SIZE.saturating_sub(indent.len() + number.len());
    format!("{}{}{}", indent, pad(name, width, FILL[depth % 2]), number)
}

fn format_leaf(name: &str, leaf: &Leaf, depth: usize) -> String {
    let indent = " ".repeat(depth * INDENT_SIZE);
    let quantity = match leaf.quantity {
        Quantity::Count(n) => format!("{:5} count = ", n),
        Quantity::Hours(h) => format!("{:5.2} hours = ", h),
    };
    let number = format!("{:10.2}", leaf.cost);
    let width = MAX_LINE_SIZE.saturating_sub(indent.len() + number.len() + quantity.len());
    format!("{}{:<width$}{}{}", indent, name, quantity, number)
}

/// Left-aligns `s` in `width` columns using `fill`. Longer strings are not truncated.
fn pad(s: &str, width: usize, fill: char) -> String {
    let len = s.chars().count();
    let mut out = String::with_capacity(width.max(len));
    out.push_str(s);
    out.extend(std::iter::repeat_n(fill, width.saturating_sub(len)));
    out
}
