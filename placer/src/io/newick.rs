//! Extended-Newick reader and writer: quoted labels, branch lengths, and
//! trailing `[{key=value}...]` attribute blocks the core treats opaquely.

use anyhow::{anyhow, Context, Result};
use parsimony::{Node, NodeId, Tree};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

#[derive(Parser)]
#[grammar = "io/newick.pest"]
struct NewickParser;

pub fn read_file(path: &Path) -> Result<Tree> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading newick file {}", path.display()))?;
    parse(&text)
}

pub fn parse(text: &str) -> Result<Tree> {
    let mut pairs = NewickParser::parse(Rule::tree, text.trim()).context("parsing newick tree")?;
    let tree_pair = pairs.next().ok_or_else(|| anyhow!("empty newick input"))?;
    let subtree = tree_pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::subtree)
        .ok_or_else(|| anyhow!("newick tree has no root subtree"))?;

    let mut nodes = Vec::new();
    build_node(subtree, None, &mut nodes)?;
    Ok(Tree::new(nodes))
}

fn build_node(pair: Pair<Rule>, parent: Option<NodeId>, nodes: &mut Vec<Node>) -> Result<NodeId> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| anyhow!("malformed subtree"))?;

    match inner.as_rule() {
        Rule::leaf => build_leaf(inner, parent, nodes),
        Rule::internal => {
            let mut parts = inner.into_inner();
            let mut children_pairs = Vec::new();
            let mut rest = Vec::new();
            for part in parts.by_ref() {
                if part.as_rule() == Rule::subtree {
                    children_pairs.push(part);
                } else {
                    rest.push(part);
                }
            }
            build_internal(children_pairs, rest, parent, nodes)
        }
        other => Err(anyhow!("unexpected newick rule {:?}", other)),
    }
}

fn build_leaf(pair: Pair<Rule>, parent: Option<NodeId>, nodes: &mut Vec<Node>) -> Result<NodeId> {
    let mut label = String::new();
    let mut branch_length = 0.0;
    let mut attrs = HashMap::new();

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::label => label = decode_label(part),
            Rule::branch_length => branch_length = parse_branch_length(part)?,
            Rule::attr_block => merge_attrs(part, &mut attrs),
            _ => {}
        }
    }

    let id = NodeId(nodes.len());
    nodes.push(Node {
        id,
        title: label,
        parent,
        children: Vec::new(),
        attrs,
        branch_length,
    });
    Ok(id)
}

fn build_internal(children_pairs: Vec<Pair<Rule>>, rest: Vec<Pair<Rule>>, parent: Option<NodeId>, nodes: &mut Vec<Node>) -> Result<NodeId> {
    let mut label = String::new();
    let mut branch_length = 0.0;
    let mut attrs = HashMap::new();
    for part in rest {
        match part.as_rule() {
            Rule::label => label = decode_label(part),
            Rule::branch_length => branch_length = parse_branch_length(part)?,
            Rule::attr_block => merge_attrs(part, &mut attrs),
            _ => {}
        }
    }

    let id = NodeId(nodes.len());
    nodes.push(Node {
        id,
        title: label,
        parent,
        children: Vec::new(),
        attrs,
        branch_length,
    });

    for child_pair in children_pairs {
        let child_id = build_node(child_pair, Some(id), nodes)?;
        nodes[id.0].children.push(child_id);
    }

    Ok(id)
}

fn decode_label(pair: Pair<Rule>) -> String {
    let inner = match pair.into_inner().next() {
        Some(p) => p,
        None => return String::new(),
    };
    match inner.as_rule() {
        Rule::quoted_label => {
            let raw = inner.as_str();
            let trimmed = &raw[1..raw.len() - 1];
            trimmed.replace("''", "'")
        }
        _ => inner.as_str().to_string(),
    }
}

fn parse_branch_length(pair: Pair<Rule>) -> Result<f64> {
    let number = pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::number)
        .ok_or_else(|| anyhow!("branch length missing number"))?;
    number.as_str().parse::<f64>().context("invalid branch length")
}

fn merge_attrs(pair: Pair<Rule>, attrs: &mut HashMap<String, String>) {
    for entry in pair.into_inner() {
        if entry.as_rule() != Rule::attr_entry {
            continue;
        }
        let mut parts = entry.into_inner();
        let key = parts.next().map(|p| p.as_str().to_string());
        let value = parts.next().map(|p| p.as_str().to_string());
        if let (Some(k), Some(v)) = (key, value) {
            attrs.insert(k, v);
        }
    }
}

/// Writes `tree` as Newick text. When `verbose_comments` is set, every
/// node's attributes are re-emitted as a trailing `[{key=value}...]` block.
pub fn write(tree: &Tree, precision: usize, verbose_comments: bool) -> String {
    let mut out = String::new();
    write_node(tree, tree.root(), precision, verbose_comments, &mut out);
    out.push(';');
    out
}

pub fn write_file(tree: &Tree, path: &Path, precision: usize, verbose_comments: bool) -> Result<()> {
    let text = write(tree, precision, verbose_comments);
    std::fs::write(path, text).with_context(|| format!("writing newick file {}", path.display()))
}

fn write_node(tree: &Tree, id: NodeId, precision: usize, verbose_comments: bool, out: &mut String) {
    let node = tree.node(id);
    if !node.is_leaf() {
        out.push('(');
        for (i, &child) in node.children.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_node(tree, child, precision, verbose_comments, out);
        }
        out.push(')');
    }
    write_label(&node.title, out);
    if node.parent.is_some() {
        let _ = write!(out, ":{:.*}", precision, node.branch_length);
    }
    if verbose_comments && !node.attrs.is_empty() {
        out.push('[');
        let mut keys: Vec<_> = node.attrs.keys().collect();
        keys.sort();
        for key in keys {
            let _ = write!(out, "{{{}={}}}", key, node.attrs[key]);
        }
        out.push(']');
    }
}

fn write_label(label: &str, out: &mut String) {
    if label.is_empty() {
        return;
    }
    let needs_quoting = label.chars().any(|c| "(),:;[\t\n".contains(c)) || label.contains('\'');
    if needs_quoting {
        out.push('\'');
        out.push_str(&label.replace('\'', "''"));
        out.push('\'');
    } else {
        out.push_str(label);
    }
}
