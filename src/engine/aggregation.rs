//! Running aggregates and the aggregation tree.
//!
//! The tree stores running aggregates along paths of group-by and pivot-by
//! key values. Nodes live in a contiguous arena and address children through
//! a sorted map from key value to node index; paths are always enumerated
//! top-down, so nodes carry no parent pointers.

use std::collections::{BTreeMap, HashMap};

use crate::error::{QueryError, QueryResult};
use crate::query::column::AggregationType;
use crate::value::{Value, ValueType};

/// Running aggregation state for one target column within one tree node.
#[derive(Debug, Clone)]
pub struct ValueAggregator {
    value_type: ValueType,
    count: u64,
    sum: f64,
    min: Option<Value>,
    max: Option<Value>,
}

impl ValueAggregator {
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            count: 0,
            sum: 0.0,
            min: None,
            max: None,
        }
    }

    /// Fold one value in. Nulls are ignored by every aggregation.
    pub fn aggregate(&mut self, value: &Value) {
        if value.is_null() {
            return;
        }
        self.count += 1;
        if let Value::Number(Some(n)) = value {
            self.sum += n;
        }
        match &self.min {
            Some(min) if min.compare(value).is_le() => {}
            _ => self.min = Some(value.clone()),
        }
        match &self.max {
            Some(max) if max.compare(value).is_ge() => {}
            _ => self.max = Some(value.clone()),
        }
    }

    /// The aggregate value. COUNT over no non-nulls is 0; SUM and AVG are
    /// the NUMBER null; MIN and MAX are the null of the target type.
    pub fn value(&self, aggregation: AggregationType) -> Value {
        match aggregation {
            AggregationType::Count => Value::number(self.count as f64),
            AggregationType::Sum => {
                if self.count == 0 {
                    Value::Number(None)
                } else {
                    Value::number(self.sum)
                }
            }
            AggregationType::Avg => {
                if self.count == 0 {
                    Value::Number(None)
                } else {
                    Value::number(self.sum / self.count as f64)
                }
            }
            AggregationType::Min => self
                .min
                .clone()
                .unwrap_or_else(|| Value::null_of(self.value_type)),
            AggregationType::Max => self
                .max
                .clone()
                .unwrap_or_else(|| Value::null_of(self.value_type)),
        }
    }
}

/// One node of the aggregation tree: children keyed by the next path value,
/// plus running state per aggregation target.
#[derive(Debug, Clone)]
struct AggregationNode {
    children: BTreeMap<Value, usize>,
    aggregators: HashMap<String, ValueAggregator>,
}

impl AggregationNode {
    fn new(targets: &[(String, ValueType)]) -> Self {
        Self {
            children: BTreeMap::new(),
            aggregators: targets
                .iter()
                .map(|(id, ty)| (id.clone(), ValueAggregator::new(*ty)))
                .collect(),
        }
    }
}

/// A tree of depth `depth + 1` aggregating rows along key paths. The root
/// accumulates every row; level `i` is keyed by the value of the `i`-th
/// group or pivot column.
#[derive(Debug, Clone)]
pub struct AggregationTree {
    nodes: Vec<AggregationNode>,
    depth: usize,
    targets: Vec<(String, ValueType)>,
}

impl AggregationTree {
    /// A tree over `depth` key columns and the given aggregation target
    /// columns.
    pub fn new(depth: usize, targets: Vec<(String, ValueType)>) -> Self {
        let root = AggregationNode::new(&targets);
        Self {
            nodes: vec![root],
            depth,
            targets,
        }
    }

    /// Fold one row in: walk the key path from the root, creating missing
    /// children, and update every node along the way with the row's value
    /// for each target. `values` is aligned with the target list given at
    /// construction.
    pub fn aggregate(&mut self, path: &[Value], values: &[Value]) -> QueryResult<()> {
        if path.len() != self.depth {
            return Err(QueryError::Internal(format!(
                "aggregation path of length {} in a tree of depth {}",
                path.len(),
                self.depth
            )));
        }
        if values.len() != self.targets.len() {
            return Err(QueryError::Internal(format!(
                "{} aggregation values for {} targets",
                values.len(),
                self.targets.len()
            )));
        }
        let mut current = 0usize;
        self.fold_into(current, values);
        for key in path {
            current = match self.nodes[current].children.get(key) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(AggregationNode::new(&self.targets));
                    self.nodes[current].children.insert(key.clone(), child);
                    child
                }
            };
            self.fold_into(current, values);
        }
        Ok(())
    }

    fn fold_into(&mut self, node: usize, values: &[Value]) {
        let node = &mut self.nodes[node];
        for ((id, _), value) in self.targets.iter().zip(values) {
            if let Some(aggregator) = node.aggregators.get_mut(id) {
                aggregator.aggregate(value);
            }
        }
    }

    /// Every leaf's ordered key vector, in sorted key order level by level.
    pub fn paths_to_leaves(&self) -> Vec<Vec<Value>> {
        let mut paths = Vec::new();
        self.collect_paths(0, 0, &mut Vec::new(), &mut paths);
        paths
    }

    fn collect_paths(
        &self,
        node: usize,
        level: usize,
        prefix: &mut Vec<Value>,
        out: &mut Vec<Vec<Value>>,
    ) {
        if level == self.depth {
            out.push(prefix.clone());
            return;
        }
        for (key, &child) in &self.nodes[node].children {
            prefix.push(key.clone());
            self.collect_paths(child, level + 1, prefix, out);
            prefix.pop();
        }
    }

    /// The node at a full key path, if that path was observed.
    fn node_at(&self, path: &[Value]) -> Option<usize> {
        let mut current = 0usize;
        for key in path {
            current = *self.nodes[current].children.get(key)?;
        }
        Some(current)
    }

    /// Whether the path was observed in the input.
    pub fn contains_path(&self, path: &[Value]) -> bool {
        self.node_at(path).is_some()
    }

    /// The aggregate for a target column at a key path. `None` when the path
    /// was never observed.
    pub fn value_at(
        &self,
        path: &[Value],
        target: &str,
        aggregation: AggregationType,
    ) -> QueryResult<Option<Value>> {
        let Some(node) = self.node_at(path) else {
            return Ok(None);
        };
        let aggregator = self.nodes[node].aggregators.get(target).ok_or_else(|| {
            QueryError::Internal(format!("unknown aggregation target '{target}'"))
        })?;
        Ok(Some(aggregator.value(aggregation)))
    }
}
