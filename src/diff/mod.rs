//! Reverse-mode automatic differentiation.
//!
//! Gradients are generated as nodes of the same graph: the engine walks the
//! flow (the nodes both reachable from the parameters and reaching the
//! objective) in reverse arena order, applying each operator's local rule
//! and accumulating multiple incoming messages with `Add`.

use crate::core::error::Result;
use crate::core::{GraphError, NodeId};
use crate::graph::Graph;
use crate::ops::{self, Op};

fn trace_enabled() -> bool {
    std::env::var("SYMB_TENSOR_TRACE")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

impl Graph {
    /// Returns the gradients of `objective` with respect to `params`.
    ///
    /// The objective must be scalar. Parameters the objective does not
    /// depend on get a zero gradient of their own shape. The generated
    /// nodes carry a raised gradient level and live under the group
    /// `Gradients N/<group of the differentiated node>`.
    pub fn gradient(&mut self, objective: NodeId, params: &[NodeId]) -> Result<Vec<NodeId>> {
        if !self.node(objective).is_scalar() {
            return Err(GraphError::UnsupportedGradient {
                node: objective,
                shape: self.node(objective).shape.clone(),
            });
        }
        let old_group = self.current_group;

        // Nodes off the flow are treated as constants while the gradient
        // sub-graph is generated.
        let descendants = self.descendants_mask(params);
        let ancestors = self.ancestors_mask(&[objective]);
        let mut flow = Vec::new();
        for i in 0..self.len() {
            if ancestors[i] && descendants[i] {
                flow.push(NodeId(i));
            } else {
                self.node_mut(NodeId(i)).temp_constant = true;
            }
        }

        self.grad_level = self.node(objective).grad_level + 1;
        let result = self.propagate_messages(objective, params, &flow);

        // Every exit path clears the poisoning and restores the group.
        for i in 0..self.len() {
            self.node_mut(NodeId(i)).temp_constant = false;
        }
        self.grad_level = 0;
        self.current_group = old_group;
        result
    }

    fn propagate_messages(
        &mut self,
        objective: NodeId,
        params: &[NodeId],
        flow: &[NodeId],
    ) -> Result<Vec<NodeId>> {
        let mut messages: Vec<Option<NodeId>> = vec![None; self.len()];

        self.set_group(&format!("Gradients {}", self.grad_level));
        let seed = self.constant(1.0)?;
        self.node_mut(seed).name = format!("Grad of {}|", objective);
        messages[objective.0] = Some(seed);

        for &node in flow.iter().rev() {
            if messages[node.0].is_some() {
                self.generate_gradients(node, &mut messages)?;
            }
        }

        let mut grads = Vec::with_capacity(params.len());
        for &param in params {
            match messages[param.0] {
                Some(grad) => grads.push(grad),
                // Not on the flow: the gradient is identically zero.
                None => {
                    let shape = self.node(param).shape.clone();
                    grads.push(self.zeros(shape)?);
                }
            }
        }
        Ok(grads)
    }

    /// Sends the gradient messages of `node` to each of its differentiable
    /// parents.
    fn generate_gradients(
        &mut self,
        node: NodeId,
        messages: &mut [Option<NodeId>],
    ) -> Result<()> {
        let my_grad = messages[node.0].expect("caller checked for a message");
        if trace_enabled() {
            eprintln!(
                "[TRACE] gradients of {} from message {}",
                node, my_grad
            );
        }

        // Gradient nodes are grouped under the differentiated node's group.
        let saved_group = self.current_group;
        let owner_group = self.groups.get(self.node(node).group).full_name.clone();
        let grad_group = format!("Gradients {}/{}", self.grad_level, owner_group);
        self.set_group(&grad_group);

        self.tag_name(my_grad, &format!("Grad of {}|", node));

        // A message to a node whose parents are all constants indicates a
        // logic error earlier in the propagation.
        let parents = self.node(node).op.parents();
        let input_leaf = matches!(self.node(node).op, Op::Input { .. } | Op::Shared { .. });
        if !input_leaf && parents.iter().all(|&p| self.node(p).is_constant()) {
            self.current_group = saved_group;
            return Err(GraphError::WrongGradient {
                op: self.node(node).op.name().to_string(),
                nodes: vec![node, my_grad],
            });
        }

        for (index, &parent) in parents.iter().enumerate() {
            if self.node(parent).is_constant() {
                continue;
            }
            let result = ops::grad::parent_grad(self, node, my_grad, index);
            let parent_grad = match result {
                Ok(grad) => grad,
                Err(err) => {
                    self.current_group = saved_group;
                    return Err(err);
                }
            };
            self.tag_name(parent_grad, &format!("Grad msg {}->{}|", node, parent));
            self.send_grad_message(parent, parent_grad, messages)?;
        }
        self.current_group = saved_group;
        Ok(())
    }

    fn tag_name(&mut self, node: NodeId, tag: &str) {
        let name = &mut self.node_mut(node).name;
        if *name == "Derived Node" || name.is_empty() {
            *name = tag.to_string();
        } else {
            name.push_str(tag);
        }
    }

    /// Delivers a message: the first one is installed as-is, later ones are
    /// accumulated with `Add`.
    fn send_grad_message(
        &mut self,
        target: NodeId,
        message: NodeId,
        messages: &mut [Option<NodeId>],
    ) -> Result<()> {
        messages[target.0] = match messages[target.0] {
            Some(previous) => Some(self.add(&[previous, message])?),
            None => Some(message),
        };
        Ok(())
    }
}
