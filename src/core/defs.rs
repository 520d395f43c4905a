//! Shared definitions: node kinds, devices, error policies, group constants.

use std::fmt;

/// The maximum number of symbolic shape variables a graph may introduce.
pub const MAX_SYM_VARIABLES: usize = 1000;

/// The root group name.
pub const GROUP_ROOT: &str = "_root";

/// The group path separator.
pub const GROUP_DELIMITER: char = '/';

/// Each node on the graph is exactly one of these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The node represents a constant.
    Constant,
    /// The node is derived from constants through one or more operators.
    ConstantDerived,
    /// The node is an input: a function parameter or a shared variable.
    Input,
    /// The node is derived from an input through one or more operators.
    InputDerived,
}

impl NodeKind {
    /// Input-derived-ness is transitive; everything else derived from
    /// constants stays constant-derived.
    pub fn is_input_like(self) -> bool {
        matches!(self, NodeKind::Input | NodeKind::InputDerived)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Constant => "Constant",
            NodeKind::ConstantDerived => "ConstantDerived",
            NodeKind::Input => "Input",
            NodeKind::InputDerived => "InputDerived",
        };
        write!(f, "{}", name)
    }
}

/// Supported device types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceKind {
    /// A host with one or more CPUs.
    #[default]
    Host,
    /// A single GPU.
    Gpu,
}

/// A computational device tag. Carried on every node; the core never
/// schedules across devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Device {
    pub kind: DeviceKind,
    pub id: usize,
}

impl Device {
    pub const MASTER: Device = Device {
        kind: DeviceKind::Host,
        id: 0,
    };
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DeviceKind::Host => write!(f, "host[{}]", self.id),
            DeviceKind::Gpu => write!(f, "gpu[{}]", self.id),
        }
    }
}

/// How the graph reacts to a recoverable construction event, such as an
/// implicit broadcast or an implicit cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Does nothing.
    Quiet,
    /// Prints a warning and continues.
    #[default]
    Warn,
    /// Raises the error.
    Raise,
}

/// Axes of a tensor, each in `0..4`.
pub type Axes = Vec<usize>;

/// Checks that `axes` is a set of distinct values in `{0..3}`.
pub fn validate_axes(axes: &[usize]) -> bool {
    if axes.len() > 4 {
        return false;
    }
    let mut checks = [false; 4];
    for &axis in axes {
        if axis > 3 || checks[axis] {
            return false;
        }
        checks[axis] = true;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes_validation() {
        assert!(validate_axes(&[0, 1, 2, 3]));
        assert!(validate_axes(&[2]));
        assert!(validate_axes(&[]));
        assert!(!validate_axes(&[4]));
        assert!(!validate_axes(&[1, 1]));
        assert!(!validate_axes(&[0, 1, 2, 3, 0]));
    }
}
