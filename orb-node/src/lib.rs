//! A stateless pipeline node that extracts ORB features from every image it
//! is activated with.
//!
//! The extraction itself is the pure [`transform`] function. [`OrbNode`]
//! adapts it to a host that drives components through the [`Component`]
//! lifecycle, and keeps the last successfully extracted [`Features`].

mod component;
mod node;
mod settings;
mod transform;

pub use component::Component;
pub use node::{NodeState, OrbNode};
pub use orb::{Descriptor, KeyPoint};
pub use settings::NodeSettings;
pub use transform::{transform, transform_with, DescriptorMatrix, Features};
