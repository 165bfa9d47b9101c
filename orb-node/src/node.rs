use crate::{transform, Component, DescriptorMatrix, Features, KeyPoint, NodeSettings};
use image::DynamicImage;
use log::*;
use std::sync::Arc;

/// Where an [`OrbNode`] is in its activation cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeState {
    Idle,
    Running,
}

/// Extracts ORB features from every image it is activated with.
///
/// A failed activation is logged and publishes nothing, so the outputs keep
/// the features of the last image that succeeded.
#[derive(Debug)]
pub struct OrbNode {
    settings: NodeSettings,
    state: NodeState,
    started: bool,
    published: Option<Arc<Features>>,
}

impl OrbNode {
    pub fn new(settings: NodeSettings) -> Self {
        Self {
            settings,
            state: NodeState::Idle,
            started: false,
            published: None,
        }
    }

    pub fn settings(&self) -> &NodeSettings {
        &self.settings
    }

    /// Replace the settings. This is only allowed before the node is started.
    ///
    /// Returns whether the settings were applied.
    pub fn configure(&mut self, settings: NodeSettings) -> bool {
        if self.started {
            warn!("Ignoring new settings {:?} on a started node.", settings);
            return false;
        }
        self.settings = settings;
        true
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    /// The keypoints of the last published features.
    pub fn out_features(&self) -> Option<&[KeyPoint]> {
        self.published
            .as_deref()
            .map(|features| features.keypoints.as_slice())
    }

    /// The descriptors of the last published features.
    pub fn out_descriptors(&self) -> Option<&DescriptorMatrix> {
        self.published.as_deref().map(|features| &features.descriptors)
    }

    /// The last published features, shared with every other reader.
    pub fn latest(&self) -> Option<Arc<Features>> {
        self.published.clone()
    }
}

impl Default for OrbNode {
    fn default() -> Self {
        Self::new(NodeSettings::default())
    }
}

impl Component for OrbNode {
    fn on_start(&mut self) -> bool {
        debug!("Starting with {:?}.", self.settings);
        self.started = true;
        true
    }

    fn on_activate(&mut self, image: &DynamicImage) -> bool {
        self.state = NodeState::Running;
        let published = match transform(image, &self.settings) {
            Ok(features) => {
                trace!("Publishing {} features.", features.len());
                self.published = Some(Arc::new(features));
                true
            }
            Err(e) => {
                error!("ORB feature extraction failed: {}", e);
                false
            }
        };
        self.state = NodeState::Idle;
        published
    }

    fn on_stop(&mut self) -> bool {
        self.started = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_are_locked_while_started() {
        let mut node = OrbNode::default();
        assert!(node.on_init());
        assert!(node.configure(NodeSettings { nfeatures: 10 }));
        assert!(node.on_start());
        assert!(!node.configure(NodeSettings { nfeatures: 20 }));
        assert_eq!(node.settings().nfeatures, 10);
        assert!(node.on_stop());
        assert!(node.configure(NodeSettings { nfeatures: 20 }));
        assert!(node.on_finish());
    }

    #[test]
    fn nothing_is_published_before_the_first_image() {
        let node = OrbNode::default();
        assert_eq!(node.state(), NodeState::Idle);
        assert!(node.out_features().is_none());
        assert!(node.out_descriptors().is_none());
        assert!(node.latest().is_none());
    }
}
