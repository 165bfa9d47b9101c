use image::DynamicImage;

/// The lifecycle a host drives a pipeline component through.
///
/// The host calls `on_init` once, then `on_start`, then `on_activate` once per
/// available input, then `on_stop` and finally `on_finish`. The hooks return
/// `false` to tell the host the transition did not succeed.
pub trait Component {
    fn on_init(&mut self) -> bool {
        true
    }

    fn on_start(&mut self) -> bool {
        true
    }

    /// Process one input image.
    ///
    /// Returns whether new outputs were published.
    fn on_activate(&mut self, image: &DynamicImage) -> bool;

    fn on_stop(&mut self) -> bool {
        true
    }

    fn on_finish(&mut self) -> bool {
        true
    }
}
