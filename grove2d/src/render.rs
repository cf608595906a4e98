use anyhow::Result;

/// Minimal rendering capability the game loop needs from the backend.
///
/// Actual drawing belongs to the game states and the UI layer, which own
/// whatever renderer handles they were built with.
pub trait RenderTarget {
    /// Clear the frame buffer to an RGBA color.
    fn clear(&mut self, color: [f32; 4]) -> Result<()>;
}

impl<T: RenderTarget + ?Sized> RenderTarget for Box<T> {
    fn clear(&mut self, color: [f32; 4]) -> Result<()> {
        (**self).clear(color)
    }
}

/// Render target that discards every call. Useful for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTarget;

impl RenderTarget for NullTarget {
    fn clear(&mut self, _color: [f32; 4]) -> Result<()> {
        Ok(())
    }
}
