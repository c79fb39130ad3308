//! Renderer storage.
//!
//! A renderer is a caller-owned transform from the cached content plus
//! per-call options to an output value. The live file never calls it on
//! its own; it only runs inside [`LiveFile::render`](crate::LiveFile::render).

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{BoxError, Error};

/// A stored renderer.
pub type Renderer<O, R> = Arc<dyn Fn(&str, &O) -> Result<R, BoxError> + Send + Sync + 'static>;

/// Replaceable renderer slot.
pub(crate) struct RendererSlot<O, R> {
    inner: RwLock<Option<Renderer<O, R>>>,
}

impl<O, R> RendererSlot<O, R> {
    pub fn new(renderer: Option<Renderer<O, R>>) -> Self {
        Self {
            inner: RwLock::new(renderer),
        }
    }

    pub fn replace(&self, renderer: Option<Renderer<O, R>>) {
        *self.inner.write() = renderer;
    }

    pub fn is_set(&self) -> bool {
        self.inner.read().is_some()
    }

    /// Run the current renderer over `content`.
    ///
    /// The renderer is cloned out before it runs, so a concurrent
    /// `replace` is never blocked by a slow render.
    pub fn render(&self, content: &str, options: &O) -> Result<R, Error> {
        let renderer = self.inner.read().clone().ok_or(Error::NoRenderer)?;
        renderer(content, options).map_err(Error::render)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_count() -> Renderer<(), usize> {
        Arc::new(|content: &str, _: &()| -> Result<usize, BoxError> {
            Ok(content.split_whitespace().count())
        })
    }

    #[test]
    fn test_empty_slot() {
        let slot: RendererSlot<(), usize> = RendererSlot::new(None);
        assert!(!slot.is_set());
        assert!(matches!(slot.render("a b", &()), Err(Error::NoRenderer)));
    }

    #[test]
    fn test_replace() {
        let slot = RendererSlot::new(Some(word_count()));
        assert_eq!(slot.render("a b c", &()).unwrap(), 3);

        slot.replace(Some(Arc::new(
            |content: &str, _: &()| -> Result<usize, BoxError> { Ok(content.len()) },
        )));
        assert_eq!(slot.render("a b c", &()).unwrap(), 5);

        slot.replace(None);
        assert!(!slot.is_set());
    }

    #[test]
    fn test_renderer_error_propagates() {
        let slot: RendererSlot<(), usize> = RendererSlot::new(Some(Arc::new(
            |_: &str, _: &()| -> Result<usize, BoxError> { Err("unclosed tag".into()) },
        )));

        let err = slot.render("{{", &()).unwrap_err();
        assert!(matches!(err, Error::Render { .. }));
        assert!(err.to_string().contains("unclosed tag"));
    }
}
