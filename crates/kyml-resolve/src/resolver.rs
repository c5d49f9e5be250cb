use crate::ResolveError;
use std::collections::HashMap;
use tracing::debug;

/// Maps an image reference to a digest-pinned reference.
///
/// `Ok(None)` means the image is unknown to every source the resolver
/// consults; errors are reserved for tools or registries that could not be
/// queried at all.
pub trait ImageResolver {
    fn resolve(&mut self, image: &str) -> Result<Option<String>, ResolveError>;
}

impl<T: ImageResolver + ?Sized> ImageResolver for &mut T {
    fn resolve(&mut self, image: &str) -> Result<Option<String>, ResolveError> {
        (**self).resolve(image)
    }
}

impl<T: ImageResolver + ?Sized> ImageResolver for Box<T> {
    fn resolve(&mut self, image: &str) -> Result<Option<String>, ResolveError> {
        (**self).resolve(image)
    }
}

/// Memoizes successful resolutions for the lifetime of one run.
///
/// Misses and errors are not cached so each occurrence reports on its own.
pub struct CachingResolver<R> {
    inner: R,
    cache: HashMap<String, String>,
}

impl<R: ImageResolver> CachingResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: HashMap::new(),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl<R: ImageResolver> ImageResolver for CachingResolver<R> {
    fn resolve(&mut self, image: &str) -> Result<Option<String>, ResolveError> {
        if let Some(hit) = self.cache.get(image) {
            debug!("{image}: cached {hit}");
            return Ok(Some(hit.clone()));
        }
        let resolved = self.inner.resolve(image)?;
        if let Some(ref pinned) = resolved {
            self.cache.insert(image.to_owned(), pinned.clone());
        }
        Ok(resolved)
    }
}
