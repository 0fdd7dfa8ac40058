//! Progress notifications from a resolution run.

/// Observer of a resolution run. Purely informational.
pub trait ResolverDelegate<I> {
    /// A container was loaded from the provider for the first time in this run.
    fn added(&self, identifier: &I);
}

/// Delegate that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDelegate;

impl<I> ResolverDelegate<I> for NoopDelegate {
    fn added(&self, _identifier: &I) {}
}

impl<I, D: ResolverDelegate<I> + ?Sized> ResolverDelegate<I> for &D {
    fn added(&self, identifier: &I) {
        (**self).added(identifier);
    }
}
