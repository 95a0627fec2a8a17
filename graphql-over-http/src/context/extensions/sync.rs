use std::ops::Deref;
use std::ops::DerefMut;
use std::sync::Arc;

/// Values of any type attached to a [`Context`](crate::Context), such as a database handle or a
/// data loader cache, that an engine retrieves by type.
///
/// Extensions are thread safe, and must be locked for mutation.
///
/// For example:
/// `context.extensions().with_lock(|mut lock| lock.insert::<MyData>(data));`
#[derive(Default, Clone, Debug)]
pub struct ExtensionsMutex {
    extensions: Arc<parking_lot::Mutex<super::Extensions>>,
}

impl ExtensionsMutex {
    /// Locks the extensions for interaction.
    ///
    /// The lock will be dropped once the closure completes.
    pub fn with_lock<'a, T, F: FnOnce(ExtensionsGuard<'a>) -> T>(&'a self, func: F) -> T {
        func(ExtensionsGuard {
            guard: self.extensions.lock(),
        })
    }
}

pub struct ExtensionsGuard<'a> {
    guard: parking_lot::MutexGuard<'a, super::Extensions>,
}

impl Deref for ExtensionsGuard<'_> {
    type Target = super::Extensions;

    fn deref(&self) -> &super::Extensions {
        &self.guard
    }
}

impl DerefMut for ExtensionsGuard<'_> {
    fn deref_mut(&mut self) -> &mut super::Extensions {
        &mut self.guard
    }
}
