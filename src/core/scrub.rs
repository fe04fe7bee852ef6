//! Scoped erasure of keystream, scratch buffers and cipher state.
//!
//! # Security
//! - **Zeroize**: writes go through `zeroize`, which the optimizer may not elide.
//! - **Fence**: a compiler fence follows every wipe so later code cannot be
//!   reordered ahead of it.
//! - With the `safe-data` feature disabled, [`Sensitive`] skips the wipe on
//!   drop; explicit calls to [`burn`] always wipe.

use core::ops::{Deref, DerefMut};
use core::sync::atomic::{compiler_fence, Ordering};

use zeroize::Zeroize;

/// Irreversibly clears `value`.
#[inline(never)]
pub fn burn<Z: Zeroize + ?Sized>(value: &mut Z) {
    value.zeroize();
    compiler_fence(Ordering::SeqCst);
}

/// Owns a scratch value and clears it when it goes out of scope, including on
/// early returns.
pub struct Sensitive<T: Zeroize>(T);

impl<T: Zeroize> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }
}

impl<T: Zeroize> Deref for Sensitive<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Zeroize> DerefMut for Sensitive<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: Zeroize> Drop for Sensitive<T> {
    fn drop(&mut self) {
        #[cfg(feature = "safe-data")]
        burn(&mut self.0);
    }
}
