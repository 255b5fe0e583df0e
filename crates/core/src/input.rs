//! External input source — where new user text comes from.
//!
//! Only the top-level agent invocation is allowed to block on this; nested
//! invocations poll it non-blockingly and must terminate on their own.

use async_trait::async_trait;

/// Source of external (human) input.
#[async_trait]
pub trait InputSource: Send + Sync {
    /// Fetch the next piece of input.
    ///
    /// With `block` set, waits until input arrives or the source is closed.
    /// Without it, returns immediately. `None` means end-of-input (when
    /// blocking) or nothing currently available (when not).
    async fn next(&self, block: bool) -> Option<String>;
}

/// An input source that is always exhausted. Used for one-shot runs and for
/// tests of the no-external-input paths.
pub struct NoInput;

#[async_trait]
impl InputSource for NoInput {
    async fn next(&self, _block: bool) -> Option<String> {
        None
    }
}
