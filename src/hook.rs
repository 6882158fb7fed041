//! External notification callback, fired with the finished level and message after
//! each successful write.

use crate::level::Level;

/// Fire-and-forget observer. Invocations are submitted to the writer's bounded
/// event queue and executed off the write path; a slow or panicking hook can never
/// block or fail a logging call.
pub trait Hook: Send + Sync {
    fn fire(&self, level: Level, message: &str);
}

/// Closures are the common case; tests and call sites shouldn't need a named type.
impl<F> Hook for F
where
    F: Fn(Level, &str) + Send + Sync,
{
    fn fire(&self, level: Level, message: &str) {
        self(level, message);
    }
}
