/*
 * stylepass-system-runtime
 * Copyright (c) 2025 Posit, PBC
 *
 * Runtime abstraction layer for filesystem access.
 *
 * - NativeRuntime: Full filesystem access using std (default)
 *
 * Every consumer takes `&dyn SystemRuntime`, so embedders can route reads
 * through a virtual filesystem without touching the pass itself.
 */

mod native;
mod traits;

pub use native::NativeRuntime;
pub use traits::{PathKind, RuntimeError, RuntimeResult, SystemRuntime};

/// Create a default runtime for the current platform.
pub fn default_runtime() -> NativeRuntime {
    NativeRuntime::new()
}
