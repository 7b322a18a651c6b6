//! Module resolution primitive.
//!
//! [`NodeResolver`] answers "what file would `require(specifier)` load from
//! here", which is all the locator and loader need from Node semantics.

pub mod exports;
pub mod manifest_cache;
pub mod node;

pub use exports::{exports_root, exports_subpath, REQUIRE_CONDITIONS};
pub use node::{
    global_folders, node_modules_paths, parse_bare_specifier, ModuleResolver, NodeResolver,
    ResolveReasonCode, ResolveResult, ResolveStatus, CJS_EXTENSIONS, NODE_PATH_ENV,
};
pub use manifest_cache::{ManifestCache, ManifestStamp, MemoryManifestCache};
