// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! OpenGL / OpenGL ES 3 backend of the Foundry RHI.
//!
//! The platform graphics library is opened at runtime and its entry points
//! are resolved into typed tables: a core table every context must expose,
//! and optional bundles that are either core at the context version or
//! provided by an extension. Engine enums are translated into native tokens
//! through fixed tables adjusted by a per-context [`MappingProfile`].
//!
//! Native object names are owned by [`resources::ContainerObject`]s and
//! deleted exactly once. All draw-time binding goes through the
//! [`StateCache`], which skips calls whose state is already current.
//!
//! Nothing here creates or makes current a context; the host does that before
//! constructing [`OpenGlRhi`] and keeps it current on the calling thread.

pub mod capabilities;
pub mod debug;
pub mod entry_points;
pub mod extensions;
pub mod loader;
pub mod mapping;
pub mod native;
pub mod resources;
pub mod rhi;
pub mod state_cache;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use capabilities::Capabilities;
pub use extensions::{Extension, ExtensionProbe, ExtensionRegistry};
pub use loader::{
    default_platform_loader, GlFlavor, NativeLoader, PlatformLoader, RuntimeLinking,
    SymbolLibrary,
};
pub use mapping::MappingProfile;
pub use native::GlVersion;
pub use resources::{
    Framebuffer, GlDevice, GpuBuffer, IndexBuffer, IndirectBuffer, MappedBuffer, PipelineState,
    Program, ResourceBinding, ResourceGroup, SamplerState, Texture2D, UniformBuffer, VertexArray,
    VertexBuffer,
};
pub use rhi::{ClearValues, DriverInfo, OpenGlRhi};
pub use state_cache::StateCache;
