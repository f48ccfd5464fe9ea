// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Backend-agnostic render hardware interface (RHI) vocabulary.
//!
//! Engine code describes pipelines and resources with the types in this
//! crate; backend crates translate them into native API calls.

pub mod backend;
pub mod buffer;
pub mod config;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod sampler;
pub mod services;
pub mod texture;

pub use backend::RhiBackend;
pub use buffer::{
    BufferUsage, ClearFlags, DrawArguments, DrawIndexedArguments, MapType, VertexAttribute,
    VertexAttributes,
};
pub use config::RhiConfig;
pub use error::{Result, RhiError, ShaderStage};
pub use format::{IndexBufferFormat, TextureFormat, VertexAttributeFormat};
pub use pipeline::{
    Blend, BlendStateDescriptor, ClipOrigin, DepthStencilDescriptor, PipelineStateDescriptor,
    PrimitiveTopology,
};
pub use sampler::{ComparisonFunc, FilterMode, SamplerStateDescriptor, TextureAddressMode};
pub use texture::{TextureDescriptor, TextureFlags};
