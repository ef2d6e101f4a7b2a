//! Shader programs.
//!
//! A program is a vertex and a fragment WGSL source. Building one happens in
//! two steps that mirror a classic compile/link:
//!
//! 1. each stage is parsed and validated with naga and must expose its entry
//!    point (`vs_main` / `fs_main` unless overridden);
//! 2. the stages are linked: every fragment input location must be written by
//!    the vertex stage with the same type, and resources bound at the same slot
//!    in both stages must agree.
//!
//! The reflected [`ProgramLayout`] maps attribute names to vertex locations and
//! uniform names to byte offsets in the program's uniform block, which is what
//! [`ShaderProgram::set_uniform`] writes into.

use std::collections::BTreeMap;
use std::fmt;

use hornview_core::DrawRange;
use naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::buffer::{create_vertex_buffer, AttributeBinding};
use crate::error::{RenderError, RenderResult};
use crate::texture::SurfaceTexture;
use crate::uniform::{UniformBlock, UniformKind, UniformSlot, UniformValue};

/// Default vertex entry point.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Default fragment entry point.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Vertex stage of the horn surface program.
pub const SURFACE_VERTEX_SHADER: &str = include_str!("shaders/surface.vert.wgsl");
/// Fragment stage of the horn surface program.
pub const SURFACE_FRAGMENT_SHADER: &str = include_str!("shaders/surface.frag.wgsl");

/// Depth attachment format used by every program.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn naga_stage(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }

    fn visibility(self) -> wgpu::ShaderStages {
        match self {
            ShaderStage::Vertex => wgpu::ShaderStages::VERTEX,
            ShaderStage::Fragment => wgpu::ShaderStages::FRAGMENT,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// A vertex input of the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    /// `@location` of the input.
    pub location: u32,
    /// WGSL spelling of the input type.
    pub type_name: String,
    /// Number of components, 0 for non-vector types.
    pub components: u32,
}

/// What a group 0 binding holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    UniformBuffer,
    Texture,
    Sampler,
}

/// A group 0 binding and the stages that use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceInfo {
    pub binding: u32,
    pub kind: ResourceKind,
    pub visibility: wgpu::ShaderStages,
}

/// Locations resolved for the names a caller intends to use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locations {
    /// Attribute name to vertex location.
    pub attributes: BTreeMap<String, u32>,
    /// Uniforms that were found.
    pub uniforms: BTreeMap<String, UniformSlot>,
}

/// Reflected interface of a compiled and linked program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramLayout {
    attributes: BTreeMap<String, AttributeInfo>,
    uniforms: BTreeMap<String, UniformSlot>,
    uniform_block_size: u32,
    resources: Vec<ResourceInfo>,
}

#[derive(Debug, Clone)]
struct InterfaceVar {
    location: u32,
    name: String,
    type_name: String,
    components: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum GlobalKind {
    Uniform {
        members: Vec<(String, u32, String)>,
        span: u32,
    },
    Texture,
    Sampler,
    Unsupported(String),
}

#[derive(Debug, Clone)]
struct GlobalResource {
    name: String,
    group: u32,
    binding: u32,
    kind: GlobalKind,
    uniform_slots: Vec<(String, UniformSlot)>,
}

/// What one stage exposes after compiling.
#[derive(Debug)]
struct StageInterface {
    inputs: Vec<InterfaceVar>,
    outputs: Vec<InterfaceVar>,
    resources: Vec<GlobalResource>,
}

fn scalar_name(scalar: naga::Scalar) -> String {
    match (scalar.kind, scalar.width) {
        (naga::ScalarKind::Float, 4) => "f32".into(),
        (naga::ScalarKind::Float, 2) => "f16".into(),
        (naga::ScalarKind::Sint, 4) => "i32".into(),
        (naga::ScalarKind::Uint, 4) => "u32".into(),
        (naga::ScalarKind::Bool, _) => "bool".into(),
        (kind, width) => format!("{kind:?}{}", u32::from(width) * 8),
    }
}

fn type_name(module: &naga::Module, ty: naga::Handle<naga::Type>) -> String {
    let ty = &module.types[ty];
    match &ty.inner {
        naga::TypeInner::Scalar(scalar) => scalar_name(*scalar),
        naga::TypeInner::Vector { size, scalar } => {
            format!("vec{}<{}>", *size as u8, scalar_name(*scalar))
        }
        naga::TypeInner::Matrix {
            columns,
            rows,
            scalar,
        } => format!(
            "mat{}x{}<{}>",
            *columns as u8,
            *rows as u8,
            scalar_name(*scalar)
        ),
        _ => ty.name.clone().unwrap_or_else(|| "<anonymous>".into()),
    }
}

fn component_count(module: &naga::Module, ty: naga::Handle<naga::Type>) -> u32 {
    match &module.types[ty].inner {
        naga::TypeInner::Scalar(_) => 1,
        naga::TypeInner::Vector { size, .. } => u32::from(*size as u8),
        _ => 0,
    }
}

fn uniform_kind(module: &naga::Module, ty: naga::Handle<naga::Type>) -> Option<UniformKind> {
    let f32_scalar = naga::Scalar::F32;
    match &module.types[ty].inner {
        naga::TypeInner::Scalar(s) if *s == f32_scalar => Some(UniformKind::Scalar),
        naga::TypeInner::Vector { size, scalar } if *scalar == f32_scalar => match size {
            naga::VectorSize::Bi => Some(UniformKind::Vec2),
            naga::VectorSize::Tri => Some(UniformKind::Vec3),
            naga::VectorSize::Quad => Some(UniformKind::Vec4),
        },
        naga::TypeInner::Matrix {
            columns: naga::VectorSize::Quad,
            rows: naga::VectorSize::Quad,
            scalar,
        } if *scalar == f32_scalar => Some(UniformKind::Mat4),
        _ => None,
    }
}

/// Collects `@location` variables, looking through one level of struct.
fn collect_interface(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    name: Option<&str>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<InterfaceVar>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push(InterfaceVar {
            location: *location,
            name: name.unwrap_or_default().to_string(),
            type_name: type_name(module, ty),
            components: component_count(module, ty),
        }),
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_interface(
                        module,
                        member.ty,
                        member.name.as_deref(),
                        member.binding.as_ref(),
                        out,
                    );
                }
            }
        }
    }
}

fn collect_resources(module: &naga::Module) -> Vec<GlobalResource> {
    let mut resources = Vec::new();
    for (_, global) in module.global_variables.iter() {
        let Some(binding) = global.binding.as_ref() else {
            continue;
        };
        let name = global.name.clone().unwrap_or_default();
        let inner = &module.types[global.ty].inner;

        let mut uniform_slots = Vec::new();
        let kind = match (global.space, inner) {
            (naga::AddressSpace::Uniform, naga::TypeInner::Struct { members, span }) => {
                let mut described = Vec::with_capacity(members.len());
                for member in members {
                    let member_name = member.name.clone().unwrap_or_default();
                    let declared = type_name(module, member.ty);
                    uniform_slots.push((
                        member_name.clone(),
                        UniformSlot {
                            offset: member.offset,
                            kind: uniform_kind(module, member.ty),
                            declared: declared.clone(),
                        },
                    ));
                    described.push((member_name, member.offset, declared));
                }
                GlobalKind::Uniform {
                    members: described,
                    span: *span,
                }
            }
            (naga::AddressSpace::Handle, naga::TypeInner::Image { .. }) => GlobalKind::Texture,
            (naga::AddressSpace::Handle, naga::TypeInner::Sampler { .. }) => GlobalKind::Sampler,
            _ => GlobalKind::Unsupported(type_name(module, global.ty)),
        };

        resources.push(GlobalResource {
            name,
            group: binding.group,
            binding: binding.binding,
            kind,
            uniform_slots,
        });
    }
    resources
}

/// Parses and validates one stage, then reflects its interface.
fn compile_stage(stage: ShaderStage, source: &str, entry: &str) -> RenderResult<StageInterface> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| RenderError::ShaderCompile {
        stage,
        log: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|e| RenderError::ShaderCompile {
            stage,
            log: e.emit_to_string(source),
        })?;

    let entry_point = module
        .entry_points
        .iter()
        .find(|ep| ep.name == entry && ep.stage == stage.naga_stage())
        .ok_or_else(|| RenderError::ShaderCompile {
            stage,
            log: format!("no @{stage} entry point named `{entry}`"),
        })?;

    let mut inputs = Vec::new();
    for arg in &entry_point.function.arguments {
        collect_interface(
            &module,
            arg.ty,
            arg.name.as_deref(),
            arg.binding.as_ref(),
            &mut inputs,
        );
    }

    let mut outputs = Vec::new();
    if let Some(result) = &entry_point.function.result {
        collect_interface(&module, result.ty, None, result.binding.as_ref(), &mut outputs);
    }

    Ok(StageInterface {
        inputs,
        outputs,
        resources: collect_resources(&module),
    })
}

fn link(vertex: &StageInterface, fragment: &StageInterface) -> RenderResult<()> {
    for input in &fragment.inputs {
        let Some(output) = vertex.outputs.iter().find(|o| o.location == input.location) else {
            return Err(RenderError::ProgramLink {
                log: format!(
                    "fragment input `{}` at location {} is not written by the vertex stage",
                    input.name, input.location
                ),
            });
        };
        if output.type_name != input.type_name {
            return Err(RenderError::ProgramLink {
                log: format!(
                    "location {}: vertex writes {} but fragment reads {}",
                    input.location, output.type_name, input.type_name
                ),
            });
        }
    }

    for resource in vertex.resources.iter().chain(&fragment.resources) {
        if resource.group != 0 {
            return Err(RenderError::ProgramLink {
                log: format!(
                    "`{}` is bound in group {}; only group 0 is supported",
                    resource.name, resource.group
                ),
            });
        }
        if let GlobalKind::Unsupported(ty) = &resource.kind {
            return Err(RenderError::ProgramLink {
                log: format!("`{}` has unsupported resource type {ty}", resource.name),
            });
        }
    }

    for v in &vertex.resources {
        if let Some(f) = fragment.resources.iter().find(|f| f.binding == v.binding) {
            if v.kind != f.kind {
                return Err(RenderError::ProgramLink {
                    log: format!(
                        "binding {} is declared differently in the two stages (`{}` vs `{}`)",
                        v.binding, v.name, f.name
                    ),
                });
            }
        }
    }

    Ok(())
}

impl ProgramLayout {
    /// Compiles and links a program using the default entry points.
    pub fn compile(vertex_source: &str, fragment_source: &str) -> RenderResult<Self> {
        Self::compile_with_entries(vertex_source, VERTEX_ENTRY, fragment_source, FRAGMENT_ENTRY)
    }

    /// Compiles and links a program with explicit entry point names.
    pub fn compile_with_entries(
        vertex_source: &str,
        vertex_entry: &str,
        fragment_source: &str,
        fragment_entry: &str,
    ) -> RenderResult<Self> {
        let vertex = compile_stage(ShaderStage::Vertex, vertex_source, vertex_entry)?;
        let fragment = compile_stage(ShaderStage::Fragment, fragment_source, fragment_entry)?;
        link(&vertex, &fragment)?;

        let attributes = vertex
            .inputs
            .iter()
            .map(|input| {
                (
                    input.name.clone(),
                    AttributeInfo {
                        location: input.location,
                        type_name: input.type_name.clone(),
                        components: input.components,
                    },
                )
            })
            .collect();

        let mut uniforms = BTreeMap::new();
        let mut uniform_block: Option<(u32, u32)> = None;
        let mut resources: Vec<ResourceInfo> = Vec::new();

        for (stage, interface) in [
            (ShaderStage::Vertex, &vertex),
            (ShaderStage::Fragment, &fragment),
        ] {
            for resource in &interface.resources {
                if let Some(existing) = resources.iter_mut().find(|r| r.binding == resource.binding)
                {
                    existing.visibility |= stage.visibility();
                    continue;
                }

                let kind = match &resource.kind {
                    GlobalKind::Uniform { span, .. } => {
                        if let Some((binding, _)) = uniform_block {
                            return Err(RenderError::ProgramLink {
                                log: format!(
                                    "uniform `{}` at binding {}: only one uniform block is supported (already at {binding})",
                                    resource.name, resource.binding
                                ),
                            });
                        }
                        uniform_block = Some((resource.binding, *span));
                        uniforms.extend(resource.uniform_slots.iter().cloned());
                        ResourceKind::UniformBuffer
                    }
                    GlobalKind::Texture => ResourceKind::Texture,
                    GlobalKind::Sampler => ResourceKind::Sampler,
                    // Rejected during link.
                    GlobalKind::Unsupported(_) => continue,
                };

                resources.push(ResourceInfo {
                    binding: resource.binding,
                    kind,
                    visibility: stage.visibility(),
                });
            }
        }
        resources.sort_by_key(|r| r.binding);

        Ok(Self {
            attributes,
            uniforms,
            uniform_block_size: uniform_block.map_or(0, |(_, span)| span),
            resources,
        })
    }

    /// Vertex inputs by name.
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, AttributeInfo> {
        &self.attributes
    }

    /// Looks up a uniform member.
    #[must_use]
    pub fn uniform_slot(&self, name: &str) -> Option<&UniformSlot> {
        self.uniforms.get(name)
    }

    /// Size in bytes of the uniform block, 0 without one.
    #[must_use]
    pub fn uniform_block_size(&self) -> u32 {
        self.uniform_block_size
    }

    /// Group 0 bindings sorted by binding index.
    #[must_use]
    pub fn resources(&self) -> &[ResourceInfo] {
        &self.resources
    }

    /// Resolves the names a caller is going to use.
    ///
    /// Missing uniforms are logged and skipped; a missing attribute is an error.
    pub fn resolve_locations(
        &self,
        attribute_names: &[&str],
        uniform_names: &[&str],
    ) -> RenderResult<Locations> {
        let mut locations = Locations::default();

        for &name in attribute_names {
            let info = self
                .attributes
                .get(name)
                .ok_or_else(|| RenderError::MissingAttribute(name.to_string()))?;
            log::debug!("attribute {name} -> location {}", info.location);
            locations.attributes.insert(name.to_string(), info.location);
        }

        for &name in uniform_names {
            match self.uniforms.get(name) {
                Some(slot) => {
                    log::debug!("uniform {name} -> offset {}", slot.offset);
                    locations.uniforms.insert(name.to_string(), slot.clone());
                }
                None => log::warn!("uniform {name} is not used by the program"),
            }
        }

        Ok(locations)
    }
}

/// Builder for creating shader programs.
pub struct ShaderBuilder {
    vertex_source: Option<String>,
    fragment_source: Option<String>,
    vertex_entry: String,
    fragment_entry: String,
    attributes: Vec<String>,
    uniforms: Vec<String>,
    label: Option<String>,
}

impl ShaderBuilder {
    /// Creates a new shader builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            vertex_source: None,
            fragment_source: None,
            vertex_entry: VERTEX_ENTRY.to_string(),
            fragment_entry: FRAGMENT_ENTRY.to_string(),
            attributes: Vec::new(),
            uniforms: Vec::new(),
            label: None,
        }
    }

    /// Builder preloaded with the horn surface shaders and names.
    #[must_use]
    pub fn surface() -> Self {
        Self::new()
            .with_vertex(SURFACE_VERTEX_SHADER)
            .with_fragment(SURFACE_FRAGMENT_SHADER)
            .with_attributes(&["a_vertex", "a_tex_coord_uv"])
            .with_uniforms(&[
                "model_view_matrix",
                "projection_matrix",
                "normal_matrix",
                "light_position",
                "u_texture_scale",
                "u_texture_center",
                "u_texture_rot_axis",
                "u_texture_rot_angle_deg",
            ])
            .with_label("horn surface")
    }

    /// Sets the vertex shader source (WGSL).
    pub fn with_vertex(mut self, source: impl Into<String>) -> Self {
        self.vertex_source = Some(source.into());
        self
    }

    /// Sets the fragment shader source (WGSL).
    pub fn with_fragment(mut self, source: impl Into<String>) -> Self {
        self.fragment_source = Some(source.into());
        self
    }

    /// Sets the vertex shader entry point.
    pub fn with_vertex_entry(mut self, entry: impl Into<String>) -> Self {
        self.vertex_entry = entry.into();
        self
    }

    /// Sets the fragment shader entry point.
    pub fn with_fragment_entry(mut self, entry: impl Into<String>) -> Self {
        self.fragment_entry = entry.into();
        self
    }

    /// Attributes that must exist in the vertex stage.
    pub fn with_attributes(mut self, names: &[&str]) -> Self {
        self.attributes = names.iter().map(|n| (*n).to_string()).collect();
        self
    }

    /// Uniforms the caller intends to set.
    pub fn with_uniforms(mut self, names: &[&str]) -> Self {
        self.uniforms = names.iter().map(|n| (*n).to_string()).collect();
        self
    }

    /// Sets the shader label for debugging.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Compiles, links and resolves names without touching the GPU.
    pub fn layout(&self) -> RenderResult<(ProgramLayout, Locations)> {
        let vertex = self
            .vertex_source
            .as_deref()
            .ok_or_else(|| RenderError::ShaderCompile {
                stage: ShaderStage::Vertex,
                log: "missing vertex shader source".into(),
            })?;
        let fragment = self
            .fragment_source
            .as_deref()
            .ok_or_else(|| RenderError::ShaderCompile {
                stage: ShaderStage::Fragment,
                log: "missing fragment shader source".into(),
            })?;

        let layout = ProgramLayout::compile_with_entries(
            vertex,
            &self.vertex_entry,
            fragment,
            &self.fragment_entry,
        )?;
        let attributes: Vec<&str> = self.attributes.iter().map(String::as_str).collect();
        let uniforms: Vec<&str> = self.uniforms.iter().map(String::as_str).collect();
        let locations = layout.resolve_locations(&attributes, &uniforms)?;
        Ok((layout, locations))
    }

    /// Builds the program for a color target format.
    pub fn build(
        self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
    ) -> RenderResult<ShaderProgram> {
        let (layout, locations) = self.layout()?;
        let label = self.label.unwrap_or_else(|| "program".into());

        // Both sources validated above.
        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} vertex")),
            source: wgpu::ShaderSource::Wgsl(self.vertex_source.unwrap_or_default().into()),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} fragment")),
            source: wgpu::ShaderSource::Wgsl(self.fragment_source.unwrap_or_default().into()),
        });

        let entries: Vec<wgpu::BindGroupLayoutEntry> = layout
            .resources()
            .iter()
            .map(|resource| wgpu::BindGroupLayoutEntry {
                binding: resource.binding,
                visibility: resource.visibility,
                ty: match resource.kind {
                    ResourceKind::UniformBuffer => wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    ResourceKind::Texture => wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    ResourceKind::Sampler => {
                        wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                    }
                },
                count: None,
            })
            .collect();

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} bind group layout")),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label} pipeline layout")),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let uniform_block = UniformBlock::new(layout.uniform_block_size() as usize);
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label} uniforms")),
            size: u64::from(layout.uniform_block_size().max(16)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let texture = SurfaceTexture::white(device, queue);
        let sampler = SurfaceTexture::create_sampler(device);
        let bind_group = create_bind_group(
            device,
            &label,
            &layout,
            &bind_group_layout,
            &uniform_buffer,
            &texture,
            &sampler,
        );

        log::info!(
            "built program '{label}' ({} attributes, {} uniforms, {} bytes of uniforms)",
            locations.attributes.len(),
            locations.uniforms.len(),
            layout.uniform_block_size()
        );

        Ok(ShaderProgram {
            label,
            layout,
            locations,
            vertex_entry: self.vertex_entry,
            fragment_entry: self.fragment_entry,
            vertex_module,
            fragment_module,
            bind_group_layout,
            pipeline_layout,
            pipelines: Vec::new(),
            color_format,
            uniform_block,
            uniform_buffer,
            texture,
            sampler,
            bind_group,
            vertex_buffer: None,
        })
    }
}

impl Default for ShaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    label: &str,
    layout: &ProgramLayout,
    bind_group_layout: &wgpu::BindGroupLayout,
    uniform_buffer: &wgpu::Buffer,
    texture: &SurfaceTexture,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    let entries: Vec<wgpu::BindGroupEntry> = layout
        .resources()
        .iter()
        .map(|resource| wgpu::BindGroupEntry {
            binding: resource.binding,
            resource: match resource.kind {
                ResourceKind::UniformBuffer => uniform_buffer.as_entire_binding(),
                ResourceKind::Texture => wgpu::BindingResource::TextureView(&texture.view),
                ResourceKind::Sampler => wgpu::BindingResource::Sampler(sampler),
            },
        })
        .collect();

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("{label} bind group")),
        layout: bind_group_layout,
        entries: &entries,
    })
}

/// The uploaded vertex buffer and how each attribute reads it.
struct VertexSource {
    buffer: wgpu::Buffer,
    byte_len: usize,
    bindings: Vec<(u32, AttributeBinding)>,
}

impl VertexSource {
    fn check_ranges(&self, ranges: &[DrawRange]) -> RenderResult<()> {
        check_draw_ranges(self.byte_len, &self.bindings, ranges)
    }
}

/// Fails if any binding would read past `byte_len` for any range.
fn check_draw_ranges(
    byte_len: usize,
    bindings: &[(u32, AttributeBinding)],
    ranges: &[DrawRange],
) -> RenderResult<()> {
    for range in ranges {
        let end = range.offset as usize + range.count as usize;
        for (_, binding) in bindings {
            let required = binding.required_bytes(end);
            if required > byte_len {
                return Err(RenderError::BufferSizeMismatch {
                    expected: required,
                    actual: byte_len,
                });
            }
        }
    }
    Ok(())
}

/// A compiled and linked program with its GPU resources.
pub struct ShaderProgram {
    label: String,
    layout: ProgramLayout,
    locations: Locations,
    vertex_entry: String,
    fragment_entry: String,
    vertex_module: wgpu::ShaderModule,
    fragment_module: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    /// Pipelines by color write mask, created on first use.
    pipelines: Vec<(wgpu::ColorWrites, wgpu::RenderPipeline)>,
    color_format: wgpu::TextureFormat,
    uniform_block: UniformBlock,
    uniform_buffer: wgpu::Buffer,
    texture: SurfaceTexture,
    sampler: wgpu::Sampler,
    bind_group: wgpu::BindGroup,
    vertex_buffer: Option<VertexSource>,
}

impl ShaderProgram {
    /// The reflected program interface.
    #[must_use]
    pub fn layout(&self) -> &ProgramLayout {
        &self.layout
    }

    /// Names resolved at build time.
    #[must_use]
    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    /// Writes a uniform into the CPU block. Unknown names are ignored.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) -> RenderResult<()> {
        let Some(slot) = self.layout.uniforms.get(name) else {
            log::trace!("{}: ignoring unknown uniform {name}", self.label);
            return Ok(());
        };
        self.uniform_block.write(name, slot, value.into())
    }

    /// Uploads pending uniform changes.
    pub fn flush_uniforms(&mut self, queue: &wgpu::Queue) {
        if self.uniform_block.take_dirty() && !self.uniform_block.as_bytes().is_empty() {
            queue.write_buffer(&self.uniform_buffer, 0, self.uniform_block.as_bytes());
        }
    }

    /// Uploads the packed vertex data. Only one upload is allowed.
    ///
    /// The data must be whole floats. Draws are later checked against the
    /// number of vertices every binding can read.
    pub fn upload_interleaved_buffer(
        &mut self,
        device: &wgpu::Device,
        bytes: &[u8],
        bindings: &[(&str, AttributeBinding)],
    ) -> RenderResult<()> {
        if self.vertex_buffer.is_some() {
            return Err(RenderError::BufferAlreadyUploaded);
        }
        if bytes.len() % 4 != 0 {
            return Err(RenderError::BufferSizeMismatch {
                expected: bytes.len().next_multiple_of(4),
                actual: bytes.len(),
            });
        }

        let mut resolved = Vec::with_capacity(bindings.len());
        for &(name, binding) in bindings {
            let info = self
                .layout
                .attributes
                .get(name)
                .ok_or_else(|| RenderError::MissingAttribute(name.to_string()))?;
            if !(1..=4).contains(&binding.component_count) {
                return Err(RenderError::UnsupportedAttributeFormat {
                    name: name.to_string(),
                    components: binding.component_count,
                });
            }
            if binding.byte_offset as usize > bytes.len() {
                return Err(RenderError::BufferSizeMismatch {
                    expected: binding.byte_offset as usize,
                    actual: bytes.len(),
                });
            }
            resolved.push((info.location, binding));
        }

        let buffer = create_vertex_buffer(device, bytes, Some(&format!("{} vertices", self.label)));

        let capacity = resolved
            .iter()
            .map(|(_, binding)| binding.vertex_capacity(bytes.len()))
            .min()
            .unwrap_or(0);
        log::debug!(
            "{}: uploaded {} bytes for {} attributes, room for {capacity} vertices",
            self.label,
            bytes.len(),
            resolved.len()
        );
        self.vertex_buffer = Some(VertexSource {
            buffer,
            byte_len: bytes.len(),
            bindings: resolved,
        });
        // Vertex layouts are baked into pipelines.
        self.pipelines.clear();
        Ok(())
    }

    /// Replaces the bound texture with a decoded RGBA image.
    pub fn set_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &image::RgbaImage,
    ) -> RenderResult<()> {
        self.texture = SurfaceTexture::from_image(device, queue, image)?;
        self.bind_group = create_bind_group(
            device,
            &self.label,
            &self.layout,
            &self.bind_group_layout,
            &self.uniform_buffer,
            &self.texture,
            &self.sampler,
        );
        Ok(())
    }

    /// Size of the bound texture.
    #[must_use]
    pub fn texture_size(&self) -> (u32, u32) {
        (self.texture.width, self.texture.height)
    }

    /// Makes sure a pipeline exists for the given write mask.
    pub fn prepare(&mut self, device: &wgpu::Device, writes: wgpu::ColorWrites) -> RenderResult<()> {
        if self.pipelines.iter().any(|(w, _)| *w == writes) {
            return Ok(());
        }
        let source = self.vertex_buffer.as_ref().ok_or(RenderError::NoVertexBuffer)?;

        let attributes: Vec<[wgpu::VertexAttribute; 1]> = source
            .bindings
            .iter()
            .map(|(location, binding)| {
                [wgpu::VertexAttribute {
                    format: binding.vertex_format(),
                    offset: 0,
                    shader_location: *location,
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout> = source
            .bindings
            .iter()
            .zip(&attributes)
            .map(|((_, binding), attribute)| wgpu::VertexBufferLayout {
                array_stride: u64::from(binding.effective_stride()),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attribute,
            })
            .collect();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} pipeline {writes:?}", self.label)),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.vertex_module,
                entry_point: Some(self.vertex_entry.as_str()),
                buffers: &buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.fragment_module,
                entry_point: Some(self.fragment_entry.as_str()),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.color_format,
                    blend: None,
                    write_mask: writes,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        self.pipelines.push((writes, pipeline));
        Ok(())
    }

    /// Records one strip draw per range. [`ShaderProgram::prepare`] must have
    /// been called for `writes`.
    ///
    /// Nothing is recorded if a range reads past the uploaded data.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        writes: wgpu::ColorWrites,
        ranges: &[DrawRange],
    ) -> RenderResult<()> {
        let source = self.vertex_buffer.as_ref().ok_or(RenderError::NoVertexBuffer)?;
        let Some((_, pipeline)) = self.pipelines.iter().find(|(w, _)| *w == writes) else {
            return Err(RenderError::PipelineNotPrepared(writes));
        };
        source.check_ranges(ranges)?;

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        for (slot, (_, binding)) in source.bindings.iter().enumerate() {
            pass.set_vertex_buffer(
                slot as u32,
                source.buffer.slice(u64::from(binding.byte_offset)..),
            );
        }
        for range in ranges {
            pass.draw(range.vertices(), 0..1);
        }
        Ok(())
    }
}
