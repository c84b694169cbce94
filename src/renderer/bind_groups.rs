//! Bind groups shared by the scene passes.
//!
//! - [`FrameBindings`]: `@group(0)`, the four uniform blocks. Per-object and
//!   material blocks are dynamic-offset arrays indexed by object slot.
//! - [`MaterialBindings`]: `@group(1)`, material textures, one bind group per
//!   distinct `(albedo, normal, orm)` texture triple.

use std::mem::size_of;

use rustc_hash::FxHashMap;

use super::dynamic_buffer::DynamicBuffer;
use super::gpu_resources::GpuTextureCache;
use super::queue::RenderQueue;
use super::uniforms::{
    FRAME_BINDING, MATERIAL_BINDING, MaterialData, OBJECT_BINDING, PerFrameData, PerObjectData, SHADOW_BINDING,
    ShadowData,
};
use crate::core::TextureHandle;

fn uniform_entry(binding: u32, dynamic: bool, size: usize) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: wgpu::BufferSize::new(size as u64),
        },
        count: None,
    }
}

pub struct FrameBindings {
    layout: wgpu::BindGroupLayout,
    frame_buffer: wgpu::Buffer,
    shadow_buffer: wgpu::Buffer,
    objects: DynamicBuffer<PerObjectData>,
    materials: DynamicBuffer<MaterialData>,
    bind_group: wgpu::BindGroup,
    /// Generations of the dynamic buffers `bind_group` was built against.
    bound: (u64, u64),

    object_scratch: Vec<PerObjectData>,
    material_scratch: Vec<MaterialData>,
}

impl FrameBindings {
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[
                uniform_entry(FRAME_BINDING, false, size_of::<PerFrameData>()),
                uniform_entry(OBJECT_BINDING, true, size_of::<PerObjectData>()),
                uniform_entry(SHADOW_BINDING, false, size_of::<ShadowData>()),
                uniform_entry(MATERIAL_BINDING, true, size_of::<MaterialData>()),
            ],
        });

        let uniform = |label: &str, size: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let frame_buffer = uniform("Per-Frame Uniforms", size_of::<PerFrameData>());
        let shadow_buffer = uniform("Shadow Uniforms", size_of::<ShadowData>());
        let objects = DynamicBuffer::new(device, "Per-Object Uniforms");
        let materials = DynamicBuffer::new(device, "Material Uniforms");

        let bind_group = Self::create_bind_group(device, &layout, &frame_buffer, &shadow_buffer, &objects, &materials);
        let bound = (objects.generation(), materials.generation());

        Self {
            layout,
            frame_buffer,
            shadow_buffer,
            objects,
            materials,
            bind_group,
            bound,
            object_scratch: Vec::new(),
            material_scratch: Vec::new(),
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        frame_buffer: &wgpu::Buffer,
        shadow_buffer: &wgpu::Buffer,
        objects: &DynamicBuffer<PerObjectData>,
        materials: &DynamicBuffer<MaterialData>,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: FRAME_BINDING,
                    resource: frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: OBJECT_BINDING,
                    resource: objects.binding(),
                },
                wgpu::BindGroupEntry {
                    binding: SHADOW_BINDING,
                    resource: shadow_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: MATERIAL_BINDING,
                    resource: materials.binding(),
                },
            ],
        })
    }

    /// Uploads this frame's uniforms: frame and shadow blocks once, then one
    /// object and one material block per command in object-slot order.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        frame: &PerFrameData,
        shadow: &ShadowData,
        commands: &RenderQueue,
    ) {
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(frame));
        queue.write_buffer(&self.shadow_buffer, 0, bytemuck::bytes_of(shadow));

        self.object_scratch.clear();
        self.material_scratch.clear();
        for (_, cmd) in commands.object_slots() {
            self.object_scratch.push(cmd.object_data());
            self.material_scratch.push(cmd.material_data());
        }
        self.objects.write(device, queue, &self.object_scratch);
        self.materials.write(device, queue, &self.material_scratch);

        let generations = (self.objects.generation(), self.materials.generation());
        if generations != self.bound {
            self.bind_group = Self::create_bind_group(
                device,
                &self.layout,
                &self.frame_buffer,
                &self.shadow_buffer,
                &self.objects,
                &self.materials,
            );
            self.bound = generations;
        }
    }

    #[must_use]
    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    #[must_use]
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Dynamic offsets for `slot`, in binding order (object, material).
    #[inline]
    #[must_use]
    pub fn offsets(&self, slot: u32) -> [u32; 2] {
        [self.objects.offset(slot), self.materials.offset(slot)]
    }
}

pub struct MaterialBindings {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    groups: FxHashMap<[TextureHandle; 3], wgpu::BindGroup>,
}

impl MaterialBindings {
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                texture_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        Self {
            layout,
            sampler,
            groups: FxHashMap::default(),
        }
    }

    /// Creates bind groups for texture triples seen for the first time.
    /// Textures must already be resident in `textures`.
    pub fn prepare(&mut self, device: &wgpu::Device, textures: &GpuTextureCache, commands: &RenderQueue) {
        for (_, cmd) in commands.object_slots() {
            let key = cmd.texture_key();
            if self.groups.contains_key(&key) {
                continue;
            }

            let (Some(albedo), Some(normal), Some(orm)) =
                (textures.view(key[0]), textures.view(key[1]), textures.view(key[2]))
            else {
                log::warn!("Material texture missing on the GPU; draw will be skipped");
                continue;
            };

            let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Material Bind Group"),
                layout: &self.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(albedo),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(normal),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(orm),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });
            self.groups.insert(key, group);
        }
    }

    #[must_use]
    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    #[must_use]
    pub fn get(&self, key: &[TextureHandle; 3]) -> Option<&wgpu::BindGroup> {
        self.groups.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
