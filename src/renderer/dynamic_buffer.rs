//! Dynamic-offset uniform array.
//!
//! Stores one `T` per draw slot at a stride aligned to the device's
//! `min_uniform_buffer_offset_alignment`, so a single bind group serves every
//! draw with `dynamic_offset = slot * stride`.
//!
//! The buffer grows (doubling) when a frame needs more slots than it holds.
//! Growth replaces the `wgpu::Buffer`, which bumps [`DynamicBuffer::generation`];
//! bind groups referencing it must be rebuilt when the generation changes.

use std::marker::PhantomData;
use std::mem::size_of;

use bytemuck::Pod;

use crate::core::align_to;

const INITIAL_CAPACITY: u32 = 128;

pub struct DynamicBuffer<T: Pod> {
    label: &'static str,
    buffer: wgpu::Buffer,
    stride: u64,
    capacity: u32,
    generation: u64,
    staging: Vec<u8>,
    _marker: PhantomData<T>,
}

impl<T: Pod> DynamicBuffer<T> {
    #[must_use]
    pub fn new(device: &wgpu::Device, label: &'static str) -> Self {
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let stride = align_to(size_of::<T>() as u64, alignment);
        Self {
            label,
            buffer: Self::create(device, label, stride, INITIAL_CAPACITY),
            stride,
            capacity: INITIAL_CAPACITY,
            generation: 0,
            staging: Vec::new(),
            _marker: PhantomData,
        }
    }

    fn create(device: &wgpu::Device, label: &str, stride: u64, capacity: u32) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: stride * u64::from(capacity),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Uploads `items` to slots `0..items.len()`, growing the buffer if needed.
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, items: &[T]) {
        if items.is_empty() {
            return;
        }

        let needed = items.len() as u32;
        if needed > self.capacity {
            let capacity = needed.next_power_of_two();
            log::info!(
                "Growing {} from {} to {capacity} slots",
                self.label,
                self.capacity
            );
            self.buffer = Self::create(device, self.label, self.stride, capacity);
            self.capacity = capacity;
            self.generation += 1;
        }

        let stride = self.stride as usize;
        self.staging.clear();
        self.staging.resize(stride * items.len(), 0);
        for (chunk, item) in self.staging.chunks_exact_mut(stride).zip(items) {
            chunk[..size_of::<T>()].copy_from_slice(bytemuck::bytes_of(item));
        }

        queue.write_buffer(&self.buffer, 0, &self.staging);
    }

    /// Dynamic offset of `slot`.
    #[inline]
    #[must_use]
    pub fn offset(&self, slot: u32) -> u32 {
        (u64::from(slot) * self.stride) as u32
    }

    /// Binding covering a single element; pair with a dynamic offset.
    #[must_use]
    pub fn binding(&self) -> wgpu::BindingResource<'_> {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: wgpu::BufferSize::new(size_of::<T>() as u64),
        })
    }

    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    #[must_use]
    pub fn stride(&self) -> u64 {
        self.stride
    }
}
