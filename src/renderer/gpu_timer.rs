//! Per-pass GPU timing with timestamp queries.
//!
//! Two query slots are used alternately. A frame records begin/end timestamps
//! for each [`GpuStage`] into its slot, resolves them and copies them into the
//! slot's readback buffer, which is then mapped asynchronously. Results are
//! picked up by [`GpuTimer::collect`] once the map callback has fired, one or
//! more frames later; nothing ever waits on the GPU. A frame whose slot is
//! still in flight simply goes untimed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use rustc_hash::FxHashMap;

/// Timed stages in frame order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuStage {
    Shadow,
    GBuffer,
    Lighting,
    PostFx,
}

impl GpuStage {
    pub const ALL: [GpuStage; 4] = [Self::Shadow, Self::GBuffer, Self::Lighting, Self::PostFx];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Shadow => "Shadow",
            Self::GBuffer => "GBuffer",
            Self::Lighting => "Lighting",
            Self::PostFx => "PostFX",
        }
    }

    fn index(self) -> u32 {
        self as u32
    }
}

const SLOT_COUNT: usize = 2;
const QUERIES_PER_SLOT: u32 = GpuStage::ALL.len() as u32 * 2;
const SLOT_BYTES: u64 = QUERIES_PER_SLOT as u64 * 8;

/// Byte offset of `slot` inside the shared resolve buffer. Resolve
/// destinations must sit on `QUERY_RESOLVE_BUFFER_ALIGNMENT`.
#[must_use]
pub fn resolve_offset(slot: usize) -> wgpu::BufferAddress {
    slot as u64 * wgpu::util::align_to(SLOT_BYTES, wgpu::QUERY_RESOLVE_BUFFER_ALIGNMENT)
}

const SLOT_IDLE: u8 = 0;
const SLOT_MAPPING: u8 = 1;
const SLOT_READY: u8 = 2;
const SLOT_FAILED: u8 = 3;

struct ReadbackSlot {
    buffer: wgpu::Buffer,
    state: Arc<AtomicU8>,
}

/// Query slot claimed for the frame being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedFrame {
    slot: usize,
}

pub struct GpuTimer {
    query_set: wgpu::QuerySet,
    resolve_buffer: wgpu::Buffer,
    slots: [ReadbackSlot; SLOT_COUNT],
    next_slot: usize,
    /// Nanoseconds per timestamp tick.
    period: f32,
}

impl GpuTimer {
    /// Returns `None` when the device was created without `TIMESTAMP_QUERY`.
    #[must_use]
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Option<Self> {
        if !device.features().contains(wgpu::Features::TIMESTAMP_QUERY) {
            log::info!("GPU timing disabled: TIMESTAMP_QUERY not supported");
            return None;
        }

        let query_set = device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("GPU Timer Queries"),
            ty: wgpu::QueryType::Timestamp,
            count: QUERIES_PER_SLOT * SLOT_COUNT as u32,
        });
        let resolve_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("GPU Timer Resolve"),
            size: resolve_offset(SLOT_COUNT),
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let slots = std::array::from_fn(|i| ReadbackSlot {
            buffer: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(if i == 0 { "GPU Timer Readback 0" } else { "GPU Timer Readback 1" }),
                size: SLOT_BYTES,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            state: Arc::new(AtomicU8::new(SLOT_IDLE)),
        });

        Some(Self {
            query_set,
            resolve_buffer,
            slots,
            next_slot: 0,
            period: queue.get_timestamp_period(),
        })
    }

    /// Claims the next slot, or `None` if its previous readback is still pending.
    pub fn begin_frame(&mut self) -> Option<TimedFrame> {
        let slot = self.next_slot;
        if self.slots[slot].state.load(Ordering::Acquire) != SLOT_IDLE {
            return None;
        }
        self.next_slot = (slot + 1) % SLOT_COUNT;
        Some(TimedFrame { slot })
    }

    fn query_index(frame: TimedFrame, stage: GpuStage, end: bool) -> u32 {
        frame.slot as u32 * QUERIES_PER_SLOT + stage.index() * 2 + u32::from(end)
    }

    /// Timestamp writes for a render pass that spans a whole stage.
    #[must_use]
    pub fn pass_writes(&self, frame: TimedFrame, stage: GpuStage) -> wgpu::RenderPassTimestampWrites<'_> {
        self.span_writes(frame, stage, true, true)
    }

    /// Timestamp writes for one render pass of a stage spread over several
    /// passes: `first` records the begin stamp, `last` the end stamp.
    #[must_use]
    pub fn span_writes(
        &self,
        frame: TimedFrame,
        stage: GpuStage,
        first: bool,
        last: bool,
    ) -> wgpu::RenderPassTimestampWrites<'_> {
        wgpu::RenderPassTimestampWrites {
            query_set: &self.query_set,
            beginning_of_pass_write_index: first.then(|| Self::query_index(frame, stage, false)),
            end_of_pass_write_index: last.then(|| Self::query_index(frame, stage, true)),
        }
    }

    /// Binds the timer to a claimed frame for handing to the passes.
    #[must_use]
    pub fn stage_timing(&self, frame: TimedFrame) -> StageTiming<'_> {
        StageTiming { timer: self, frame }
    }

    /// Resolves the frame's queries into its readback buffer.
    pub fn resolve(&self, encoder: &mut wgpu::CommandEncoder, frame: TimedFrame) {
        let first = frame.slot as u32 * QUERIES_PER_SLOT;
        let offset = resolve_offset(frame.slot);
        encoder.resolve_query_set(&self.query_set, first..first + QUERIES_PER_SLOT, &self.resolve_buffer, offset);
        encoder.copy_buffer_to_buffer(&self.resolve_buffer, offset, &self.slots[frame.slot].buffer, 0, SLOT_BYTES);
    }

    /// Starts the asynchronous readback. Call after the frame was submitted.
    pub fn after_submit(&self, frame: TimedFrame) {
        let slot = &self.slots[frame.slot];
        slot.state.store(SLOT_MAPPING, Ordering::Release);
        let state = Arc::clone(&slot.state);
        slot.buffer.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            let next = if result.is_ok() { SLOT_READY } else { SLOT_FAILED };
            state.store(next, Ordering::Release);
        });
    }

    /// Returns milliseconds per stage for every slot whose readback completed.
    pub fn collect(&mut self, device: &wgpu::Device) -> FxHashMap<&'static str, f32> {
        let _ = device.poll(wgpu::PollType::Poll);

        let mut fresh = FxHashMap::default();
        for slot in &self.slots {
            match slot.state.load(Ordering::Acquire) {
                SLOT_READY => {
                    let ticks: Vec<u64> = {
                        let view = slot.buffer.slice(..).get_mapped_range();
                        bytemuck::pod_collect_to_vec(&view[..])
                    };
                    slot.buffer.unmap();
                    slot.state.store(SLOT_IDLE, Ordering::Release);
                    fresh.extend(stage_millis(&ticks, self.period));
                }
                SLOT_FAILED => {
                    log::warn!("GPU timer readback failed; dropping one frame of timings");
                    slot.state.store(SLOT_IDLE, Ordering::Release);
                }
                _ => {}
            }
        }
        fresh
    }
}

/// A timer and the frame being recorded; passes take `Option<StageTiming>`.
#[derive(Clone, Copy)]
pub struct StageTiming<'a> {
    timer: &'a GpuTimer,
    frame: TimedFrame,
}

impl<'a> StageTiming<'a> {
    #[must_use]
    pub fn pass(self, stage: GpuStage) -> wgpu::RenderPassTimestampWrites<'a> {
        self.timer.pass_writes(self.frame, stage)
    }

    #[must_use]
    pub fn span(self, stage: GpuStage, first: bool, last: bool) -> wgpu::RenderPassTimestampWrites<'a> {
        self.timer.span_writes(self.frame, stage, first, last)
    }
}

/// Converts begin/end tick pairs into per-stage milliseconds, skipping stages
/// whose stamps were not written or went backwards.
fn stage_millis(ticks: &[u64], period_ns: f32) -> impl Iterator<Item = (&'static str, f32)> + '_ {
    GpuStage::ALL.into_iter().filter_map(move |stage| {
        let i = stage.index() as usize * 2;
        let (begin, end) = (*ticks.get(i)?, *ticks.get(i + 1)?);
        (begin != 0 && end >= begin).then(|| (stage.label(), (end - begin) as f32 * period_ns / 1.0e6))
    })
}

/// Exponentially smoothed stage timings.
///
/// A label seen for the first time takes its sample verbatim; labels missing
/// from a batch keep their previous value.
#[derive(Debug, Clone, Default)]
pub struct GpuTimings {
    values: FxHashMap<&'static str, f32>,
}

impl GpuTimings {
    pub fn fold(&mut self, fresh: &FxHashMap<&'static str, f32>, alpha: f32) {
        for (&label, &ms) in fresh {
            self.values
                .entry(label)
                .and_modify(|old| *old = *old * (1.0 - alpha) + ms * alpha)
                .or_insert(ms);
        }
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<f32> {
        self.values.get(label).copied()
    }

    #[must_use]
    pub fn as_map(&self) -> &FxHashMap<&'static str, f32> {
        &self.values
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(entries: &[(&'static str, f32)]) -> FxHashMap<&'static str, f32> {
        entries.iter().copied().collect()
    }

    #[test]
    fn first_sample_is_taken_verbatim() {
        let mut timings = GpuTimings::default();
        timings.fold(&batch(&[("Shadow", 2.0)]), 0.15);
        assert_eq!(timings.get("Shadow"), Some(2.0));
    }

    #[test]
    fn later_samples_are_smoothed() {
        let mut timings = GpuTimings::default();
        timings.fold(&batch(&[("Lighting", 1.0)]), 0.15);
        timings.fold(&batch(&[("Lighting", 2.0)]), 0.15);
        let value = timings.get("Lighting").unwrap();
        assert!((value - 1.15).abs() < 1e-5, "got {value}");
    }

    #[test]
    fn stale_entries_persist() {
        let mut timings = GpuTimings::default();
        timings.fold(&batch(&[("GBuffer", 3.0), ("PostFX", 1.0)]), 0.15);
        timings.fold(&batch(&[("PostFX", 1.0)]), 0.15);
        assert_eq!(timings.get("GBuffer"), Some(3.0));
    }

    #[test]
    fn resolve_offsets_are_aligned_and_disjoint() {
        for slot in 0..SLOT_COUNT {
            let offset = resolve_offset(slot);
            assert_eq!(offset % wgpu::QUERY_RESOLVE_BUFFER_ALIGNMENT, 0, "slot {slot}");
            assert!(offset + SLOT_BYTES <= resolve_offset(SLOT_COUNT));
        }
        assert!(resolve_offset(1) >= SLOT_BYTES);
    }

    #[test]
    fn query_indices_stay_inside_their_slot() {
        for slot in 0..SLOT_COUNT {
            let frame = TimedFrame { slot };
            for stage in GpuStage::ALL {
                for end in [false, true] {
                    let index = GpuTimer::query_index(frame, stage, end);
                    assert_eq!(index / QUERIES_PER_SLOT, slot as u32);
                }
            }
        }
    }

    #[test]
    fn stage_millis_skips_unwritten_pairs() {
        // Shadow: 1_000_000 ticks at 1ns = 1ms. GBuffer never written.
        let mut ticks = vec![0u64; QUERIES_PER_SLOT as usize];
        ticks[0] = 5;
        ticks[1] = 1_000_005;
        let out: Vec<_> = stage_millis(&ticks, 1.0).collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, "Shadow");
        assert!((out[0].1 - 1.0).abs() < 1e-4);
    }
}
