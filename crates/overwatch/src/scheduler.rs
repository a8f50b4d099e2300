use std::ops::RangeInclusive;

use thiserror::Error;

use crate::EntityId;

/// Largest slot array an `EntityId` can address.
pub const MAX_CAPACITY: usize = u16::MAX as usize + 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("frame count must be non-zero")]
    ZeroFrames,
    #[error("slot array is empty")]
    EmptyCapacity,
    #[error("capacity {capacity} exceeds the addressable maximum {max}")]
    CapacityTooLarge { capacity: usize, max: usize },
    #[error("capacity {capacity} is not divisible into {frame_count} frames")]
    UnevenFrames { capacity: usize, frame_count: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    frame_count: u32,
    window: usize,
}

impl FrameLayout {
    pub fn new(frame_count: u32, capacity: usize) -> Result<Self, LayoutError> {
        if frame_count == 0 {
            return Err(LayoutError::ZeroFrames);
        }
        if capacity == 0 {
            return Err(LayoutError::EmptyCapacity);
        }
        if capacity > MAX_CAPACITY {
            return Err(LayoutError::CapacityTooLarge {
                capacity,
                max: MAX_CAPACITY,
            });
        }
        if capacity % frame_count as usize != 0 {
            return Err(LayoutError::UnevenFrames {
                capacity,
                frame_count,
            });
        }
        Ok(Self {
            frame_count,
            window: capacity / frame_count as usize,
        })
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn capacity(&self) -> usize {
        self.window * self.frame_count as usize
    }

    pub fn frame_of(&self, tick: u32) -> u32 {
        tick % self.frame_count
    }

    pub fn frame_of_id(&self, id: EntityId) -> u32 {
        (id.index() / self.window) as u32
    }

    /// Slot indices owned by `frame`, both ends inclusive.
    pub fn frame_range(&self, frame: u32) -> RangeInclusive<usize> {
        let first = frame as usize * self.window;
        first..=first + self.window - 1
    }

    pub fn frame_ids(&self, frame: u32) -> impl Iterator<Item = EntityId> {
        // Capacity is bounded by MAX_CAPACITY, so every index fits in a u16.
        self.frame_range(frame).map(|index| EntityId(index as u16))
    }

    pub fn all_ids(&self) -> impl Iterator<Item = EntityId> {
        (0..self.capacity()).map(|index| EntityId(index as u16))
    }
}

#[derive(Debug, Clone)]
pub struct FrameScheduler {
    layout: FrameLayout,
    last_processed_frame: u32,
}

impl FrameScheduler {
    /// Starts with the frame of `tick` already counted as processed.
    pub fn new(layout: FrameLayout, tick: u32) -> Self {
        Self {
            layout,
            last_processed_frame: layout.frame_of(tick),
        }
    }

    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    pub fn last_processed_frame(&self) -> u32 {
        self.last_processed_frame
    }

    /// Frames `due_frames(tick)` would yield.
    pub fn pending_frames(&self, tick: u32) -> u32 {
        let frames = self.layout.frame_count;
        (self.layout.frame_of(tick) + frames - self.last_processed_frame) % frames
    }

    /// Yields every frame after the last processed one up to and including
    /// the frame of `tick`, advancing the cursor as each is taken.
    pub fn due_frames(&mut self, tick: u32) -> DueFrames<'_> {
        let end = self.layout.frame_of(tick);
        DueFrames {
            scheduler: self,
            end,
        }
    }
}

pub struct DueFrames<'a> {
    scheduler: &'a mut FrameScheduler,
    end: u32,
}

impl Iterator for DueFrames<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let scheduler = &mut *self.scheduler;
        if scheduler.last_processed_frame == self.end {
            return None;
        }
        scheduler.last_processed_frame =
            (scheduler.last_processed_frame + 1) % scheduler.layout.frame_count;
        Some(scheduler.last_processed_frame)
    }
}
