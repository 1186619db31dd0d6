use std::sync::atomic::{AtomicU8, Ordering};

use crate::render::{framegraph::TimelineStats, passes::FrameSettings};

#[derive(Debug, Clone, Copy)]
pub struct FrameRequest {
    pub index: u64,
    pub settings: FrameSettings,
}

#[derive(Debug, Clone)]
pub struct FrameComplete {
    pub index: u64,
    pub stats: TimelineStats,
    pub passes: Vec<String>,
    pub commands: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShutdownPhase {
    Running,
    StopGameplay,
    StopRender,
}

pub struct EngineControl {
    phase: AtomicU8,
}

impl Default for EngineControl {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineControl {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(ShutdownPhase::Running as u8),
        }
    }

    pub fn set_phase(&self, phase: ShutdownPhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    pub fn phase(&self) -> ShutdownPhase {
        match self.phase.load(Ordering::Acquire) {
            0 => ShutdownPhase::Running,
            1 => ShutdownPhase::StopGameplay,
            _ => ShutdownPhase::StopRender,
        }
    }
}
