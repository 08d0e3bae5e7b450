use std::time::Duration;

use reelix_contracts::media::MediaProgress;

use crate::infra::constants::playback::buffering::{
    INITIAL_LOAD_BUFFER_FRACTION, INITIAL_LOAD_POSITION_MS, RECONNECT_BUFFER_MS,
};

/// Label shown on the buffering overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferingLabel {
    InitialLoad,
    Reconnecting,
    Buffering,
}

impl BufferingLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            BufferingLabel::InitialLoad => "Loading",
            BufferingLabel::Reconnecting => "Reconnecting",
            BufferingLabel::Buffering => "Buffering",
        }
    }
}

impl std::fmt::Display for BufferingLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a buffering period from the latest progress report.
///
/// Unknown duration counts as nothing buffered.
pub fn classify_buffering(progress: &MediaProgress, stalled: bool) -> BufferingLabel {
    let ahead = progress.buffered_ahead();
    let fraction = match progress.duration {
        Some(duration) if !duration.is_zero() => {
            ahead.as_secs_f64() / duration.as_secs_f64()
        }
        _ => 0.0,
    };

    if progress.position < Duration::from_millis(INITIAL_LOAD_POSITION_MS)
        && fraction < INITIAL_LOAD_BUFFER_FRACTION
    {
        BufferingLabel::InitialLoad
    } else if stalled && ahead < Duration::from_millis(RECONNECT_BUFFER_MS) {
        BufferingLabel::Reconnecting
    } else {
        BufferingLabel::Buffering
    }
}
