// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use ductus_core::time::HostTime;
use ductus_core::trace::{
    CommandEvent, CommandKind, FrameBeginEvent, FrameSummary, InputBatchEvent, PhaseBeginEvent,
    PhaseEndEvent, PhaseKind, TouchPhase, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_INPUT_BATCH: u8 = 1;
const TAG_FRAME_BEGIN: u8 = 2;
const TAG_PHASE_BEGIN: u8 = 3;
const TAG_PHASE_END: u8 = 4;
const TAG_COMMAND: u8 = 5;
const TAG_FRAME_SUMMARY: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_time(&mut self, t: HostTime) {
        self.write_u64(t.nanos());
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Input => 0,
            PhaseKind::Execute => 1,
            PhaseKind::Composite => 2,
            PhaseKind::Present => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_input_batch(&mut self, e: &InputBatchEvent) {
        self.write_u8(TAG_INPUT_BATCH);
        self.write_u8(match e.phase {
            TouchPhase::Begin => 0,
            TouchPhase::Move => 1,
            TouchPhase::End => 2,
            TouchPhase::Cancel => 3,
        });
        self.write_time(e.timestamp);
        self.write_u32(e.accepted);
        self.write_u32(e.rejected);
        self.write_u32(e.dropped);
    }

    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.write_u8(TAG_FRAME_BEGIN);
        self.write_u64(e.frame_index);
        self.write_time(e.now);
        self.write_u32(e.queued);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_time(e.timestamp);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_time(e.timestamp);
    }

    fn on_command(&mut self, e: &CommandEvent) {
        self.write_u8(TAG_COMMAND);
        self.write_u64(e.frame_index);
        self.write_u8(match e.kind {
            CommandKind::Stroke => 0,
            CommandKind::Path => 1,
            CommandKind::Composite => 2,
        });
        self.write_u8(e.priority);
        self.write_time(e.start);
        self.write_time(e.end);
        self.write_u8(u8::from(e.failed));
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_u8(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_time(s.now);
        self.write_u64(s.budget_ns);
        self.write_u64(s.input_ns);
        self.write_u64(s.execute_ns);
        self.write_u64(s.composite_ns);
        self.write_u64(s.present_ns);
        self.write_u32(s.executed);
        self.write_u32(s.deferred);
        self.write_u32(s.failed);
        self.write_u8(u8::from(s.over_budget));
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// An [`InputBatchEvent`].
    InputBatch(InputBatchEvent),
    /// A [`FrameBeginEvent`].
    FrameBegin(FrameBeginEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`CommandEvent`].
    Command(CommandEvent),
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|b| b != 0)
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Input,
            1 => PhaseKind::Execute,
            2 => PhaseKind::Composite,
            _ => PhaseKind::Present,
        })
    }

    fn decode_input_batch(&mut self) -> Option<RecordedEvent> {
        let phase = match self.read_u8()? {
            0 => TouchPhase::Begin,
            1 => TouchPhase::Move,
            2 => TouchPhase::End,
            _ => TouchPhase::Cancel,
        };
        Some(RecordedEvent::InputBatch(InputBatchEvent {
            phase,
            timestamp: self.read_time()?,
            accepted: self.read_u32()?,
            rejected: self.read_u32()?,
            dropped: self.read_u32()?,
        }))
    }

    fn decode_frame_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameBegin(FrameBeginEvent {
            frame_index: self.read_u64()?,
            now: self.read_time()?,
            queued: self.read_u32()?,
        }))
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_command(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let kind = match self.read_u8()? {
            0 => CommandKind::Stroke,
            1 => CommandKind::Path,
            _ => CommandKind::Composite,
        };
        Some(RecordedEvent::Command(CommandEvent {
            frame_index,
            kind,
            priority: self.read_u8()?,
            start: self.read_time()?,
            end: self.read_time()?,
            failed: self.read_bool()?,
        }))
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_index: self.read_u64()?,
            now: self.read_time()?,
            budget_ns: self.read_u64()?,
            input_ns: self.read_u64()?,
            execute_ns: self.read_u64()?,
            composite_ns: self.read_u64()?,
            present_ns: self.read_u64()?,
            executed: self.read_u32()?,
            deferred: self.read_u32()?,
            failed: self.read_u32()?,
            over_budget: self.read_bool()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_INPUT_BATCH => self.decode_input_batch(),
            TAG_FRAME_BEGIN => self.decode_frame_begin(),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_COMMAND => self.decode_command(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> FrameSummary {
        FrameSummary {
            frame_index: 7,
            now: HostTime(1_000_000),
            budget_ns: 6_666_666,
            input_ns: 0,
            execute_ns: 4_000_000,
            composite_ns: 300_000,
            present_ns: 200_000,
            executed: 12,
            deferred: 3,
            failed: 1,
            over_budget: false,
        }
    }

    fn sample_command() -> CommandEvent {
        CommandEvent {
            frame_index: 7,
            kind: CommandKind::Stroke,
            priority: 2,
            start: HostTime(1_000_000),
            end: HostTime(1_250_000),
            failed: true,
        }
    }

    #[test]
    fn frame_timeline_decodes_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 7,
            now: HostTime(1_000_000),
            queued: 15,
        });
        rec.on_phase_begin(&PhaseBeginEvent {
            frame_index: 7,
            phase: PhaseKind::Execute,
            timestamp: HostTime(1_000_000),
        });
        rec.on_command(&sample_command());
        rec.on_phase_end(&PhaseEndEvent {
            frame_index: 7,
            phase: PhaseKind::Execute,
            timestamp: HostTime(5_000_000),
        });
        rec.on_frame_summary(&sample_summary());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], RecordedEvent::FrameBegin(e) if e.queued == 15));
        assert!(matches!(events[1], RecordedEvent::PhaseBegin(e) if e.phase == PhaseKind::Execute));
        match &events[2] {
            RecordedEvent::Command(e) => {
                assert_eq!(e.kind, CommandKind::Stroke);
                assert_eq!(e.priority, 2);
                assert_eq!(e.end, HostTime(1_250_000));
                assert!(e.failed);
            }
            other => panic!("expected Command, got {other:?}"),
        }
        assert!(matches!(events[3], RecordedEvent::PhaseEnd(e) if e.timestamp == HostTime(5_000_000)));
        match &events[4] {
            RecordedEvent::FrameSummary(s) => {
                assert_eq!(s.execute_ns, 4_000_000);
                assert_eq!((s.executed, s.deferred, s.failed), (12, 3, 1));
                assert!(!s.over_budget);
            }
            other => panic!("expected FrameSummary, got {other:?}"),
        }
    }

    #[test]
    fn input_batches_keep_their_counts() {
        let mut rec = RecorderSink::new();
        rec.on_input_batch(&InputBatchEvent {
            phase: TouchPhase::Cancel,
            timestamp: HostTime(42),
            accepted: 1,
            rejected: 2,
            dropped: 3,
        });
        match decode(rec.as_bytes()).next() {
            Some(RecordedEvent::InputBatch(e)) => {
                assert_eq!(e.phase, TouchPhase::Cancel);
                assert_eq!((e.accepted, e.rejected, e.dropped), (1, 2, 3));
            }
            other => panic!("expected InputBatch, got {other:?}"),
        }
    }

    #[test]
    fn truncated_records_end_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_command(&sample_command());
        rec.on_frame_summary(&sample_summary());
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 1);
        assert!(decode(&[]).next().is_none());
        assert!(decode(&[0xff, 0, 0]).next().is_none(), "unknown tag");
    }
}
