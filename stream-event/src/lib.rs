//! Stream event protocol: one JSON event per `data: ` line.
//!
//! This crate defines the wire shape of a single server event and the framing layer that
//! turns raw bytes into events. It has no knowledge of game semantics and no async runtime;
//! questline wraps [`FrameDecoder`] around an HTTP body stream.

pub mod event;
pub mod frame;

pub use event::StreamEvent;
pub use frame::{encode_frame, Frame, FrameDecoder, FRAME_MARKER};
