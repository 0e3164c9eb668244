//! Container module - reading and writing the files around the codecs
//!
//! This module handles:
//! - Writing one AAC stream into a file whose format follows its extension
//! - Opening an input file and reading the packets of its audio stream

pub mod demuxer;
pub mod muxer;

pub use demuxer::ContainerReader;
pub use muxer::ContainerWriter;

use crate::error::{Result, TranscodeError};

/// Lifecycle of an output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Context allocated, streams may be added
    Allocated,
    /// File opened and header written
    HeaderWritten,
    /// At least one packet written
    Streaming,
    /// Trailer written, the file is complete
    TrailerWritten,
}

impl WriterState {
    /// Streams can only be added before the header is written.
    pub fn check_add_stream(self) -> Result<()> {
        match self {
            WriterState::Allocated => Ok(()),
            other => Err(out_of_order("add a stream", other)),
        }
    }

    pub fn check_header(self) -> Result<()> {
        match self {
            WriterState::Allocated => Ok(()),
            other => Err(out_of_order("write the header", other)),
        }
    }

    pub fn check_packet(self) -> Result<()> {
        match self {
            WriterState::HeaderWritten | WriterState::Streaming => Ok(()),
            other => Err(out_of_order("write a packet", other)),
        }
    }

    pub fn check_trailer(self) -> Result<()> {
        match self {
            WriterState::HeaderWritten | WriterState::Streaming => Ok(()),
            other => Err(out_of_order("write the trailer", other)),
        }
    }
}

fn out_of_order(action: &str, state: WriterState) -> TranscodeError {
    TranscodeError::Container(format!("cannot {} in state {:?}", action, state))
}
