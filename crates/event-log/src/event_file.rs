//! Resumable loader for a single event file
//!
//! The file is an append-only TFRecord stream. Every poll resumes at the
//! last successfully-read byte offset, so partial trailing writes are
//! simply retried on the next poll. Checksum failures mark the file dead;
//! the rest of the pipeline keeps running.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use prost::Message;
use tb_proto::tensorboard::Event;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, warn};
use uploader_core::{Error, Result};

use crate::record::{read_frame, FrameRead};

/// Reads newly-appended events from one event file across polls
#[derive(Debug)]
pub struct EventFileLoader {
    path: PathBuf,
    offset: u64,
    error: Option<Error>,
}

impl EventFileLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            offset: 0,
            error: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of the last successfully-read frame boundary.
    /// Non-decreasing across polls.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The corruption that killed this file, if any
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Drain all complete, checksum-valid events appended since the last
    /// poll. A truncated trailing frame leaves the offset untouched.
    pub async fn poll(&mut self) -> Result<Vec<Event>> {
        if self.error.is_some() {
            return Ok(Vec::new());
        }

        let mut file = File::open(&self.path).await?;
        file.seek(SeekFrom::Start(self.offset)).await?;

        let mut tail = Vec::new();
        file.read_to_end(&mut tail).await?;

        let mut events = Vec::new();
        let mut cursor = 0usize;
        while cursor < tail.len() {
            match read_frame(&tail[cursor..]) {
                FrameRead::Frame { body, consumed } => {
                    match Event::decode(body.as_slice()) {
                        Ok(event) => events.push(event),
                        Err(e) => {
                            // Framing was valid, so the offset still advances
                            warn!(
                                path = %self.path.display(),
                                offset = self.offset + cursor as u64,
                                error = %e,
                                "Skipping undecodable event record"
                            );
                        }
                    }
                    cursor += consumed;
                    self.offset += consumed as u64;
                }
                FrameRead::Incomplete => {
                    debug!(
                        path = %self.path.display(),
                        offset = self.offset,
                        pending = tail.len() - cursor,
                        "Partial trailing frame; will retry next poll"
                    );
                    break;
                }
                FrameRead::Corrupt { reason } => {
                    let err = Error::CorruptRecord {
                        path: self.path.display().to_string(),
                        offset: self.offset,
                        reason: reason.to_string(),
                    };
                    warn!(error = %err, "Corrupt event file; skipping the rest of it");
                    self.error = Some(err);
                    break;
                }
            }
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::write_frame;
    use tb_proto::tensorboard::{event::What, Summary};
    use tempfile::tempdir;

    fn scalar_event(step: i64, value: f32) -> Event {
        Event {
            wall_time: 1000.0 + step as f64,
            step,
            what: Some(What::Summary(Summary {
                value: vec![tb_proto::tensorboard::summary::Value {
                    tag: "loss".to_string(),
                    metadata: None,
                    value: Some(
                        tb_proto::tensorboard::summary::value::Value::SimpleValue(value),
                    ),
                }],
            })),
        }
    }

    fn frame_of(event: &Event) -> Vec<u8> {
        let mut buf = Vec::new();
        write_frame(&mut buf, &event.encode_to_vec());
        buf
    }

    #[tokio::test]
    async fn test_poll_resumes_at_offset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.out.tfevents.0.host");

        std::fs::write(&path, frame_of(&scalar_event(1, 5.0))).unwrap();

        let mut loader = EventFileLoader::new(&path);
        let events = loader.poll().await.unwrap();
        assert_eq!(events.len(), 1);
        let first_offset = loader.offset();
        assert!(first_offset > 0);

        // Nothing new: no events, offset unchanged
        assert!(loader.poll().await.unwrap().is_empty());
        assert_eq!(loader.offset(), first_offset);

        // Append a second event and poll again
        let mut data = std::fs::read(&path).unwrap();
        data.extend_from_slice(&frame_of(&scalar_event(2, 6.0)));
        std::fs::write(&path, data).unwrap();

        let events = loader.poll().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].step, 2);
        assert!(loader.offset() > first_offset);
    }

    #[tokio::test]
    async fn test_truncated_tail_retried_next_poll() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.out.tfevents.0.host");

        let full = frame_of(&scalar_event(1, 5.0));
        std::fs::write(&path, &full[..full.len() - 2]).unwrap();

        let mut loader = EventFileLoader::new(&path);
        assert!(loader.poll().await.unwrap().is_empty());
        assert_eq!(loader.offset(), 0);

        // The writer finishes the frame; the record shows up now
        std::fs::write(&path, &full).unwrap();
        let events = loader.poll().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(loader.offset(), full.len() as u64);
    }

    #[tokio::test]
    async fn test_corruption_stops_the_file_without_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.out.tfevents.0.host");

        let mut data = frame_of(&scalar_event(1, 5.0));
        let good_len = data.len();
        data.extend_from_slice(&frame_of(&scalar_event(2, 6.0)));
        data[good_len] ^= 0xff; // flip a bit in the second frame's length
        std::fs::write(&path, &data).unwrap();

        let mut loader = EventFileLoader::new(&path);
        assert!(loader.error().is_none());
        let events = loader.poll().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(loader.offset(), good_len as u64);
        assert!(matches!(
            loader.error(),
            Some(uploader_core::Error::CorruptRecord { offset, .. }) if *offset == good_len as u64
        ));

        // Dead file: further polls yield nothing even after appends
        assert!(loader.poll().await.unwrap().is_empty());
    }
}
