//! Upload progress tracking
//!
//! Counters are cumulative; each poll logs the delta since the previous
//! poll, and the final summary logs the totals when the loop exits.

use tracing::info;

/// Cumulative upload counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Counts {
    pub scalar_points: u64,
    pub tensor_points: u64,
    pub tensor_points_dropped: u64,
    pub blobs_uploaded: u64,
    pub blobs_skipped: u64,
    pub blob_bytes: u64,
    pub files_uploaded: u64,
    pub requests_sent: u64,
    pub records_skipped: u64,
}

/// Aggregates counters for user-visible progress reporting
#[derive(Debug, Default)]
pub struct UploadTracker {
    totals: Counts,
    poll_start: Counts,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn totals(&self) -> &Counts {
        &self.totals
    }

    pub fn scalar_points_sent(&mut self, n: u64) {
        self.totals.scalar_points += n;
    }

    pub fn tensor_points_sent(&mut self, n: u64) {
        self.totals.tensor_points += n;
    }

    pub fn tensor_point_dropped(&mut self) {
        self.totals.tensor_points_dropped += 1;
    }

    pub fn blob_uploaded(&mut self, bytes: u64) {
        self.totals.blobs_uploaded += 1;
        self.totals.blob_bytes += bytes;
    }

    pub fn blob_skipped(&mut self) {
        self.totals.blobs_skipped += 1;
    }

    pub fn file_uploaded(&mut self, bytes: u64) {
        self.totals.files_uploaded += 1;
        self.totals.blob_bytes += bytes;
    }

    pub fn request_sent(&mut self) {
        self.totals.requests_sent += 1;
    }

    pub fn record_skipped(&mut self) {
        self.totals.records_skipped += 1;
    }

    /// Snapshot counters at the start of a poll cycle
    pub fn begin_poll(&mut self) {
        self.poll_start = self.totals.clone();
    }

    /// Log what this poll cycle shipped, if anything
    pub fn end_poll(&self) {
        let d = self.delta();
        if d == Counts::default() {
            return;
        }
        info!(
            scalar_points = d.scalar_points,
            tensor_points = d.tensor_points,
            blobs = d.blobs_uploaded,
            files = d.files_uploaded,
            blob_bytes = d.blob_bytes,
            requests = d.requests_sent,
            "Uploaded batch"
        );
    }

    /// Log cumulative totals when the upload loop exits
    pub fn log_summary(&self) {
        info!(
            scalar_points = self.totals.scalar_points,
            tensor_points = self.totals.tensor_points,
            tensor_points_dropped = self.totals.tensor_points_dropped,
            blobs = self.totals.blobs_uploaded,
            blobs_skipped = self.totals.blobs_skipped,
            files = self.totals.files_uploaded,
            blob_bytes = self.totals.blob_bytes,
            requests = self.totals.requests_sent,
            records_skipped = self.totals.records_skipped,
            "Upload session finished"
        );
    }

    fn delta(&self) -> Counts {
        Counts {
            scalar_points: self.totals.scalar_points - self.poll_start.scalar_points,
            tensor_points: self.totals.tensor_points - self.poll_start.tensor_points,
            tensor_points_dropped: self.totals.tensor_points_dropped
                - self.poll_start.tensor_points_dropped,
            blobs_uploaded: self.totals.blobs_uploaded - self.poll_start.blobs_uploaded,
            blobs_skipped: self.totals.blobs_skipped - self.poll_start.blobs_skipped,
            blob_bytes: self.totals.blob_bytes - self.poll_start.blob_bytes,
            files_uploaded: self.totals.files_uploaded - self.poll_start.files_uploaded,
            requests_sent: self.totals.requests_sent - self.poll_start.requests_sent,
            records_skipped: self.totals.records_skipped - self.poll_start.records_skipped,
        }
    }
}
