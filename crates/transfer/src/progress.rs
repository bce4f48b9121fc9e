use std::sync::{Arc, Mutex, PoisonError, RwLock};

use vodup_protocol::ProgressInfo;

use crate::chunked::ChunkSpan;

/// Callback invoked with upload progress.
pub type ProgressCallback = Arc<dyn Fn(ProgressInfo) + Send + Sync>;

/// `round(loaded / total * 100)`, in whole percent.
pub fn percent_of(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let loaded = u128::from(loaded.min(total));
    let total = u128::from(total);
    ((loaded * 100 + total / 2) / total) as u8
}

// ---------------------------------------------------------------------------
// ProgressAggregator
// ---------------------------------------------------------------------------

/// Turns chunk completions and transport events into progress records.
///
/// Whole-chunk records are authoritative. Intra-chunk transport records are
/// advisory: scaled by `1 / total_chunks`, added to the last whole-chunk
/// percent, and clamped below the percent the chunk will reach when it
/// completes. Emitted percents never decrease until [`reset`](Self::reset).
#[derive(Debug, Clone, Default)]
pub struct ProgressAggregator {
    total: u64,
    total_chunks: u32,
    chunk_percent: u8,
    last_percent: Option<u8>,
}

impl ProgressAggregator {
    /// Starts tracking a source of `total` bytes split into `total_chunks`.
    pub fn new(total: u64, total_chunks: u32) -> Self {
        Self {
            total,
            total_chunks,
            chunk_percent: 0,
            last_percent: None,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Last percent handed out, if any.
    pub fn last_percent(&self) -> Option<u8> {
        self.last_percent
    }

    fn emit(&mut self, loaded: u64, percent: u8) -> ProgressInfo {
        self.last_percent = Some(percent);
        ProgressInfo {
            loaded,
            total: self.total,
            percent,
        }
    }

    /// Record for a chunk acknowledged by the remote side.
    pub fn chunk_completed(&mut self, uploaded_bytes: u64) -> ProgressInfo {
        let percent = percent_of(uploaded_bytes, self.total).max(self.last_percent.unwrap_or(0));
        self.chunk_percent = percent;
        self.emit(uploaded_bytes, percent)
    }

    /// Advisory record for `sent` bytes of `span` handed to the transport.
    ///
    /// Returns `None` when the record would not move the percent forward.
    pub fn chunk_transfer(&mut self, span: ChunkSpan, sent: u64) -> Option<ProgressInfo> {
        if self.total_chunks == 0 || span.is_empty() {
            return None;
        }
        let sent = sent.min(span.len());
        let sub = percent_of(sent, span.len()) as u32 / self.total_chunks;
        let ceiling = percent_of(span.end, self.total).saturating_sub(1);
        let advisory = (u32::from(self.chunk_percent) + sub).min(u32::from(ceiling)) as u8;

        if self.last_percent.is_some_and(|last| advisory <= last) {
            return None;
        }
        Some(self.emit(span.start + sent, advisory))
    }

    /// Zero-progress record; restarts monotonic tracking.
    pub fn reset(&mut self) -> ProgressInfo {
        self.chunk_percent = 0;
        self.emit(0, 0)
    }
}

// ---------------------------------------------------------------------------
// ProgressReporter
// ---------------------------------------------------------------------------

/// Shares one aggregator and one callback between the chunk loop and the
/// control surface.
///
/// Callbacks run after internal locks are released, so a callback may call
/// back into the controller (e.g. to pause).
#[derive(Default)]
pub struct ProgressReporter {
    state: Mutex<ProgressAggregator>,
    callback: RwLock<Option<ProgressCallback>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new attempt with a fresh aggregator and callback.
    pub fn begin(&self, total: u64, total_chunks: u32, callback: Option<ProgressCallback>) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) =
            ProgressAggregator::new(total, total_chunks);
        self.set_callback(callback);
    }

    /// Resizes tracking once the chunk plan is known, keeping the callback.
    pub fn set_plan(&self, total: u64, total_chunks: u32) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) =
            ProgressAggregator::new(total, total_chunks);
    }

    /// Replaces the callback for the rest of the attempt.
    pub fn set_callback(&self, callback: Option<ProgressCallback>) {
        *self.callback.write().unwrap_or_else(PoisonError::into_inner) = callback;
    }

    pub fn has_callback(&self) -> bool {
        self.callback
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn last_percent(&self) -> Option<u8> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_percent()
    }

    fn notify(&self, info: ProgressInfo) {
        let cb = self
            .callback
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(cb) = cb {
            cb(info);
        }
    }

    /// Reports a completed chunk.
    pub fn chunk_completed(&self, uploaded_bytes: u64) -> ProgressInfo {
        let info = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .chunk_completed(uploaded_bytes);
        self.notify(info);
        info
    }

    /// Reports transport progress inside a chunk (advisory).
    pub fn chunk_transfer(&self, span: ChunkSpan, sent: u64) {
        let info = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .chunk_transfer(span, sent);
        if let Some(info) = info {
            self.notify(info);
        }
    }

    /// Delivers a final zero-progress record and drops the callback.
    ///
    /// The callback is detached first, so records raised after this call
    /// starts never reach it.
    pub fn reset_and_release(&self) -> ProgressInfo {
        let cb = self
            .callback
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let info = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reset();
        if let Some(cb) = cb {
            cb(info);
        }
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(part_number: u32, start: u64, end: u64) -> ChunkSpan {
        ChunkSpan {
            part_number,
            start,
            end,
        }
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent_of(0, 10), 0);
        assert_eq!(percent_of(1, 3), 33);
        assert_eq!(percent_of(2, 3), 67);
        assert_eq!(percent_of(1, 200), 1);
        assert_eq!(percent_of(10, 10), 100);
        assert_eq!(percent_of(5, 0), 0);
        assert_eq!(percent_of(20, 10), 100);
    }

    #[test]
    fn chunk_completions_reach_100() {
        let mut agg = ProgressAggregator::new(250, 3);
        assert_eq!(agg.chunk_completed(100).percent, 40);
        assert_eq!(agg.chunk_completed(200).percent, 80);
        let last = agg.chunk_completed(250);
        assert_eq!(last.percent, 100);
        assert_eq!(last.loaded, 250);
        assert_eq!(last.total, 250);
    }

    #[test]
    fn transfer_progress_is_scaled_and_clamped() {
        let mut agg = ProgressAggregator::new(300, 3);
        // Half of chunk 1: 50% / 3 chunks = 16.
        let p = agg.chunk_transfer(span(1, 0, 100), 50).unwrap();
        assert_eq!(p.percent, 16);
        assert_eq!(p.loaded, 50);

        // Whole chunk sent: clamped below the chunk's completion percent (33).
        let p = agg.chunk_transfer(span(1, 0, 100), 100).unwrap();
        assert_eq!(p.percent, 32);

        assert_eq!(agg.chunk_completed(100).percent, 33);

        // Chunk 2 starts from the whole-chunk percent.
        let p = agg.chunk_transfer(span(2, 100, 200), 60).unwrap();
        assert_eq!(p.percent, 33 + 20);
    }

    #[test]
    fn transfer_progress_never_moves_backwards() {
        let mut agg = ProgressAggregator::new(300, 3);
        agg.chunk_transfer(span(1, 0, 100), 90).unwrap();
        assert!(agg.chunk_transfer(span(1, 0, 100), 10).is_none());
        assert!(agg.chunk_transfer(span(1, 0, 100), 90).is_none());
    }

    #[test]
    fn transfer_progress_ignored_for_empty_plan() {
        let mut agg = ProgressAggregator::new(0, 0);
        assert!(agg.chunk_transfer(span(1, 0, 0), 0).is_none());
    }

    #[test]
    fn monotonic_across_mixed_events() {
        let mut agg = ProgressAggregator::new(1000, 4);
        let mut seen = Vec::new();
        for part in 1..=4u32 {
            let s = span(part, u64::from(part - 1) * 250, u64::from(part) * 250);
            for sent in [0, 60, 125, 200, 250] {
                if let Some(p) = agg.chunk_transfer(s, sent) {
                    seen.push(p.percent);
                }
            }
            seen.push(agg.chunk_completed(s.end).percent);
        }
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
        assert_eq!(seen.last(), Some(&100));
        // 100 only ever comes from the final completion.
        assert_eq!(seen.iter().filter(|p| **p == 100).count(), 1);
    }

    #[test]
    fn reset_emits_zero() {
        let mut agg = ProgressAggregator::new(100, 1);
        agg.chunk_completed(100);
        let p = agg.reset();
        assert_eq!(p, ProgressInfo::zero(100));
        assert_eq!(agg.last_percent(), Some(0));
    }

    #[test]
    fn reporter_invokes_callback() {
        let received = Arc::new(Mutex::new(Vec::<ProgressInfo>::new()));
        let r = Arc::clone(&received);
        let reporter = ProgressReporter::new();
        reporter.begin(
            200,
            2,
            Some(Arc::new(move |p| r.lock().unwrap().push(p))),
        );

        reporter.chunk_completed(100);
        reporter.chunk_completed(200);

        let got = received.lock().unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].percent, 50);
        assert_eq!(got[1].percent, 100);
    }

    #[test]
    fn reporter_replaces_callback() {
        let first = Arc::new(Mutex::new(0usize));
        let second = Arc::new(Mutex::new(0usize));
        let reporter = ProgressReporter::new();

        let f = Arc::clone(&first);
        reporter.begin(300, 3, Some(Arc::new(move |_| *f.lock().unwrap() += 1)));
        reporter.chunk_completed(100);

        let s = Arc::clone(&second);
        reporter.set_callback(Some(Arc::new(move |_| *s.lock().unwrap() += 1)));
        reporter.chunk_completed(200);

        assert_eq!(*first.lock().unwrap(), 1);
        assert_eq!(*second.lock().unwrap(), 1);
    }

    #[test]
    fn reporter_reset_releases_callback() {
        let received = Arc::new(Mutex::new(Vec::<ProgressInfo>::new()));
        let r = Arc::clone(&received);
        let reporter = ProgressReporter::new();
        reporter.begin(100, 1, Some(Arc::new(move |p| r.lock().unwrap().push(p))));

        reporter.chunk_transfer(span(1, 0, 100), 50);
        let info = reporter.reset_and_release();
        assert_eq!(info.percent, 0);
        assert!(!reporter.has_callback());

        let got = received.lock().unwrap();
        assert_eq!(got.last(), Some(&ProgressInfo::zero(100)));
    }

    #[test]
    fn callback_may_reenter_reporter() {
        let reporter = Arc::new(ProgressReporter::new());
        let inner = Arc::clone(&reporter);
        reporter.begin(
            100,
            1,
            Some(Arc::new(move |_| {
                // Would deadlock if the state lock were held during callbacks.
                let _ = inner.last_percent();
            })),
        );
        reporter.chunk_completed(100);
        assert_eq!(reporter.last_percent(), Some(100));
    }

    #[test]
    fn zero_record_is_last_delivered() {
        let received = Arc::new(Mutex::new(Vec::<ProgressInfo>::new()));
        let reporter = Arc::new(ProgressReporter::new());
        let r = Arc::clone(&received);
        let late = Arc::downgrade(&reporter);
        reporter.begin(
            100,
            2,
            Some(Arc::new(move |p| {
                r.lock().unwrap().push(p);
                // A chunk completing while the stop is delivered.
                if p.percent == 0
                    && let Some(late) = late.upgrade()
                {
                    late.chunk_completed(50);
                }
            })),
        );

        reporter.reset_and_release();

        assert_eq!(*received.lock().unwrap(), vec![ProgressInfo::zero(100)]);
        assert!(!reporter.has_callback());
    }
}
