//! Fixed-length sliding window over the most recent `chunk * window_chunks`
//! samples, appended one frame at a time.
//!
//! The original `note_dancer` analyzer rolled its whole buffer every frame
//! (`np.roll` over `CHUNK * WINDOW_CHUNKS` elements — an O(n) shift dressed up
//! as a one-liner). This is a
//! true single-writer shift-buffer: `append` still moves `len - chunk`
//! elements, but it's an explicit, pre-allocated `copy_within` rather than an
//! allocating roll, and `snapshot` is a zero-copy borrow of the whole window.

pub struct RingBuffer {
    data: Vec<f32>,
    chunk: usize,
}

impl RingBuffer {
    pub fn new(chunk: usize, window_chunks: usize) -> Self {
        Self {
            data: vec![0.0; chunk * window_chunks],
            chunk,
        }
    }

    /// Shift the window left by `chunk` samples and copy `frame` into the tail.
    /// `frame` must be exactly `chunk` samples long.
    pub fn append(&mut self, frame: &[f32]) {
        debug_assert_eq!(frame.len(), self.chunk);
        let len = self.data.len();
        self.data.copy_within(self.chunk.., 0);
        self.data[len - self.chunk..].copy_from_slice(frame);
    }

    /// A contiguous, oldest-to-newest view of the current window.
    pub fn snapshot(&self) -> &[f32] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
