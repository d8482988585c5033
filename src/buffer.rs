//! Rolling transcript buffer
//!
//! Holds the most recent STT text, bounded to `max_chars` bytes. When full,
//! the oldest text falls off the front. There is no backpressure.

use std::sync::Mutex;

pub struct TextBuffer {
    max_chars: usize,
    inner: Mutex<String>,
}

impl TextBuffer {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            inner: Mutex::new(String::new()),
        }
    }

    /// Append text, space-joined onto what is already there
    pub fn add(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut buf = self.lock();
        if !buf.is_empty() {
            buf.push(' ');
        }
        buf.push_str(text);

        if buf.len() > self.max_chars {
            let cut = ceil_char_boundary(&buf, buf.len() - self.max_chars);
            buf.drain(..cut);
        }
    }

    /// Last `n` bytes of the buffer (the whole buffer if shorter)
    pub fn tail(&self, n: usize) -> String {
        let buf = self.lock();
        if n >= buf.len() {
            return buf.clone();
        }
        let start = ceil_char_boundary(&buf, buf.len() - n);
        buf[start..].to_string()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A poisoned lock still holds a valid String; keep going with it.
    fn lock(&self) -> std::sync::MutexGuard<'_, String> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Smallest char boundary at or after `idx`
fn ceil_char_boundary(s: &str, idx: usize) -> usize {
    let mut i = idx.min(s.len());
    while !s.is_char_boundary(i) {
        i += 1;
    }
    i
}
