// src/stream.rs

//! Stream helpers shared by the asset sources and stages

use std::io::{self, Read, Write};

/// Copy everything from `src` into `dest`, then flush `dest`.
///
/// Returns the number of bytes copied.
pub fn pipe<R: Read + ?Sized, W: Write + ?Sized>(src: &mut R, dest: &mut W) -> io::Result<u64> {
    let total = io::copy(src, dest)?;
    dest.flush()?;
    Ok(total)
}

/// A reader that runs a callback once, when it is dropped.
///
/// The inner reader (and any handle it owns) is dropped before the callback
/// runs. The archive asset source uses this to report when an entry stream,
/// and with it the archive handle, has been closed.
pub struct CloseListener<R, F: FnOnce()> {
    inner: Option<R>,
    on_close: Option<F>,
}

impl<R: Read, F: FnOnce()> CloseListener<R, F> {
    pub fn new(inner: R, on_close: F) -> Self {
        Self {
            inner: Some(inner),
            on_close: Some(on_close),
        }
    }
}

impl<R: Read, F: FnOnce()> Read for CloseListener<R, F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.as_mut() {
            Some(inner) => inner.read(buf),
            None => Ok(0),
        }
    }
}

impl<R, F: FnOnce()> Drop for CloseListener<R, F> {
    fn drop(&mut self) {
        drop(self.inner.take());
        if let Some(on_close) = self.on_close.take() {
            on_close();
        }
    }
}

impl<R, F: FnOnce()> std::fmt::Debug for CloseListener<R, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloseListener").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Cursor;
    use std::rc::Rc;

    struct DropFlag(Rc<Cell<u32>>, u32);

    impl Read for DropFlag {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }
    }

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.set(self.1);
        }
    }

    #[test]
    fn test_pipe_counts_bytes() {
        let mut src = Cursor::new(vec![7u8; 20_000]);
        let mut dest = Vec::new();
        let copied = pipe(&mut src, &mut dest).unwrap();
        assert_eq!(copied, 20_000);
        assert_eq!(dest.len(), 20_000);
    }

    #[test]
    fn test_close_listener_runs_once_on_drop() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut reader = CloseListener::new(Cursor::new(b"abc".to_vec()), move || {
            counter.set(counter.get() + 1)
        });

        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "abc");
        assert_eq!(calls.get(), 0);

        drop(reader);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_close_listener_drops_inner_first() {
        let order = Rc::new(Cell::new(0));
        let seen = order.clone();
        let reader = CloseListener::new(DropFlag(order.clone(), 1), move || {
            assert_eq!(seen.get(), 1);
            seen.set(2);
        });
        drop(reader);
        assert_eq!(order.get(), 2);
    }
}
