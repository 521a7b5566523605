use log::debug;
use std::rc::Rc;

/// Whatever owns the pointer while a drag is in progress. For the native
/// shell this is the window: it keeps routing move/release events to the
/// slider and shows the resize cursor everywhere.
pub trait CaptureHost {
    fn begin_capture(&self);
    fn end_capture(&self);
}

/// Host that does nothing, for headless sessions.
#[derive(Debug, Default)]
pub struct DetachedHost;

impl CaptureHost for DetachedHost {
    fn begin_capture(&self) {}
    fn end_capture(&self) {}
}

/// Scoped capture of window-wide pointer input. Released when dropped.
pub struct InputCapture {
    host: Rc<dyn CaptureHost>,
}

impl InputCapture {
    pub fn acquire(host: Rc<dyn CaptureHost>) -> Self {
        debug!("Acquiring input capture");
        host.begin_capture();
        Self { host }
    }
}

impl Drop for InputCapture {
    fn drop(&mut self) {
        debug!("Releasing input capture");
        self.host.end_capture();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Counter {
        begun: Cell<u32>,
        ended: Cell<u32>,
    }

    impl CaptureHost for Counter {
        fn begin_capture(&self) {
            self.begun.set(self.begun.get() + 1);
        }
        fn end_capture(&self) {
            self.ended.set(self.ended.get() + 1);
        }
    }

    #[test]
    fn drop_releases_host() {
        let host = Rc::new(Counter::default());
        let capture = InputCapture::acquire(host.clone());
        assert_eq!(host.begun.get(), 1);
        assert_eq!(host.ended.get(), 0);
        drop(capture);
        assert_eq!(host.ended.get(), 1);
    }
}
