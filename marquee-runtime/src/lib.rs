//! Runtime wrapper that lets synchronous callers drive the async pipeline.
use anyhow::Result;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

pub struct MarqueeRuntime {
    runtime: Runtime,
}

impl MarqueeRuntime {
    /// Build a single-threaded Tokio runtime. One pipeline run at a time
    /// drives the browser, so the caller's thread is enough.
    ///
    /// ```
    /// use marquee_runtime::MarqueeRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = MarqueeRuntime::current_thread().expect("runtime builds");
    /// let value = runtime.block_on(async { 2 + 2 });
    /// assert_eq!(value, 4);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn current_thread() -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { runtime })
    }

    /// Run a future to completion, blocking the calling thread.
    pub fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Shut the runtime down, waiting up to `graceful` for spawned tasks.
    pub fn shutdown(self, graceful: Duration) {
        self.runtime.shutdown_timeout(graceful);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_thread_runtime_drives_timers() {
        let runtime = MarqueeRuntime::current_thread().unwrap();
        let waited = runtime.block_on(async {
            let start = tokio::time::Instant::now();
            tokio::time::sleep(Duration::from_millis(5)).await;
            start.elapsed()
        });
        assert!(waited >= Duration::from_millis(5));
    }

    #[test]
    fn futures_run_on_the_calling_thread() {
        let runtime = MarqueeRuntime::current_thread().unwrap();
        let caller = std::thread::current().id();
        let inside = runtime.block_on(async { std::thread::current().id() });
        assert_eq!(caller, inside);
    }
}
