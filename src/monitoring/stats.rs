use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct CspStats {
    request_count: AtomicUsize,
    nonce_generation_count: AtomicUsize,
    html_rewrite_count: AtomicUsize,
    stamped_tag_count: AtomicUsize,
    missing_nonce_count: AtomicUsize,
    header_build_count: AtomicUsize,
    header_generation_time_ns: AtomicUsize,
    start_time: Instant,
}

impl Default for CspStats {
    fn default() -> Self {
        Self {
            request_count: Default::default(),
            nonce_generation_count: Default::default(),
            html_rewrite_count: Default::default(),
            stamped_tag_count: Default::default(),
            missing_nonce_count: Default::default(),
            header_build_count: Default::default(),
            header_generation_time_ns: Default::default(),
            start_time: Instant::now(),
        }
    }
}

impl CspStats {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn nonce_generation_count(&self) -> usize {
        self.nonce_generation_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn html_rewrite_count(&self) -> usize {
        self.html_rewrite_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn stamped_tag_count(&self) -> usize {
        self.stamped_tag_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn missing_nonce_count(&self) -> usize {
        self.missing_nonce_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn header_build_count(&self) -> usize {
        self.header_build_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn avg_header_generation_time_ns(&self) -> f64 {
        let count = self.header_build_count.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            self.header_generation_time_ns.load(Ordering::Relaxed) as f64 / count as f64
        }
    }

    #[inline]
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    #[inline]
    pub(crate) fn increment_request_count(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_nonce_generation_count(&self) {
        self.nonce_generation_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_html_rewrite(&self, stamped_tags: usize) {
        self.html_rewrite_count.fetch_add(1, Ordering::Relaxed);
        self.stamped_tag_count
            .fetch_add(stamped_tags, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_missing_nonce_count(&self) {
        self.missing_nonce_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_header_build(&self, time_ns: usize) {
        self.header_build_count.fetch_add(1, Ordering::Relaxed);
        self.header_generation_time_ns
            .fetch_add(time_ns, Ordering::Relaxed);
    }

}

impl fmt::Display for CspStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CSP Nonce Injector Statistics:")?;
        writeln!(f, "  Uptime: {} seconds", self.uptime().as_secs())?;
        writeln!(f, "  Requests processed: {}", self.request_count())?;
        writeln!(f, "  Nonces generated: {}", self.nonce_generation_count())?;
        writeln!(f, "  HTML responses rewritten: {}", self.html_rewrite_count())?;
        writeln!(f, "  Tags stamped: {}", self.stamped_tag_count())?;
        writeln!(f, "  Missing nonces: {}", self.missing_nonce_count())?;
        writeln!(f, "  Headers built: {}", self.header_build_count())?;
        writeln!(
            f,
            "  Average header generation time: {:.2} ns",
            self.avg_header_generation_time_ns()
        )?;
        Ok(())
    }
}
