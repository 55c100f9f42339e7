//! Caller-side scheduling: memoization and debouncing of regeneration.
//!
//! Nothing here spawns threads or timers. The caller passes the current
//! [`Instant`] in and calls [`Generator::poll`] from its own loop.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::error::Error;
use crate::payload::Content;
use crate::render::ImageHandle;
use crate::style::{StyleResolver, Styling, StylingConfig};

/// Quiescence window used when none is given.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(300);
pub const MIN_WINDOW: Duration = Duration::from_millis(300);
pub const MAX_WINDOW: Duration = Duration::from_millis(800);

/// Identifies one (content, styling) input pair. Equal keys produce equal output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MemoKey(u64);

impl MemoKey {
    pub fn new(content: &Content, config: &StylingConfig) -> Self {
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        config.hash(&mut hasher);
        MemoKey(hasher.finish())
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Holds at most one pending item and releases it once no newer item has
/// arrived for a full window.
#[derive(Clone, Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl<T> Debouncer<T> {
    /// `window` is clamped into [`MIN_WINDOW`]..=[`MAX_WINDOW`].
    pub fn new(window: Duration) -> Self {
        Self {
            window: window.clamp(MIN_WINDOW, MAX_WINDOW),
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Replaces any pending item and restarts the window. Returns the item it displaced.
    pub fn schedule(&mut self, item: T, now: Instant) -> Option<T> {
        self.pending.replace((item, now)).map(|(old, _)| old)
    }

    /// When the pending item will fire, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.window)
    }

    /// Takes the pending item if its window has elapsed by `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline() {
            Some(deadline) if now >= deadline => self.pending.take().map(|(item, _)| item),
            _ => None,
        }
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(item, _)| item)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// What [`Generator::request`] did with the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The content is blank; any pending work was dropped and the preview should be cleared.
    Cleared,
    /// Identical to the last generated input; nothing to do.
    Unchanged,
    /// Queued to run once input settles.
    Scheduled,
}

#[derive(Clone, Debug)]
struct Request {
    content: Content,
    config: StylingConfig,
    key: MemoKey,
}

/// Debounced, memoized content-to-image pipeline for an interactive editor.
///
/// # Example
///
/// ```rust
/// use std::time::{Duration, Instant};
/// use qrcraft::payload::Content;
/// use qrcraft::session::{Generator, Outcome};
/// use qrcraft::style::StylingConfig;
///
/// let mut generator = Generator::new();
/// let start = Instant::now();
/// let content = Content::Text("hello".into());
///
/// let outcome = generator.request(content, StylingConfig::default(), start);
/// assert_eq!(outcome, Outcome::Scheduled);
/// assert!(generator.poll(start).is_none());
///
/// let image = generator.poll(start + Duration::from_millis(300)).unwrap().unwrap();
/// assert_eq!(image.width(), 256);
/// ```
#[derive(Debug, Default)]
pub struct Generator {
    resolver: StyleResolver,
    debouncer: Debouncer<Request>,
    last: Option<MemoKey>,
}

impl Generator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(window),
            ..Self::default()
        }
    }

    /// The styling used by the most recent successful generation.
    pub fn styling(&self) -> &Styling {
        self.resolver.current()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn request(&mut self, content: Content, config: StylingConfig, now: Instant) -> Outcome {
        if content.is_blank() {
            self.debouncer.cancel();
            self.last = None;
            return Outcome::Cleared;
        }
        let key = MemoKey::new(&content, &config);
        if self.last == Some(key) {
            self.debouncer.cancel();
            trace!("input unchanged ({:016x})", key.value());
            return Outcome::Unchanged;
        }
        if self.debouncer.schedule(Request { content, config, key }, now).is_some() {
            trace!("superseded pending request");
        }
        Outcome::Scheduled
    }

    /// Runs the pending request if its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<Result<ImageHandle, Error>> {
        let request = self.debouncer.poll(now)?;
        Some(self.run(request))
    }

    /// Runs immediately, dropping any pending request.
    pub fn generate_now(&mut self, content: Content, config: StylingConfig) -> Result<ImageHandle, Error> {
        self.debouncer.cancel();
        let key = MemoKey::new(&content, &config);
        self.run(Request { content, config, key })
    }

    pub fn reset(&mut self) {
        self.debouncer.cancel();
        self.last = None;
        self.resolver = StyleResolver::new();
    }

    fn run(&mut self, request: Request) -> Result<ImageHandle, Error> {
        let styling = self.resolver.update(&request.config)?.clone();
        let image = crate::generate(&request.content, &styling)?;
        debug!("generated {} image ({:016x})", request.content.kind(), request.key.value());
        self.last = Some(request.key);
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use image::Rgb;

    fn text(s: &str) -> Content {
        Content::Text(s.to_string())
    }

    #[test]
    fn test_memo_key_equality() {
        let config = StylingConfig::default();
        assert_eq!(MemoKey::new(&text("a"), &config), MemoKey::new(&text("a"), &config));
        assert_ne!(MemoKey::new(&text("a"), &config), MemoKey::new(&text("b"), &config));
        let other = StylingConfig { margin: 2, ..StylingConfig::default() };
        assert_ne!(MemoKey::new(&text("a"), &config), MemoKey::new(&text("a"), &other));
    }

    #[test]
    fn test_debouncer_window_clamped() {
        assert_eq!(Debouncer::<()>::new(Duration::from_millis(10)).window(), MIN_WINDOW);
        assert_eq!(Debouncer::<()>::new(Duration::from_secs(5)).window(), MAX_WINDOW);
        assert_eq!(Debouncer::<()>::new(Duration::from_millis(500)).window(), Duration::from_millis(500));
    }

    #[test]
    fn test_debouncer_last_write_wins() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        assert_eq!(debouncer.schedule(1, start), None);
        assert_eq!(debouncer.schedule(2, start + Duration::from_millis(200)), Some(1));

        // The window restarts with each schedule
        assert_eq!(debouncer.poll(start + Duration::from_millis(300)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(500)), Some(2));
        assert_eq!(debouncer.poll(start + Duration::from_millis(900)), None);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_debouncer_cancel() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        debouncer.schedule("x", start);
        assert_eq!(debouncer.cancel(), Some("x"));
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_generator_memoizes() {
        let start = Instant::now();
        let mut generator = Generator::new();
        let config = StylingConfig::default();

        assert_eq!(generator.request(text("hi"), config.clone(), start), Outcome::Scheduled);
        let later = start + Duration::from_millis(300);
        assert!(generator.poll(later).unwrap().is_ok());

        assert_eq!(generator.request(text("hi"), config.clone(), later), Outcome::Unchanged);
        assert_eq!(generator.request(text("hi!"), config.clone(), later), Outcome::Scheduled);
        // Typing back to the generated input drops the pending one
        assert_eq!(generator.request(text("hi"), config, later), Outcome::Unchanged);
        assert!(!generator.is_pending());
    }

    #[test]
    fn test_generator_clears_on_blank() {
        let start = Instant::now();
        let mut generator = Generator::new();
        generator.request(text("hi"), StylingConfig::default(), start);
        assert_eq!(generator.request(text("   "), StylingConfig::default(), start), Outcome::Cleared);
        assert!(generator.poll(start + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_generator_only_latest_fires() {
        let start = Instant::now();
        let mut generator = Generator::new();
        let config = StylingConfig::default();
        for (i, s) in ["h", "he", "hel", "hell", "hello"].iter().enumerate() {
            let at = start + Duration::from_millis(50 * i as u64);
            assert_eq!(generator.request(text(s), config.clone(), at), Outcome::Scheduled);
            assert!(generator.poll(at).is_none());
        }
        let fired = start + Duration::from_millis(200 + 300);
        assert!(generator.poll(fired).unwrap().is_ok());
        assert!(generator.poll(fired + Duration::from_secs(1)).is_none());
        assert_eq!(generator.request(text("hello"), config, fired), Outcome::Unchanged);
    }

    #[test]
    fn test_invalid_styling_keeps_previous() {
        let mut generator = Generator::new();
        let red = StylingConfig { foreground: "#ff0000".into(), ..StylingConfig::default() };
        generator.generate_now(text("hi"), red).unwrap();

        let broken = StylingConfig { foreground: "red".into(), ..StylingConfig::default() };
        let err = generator.generate_now(text("hi"), broken).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::InvalidColor { .. })));
        assert_eq!(generator.styling().foreground, Rgb([255, 0, 0]));
    }

    #[test]
    fn test_reset() {
        let start = Instant::now();
        let mut generator = Generator::new();
        let config = StylingConfig::default();
        generator.generate_now(text("hi"), config.clone()).unwrap();
        generator.reset();
        assert_eq!(generator.request(text("hi"), config, start), Outcome::Scheduled);
        assert_eq!(generator.styling(), &Styling::default());
    }
}
