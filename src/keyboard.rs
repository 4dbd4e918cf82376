//! Keyboard injection.

use crate::backend::EventBackend;
use crate::config::KeyboardSettings;
use crate::error::Result;
use crate::event::ModifierFlags;
use crate::keycode::{KeyStroke, Symbol};
use crate::platform;
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

/// Synthesizes key presses, releases, taps and typed text.
///
/// Characters without a key on the layout are skipped without posting
/// anything; callers that need full coverage must check with
/// [`resolve`](crate::keycode::resolve) first.
///
/// # Example
///
/// ```no_run
/// use inputkit::{KeyboardController, NamedKey};
///
/// let keyboard = KeyboardController::system()?;
/// keyboard.type_text("Hello, world!")?;
/// keyboard.tap(NamedKey::Return)?;
/// # Ok::<(), inputkit::Error>(())
/// ```
#[derive(Clone)]
pub struct KeyboardController {
    backend: Arc<dyn EventBackend>,
    settings: KeyboardSettings,
}

impl KeyboardController {
    /// Create a controller posting through `backend`.
    pub fn new(backend: Arc<dyn EventBackend>) -> Self {
        Self {
            backend,
            settings: KeyboardSettings::default(),
        }
    }

    /// Create a controller posting to the running OS.
    pub fn system() -> Result<Self> {
        Ok(Self::new(platform::system_backend()?))
    }

    /// Replace the settings.
    pub fn with_settings(mut self, settings: KeyboardSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Current settings.
    pub fn settings(&self) -> &KeyboardSettings {
        &self.settings
    }

    /// Press a key. Shifted characters carry the shift flag on the down event.
    pub fn press(&self, symbol: impl Into<Symbol>) -> Result<()> {
        match stroke(symbol.into()) {
            Some(stroke) => self.post(stroke, true),
            None => Ok(()),
        }
    }

    /// Release a key.
    ///
    /// The up event carries the same shift flag as the matching press, so a
    /// shifted character is released as shifted.
    pub fn release(&self, symbol: impl Into<Symbol>) -> Result<()> {
        match stroke(symbol.into()) {
            Some(stroke) => self.post(stroke, false),
            None => Ok(()),
        }
    }

    /// Press and release a key with no pause in between.
    pub fn tap(&self, symbol: impl Into<Symbol>) -> Result<()> {
        let Some(stroke) = stroke(symbol.into()) else {
            return Ok(());
        };
        self.post(stroke, true)?;
        self.post(stroke, false)
    }

    /// Type `text` with the configured delay between characters.
    pub fn type_text(&self, text: &str) -> Result<()> {
        self.type_text_with_delay(text, self.settings.type_delay)
    }

    /// Type `text`, tapping each character in order and pausing `delay`
    /// between characters.
    pub fn type_text_with_delay(&self, text: &str, delay: Duration) -> Result<()> {
        for (i, c) in text.chars().enumerate() {
            if i > 0 && !delay.is_zero() {
                sleep(delay);
            }
            self.tap(c)?;
        }
        Ok(())
    }

    fn post(&self, stroke: KeyStroke, down: bool) -> Result<()> {
        let flags = if stroke.shift {
            ModifierFlags::SHIFT
        } else {
            ModifierFlags::NONE
        };
        self.backend.post_key_event(stroke.code, down, flags)
    }
}

fn stroke(symbol: Symbol) -> Option<KeyStroke> {
    let stroke = symbol.stroke();
    if stroke.is_none() {
        log::debug!("no key types {symbol:?}, skipping");
    }
    stroke
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keycode::{KeyCode, NamedKey, resolve};
    use crate::platform::mock::{MockBackend, Posted};

    fn keyboard() -> (Arc<MockBackend>, KeyboardController) {
        let backend = Arc::new(MockBackend::new());
        let keyboard = KeyboardController::new(backend.clone());
        (backend, keyboard)
    }

    fn key(code: u16, down: bool, shift: bool) -> Posted {
        Posted::Key {
            code: KeyCode(code),
            down,
            flags: if shift {
                ModifierFlags::SHIFT
            } else {
                ModifierFlags::NONE
            },
        }
    }

    #[test]
    fn test_press_attaches_shift_to_down_event() {
        let (backend, keyboard) = keyboard();
        keyboard.press('@').unwrap();
        assert_eq!(backend.posted(), vec![key(19, true, true)]);
    }

    #[test]
    fn test_release_keeps_shift_flag() {
        let (backend, keyboard) = keyboard();
        keyboard.release('!').unwrap();
        keyboard.release('1').unwrap();
        assert_eq!(
            backend.posted(),
            vec![key(18, false, true), key(18, false, false)]
        );
    }

    #[test]
    fn test_named_keys_use_code_without_flags() {
        let (backend, keyboard) = keyboard();
        keyboard.tap(NamedKey::Escape).unwrap();
        keyboard.press(NamedKey::SHIFT).unwrap();
        assert_eq!(
            backend.posted(),
            vec![key(53, true, false), key(53, false, false), key(60, true, false)]
        );
    }

    #[test]
    fn test_unmapped_character_posts_nothing() {
        let (backend, keyboard) = keyboard();
        keyboard.press('é').unwrap();
        keyboard.release('é').unwrap();
        keyboard.tap('→').unwrap();
        assert!(backend.posted().is_empty());
    }

    #[test]
    fn test_type_text_taps_each_character_in_order() {
        let (backend, keyboard) = keyboard();
        keyboard
            .type_text_with_delay("Ab1!", Duration::ZERO)
            .unwrap();

        let a = resolve('a').unwrap().code.0;
        let b = resolve('b').unwrap().code.0;
        let one = resolve('1').unwrap().code.0;
        assert_eq!(
            backend.posted(),
            vec![
                key(a, true, true),
                key(a, false, true),
                key(b, true, false),
                key(b, false, false),
                key(one, true, false),
                key(one, false, false),
                key(one, true, true),
                key(one, false, true),
            ]
        );
    }

    #[test]
    fn test_type_text_skips_unmapped_characters() {
        let (backend, keyboard) = keyboard();
        keyboard
            .type_text_with_delay("a\u{e9}b", Duration::ZERO)
            .unwrap();
        assert_eq!(backend.posted().len(), 4);
    }

    #[test]
    fn test_type_text_uses_configured_delay() {
        let (_, keyboard) = keyboard();
        let keyboard = keyboard.with_settings(KeyboardSettings {
            type_delay: Duration::from_millis(10),
        });
        let started = std::time::Instant::now();
        keyboard.type_text("abc").unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_backend_failure_propagates() {
        let (backend, keyboard) = keyboard();
        backend.set_fail_posts(true);
        assert!(keyboard.tap('a').is_err());
    }
}
