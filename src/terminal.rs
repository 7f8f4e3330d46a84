// Terminal keyboard hook (crossterm)
//
// Plain terminals only report key presses. Terminals speaking the kitty
// keyboard protocol can also report releases once REPORT_EVENT_TYPES is pushed;
// when that is unavailable a held key is considered released after a quiet
// period with no press/repeat for it. Losing focus releases every held key,
// since the matching release events go to another window.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement};
use tracing::{debug, warn};

use crate::error::Result;
use crate::keys::{classify, Classified, DriveKey, KeyAction, KeyId, RawKeyEvent};
use crate::listener::{KeySource, Polled};

/// Raw mode, focus reporting and (where supported) release reporting for as
/// long as it lives
pub struct TerminalGuard {
    enhanced: bool,
}

impl TerminalGuard {
    pub fn enter() -> Result<Self> {
        enable_raw_mode()?;

        if let Err(e) = execute!(io::stdout(), EnableFocusChange) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }

        let enhanced = supports_keyboard_enhancement().unwrap_or(false);
        if enhanced {
            let flags = KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                | KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
            if let Err(e) = execute!(io::stdout(), PushKeyboardEnhancementFlags(flags)) {
                let _ = execute!(io::stdout(), DisableFocusChange);
                let _ = disable_raw_mode();
                return Err(e.into());
            }
        }
        debug!("Raw mode on, release events: {}", enhanced);

        Ok(Self { enhanced })
    }

    /// Whether the terminal reports key-release events
    pub fn reports_releases(&self) -> bool {
        self.enhanced
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.enhanced {
            if let Err(e) = execute!(io::stdout(), PopKeyboardEnhancementFlags) {
                warn!("Failed to restore keyboard flags: {}", e);
            }
        }
        if let Err(e) = execute!(io::stdout(), DisableFocusChange) {
            warn!("Failed to disable focus reporting: {}", e);
        }
        if let Err(e) = disable_raw_mode() {
            warn!("Failed to leave raw mode: {}", e);
        }
    }
}

pub struct TerminalKeySource {
    // Some(timeout) when releases have to be synthesised
    release_timeout: Option<Duration>,
    // Drive keys believed held, with the last press/repeat seen for each
    held: HashMap<DriveKey, Instant>,
    // Synthetic releases not yet handed to the listener
    pending: VecDeque<RawKeyEvent>,
}

impl TerminalKeySource {
    pub fn new(reports_releases: bool, release_timeout: Duration) -> Self {
        Self {
            release_timeout: (!reports_releases).then_some(release_timeout),
            held: HashMap::new(),
            pending: VecDeque::new(),
        }
    }

    fn handle_event(&mut self, event: Event, now: Instant) -> Polled {
        match event {
            Event::Key(key) => self.translate(key, now),
            Event::FocusLost => {
                debug!("Focus lost, releasing {} held keys", self.held.len());
                self.release_all();
                self.pending.pop_front().map_or(Polled::Idle, Polled::Event)
            }
            _ => Polled::Idle,
        }
    }

    fn translate(&mut self, key: KeyEvent, now: Instant) -> Polled {
        if key.code == KeyCode::Char('c')
            && key.modifiers.contains(KeyModifiers::CONTROL)
            && key.kind != KeyEventKind::Release
        {
            return Polled::Interrupt;
        }

        let id = key_id(key.code);
        let action = match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => KeyAction::Down,
            KeyEventKind::Release => KeyAction::Up,
        };

        // Tracked by drive key, so 'W' and 'w' refresh the same entry
        if let Classified::Recognized(drive) = classify(&id) {
            match action {
                KeyAction::Down => {
                    self.held.insert(drive, now);
                }
                KeyAction::Up => {
                    self.held.remove(&drive);
                }
            }
        }

        Polled::Event(RawKeyEvent { action, id })
    }

    /// Synthesise a release for one key that has gone quiet, if any
    fn expire(&mut self, now: Instant) -> Option<RawKeyEvent> {
        let timeout = self.release_timeout?;
        let stale = DriveKey::ALL.into_iter().find(|key| {
            self.held
                .get(key)
                .is_some_and(|seen| now.saturating_duration_since(*seen) >= timeout)
        })?;
        self.held.remove(&stale);
        Some(release_of(stale))
    }

    /// Queue a release for every held drive key
    fn release_all(&mut self) {
        for key in DriveKey::ALL {
            if self.held.remove(&key).is_some() {
                self.pending.push_back(release_of(key));
            }
        }
    }
}

impl KeySource for TerminalKeySource {
    fn poll(&mut self, timeout: Duration) -> Result<Polled> {
        if let Some(release) = self.pending.pop_front() {
            return Ok(Polled::Event(release));
        }
        if let Some(release) = self.expire(Instant::now()) {
            return Ok(Polled::Event(release));
        }

        if !event::poll(timeout)? {
            return Ok(Polled::Idle);
        }

        let event = event::read()?;
        Ok(self.handle_event(event, Instant::now()))
    }
}

fn key_id(code: KeyCode) -> KeyId {
    match code {
        KeyCode::Char(c) => KeyId::Char(c),
        other => KeyId::Named(format!("{:?}", other)),
    }
}

fn release_of(key: DriveKey) -> RawKeyEvent {
    RawKeyEvent::up(KeyId::Char(key.binding()))
}
