use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::{mpsc, watch};

use crate::session::{Mode, Trigger};

/// Ctrl+C finishes the task early; Ctrl+R discards it (work tasks only).
pub fn map_key(key: KeyEvent, mode: Mode) -> Option<Trigger> {
    match key {
        KeyEvent {
            code: KeyCode::Char('c'),
            modifiers,
            ..
        } if modifiers.contains(KeyModifiers::CONTROL) => Some(Trigger::Finish),
        KeyEvent {
            code: KeyCode::Char('r'),
            modifiers,
            ..
        } if modifiers.contains(KeyModifiers::CONTROL) && mode == Mode::Work => {
            Some(Trigger::Remove)
        }
        _ => None,
    }
}

/// Spawns a thread for keyboard input (crossterm events are blocking).
/// The first mapped key is sent once and the thread exits; it also exits
/// when the disarm flag flips.
pub fn listen(mode: Mode, triggers: mpsc::Sender<Trigger>, disarm: watch::Receiver<bool>) {
    std::thread::spawn(move || {
        loop {
            if event::poll(std::time::Duration::from_millis(50)).unwrap_or(false) {
                if let Ok(Event::Key(key)) = event::read() {
                    if let Some(trigger) = map_key(key, mode) {
                        let _ = triggers.blocking_send(trigger);
                        break;
                    }
                }
            }
            if *disarm.borrow() {
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn plain(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn ctrl_c_finishes_in_both_modes() {
        assert_eq!(map_key(ctrl('c'), Mode::Work), Some(Trigger::Finish));
        assert_eq!(map_key(ctrl('c'), Mode::Dinner), Some(Trigger::Finish));
    }

    #[test]
    fn ctrl_r_removes_work_only() {
        assert_eq!(map_key(ctrl('r'), Mode::Work), Some(Trigger::Remove));
        assert_eq!(map_key(ctrl('r'), Mode::Dinner), None);
    }

    #[test]
    fn unmodified_keys_do_nothing() {
        assert_eq!(map_key(plain('c'), Mode::Work), None);
        assert_eq!(map_key(plain('r'), Mode::Work), None);
        assert_eq!(map_key(plain('q'), Mode::Dinner), None);
    }

    #[test]
    fn other_ctrl_keys_do_nothing() {
        assert_eq!(map_key(ctrl('x'), Mode::Work), None);
    }
}
