use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::{Action, PromptKind};

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    Viewer,
    Prompt,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        bindings.insert(KeyContext::Global, global);

        // Log viewer bindings
        let mut viewer = HashMap::new();
        viewer.insert(KeyBinding::new(KeyCode::Char(' ')), Action::TogglePause);
        viewer.insert(
            KeyBinding::new(KeyCode::Char('p')),
            Action::TogglePackageFilter,
        );
        viewer.insert(
            KeyBinding::shift(KeyCode::Char('P')),
            Action::OpenPrompt(PromptKind::Package),
        );
        viewer.insert(
            KeyBinding::new(KeyCode::Char('t')),
            Action::OpenPrompt(PromptKind::Tag),
        );
        viewer.insert(
            KeyBinding::new(KeyCode::Char('l')),
            Action::OpenPrompt(PromptKind::Level),
        );
        viewer.insert(
            KeyBinding::new(KeyCode::Char('/')),
            Action::OpenPrompt(PromptKind::Text),
        );
        viewer.insert(KeyBinding::new(KeyCode::Char('c')), Action::ClearFilters);
        viewer.insert(
            KeyBinding::shift(KeyCode::Char('C')),
            Action::ClearAllFilters,
        );
        // Line navigation
        viewer.insert(KeyBinding::new(KeyCode::Char('j')), Action::ScrollDown(1));
        viewer.insert(KeyBinding::new(KeyCode::Down), Action::ScrollDown(1));
        viewer.insert(KeyBinding::new(KeyCode::Char('k')), Action::ScrollUp(1));
        viewer.insert(KeyBinding::new(KeyCode::Up), Action::ScrollUp(1));
        // Page navigation (less-style)
        viewer.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        viewer.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        viewer.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        viewer.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        // Top/bottom navigation
        viewer.insert(KeyBinding::new(KeyCode::Char('g')), Action::ScrollToTop);
        viewer.insert(KeyBinding::shift(KeyCode::Char('G')), Action::ScrollToBottom);
        viewer.insert(KeyBinding::new(KeyCode::Home), Action::ScrollToTop);
        viewer.insert(KeyBinding::new(KeyCode::End), Action::ScrollToBottom);
        viewer.insert(KeyBinding::new(KeyCode::Char('f')), Action::ToggleFollow);
        bindings.insert(KeyContext::Viewer, viewer);

        // Prompt input bindings (while collecting a filter value)
        let mut prompt = HashMap::new();
        prompt.insert(KeyBinding::new(KeyCode::Enter), Action::PromptAccept);
        prompt.insert(KeyBinding::new(KeyCode::Esc), Action::PromptCancel);
        prompt.insert(KeyBinding::new(KeyCode::Backspace), Action::PromptBackspace);
        prompt.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PromptClear);
        prompt.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::PromptCancel);
        bindings.insert(KeyContext::Prompt, prompt);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(context_bindings) = self.bindings.get(&context)
            && let Some(action) = context_bindings.get(&binding)
        {
            return Some(action.clone());
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Handle key event while a prompt is open. Special keys map to
    /// prompt actions; any other printable key is input. Global bindings
    /// deliberately do not apply here, so `q` can be typed into a value.
    pub fn get_prompt_action(&self, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        if let Some(prompt_bindings) = self.bindings.get(&KeyContext::Prompt)
            && let Some(action) = prompt_bindings.get(&binding)
        {
            return Some(action.clone());
        }

        if let KeyCode::Char(c) = key.code
            && (key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT)
        {
            return Some(Action::PromptInput(c));
        }

        None
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn shifted(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::SHIFT)
    }

    #[test]
    fn test_documented_key_table() {
        let bindings = KeyBindings::new();
        let cases = [
            ('q', Action::Quit),
            (' ', Action::TogglePause),
            ('p', Action::TogglePackageFilter),
            ('t', Action::OpenPrompt(PromptKind::Tag)),
            ('l', Action::OpenPrompt(PromptKind::Level)),
            ('/', Action::OpenPrompt(PromptKind::Text)),
            ('c', Action::ClearFilters),
            ('?', Action::ToggleHelp),
        ];
        for (c, expected) in cases {
            assert_eq!(
                bindings.get_action(KeyContext::Viewer, &key(c)),
                Some(expected),
                "key '{c}'"
            );
        }
        assert_eq!(
            bindings.get_action(KeyContext::Viewer, &shifted('P')),
            Some(Action::OpenPrompt(PromptKind::Package))
        );
        assert_eq!(
            bindings.get_action(KeyContext::Viewer, &shifted('C')),
            Some(Action::ClearAllFilters)
        );
    }

    #[test]
    fn test_prompt_mode_routes_characters_as_input() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.get_prompt_action(&key('q')),
            Some(Action::PromptInput('q'))
        );
        assert_eq!(
            bindings.get_prompt_action(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)),
            Some(Action::PromptAccept)
        );
        assert_eq!(
            bindings.get_prompt_action(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)),
            Some(Action::PromptCancel)
        );
    }

    #[test]
    fn test_unbound_key_is_ignored() {
        let bindings = KeyBindings::new();
        assert_eq!(bindings.get_action(KeyContext::Viewer, &key('z')), None);
    }
}
