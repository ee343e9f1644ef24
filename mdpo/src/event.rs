// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Hooks run by the engine before handling each event.
//!
//! A hook returning [`ControlFlow::Break`] makes the engine skip its own
//! handling of the event. All hooks registered for an event run, even
//! after one of them asked to skip it.

use crate::command::Command;
use crate::error::{Error, Result};
use crate::link_refs::LinkReference;
use crate::markdown::{Block, Span};
use std::fmt;
use std::io::Write;
use std::ops::ControlFlow;
use std::str::FromStr;

/// The points of the traversal where hooks can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookTarget {
    EnterBlock,
    LeaveBlock,
    EnterSpan,
    LeaveSpan,
    Text,
    Command,
    Msgid,
    LinkReference,
}

impl HookTarget {
    pub const ALL: [HookTarget; 8] = [
        HookTarget::EnterBlock,
        HookTarget::LeaveBlock,
        HookTarget::EnterSpan,
        HookTarget::LeaveSpan,
        HookTarget::Text,
        HookTarget::Command,
        HookTarget::Msgid,
        HookTarget::LinkReference,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HookTarget::EnterBlock => "enter_block",
            HookTarget::LeaveBlock => "leave_block",
            HookTarget::EnterSpan => "enter_span",
            HookTarget::LeaveSpan => "leave_span",
            HookTarget::Text => "text",
            HookTarget::Command => "command",
            HookTarget::Msgid => "msgid",
            HookTarget::LinkReference => "link_reference",
        }
    }
}

impl fmt::Display for HookTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HookTarget {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        HookTarget::ALL
            .into_iter()
            .find(|target| target.name() == name)
            .ok_or_else(|| {
                let valid = HookTarget::ALL.map(HookTarget::name).join(", ");
                Error::UnknownEvent(name.to_string(), valid)
            })
    }
}

/// The arguments of an event.
///
/// Hooks may rewrite the text of `Text` events and the msgid of `Msgid`
/// events before the engine uses them.
#[derive(Debug)]
pub enum HookEvent<'a> {
    EnterBlock(&'a Block),
    LeaveBlock(&'a Block),
    EnterSpan(&'a Span),
    LeaveSpan(&'a Span),
    Text {
        /// Innermost open block.
        block: &'a Block,
        text: &'a mut String,
    },
    Command {
        command: Command,
        argument: Option<&'a str>,
        /// Name as written in the document.
        original: &'a str,
    },
    Msgid {
        msgid: &'a mut String,
        msgstr: Option<&'a str>,
        msgctxt: Option<&'a str>,
        tcomment: Option<&'a str>,
        flags: &'a [String],
    },
    LinkReference(&'a LinkReference),
}

impl HookEvent<'_> {
    pub fn target(&self) -> HookTarget {
        match self {
            HookEvent::EnterBlock(_) => HookTarget::EnterBlock,
            HookEvent::LeaveBlock(_) => HookTarget::LeaveBlock,
            HookEvent::EnterSpan(_) => HookTarget::EnterSpan,
            HookEvent::LeaveSpan(_) => HookTarget::LeaveSpan,
            HookEvent::Text { .. } => HookTarget::Text,
            HookEvent::Command { .. } => HookTarget::Command,
            HookEvent::Msgid { .. } => HookTarget::Msgid,
            HookEvent::LinkReference(_) => HookTarget::LinkReference,
        }
    }

    /// Human readable description used by the debug hooks.
    pub fn describe(&self) -> String {
        match self {
            HookEvent::EnterBlock(block) | HookEvent::LeaveBlock(block) => block.to_string(),
            HookEvent::EnterSpan(span) | HookEvent::LeaveSpan(span) => span.to_string(),
            HookEvent::Text { text, .. } => text.to_string(),
            HookEvent::Command {
                command,
                argument,
                original,
            } => {
                let mut message = command.to_string();
                if let Some(argument) = argument {
                    message.push_str(&format!(" - {argument}"));
                }
                if *original != command.to_string() {
                    message.push_str(&format!(" (original command: '{original}')"));
                }
                message
            }
            HookEvent::Msgid {
                msgid,
                msgstr,
                msgctxt,
                tcomment,
                flags,
            } => {
                let mut message = format!("msgid='{msgid}'");
                let optional = [
                    ("msgstr", msgstr.filter(|s| !s.is_empty())),
                    ("msgctxt", *msgctxt),
                    ("tcomment", *tcomment),
                ];
                for (name, value) in optional {
                    if let Some(value) = value {
                        message.push_str(&format!(" - {name}='{value}'"));
                    }
                }
                if !flags.is_empty() {
                    message.push_str(&format!(" - flags='{}'", flags.join(", ")));
                }
                message
            }
            HookEvent::LinkReference(reference) => {
                let mut message = format!("target='{}'", reference.label);
                if !reference.href.is_empty() {
                    message.push_str(&format!(" - href='{}'", reference.href));
                }
                if let Some(title) = &reference.title {
                    message.push_str(&format!(" - title='{title}'"));
                }
                message
            }
        }
    }
}

/// A function run before the engine handles an event.
pub type Hook = Box<dyn FnMut(&mut HookEvent<'_>) -> ControlFlow<()>>;

/// Formats a debug line for `event` as printed by `program`.
pub fn debug_line(program: &str, event: &HookEvent<'_>) -> String {
    let date = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f");
    format!(
        "{program}[DEBUG]::{date}::{}:: {}",
        event.target(),
        event.describe()
    )
}

/// A hook printing every event to stdout.
pub fn debug_hook(program: &str) -> Hook {
    let program = program.to_string();
    Box::new(move |event| {
        let mut stdout = std::io::stdout().lock();
        // Debug output is best effort.
        let _ = writeln!(stdout, "{}", debug_line(&program, event));
        ControlFlow::Continue(())
    })
}

/// Hooks registered by the caller, in registration order.
#[derive(Default)]
pub struct Hooks {
    hooks: Vec<(HookTarget, Hook)>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|(target, _)| target))
            .finish()
    }
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, target: HookTarget, hook: F)
    where
        F: FnMut(&mut HookEvent<'_>) -> ControlFlow<()> + 'static,
    {
        self.hooks.push((target, Box::new(hook)));
    }

    /// Registers a built-in hook by name.
    ///
    /// Known hooks are `mdpo::debug`, which prints the event, and
    /// `mdpo::skip`, which makes the engine skip it.
    pub fn register_named(&mut self, target: &str, name: &str, program: &str) -> Result<()> {
        let target = target.parse::<HookTarget>()?;
        match name.trim() {
            "mdpo::debug" => self.hooks.push((target, debug_hook(program))),
            "mdpo::skip" => self.register(target, |_| ControlFlow::Break(())),
            other => {
                return Err(Error::UnresolvedHook(
                    other.to_string(),
                    String::from("valid hooks are 'mdpo::debug' and 'mdpo::skip'"),
                ))
            }
        }
        Ok(())
    }

    /// Builds the hooks from `(event, hook name)` pairs.
    pub fn from_names<I, T, N>(pairs: I, program: &str) -> Result<Hooks>
    where
        I: IntoIterator<Item = (T, N)>,
        T: AsRef<str>,
        N: AsRef<str>,
    {
        let mut hooks = Hooks::new();
        for (target, name) in pairs {
            hooks.register_named(target.as_ref(), name.as_ref(), program)?;
        }
        Ok(hooks)
    }

    /// Adds a debug hook for every event.
    pub fn add_debug_hooks(&mut self, program: &str) {
        for target in HookTarget::ALL {
            self.hooks.push((target, debug_hook(program)));
        }
    }

    pub fn has(&self, target: HookTarget) -> bool {
        self.hooks.iter().any(|(hook_target, _)| *hook_target == target)
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs the hooks of the event, returning `true` when the engine must
    /// skip it.
    pub fn fire(&mut self, event: &mut HookEvent<'_>) -> bool {
        let target = event.target();
        let mut skip = false;
        for (hook_target, hook) in &mut self.hooks {
            if *hook_target == target && hook(&mut *event).is_break() {
                skip = true;
            }
        }
        skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_target_names() {
        for target in HookTarget::ALL {
            assert_eq!(target.name().parse::<HookTarget>().unwrap(), target);
        }
        assert!(matches!(
            "nope".parse::<HookTarget>(),
            Err(Error::UnknownEvent(..))
        ));
    }

    #[test]
    fn test_all_hooks_run_and_any_can_skip() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut hooks = Hooks::new();
        let first = Rc::clone(&calls);
        hooks.register(HookTarget::EnterBlock, move |_| {
            first.borrow_mut().push("first");
            ControlFlow::Break(())
        });
        let second = Rc::clone(&calls);
        hooks.register(HookTarget::EnterBlock, move |_| {
            second.borrow_mut().push("second");
            ControlFlow::Continue(())
        });

        assert!(hooks.fire(&mut HookEvent::EnterBlock(&Block::Paragraph)));
        assert!(!hooks.fire(&mut HookEvent::LeaveBlock(&Block::Paragraph)));
        assert_eq!(*calls.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_msgid_hook_can_rewrite() {
        let mut hooks = Hooks::new();
        hooks.register(HookTarget::Msgid, |event| {
            if let HookEvent::Msgid { msgid, .. } = event {
                if msgid.as_str() == "Foo" {
                    **msgid = String::from("Bar");
                }
            }
            ControlFlow::Continue(())
        });
        let mut msgid = String::from("Foo");
        hooks.fire(&mut HookEvent::Msgid {
            msgid: &mut msgid,
            msgstr: None,
            msgctxt: None,
            tcomment: None,
            flags: &[],
        });
        assert_eq!(msgid, "Bar");
    }

    #[test]
    fn test_register_named() -> anyhow::Result<()> {
        let mut hooks = Hooks::from_names([("text", "mdpo::skip")], "md2po")?;
        assert!(hooks.has(HookTarget::Text));
        let mut text = String::from("x");
        assert!(hooks.fire(&mut HookEvent::Text {
            block: &Block::Paragraph,
            text: &mut text,
        }));

        assert!(matches!(
            Hooks::from_names([("text", "hooks.py::skip")], "md2po"),
            Err(Error::UnresolvedHook(..))
        ));
        assert!(matches!(
            Hooks::from_names([("nope", "mdpo::skip")], "md2po"),
            Err(Error::UnknownEvent(..))
        ));
        Ok(())
    }

    #[test]
    fn test_describe() {
        let mut msgid = String::from("Foo");
        let flags = [String::from("fuzzy")];
        let event = HookEvent::Msgid {
            msgid: &mut msgid,
            msgstr: Some(""),
            msgctxt: Some("ctx"),
            tcomment: None,
            flags: &flags,
        };
        assert_eq!(event.describe(), "msgid='Foo' - msgctxt='ctx' - flags='fuzzy'");

        let event = HookEvent::Command {
            command: Command::Disable,
            argument: None,
            original: "off",
        };
        assert_eq!(
            event.describe(),
            "mdpo-disable (original command: 'off')"
        );

        let event = HookEvent::Command {
            command: Command::Context,
            argument: Some("month"),
            original: "mdpo-context",
        };
        assert_eq!(event.describe(), "mdpo-context - month");

        let reference = LinkReference {
            label: String::from("a"),
            href: String::from("/b"),
            title: None,
        };
        assert_eq!(
            HookEvent::LinkReference(&reference).describe(),
            "target='a' - href='/b'"
        );
    }

    #[test]
    fn test_debug_line() {
        let line = debug_line("po2md", &HookEvent::EnterBlock(&Block::Heading { level: 1 }));
        assert!(line.starts_with("po2md[DEBUG]::"));
        assert!(line.ends_with("::enter_block:: H - level=1"));
    }
}
