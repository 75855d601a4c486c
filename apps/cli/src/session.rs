//! Line-oriented interactive session over a [`Workspace`].

use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::{bail, Result};
use codehub_assistant::{Conversation, Message, Speaker};
use codehub_core::{Intent, Outcome, StorageAdapter, Workspace, WorkspaceError, WorkspaceView};

use crate::lookup;

const HELP: &str = "\
commands:
  projects               list projects
  project <id|name>      switch project
  new-project <name>     create and switch to a project
  new-file <name>        create a file in the current project and open it
  open <id|name>         open a file of the current project in a tab
  activate <id|name>     activate an open tab
  close <id|name>        close an open tab
  edit <text>            replace the active file's content (\\n for newlines)
  show                   print projects, files, tabs and the editor
  ask <query>            ask the assistant
  help                   print this help
  quit                   leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Projects,
    Project(String),
    NewProject(String),
    NewFile(String),
    Open(String),
    Activate(String),
    Close(String),
    Edit(String),
    Show,
    Ask(String),
    Help,
    Quit,
}

impl Command {
    /// Parses one input line; blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim_start();
        if line.trim().is_empty() {
            return Ok(None);
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest),
            None => (line, ""),
        };
        let arg = |verb: &str| -> Result<String> {
            let value = rest.trim();
            if value.is_empty() {
                bail!("`{verb}` needs an argument");
            }
            Ok(value.to_string())
        };
        let command = match verb {
            "projects" => Command::Projects,
            "project" => Command::Project(arg(verb)?),
            "new-project" => Command::NewProject(arg(verb)?),
            "new-file" => Command::NewFile(arg(verb)?),
            "open" => Command::Open(arg(verb)?),
            "activate" => Command::Activate(arg(verb)?),
            "close" => Command::Close(arg(verb)?),
            "edit" => Command::Edit(unescape(rest.trim_end_matches(['\r', '\n']))),
            "show" => Command::Show,
            "ask" => Command::Ask(arg(verb)?),
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command `{other}`; type `help`"),
        };
        Ok(Some(command))
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Runs commands from `input` until `quit` or end of input. Pending assistant
/// replies are awaited (up to `reply_wait` each) before returning.
pub fn run<S, R, W>(
    ws: &mut Workspace<S>,
    mut conversation: Option<&mut Conversation>,
    reply_wait: Duration,
    input: R,
    out: &mut W,
) -> Result<()>
where
    S: StorageAdapter,
    R: BufRead,
    W: Write,
{
    writeln!(out, "codehub session; type `help` for commands")?;
    for line in input.lines() {
        let line = line?;
        if let Some(conversation) = conversation.as_deref_mut() {
            print_replies(conversation, out)?;
        }
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(out, "error: {err}")?;
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        match execute(ws, conversation.as_deref_mut(), command, out) {
            Ok(()) => {}
            Err(err)
                if matches!(
                    err.downcast_ref::<WorkspaceError>(),
                    Some(WorkspaceError::NoProjectSelected)
                ) =>
            {
                writeln!(out, "notice: {err}")?
            }
            Err(err) => return Err(err),
        }
    }

    if let Some(conversation) = conversation {
        while conversation.pending() > 0 {
            let Some(reply) = conversation.wait_reply(reply_wait) else {
                break;
            };
            write_message(reply, out)?;
        }
    }
    Ok(())
}

fn execute<S: StorageAdapter, W: Write>(
    ws: &mut Workspace<S>,
    conversation: Option<&mut Conversation>,
    command: Command,
    out: &mut W,
) -> Result<()> {
    let intent = match command {
        Command::Projects => {
            write_projects(&ws.view(), out)?;
            return Ok(());
        }
        Command::Show => {
            write_view(&ws.view(), out)?;
            return Ok(());
        }
        Command::Help => {
            writeln!(out, "{HELP}")?;
            return Ok(());
        }
        Command::Ask(query) => {
            match conversation {
                Some(conversation) => {
                    conversation.send(&query);
                    writeln!(out, "you: {query}")?;
                }
                None => writeln!(out, "assistant is disabled")?,
            }
            return Ok(());
        }
        Command::Quit => return Ok(()),
        Command::Project(key) => Intent::SelectProject {
            project: lookup::project_id(ws, &key),
        },
        Command::NewProject(name) => Intent::CreateProject { name },
        Command::NewFile(name) => Intent::CreateFile { name },
        Command::Open(key) => Intent::OpenFile {
            file: lookup::file_id(ws, &key),
        },
        Command::Activate(key) => Intent::ActivateTab {
            tab: lookup::tab_id(ws, &key),
        },
        Command::Close(key) => Intent::CloseTab {
            tab: lookup::tab_id(ws, &key),
        },
        Command::Edit(text) => Intent::EditContent { text },
    };

    match ws.dispatch(intent)? {
        Outcome::ProjectCreated(id) => {
            let name = ws.current_project().map(|p| p.name.as_str()).unwrap_or("");
            writeln!(out, "project {id} created: {name}")?;
        }
        Outcome::ProjectSelected(Some(id)) => {
            writeln!(out, "switched to project {id}")?;
            write_tabs(&ws.view(), out)?;
        }
        Outcome::ProjectSelected(None) => writeln!(out, "no such project; nothing selected")?,
        Outcome::FileCreated(id) => {
            let name = ws.current_file().map(|f| f.name.as_str()).unwrap_or("");
            writeln!(out, "file {id} created: {name}")?;
            write_tabs(&ws.view(), out)?;
        }
        Outcome::Tabs(_) => write_tabs(&ws.view(), out)?,
        Outcome::ContentSynced(true) => writeln!(out, "saved")?,
        Outcome::ContentSynced(false) => writeln!(out, "no file open; nothing saved")?,
        Outcome::Declined => writeln!(out, "name must not be blank")?,
    }
    Ok(())
}

fn print_replies<W: Write>(conversation: &mut Conversation, out: &mut W) -> Result<()> {
    let before = conversation.transcript().len();
    if conversation.drain() == 0 {
        return Ok(());
    }
    for message in &conversation.transcript()[before..] {
        write_message(message, out)?;
    }
    Ok(())
}

fn write_message<W: Write>(message: &Message, out: &mut W) -> Result<()> {
    let label = match message.speaker {
        Speaker::User => "you",
        Speaker::Assistant => "assistant",
    };
    writeln!(out, "{label}: {}", message.text)?;
    Ok(())
}

pub fn write_projects<W: Write>(view: &WorkspaceView, out: &mut W) -> Result<()> {
    if view.projects.is_empty() {
        writeln!(out, "No projects yet.")?;
    }
    for row in &view.projects {
        let marker = if row.active { '*' } else { ' ' };
        writeln!(out, "{marker} {}  {}", row.id, row.name)?;
    }
    Ok(())
}

fn write_tabs<W: Write>(view: &WorkspaceView, out: &mut W) -> Result<()> {
    let tabs: Vec<String> = view
        .tabs
        .iter()
        .map(|tab| {
            if tab.active {
                format!("[{}]", tab.name)
            } else {
                tab.name.clone()
            }
        })
        .collect();
    writeln!(out, "tabs: {}", tabs.join(" "))?;
    Ok(())
}

fn write_view<W: Write>(view: &WorkspaceView, out: &mut W) -> Result<()> {
    write_projects(view, out)?;
    match view.active_project() {
        Some(project) => {
            writeln!(out, "files in {}:", project.name)?;
            for file in &view.files {
                let marker = if file.active { '*' } else { ' ' };
                writeln!(out, "  {marker} {}  {}", file.id, file.name)?;
            }
        }
        None => writeln!(out, "no project selected")?,
    }
    write_tabs(view, out)?;
    writeln!(out, "editor:")?;
    writeln!(out, "{}", view.editor)?;
    Ok(())
}
