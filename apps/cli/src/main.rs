mod logging;
mod lookup;
mod session;

use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context as _, Result};
use clap::{Args, Parser, Subcommand};
use codehub_assistant::{Assistant, Conversation};
use codehub_core::{FileStorage, Intent, TabChange, Workspace, WorkspaceError, WorkspaceStore};
use codehub_settings::{resolve_data_dir, Config, ConfigStore, CONFIG_FILE};
use tracing::{debug, warn};

#[derive(Parser)]
#[command(
    name = "codehub",
    about = "Projects, files and tabs kept in a local workspace",
    author,
    version
)]
struct Cli {
    /// Data directory (defaults to $CODEHUB_HOME, then ./.codehub).
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List projects; `*` marks the project selected at startup.
    Projects,
    /// Create a project and print its id.
    NewProject {
        name: String,
    },
    /// Create a file in a project and print its id.
    NewFile(NewFileArgs),
    /// List the files of a project.
    Files(ProjectArgs),
    /// Print a file's content.
    Cat(FileArgs),
    /// Replace a file's content (from --text or stdin).
    Write(WriteArgs),
    /// Apply JSON-lines intents and print the resulting view as JSON.
    Replay {
        /// Script path, or `-` for stdin.
        #[arg(value_name = "PATH")]
        input: PathBuf,
    },
    /// Interactive session reading commands from stdin.
    Session,
    /// Ask the coding assistant.
    Ask {
        #[arg(required = true)]
        query: Vec<String>,
    },
}

#[derive(Args)]
struct ProjectArgs {
    /// Project id or name (defaults to the first project).
    #[arg(long, value_name = "PROJECT")]
    project: Option<String>,
}

#[derive(Args)]
struct NewFileArgs {
    name: String,
    #[command(flatten)]
    target: ProjectArgs,
}

#[derive(Args)]
struct FileArgs {
    /// File id or name.
    file: String,
    #[command(flatten)]
    target: ProjectArgs,
}

#[derive(Args)]
struct WriteArgs {
    #[command(flatten)]
    file: FileArgs,
    /// New content; stdin is read when omitted.
    #[arg(long)]
    text: Option<String>,
}

struct Context {
    data_dir: PathBuf,
    config: Config,
}

impl Context {
    fn load(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = resolve_data_dir(data_dir);
        let store = ConfigStore::load(data_dir.join(CONFIG_FILE))
            .with_context(|| format!("failed to load config from {}", data_dir.display()))?;
        Ok(Self {
            data_dir,
            config: store.config().clone(),
        })
    }

    fn workspace(&self) -> Workspace<FileStorage> {
        let storage = FileStorage::new(&self.data_dir);
        Workspace::from_store(WorkspaceStore::open_with_key(
            storage,
            self.config.storage.key.clone(),
        ))
    }

    fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.config.assistant.reply_delay_ms)
    }

    fn conversation(&self) -> Result<Option<Conversation>> {
        let assistant = &self.config.assistant;
        if !assistant.enabled {
            return Ok(None);
        }
        let responder = match &assistant.rules {
            Some(path) => Assistant::from_path(self.data_dir.join(path))?,
            None => Assistant::default(),
        };
        Ok(Some(Conversation::new(responder, self.reply_delay())))
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli { data_dir, command } = Cli::parse();
    let context = Context::load(data_dir)?;
    logging::init(&context.config.logging.filter);
    debug!(data_dir = %context.data_dir.display(), "starting");

    match command {
        Commands::Projects => execute_projects(&context),
        Commands::NewProject { name } => execute_new_project(&context, &name),
        Commands::NewFile(args) => execute_new_file(&context, args),
        Commands::Files(args) => execute_files(&context, args),
        Commands::Cat(args) => execute_cat(&context, args),
        Commands::Write(args) => execute_write(&context, args),
        Commands::Replay { input } => execute_replay(&context, &input),
        Commands::Session => execute_session(&context),
        Commands::Ask { query } => execute_ask(&context, &query.join(" ")),
    }
}

/// Switches to the requested project, or keeps the startup selection.
fn select_project(ws: &mut Workspace<FileStorage>, target: &ProjectArgs) -> Result<()> {
    if let Some(key) = &target.project {
        let id = lookup::project_id(ws, key);
        if ws.switch_project(&id).is_none() {
            bail!("unknown project '{key}'");
        }
    }
    Ok(())
}

fn open_file(ws: &mut Workspace<FileStorage>, args: &FileArgs) -> Result<()> {
    select_project(ws, &args.target)?;
    if ws.current_project().is_none() {
        return Err(WorkspaceError::NoProjectSelected.into());
    }
    let id = lookup::file_id(ws, &args.file);
    match ws.open_file(&id) {
        TabChange::Activated(_) => Ok(()),
        _ => bail!("unknown file '{}'", args.file),
    }
}

fn execute_projects(context: &Context) -> Result<()> {
    let ws = context.workspace();
    let mut stdout = io::stdout().lock();
    session::write_projects(&ws.view(), &mut stdout)
}

fn execute_new_project(context: &Context, name: &str) -> Result<()> {
    let mut ws = context.workspace();
    let Some(id) = ws.create_project(name)? else {
        bail!("project name must not be blank");
    };
    println!("{id}");
    Ok(())
}

fn execute_new_file(context: &Context, args: NewFileArgs) -> Result<()> {
    let mut ws = context.workspace();
    select_project(&mut ws, &args.target)?;
    let Some(id) = ws.create_file(&args.name)? else {
        bail!("file name must not be blank");
    };
    println!("{id}");
    Ok(())
}

fn execute_files(context: &Context, args: ProjectArgs) -> Result<()> {
    let mut ws = context.workspace();
    select_project(&mut ws, &args)?;
    let project = ws
        .current_project()
        .ok_or(WorkspaceError::NoProjectSelected)?;
    if project.files.is_empty() {
        println!("No files in {}.", project.name);
    }
    for file in &project.files {
        println!("{}  {}  ({} bytes)", file.id, file.name, file.content.len());
    }
    Ok(())
}

fn execute_cat(context: &Context, args: FileArgs) -> Result<()> {
    let mut ws = context.workspace();
    open_file(&mut ws, &args)?;
    let content = ws
        .current_file()
        .map(|file| file.content.as_str())
        .unwrap_or_default();
    print!("{content}");
    Ok(())
}

fn execute_write(context: &Context, args: WriteArgs) -> Result<()> {
    let mut ws = context.workspace();
    open_file(&mut ws, &args.file)?;
    let text = match args.text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read content from stdin")?;
            buffer
        }
    };
    ws.edit_content(&text)?;
    let name = ws.current_file().map(|f| f.name.as_str()).unwrap_or("");
    println!("Saved {} bytes to {name}", text.len());
    Ok(())
}

fn execute_replay(context: &Context, input: &Path) -> Result<()> {
    let reader: Box<dyn BufRead> = if input == Path::new("-") {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = fs::File::open(input)
            .with_context(|| format!("failed to open {}", input.display()))?;
        Box::new(BufReader::new(file))
    };

    let mut ws = context.workspace();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let intent: Intent = serde_json::from_str(trimmed)
            .with_context(|| format!("line {}: invalid intent", index + 1))?;
        match ws.dispatch(intent) {
            Ok(outcome) => debug!(line = index + 1, ?outcome, "intent applied"),
            Err(WorkspaceError::NoProjectSelected) => {
                warn!(line = index + 1, "file creation without a project");
                eprintln!("line {}: {}", index + 1, WorkspaceError::NoProjectSelected);
            }
            Err(err) => return Err(anyhow!(err).context(format!("line {}", index + 1))),
        }
    }

    let view = serde_json::to_string_pretty(&ws.view())?;
    println!("{view}");
    Ok(())
}

fn execute_session(context: &Context) -> Result<()> {
    let mut ws = context.workspace();
    let mut conversation = context.conversation()?;
    let reply_wait = context.reply_delay() + Duration::from_secs(2);
    let stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    session::run(
        &mut ws,
        conversation.as_mut(),
        reply_wait,
        stdin,
        &mut stdout,
    )
}

fn execute_ask(context: &Context, query: &str) -> Result<()> {
    let Some(mut conversation) = context.conversation()? else {
        bail!("assistant is disabled in {}", CONFIG_FILE);
    };
    if !conversation.send(query) {
        bail!("query must not be blank");
    }
    let wait = context.reply_delay() + Duration::from_secs(2);
    let reply = conversation
        .wait_reply(wait)
        .ok_or_else(|| anyhow!("assistant did not reply"))?;
    println!("{}", reply.text);
    Ok(())
}
