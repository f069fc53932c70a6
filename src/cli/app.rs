//! CLI module for the notesuite client
//!
//! This module turns parsed subcommands into calls on the remote-backed
//! note storage and prints the results.
use std::{
    fs::{self, OpenOptions},
    io::{stdin, stdout, Write},
    path::{Path, PathBuf},
    process::Command,
    str::FromStr,
    sync::Arc,
};

use console::{style, Term};
use log::{debug, info};
use shell_words::split;
use tempfile::Builder;
use tokio::sync::Mutex;

use crate::{
    parse_tags, read_content_from_file, render_preview, restore_session, sign_in, sign_out,
    sign_up, split_title, strip_editor_comments, summarize, Commands, Config, EditNoteOptions,
    ExportFormat, ListNotesOptions, Note, NoteDraft, NoteStorage, NotesError, Query, Result,
    SharePermission, ShareRequest, Visibility, VisibilityFilter, DEFAULT_NOTE_CONTENT,
    DEFAULT_NOTE_TITLE,
};

/// CLI Application handler - processes CLI commands and interfaces with NoteStorage
pub struct App {
    /// The remote-backed note storage
    note_storage: Arc<Mutex<NoteStorage>>,

    /// Application configuration
    config: Config,

    /// Where `config --set` and `config --reset` write to
    config_path: Option<PathBuf>,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    /// Create a new CLI application with the given storage backend and config
    pub fn new(
        note_storage: Arc<Mutex<NoteStorage>>,
        config: Config,
        config_path: Option<PathBuf>,
        verbose: bool,
    ) -> Self {
        Self {
            note_storage,
            config,
            config_path,
            verbose,
        }
    }

    /// Run the CLI application with the given command
    pub async fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Login { username, password } => self.handle_login(username, password).await,

            Commands::Register {
                username,
                email,
                password,
            } => self.handle_register(username, email, password).await,

            Commands::Logout => self.handle_logout().await,

            Commands::Whoami => self.handle_whoami().await,

            Commands::List(options) => self.list_notes(options).await,

            Commands::Tags => self.handle_tags().await,

            Commands::View { id, raw, json } => self.handle_view(id, raw, json).await,

            Commands::Create {
                title,
                content,
                edit,
                tags,
                file,
                visibility,
            } => {
                self.create_note(title, content, file, tags, edit, visibility)
                    .await
            }

            Commands::Edit(options) => self.handle_edit(options).await,

            Commands::Delete { id, force } => self.handle_delete(id, force).await,

            Commands::Share {
                id,
                email,
                permission,
                public,
            } => self.handle_share(id, email, permission, public).await,

            Commands::Export { output, format } => self.handle_export(output, format).await,

            Commands::Import { source } => self.handle_import(source).await,

            Commands::Health => self.handle_health().await,

            Commands::Config { show, set, reset } => self.handle_config(show, set, reset),
        }
    }

    async fn handle_login(&self, username: String, password: Option<String>) -> Result<()> {
        let password = match password {
            Some(p) => p,
            None => prompt_secret("Password: ")?,
        };

        let storage = self.note_storage.lock().await;
        let user = sign_in(storage.client(), &username, &password).await?;
        println!("Signed in as {}", style(&user.username).bold());
        Ok(())
    }

    async fn handle_register(
        &self,
        username: String,
        email: Option<String>,
        password: Option<String>,
    ) -> Result<()> {
        let (password, confirm) = match password {
            Some(p) => (p.clone(), p),
            None => (
                prompt_secret("Password: ")?,
                prompt_secret("Confirm password: ")?,
            ),
        };

        let storage = self.note_storage.lock().await;
        let user = sign_up(
            storage.client(),
            &username,
            email.as_deref(),
            &password,
            &confirm,
        )
        .await?;
        println!("Account created. Signed in as {}", style(&user.username).bold());
        Ok(())
    }

    async fn handle_logout(&self) -> Result<()> {
        let storage = self.note_storage.lock().await;
        sign_out(storage.client()).await?;
        println!("Signed out.");
        Ok(())
    }

    async fn handle_whoami(&self) -> Result<()> {
        let storage = self.note_storage.lock().await;
        match restore_session(storage.client()).await? {
            Some(user) => {
                println!("Signed in as {}", style(&user.username).bold());
                if let Some(email) = &user.email {
                    println!("Email: {}", email);
                }
                if self.verbose {
                    println!("User ID: {}", user.id);
                    println!("Server: {}", storage.client().base_url());
                }
            }
            None => println!("Not signed in."),
        }
        Ok(())
    }

    async fn create_note(
        &self,
        title: Option<String>,
        content: Option<String>,
        file: Option<PathBuf>,
        tags: Option<String>,
        edit: bool,
        visibility: String,
    ) -> Result<()> {
        let visibility = Visibility::from_str(&visibility)?;
        let parsed_tags = parse_tags(tags);

        // Get content based on the provided options
        let (derived_title, note_content) = match (content, file) {
            (Some(c), _) => (None, c),
            (_, Some(file_path)) => split_title(&read_content_from_file(&file_path)?),
            (None, None) if edit => {
                let heading = title.as_deref().unwrap_or(DEFAULT_NOTE_TITLE);
                split_title(&self.open_editor_for_content(heading)?)
            }
            (None, None) => (None, DEFAULT_NOTE_CONTENT.to_string()),
        };

        let title = title
            .or(derived_title)
            .unwrap_or_else(|| DEFAULT_NOTE_TITLE.to_string());
        let draft = NoteDraft::new(title, note_content)
            .with_tags(parsed_tags)
            .with_visibility(visibility);

        let note = self.note_storage.lock().await.create_note(&draft).await?;
        println!("Note created with ID: {}", note.id());
        Ok(())
    }

    fn open_editor_for_content(&self, title: &str) -> Result<String> {
        // Create a temporary file with .md extension
        let temp_file = Builder::new().suffix(".md").tempfile()?;
        let temp_path = temp_file.path().to_path_buf();

        self.write_editor_template(&temp_path, title, None)?;

        info!("Opening editor to write note content. Save and exit when done...");
        self.launch_editor(&self.config.get_editor_command(), &temp_path)?;

        let content = fs::read_to_string(&temp_path)?;
        Ok(strip_editor_comments(&content))
    }

    fn open_editor_with_content(&self, title: &str, existing_content: &str) -> Result<String> {
        let temp_file = Builder::new().suffix(".md").tempfile()?;
        let temp_path = temp_file.path().to_path_buf();

        self.write_editor_template(&temp_path, title, Some(existing_content))?;
        self.launch_editor(&self.config.get_editor_command(), &temp_path)?;

        let content = fs::read_to_string(&temp_path)?;
        Ok(strip_editor_comments(&content))
    }

    fn write_editor_template(&self, path: &Path, title: &str, body: Option<&str>) -> Result<()> {
        let mut file = OpenOptions::new().write(true).truncate(true).open(path)?;

        writeln!(file, "# {}", title)?;
        writeln!(file)?;
        writeln!(
            file,
            "<!-- The first heading becomes the title. Markdown headings, checkboxes, **bold**, *italic* and `code` are previewed. -->"
        )?;
        writeln!(file, "<!-- Save and exit the editor when you're done. -->")?;
        writeln!(file)?;
        if let Some(body) = body {
            writeln!(file, "{}", body)?;
        }

        Ok(())
    }

    fn launch_editor(&self, editor_cmd: &str, file_path: &Path) -> Result<()> {
        let path_str = file_path.to_string_lossy();

        // Handle shell-like command parsing
        let args = split(editor_cmd).map_err(|e| NotesError::EditorError {
            message: format!("Failed to parse editor command: {}", e),
        })?;

        let Some((program, rest)) = args.split_first() else {
            return Err(NotesError::EditorError {
                message: "Empty editor command".to_string(),
            });
        };

        debug!("Launching editor: {}", program);
        let status = Command::new(program)
            .args(rest)
            .arg(path_str.as_ref())
            .status()
            .map_err(|e| NotesError::EditorError {
                message: format!("Failed to execute editor command '{}': {}", program, e),
            })?;

        if !status.success() {
            return Err(NotesError::EditorError {
                message: "Editor exited with non-zero status".to_string(),
            });
        }

        Ok(())
    }

    /// List notes according to provided filters and options
    async fn list_notes(&self, options: ListNotesOptions) -> Result<()> {
        let query = Query::new()
            .with_text(options.search.unwrap_or_default())
            .with_tags(options.tags)
            .with_visibility(VisibilityFilter::from_str(&options.visibility)?);

        let mut notes = {
            let mut storage = self.note_storage.lock().await;
            storage.refresh().await?;
            storage.notebook_mut().set_query(query);
            storage.notebook().visible_notes()
        };

        // 0 means no limit
        if options.limit > 0 && notes.len() > options.limit {
            notes.truncate(options.limit);
        }

        if options.json {
            self.display_notes_json(&notes)?;
        } else if options.brief {
            self.display_notes_brief(&notes);
        } else {
            self.display_notes_text(&notes);
        }
        Ok(())
    }

    fn display_notes_json(&self, notes: &[Note]) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(notes)?);
        Ok(())
    }

    fn display_notes_brief(&self, notes: &[Note]) {
        for note in notes {
            println!("{}  {}", style(note.id()).dim(), note.title());
        }
    }

    /// Display notes in text format
    fn display_notes_text(&self, notes: &[Note]) {
        if notes.is_empty() {
            println!("No notes found matching the criteria.");
            return;
        }

        // Use terminal width for formatting if available
        let term_width = terminal_width();

        for (i, note) in notes.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(term_width.min(50)));
            }
            self.print_note_header(note);

            let preview = summarize(note.content(), self.config.preview_length);
            if !preview.is_empty() {
                println!("\n{}", preview);
            }
        }

        println!(
            "\nFound {} note{}",
            notes.len(),
            if notes.len() == 1 { "" } else { "s" }
        );
    }

    fn print_note_header(&self, note: &Note) {
        let updated = note
            .updated_at()
            .or(note.created_at())
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());

        println!(
            "ID: {} | {} | Updated: {}",
            note.id(),
            note.visibility(),
            updated
        );
        println!("Title: {}", style(note.title()).bold());

        if !note.tags().is_empty() {
            let tags = note
                .tags()
                .iter()
                .map(|tag| format!("#{}", tag))
                .collect::<Vec<_>>()
                .join(" ");
            println!("Tags: {}", style(tags).cyan());
        }
    }

    async fn handle_tags(&self) -> Result<()> {
        let mut storage = self.note_storage.lock().await;
        storage.refresh().await?;

        let notebook = storage.notebook();
        let tags = notebook.all_tags();
        if tags.is_empty() {
            println!("No tags in use.");
            return Ok(());
        }

        for tag in tags {
            let count = notebook.notes().iter().filter(|n| n.has_tag(&tag)).count();
            println!("{} ({})", style(format!("#{}", tag)).cyan(), count);
        }
        Ok(())
    }

    async fn handle_view(&self, id: String, raw: bool, json: bool) -> Result<()> {
        let note = self.note_storage.lock().await.fetch_note(&id).await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&note)?);
        } else if raw {
            println!("{}", note.content());
        } else {
            self.print_note_header(&note);
            println!();
            println!("{}", render_preview(note.content(), terminal_width()));
        }
        Ok(())
    }

    async fn handle_edit(&self, options: EditNoteOptions) -> Result<()> {
        // Validate input - check for conflicting options
        let sources = [
            options.content.is_some(),
            options.file.is_some(),
            options.open_editor,
        ];
        if sources.iter().filter(|s| **s).count() > 1 {
            return Err(NotesError::ApplicationError {
                message: "Use only one of --content, --file and --edit".to_string(),
            });
        }

        let visibility = options
            .visibility
            .as_deref()
            .map(Visibility::from_str)
            .transpose()?;

        let mut storage = self.note_storage.lock().await;
        let mut note = storage.fetch_note(&options.id).await?;

        for tag in parse_tags(options.add_tags) {
            note.add_tag(&tag);
        }
        for tag in parse_tags(options.remove_tags) {
            note.remove_tag(&tag);
        }

        let mut draft = note.to_draft();
        if let Some(title) = options.title {
            draft.title = title;
        }
        if let Some(visibility) = visibility {
            draft.visibility = visibility;
        }

        if let Some(content) = options.content {
            draft.content = content;
        } else if let Some(file_path) = options.file {
            draft.content = read_content_from_file(&file_path)?;
            println!("Content updated from file: {}", file_path.display());
        } else if options.open_editor {
            let edited = self.open_editor_with_content(&draft.title, &draft.content)?;
            let (title, body) = split_title(&edited);
            if let Some(title) = title {
                draft.title = title;
            }
            draft.content = body;
        }

        if draft == note.to_draft() {
            debug!("No field changes for note {}", note.id());
        }

        let updated = storage.update_note(note.id(), &draft).await?;
        println!("Note {} updated successfully", updated.id());
        Ok(())
    }

    async fn handle_delete(&self, id: String, force: bool) -> Result<()> {
        let mut storage = self.note_storage.lock().await;

        if !force {
            let note = storage.fetch_note(&id).await?;
            println!("You are about to delete the following note:");
            println!("ID:     {}", note.id());
            println!("Title:  {}", note.title());
            println!("Tags:   {}", note.tags().join(", "));

            let preview = summarize(note.content(), self.config.preview_length);
            if !preview.is_empty() {
                println!("\nContent preview:\n{}", preview);
            }

            println!("\nThis action cannot be undone!");
            if !confirm("Are you sure you want to delete this note? [y/N]: ")? {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        storage.delete_note(&id).await?;
        println!("Note {} has been permanently deleted.", id);
        Ok(())
    }

    async fn handle_share(
        &self,
        id: String,
        email: Option<String>,
        permission: String,
        public: bool,
    ) -> Result<()> {
        let storage = self.note_storage.lock().await;
        let client = storage.client();

        if public {
            let link = client.create_public_link(&id).await?;
            println!("Public link created (ID: {})", link.id);
            println!("Token: {}", style(&link.url_token).bold());
            if let Some(expires) = link.expires_at {
                println!("Expires: {}", expires.format("%Y-%m-%d %H:%M"));
            }
            return Ok(());
        }

        let email = email.ok_or_else(|| NotesError::ApplicationError {
            message: "Specify --email or --public".to_string(),
        })?;
        let request = ShareRequest {
            email: email.trim().to_string(),
            permission: SharePermission::from_str(&permission)?,
            message: None,
        };
        let share = client.share_with_user(&id, &request).await?;
        println!(
            "Note {} shared with {} ({:?}, share ID: {})",
            id, request.email, share.permission, share.id
        );
        Ok(())
    }

    async fn handle_export(&self, output: Option<PathBuf>, format: String) -> Result<()> {
        let format = ExportFormat::from_str(&format)?;
        let output =
            output.unwrap_or_else(|| PathBuf::from(format!("notes-export.{}", format.extension())));

        let bytes = {
            let storage = self.note_storage.lock().await;
            storage.client().export_notes(format).await?
        };

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output, &bytes)?;
        println!("Exported {} bytes to {}", bytes.len(), output.display());
        Ok(())
    }

    async fn handle_import(&self, source: PathBuf) -> Result<()> {
        if !source.is_file() {
            return Err(NotesError::FileNotFound {
                file_path: source.display().to_string(),
            });
        }

        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "notes.json".to_string());
        let bytes = fs::read(&source)?;

        let summary = {
            let storage = self.note_storage.lock().await;
            storage.client().import_notes(&file_name, bytes).await?
        };

        println!("\nImport summary:");
        println!("  Successfully imported: {}", summary.imported);
        println!("  Failed imports: {}", summary.errors.len());
        for error in &summary.errors {
            eprintln!("  - {}", error);
        }
        Ok(())
    }

    async fn handle_health(&self) -> Result<()> {
        let storage = self.note_storage.lock().await;
        let health = storage.client().check_health().await?;
        println!(
            "{} is {}",
            storage.client().base_url(),
            style(&health.status).green()
        );
        if let Some(timestamp) = health.timestamp {
            println!("Server time: {}", timestamp);
        }
        Ok(())
    }

    fn handle_config(&mut self, show: bool, set: Option<String>, reset: bool) -> Result<()> {
        // Plain `config` shows the settings
        let show = show || (set.is_none() && !reset);

        if reset {
            self.config = Config::default();
            self.save_config()?;
            println!("Configuration reset to defaults.");
        }

        if let Some(assignment) = set {
            self.config.set_value(&assignment)?;
            self.save_config()?;
            println!("Updated {}", assignment.trim());
        }

        if show {
            println!("{}", serde_json::to_string_pretty(&self.config)?);
        }
        Ok(())
    }

    fn save_config(&self) -> Result<()> {
        let path = self
            .config_path
            .clone()
            .or_else(Config::default_path)
            .ok_or_else(|| NotesError::ConfigError {
                message: "No location available for the configuration file".to_string(),
            })?;
        self.config.save(&path)
    }
}

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

fn prompt_secret(prompt: &str) -> Result<String> {
    let term = Term::stderr();
    term.write_str(prompt)?;
    Ok(term.read_secure_line()?)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    stdout().flush()?;

    let mut input = String::new();
    stdin().read_line(&mut input)?;
    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
