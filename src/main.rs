//! Contextual CLI - explain a text selection against a personal knowledge base

use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use contextual::analyzer::ContextSynthesizer;
use contextual::config::{self, ContextualConfig};
use contextual::embedding::{self, BackendKind, EmbeddingIndex};
use contextual::entity::{Abbreviation, Contact, EntityRef, Project, Snippet};
use contextual::linker::{EntityLinker, LinkMode, SaveAdvisor};
use contextual::pattern::{Classifier, RegexClassifier};
use contextual::server::{self, AppState};
use contextual::storage::{SqliteStore, StoreHandle};
use contextual::ui::{self, Icons, Spinner};
use contextual::watcher::{CommandSource, FileSource, SelectionSource, SelectionWatcher, WatchOptions};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "contextual")]
#[command(version)]
#[command(about = "Context analysis and entity linking for selected text")]
#[command(long_about = r#"
Contextual explains a piece of selected text using your own knowledge base:
  • Detects tickets, emails, links, phone numbers, dates and acronyms
  • Finds matching contacts, notes, projects and abbreviations
  • Follows relationships one hop and ranks semantically similar notes
  • Saves notes and links them to the people they mention

Example usage:
  contextual init
  contextual add-contact "Sarah Mitchell" --role "Security Lead"
  contextual analyze "Met with Sarah Mitchell and John Davis"
  contextual save "Met with Sarah Mitchell" --link explicit --person "Sarah Mitchell"
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print JSON instead of human output
    #[arg(long, global = true)]
    json: bool,

    /// Config file (default: contextual.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LinkArg {
    Auto,
    Explicit,
    None,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config and create the database
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Analyze a selection ("-" reads stdin)
    Analyze { text: String },

    /// Suggest what a selection could be saved as
    Suggest { text: String },

    /// Save a snippet and link it to contacts
    Save {
        text: String,

        /// How to link: detect names, only the given --person names, or nothing
        #[arg(long, value_enum)]
        link: LinkArg,

        /// Contact name to link (explicit mode only, repeatable)
        #[arg(long = "person")]
        persons: Vec<String>,

        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        source: Option<String>,
    },

    /// Link an existing snippet to contacts
    Link {
        snippet_id: i64,

        #[arg(long, value_enum, required_unless_present = "contact", conflicts_with = "contact")]
        link: Option<LinkArg>,

        #[arg(long = "person")]
        persons: Vec<String>,

        /// Link to this contact id, e.g. to settle an ambiguous name
        #[arg(long)]
        contact: Option<i64>,
    },

    /// Add a contact
    AddContact {
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        context: Option<String>,
        /// When you last spoke, free text
        #[arg(long)]
        last_contact: Option<String>,
        #[arg(long)]
        next_event: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Add a project
    AddProject {
        name: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        lead: Option<String>,
    },

    /// Add or update an abbreviation
    AddAbbreviation {
        abbr: String,
        full: String,
        #[arg(long)]
        definition: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },

    /// Regenerate embeddings for contacts, snippets and projects
    Embed {
        /// Backend, overriding the config
        #[arg(long)]
        backend: Option<BackendKind>,
    },

    /// Find semantically similar entities
    Similar {
        /// Free-text query
        query: Option<String>,

        /// Use an entity's embedding instead, e.g. contact:3
        #[arg(long, conflicts_with = "query")]
        entity: Option<String>,

        #[arg(short, long, default_value = "10")]
        limit: usize,

        #[arg(short, long)]
        threshold: Option<f32>,
    },

    /// Show knowledge base statistics
    Stats,

    /// Analyze selections as they change
    Watch {
        /// Command printing the selection, overriding the config
        #[arg(long, num_args = 1.., allow_hyphen_values = true, conflicts_with = "file")]
        command: Option<Vec<String>>,

        /// File holding the selection, overriding the config
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn link_mode(link: LinkArg, persons: Vec<String>) -> anyhow::Result<LinkMode> {
    match link {
        LinkArg::Explicit => Ok(LinkMode::Explicit(persons)),
        LinkArg::Auto | LinkArg::None if !persons.is_empty() => {
            anyhow::bail!("--person is only valid with --link explicit")
        }
        LinkArg::Auto => Ok(LinkMode::Auto),
        LinkArg::None => Ok(LinkMode::None),
    }
}

fn read_text(text: String) -> anyhow::Result<String> {
    if text == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(text)
    }
}

fn emit_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Everything the commands share, built from the config
struct App {
    config: ContextualConfig,
    store: StoreHandle,
    classifier: Arc<dyn Classifier>,
    json: bool,
}

impl App {
    fn open(config: ContextualConfig, database: Option<PathBuf>, json: bool) -> anyhow::Result<Self> {
        let db_path = database.unwrap_or_else(|| config.database_path());
        config::ensure_db_dir(&db_path)?;
        let store = SqliteStore::open(&db_path)?.into_handle();

        let classifier: Arc<dyn Classifier> = match &config.tracker.ticket_pattern {
            Some(pattern) => Arc::new(RegexClassifier::with_ticket_pattern(pattern)?),
            None => Arc::new(RegexClassifier::with_project_keys(&config.tracker.project_keys)?),
        };

        Ok(Self {
            config,
            store,
            classifier,
            json,
        })
    }

    fn index(&self, backend: BackendKind) -> EmbeddingIndex {
        let spinner = (!self.json && backend == BackendKind::Fastembed).then(|| Spinner::new("Loading embedding model"));
        let backend = embedding::load_backend(backend, !self.json);
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        EmbeddingIndex::new(self.store.clone(), backend).with_default_threshold(self.config.semantic.threshold)
    }

    fn synthesizer(&self, index: Arc<EmbeddingIndex>) -> ContextSynthesizer {
        ContextSynthesizer::new(self.store.clone(), Arc::clone(&self.classifier))
            .with_index(index)
            .with_config(self.config.analyzer_config())
    }

    fn linker(&self) -> EntityLinker {
        EntityLinker::new(self.store.clone(), Arc::clone(&self.classifier))
            .with_exists_threshold(self.config.matching.exists_threshold)
    }

    fn created(&self, kind: &str, entity: EntityRef, label: &str) -> anyhow::Result<()> {
        if self.json {
            emit_json(&serde_json::json!({ "created": entity, "label": label }))
        } else {
            ui::success(&format!("Added {} {} ({})", kind, ui::entity(label), entity));
            Ok(())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);

    let config = match &cli.command {
        Commands::Init { force } => {
            let config = ContextualConfig::default();
            config::write_config(&config_path, &config, *force)?;
            config
        }
        _ => config::load_config(Some(&config_path))?.unwrap_or_default(),
    };
    let app = App::open(config, cli.database, cli.json)?;

    match cli.command {
        Commands::Init { .. } => {
            if app.json {
                emit_json(&serde_json::json!({ "config": config_path, "database": app.config.database }))?;
            } else {
                ui::success(&format!("Wrote {}", config_path.display()));
                ui::status(Icons::DATABASE, "Database", &app.config.database);
            }
        }

        Commands::Analyze { text } => {
            let text = read_text(text)?;
            let index = Arc::new(app.index(app.config.semantic.backend));
            index.generate_at_startup()?;
            let result = app.synthesizer(index).analyze(&text)?;
            if app.json {
                emit_json(&result)?;
            } else {
                ui::report::analysis(&result);
            }
        }

        Commands::Suggest { text } => {
            let choices = SaveAdvisor::new(Arc::clone(&app.classifier)).choices(&read_text(text)?);
            if app.json {
                emit_json(&choices)?;
            } else {
                ui::report::save_choices(&choices);
            }
        }

        Commands::Save {
            text,
            link,
            persons,
            tags,
            source,
        } => {
            let mode = link_mode(link, persons)?;
            let mut snippet = Snippet::new(read_text(text)?).with_tags(tags);
            if let Some(source) = source {
                snippet = snippet.with_source(source);
            }

            let (id, report) = app.linker().save_snippet(&snippet, &mode)?;
            if app.json {
                emit_json(&serde_json::json!({ "id": id, "report": report }))?;
            } else {
                ui::success(&format!("Saved snippet {}", EntityRef::snippet(id)));
                ui::report::link_report(&report);
            }
            report.ensure_resolved()?;
        }

        Commands::Link {
            snippet_id,
            link,
            persons,
            contact,
        } => {
            let linker = app.linker();
            match (contact, link) {
                (Some(contact_id), _) => {
                    let created = linker.link_contact(snippet_id, contact_id)?;
                    if app.json {
                        emit_json(&serde_json::json!({ "created": created }))?;
                    } else if created {
                        ui::success(&format!("Linked snippet:{} to contact:{}", snippet_id, contact_id));
                    } else {
                        ui::info("Already linked", &format!("snippet:{} → contact:{}", snippet_id, contact_id));
                    }
                }
                (None, Some(link)) => {
                    let report = linker.link_snippet(snippet_id, &link_mode(link, persons)?)?;
                    if app.json {
                        emit_json(&report)?;
                    } else {
                        ui::report::link_report(&report);
                    }
                    report.ensure_resolved()?;
                }
                (None, None) => anyhow::bail!("pass --link or --contact"),
            }
        }

        Commands::AddContact {
            name,
            email,
            role,
            context,
            last_contact,
            next_event,
            tags,
        } => {
            let mut contact = Contact::new(name).with_tags(tags);
            if let Some(email) = email {
                contact = contact.with_email(email);
            }
            if let Some(role) = role {
                contact = contact.with_role(role);
            }
            if let Some(context) = context {
                contact = contact.with_context(context);
            }
            if let Some(last_contact) = last_contact {
                contact = contact.with_last_contact(last_contact);
            }
            if let Some(next_event) = next_event {
                contact = contact.with_next_event(next_event);
            }
            let id = app.store.insert_contact(&contact)?;
            app.created("contact", EntityRef::contact(id), &contact.name)?;
        }

        Commands::AddProject {
            name,
            status,
            description,
            lead,
        } => {
            let mut project = Project::new(name);
            if let Some(status) = status {
                project = project.with_status(status);
            }
            if let Some(description) = description {
                project = project.with_description(description);
            }
            if let Some(lead) = lead {
                project = project.with_lead(lead);
            }
            let id = app.store.insert_project(&project)?;
            app.created("project", EntityRef::project(id), &project.name)?;
        }

        Commands::AddAbbreviation {
            abbr,
            full,
            definition,
            category,
        } => {
            let mut abbreviation = Abbreviation::new(abbr, full);
            if let Some(definition) = definition {
                abbreviation = abbreviation.with_definition(definition);
            }
            if let Some(category) = category {
                abbreviation = abbreviation.with_category(category);
            }
            abbreviation.id = app.store.upsert_abbreviation(&abbreviation)?;
            app.created("abbreviation", abbreviation.entity_ref(), &abbreviation.abbr)?;
        }

        Commands::Embed { backend } => {
            let index = app.index(backend.unwrap_or(app.config.semantic.backend));
            if !index.available() {
                anyhow::bail!("embedding backend '{}' is unavailable", index.backend_name());
            }

            let stale = index.stale_entries()?;
            let spinner = (!app.json).then(|| Spinner::new("Generating embeddings"));
            let count = index.generate_all()?;
            if let Some(spinner) = spinner {
                spinner.finish_with_message(&format!("{} Embedded {} entities", Icons::BRAIN, count));
            }

            if app.json {
                emit_json(&serde_json::json!({
                    "backend": index.backend_name(),
                    "embedded": count,
                    "refreshed_stale": stale.len(),
                }))?;
            } else if !stale.is_empty() {
                ui::info("Refreshed stale embeddings", &stale.len().to_string());
            }
        }

        Commands::Similar {
            query,
            entity,
            limit,
            threshold,
        } => {
            let index = app.index(app.config.semantic.backend);
            let matches = match (query, entity) {
                (Some(query), None) => {
                    index.find_similar(&query, limit, threshold.unwrap_or(index.default_threshold()))?
                }
                (None, Some(entity)) => index.find_similar_to_entity(EntityRef::parse(&entity)?, limit)?,
                _ => anyhow::bail!("pass a query or --entity"),
            };

            if app.json {
                emit_json(&matches)?;
            } else if matches.is_empty() {
                ui::warn("No similar entities found.");
            } else {
                println!("{}", ui::similar_table(&matches));
            }
        }

        Commands::Stats => {
            let stats = app.store.stats()?;
            if app.json {
                emit_json(&stats)?;
            } else {
                ui::header(Icons::STATS, "Contextual Statistics");
                println!("{}", ui::stats_table(&stats));
            }
        }

        Commands::Watch { command, file } => {
            let source: Box<dyn SelectionSource> = match (command, file) {
                (Some(argv), _) => Box::new(CommandSource::new(&argv)?),
                (None, Some(path)) => Box::new(FileSource::new(path)),
                (None, None) => match (&app.config.watcher.command, &app.config.watcher.file) {
                    (Some(argv), _) => Box::new(CommandSource::new(argv)?),
                    (None, Some(path)) => Box::new(FileSource::new(path)),
                    (None, None) => anyhow::bail!("no selection source: pass --command or --file, or set [watcher] in the config"),
                },
            };

            let options = WatchOptions {
                poll_interval: Duration::from_millis(app.config.watcher.poll_interval_ms),
                min_length: app.config.watcher.min_length,
            };
            let index = Arc::new(app.index(app.config.semantic.backend));
            index.generate_at_startup()?;
            let handle = SelectionWatcher::new(Arc::new(app.synthesizer(index)), options).spawn(source);

            if !app.json {
                ui::header(Icons::EYE, "Watching selections (Ctrl+C to stop)");
            }
            loop {
                if let Some(result) = handle.recv_timeout(Duration::from_secs(1)) {
                    if app.json {
                        println!("{}", serde_json::to_string(&result)?);
                    } else {
                        println!();
                        ui::report::analysis(&result);
                    }
                }
            }
        }

        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| app.config.server.host.clone());
            let port = port.unwrap_or(app.config.server.port);
            let index = Arc::new(app.index(app.config.semantic.backend));
            index.generate_at_startup()?;

            let state = Arc::new(AppState {
                store: app.store.clone(),
                synthesizer: Arc::new(app.synthesizer(Arc::clone(&index))),
                linker: Arc::new(app.linker()),
                index,
            });

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::start_server(&host, port, state))?;
        }
    }

    Ok(())
}
