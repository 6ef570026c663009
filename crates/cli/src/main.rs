mod config;
mod error;
mod source;

use std::path::PathBuf;

use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use policy::Rank;
use runtime::{AutoSelect, LocalSource, MemberSource, RestSource, SelectError, ViewState, Viewer};
use storage::{Catalog, Material, MaterialId, MaterialKind, Member};
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use config::{Config, SourceKind};
use error::{Error, Result};
use source::Source;

const CONFIG_FILE: &str = "sabuk.toml";
const DEFAULT_LOG_FILTER: &str = "warn,sabuk=info,runtime=info,storage=info";

#[derive(Parser)]
#[command(name = "sabuk")]
#[command(about = "Belt-rank gated training materials", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./sabuk.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the belt rank ordering
    Ranks,
    /// Check whether a required rank is locked for a member rank
    Check {
        /// Rank required by the material
        #[arg(short, long)]
        required: String,
        /// Member's rank (omit for a member without a rank)
        #[arg(short, long)]
        member: Option<String>,
    },
    /// List training materials with their lock state
    Materials {
        /// Filter by title
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Open a training material
    View {
        /// Material ID (defaults to the viewer's auto-selection)
        id: Option<String>,
        /// Filter the list before selecting
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Manage materials in the local catalog
    Material {
        #[command(subcommand)]
        action: MaterialCommand,
    },
    /// Manage members in the local catalog
    Member {
        #[command(subcommand)]
        action: MemberCommand,
    },
}

#[derive(Subcommand)]
enum MaterialCommand {
    /// Add a material
    Add {
        #[arg(short, long)]
        title: String,
        /// video, document or pdf
        #[arg(short, long)]
        kind: String,
        /// Minimum rank, e.g. "Sabuk Putih"
        #[arg(short, long)]
        rank: String,
        #[arg(short, long)]
        url: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Change fields of a material
    Edit {
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        kind: Option<String>,
        #[arg(short, long)]
        rank: Option<String>,
        #[arg(short, long)]
        url: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Remove a material
    Remove { id: String },
}

#[derive(Subcommand)]
enum MemberCommand {
    /// Create or update a member
    Set {
        username: String,
        /// Certified rank (omit for none)
        #[arg(short, long)]
        rank: Option<String>,
        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// List members
    List,
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Ranks => {
            cmd_ranks();
            Ok(())
        }
        Commands::Check { required, member } => {
            cmd_check(&required, member.as_deref());
            Ok(())
        }
        Commands::Materials { search } => {
            let (_, source) = setup(config_path)?;
            cmd_materials(source, search.as_deref()).await
        }
        Commands::View { id, search } => {
            let (config, source) = setup(config_path)?;
            cmd_view(source, &config, id.map(MaterialId::from), search.as_deref()).await
        }
        Commands::Material { action } => {
            let (_, source) = setup(config_path)?;
            cmd_material(&source, action)
        }
        Commands::Member { action } => {
            let (_, source) = setup(config_path)?;
            cmd_member(&source, action)
        }
    }
}

fn setup(config_path: Option<&std::path::Path>) -> Result<(Config, Source)> {
    let config = load_config(config_path)?;
    let source = open_source(&config)?;
    debug!(%source, "source opened");
    Ok((config, source))
}

fn cmd_ranks() {
    println!("{:<5}  RANK", "INDEX");
    println!("{}", "-".repeat(32));
    for rank in Rank::ALL {
        println!("{:<5}  {rank}", rank.index());
    }
}

fn cmd_check(required: &str, member: Option<&str>) {
    let locked = policy::is_locked(Some(required), member);
    let required_rank = Rank::resolve(Some(required));
    let member_rank = Rank::resolve(member);

    for (given, resolved) in [(Some(required), required_rank), (member, member_rank)] {
        if let Some(given) = given {
            if Rank::from_name(given).is_none() {
                warn!(given, resolved = %resolved, "unknown rank name");
            }
        }
    }

    println!(
        "{} (requires {required_rank} [{}], member holds {member_rank} [{}])",
        if locked { "locked" } else { "unlocked" },
        required_rank.index(),
        member_rank.index(),
    );
}

async fn cmd_materials(source: Source, search: Option<&str>) -> Result<()> {
    let rank = member_rank(&source).await?;
    let viewer = Viewer::new(source, rank).with_auto_select(AutoSelect::None);

    if let Err(e) = viewer.load_list(search).await {
        eprintln!("{e}");
        return Ok(());
    }

    let entries = viewer.entries();
    if entries.is_empty() {
        println!("No materials found.");
        return Ok(());
    }

    println!("Viewing as: {}\n", rank.unwrap_or(Rank::LOWEST));
    println!(
        "{:<6}  {:<36}  {:<8}  {:<20}  TITLE",
        "", "ID", "TYPE", "REQUIRES"
    );
    println!("{}", "-".repeat(96));
    for entry in entries {
        let material = entry.material;
        println!(
            "{:<6}  {:<36}  {:<8}  {:<20}  {}",
            if entry.locked { "LOCKED" } else { "" },
            material.id,
            material.kind,
            material.required_rank,
            material.title
        );
    }

    Ok(())
}

async fn cmd_view(
    source: Source,
    config: &Config,
    id: Option<MaterialId>,
    search: Option<&str>,
) -> Result<()> {
    let rank = member_rank(&source).await?;
    let auto_select = if id.is_some() {
        AutoSelect::None
    } else {
        config.viewer.auto_select
    };
    let viewer = Viewer::new(source, rank).with_auto_select(auto_select);

    let auto = match viewer.load_list(search).await {
        Ok(auto) => auto,
        Err(e) => {
            eprintln!("{e}");
            return Ok(());
        }
    };

    let pending = match (id, auto) {
        (Some(id), _) => match viewer.select(&id) {
            Ok(pending) => Some(pending),
            Err(e) => {
                println!("{}", render_rejection(&e));
                return Ok(());
            }
        },
        (None, auto) => auto,
    };
    if let Some(pending) = pending {
        pending.run().await;
    }

    let view = viewer.view();
    match view {
        ViewState::LoadError { .. } => eprintln!("{}", render_view(&view)),
        _ => println!("{}", render_view(&view)),
    }

    Ok(())
}

/// Text shown for the viewer's display state. Only `Loaded` reveals a URL.
fn render_view(view: &ViewState) -> String {
    match view {
        ViewState::Loaded(material) => render_material(material),
        ViewState::Locked { required, held, .. } => locked_message(*required, *held),
        ViewState::LoadError { id, message } => format!("Failed to load material {id}: {message}"),
        ViewState::Loading { .. } | ViewState::NoSelection => "No material selected.".to_string(),
    }
}

fn render_rejection(err: &SelectError) -> String {
    match err {
        SelectError::Locked { required, held, .. } => locked_message(*required, *held),
        other => other.to_string(),
    }
}

fn locked_message(required: Rank, held: Rank) -> String {
    format!("Locked: this material requires {required}; you hold {held}.")
}

fn render_material(material: &Material) -> String {
    let added = Local
        .from_utc_datetime(&material.created_at.naive_utc())
        .format("%Y-%m-%d %H:%M");

    let mut out = format!(
        "{}\n  type:     {}\n  requires: {}\n  added:    {added}\n  url:      {}",
        material.title, material.kind, material.required_rank, material.url
    );
    if let Some(description) = &material.description {
        out.push_str("\n\n");
        out.push_str(description);
    }
    out
}

fn cmd_material(source: &Source, action: MaterialCommand) -> Result<()> {
    let local = source.local().ok_or(Error::LocalOnly { command: "material" })?;
    let catalog = local.catalog();

    match action {
        MaterialCommand::Add {
            title,
            kind,
            rank,
            url,
            description,
        } => {
            let mut material = Material::new(title, kind.parse()?, rank.parse()?, url);
            material.description = description;
            catalog.insert_material(&material)?;
            println!("Added material {}", material.id);
        }
        MaterialCommand::Edit {
            id,
            title,
            kind,
            rank,
            url,
            description,
        } => {
            if title.is_none()
                && kind.is_none()
                && rank.is_none()
                && url.is_none()
                && description.is_none()
            {
                return Err(Error::NothingToChange { id });
            }

            let mut material = catalog.get_material(&MaterialId::from(id))?;
            if let Some(title) = title {
                material.title = title;
            }
            if let Some(kind) = kind {
                material.kind = kind.parse::<MaterialKind>()?;
            }
            if let Some(rank) = rank {
                material.required_rank = rank.parse::<Rank>()?;
            }
            if let Some(url) = url {
                material.url = url;
            }
            if let Some(description) = description {
                material.description = Some(description).filter(|d| !d.is_empty());
            }
            material.touch();
            catalog.update_material(&material)?;
            println!("Updated material {}", material.id);
        }
        MaterialCommand::Remove { id } => {
            let id = MaterialId::from(id);
            catalog.delete_material(&id)?;
            println!("Removed material {id}");
        }
    }

    Ok(())
}

fn cmd_member(source: &Source, action: MemberCommand) -> Result<()> {
    let local = source.local().ok_or(Error::LocalOnly { command: "member" })?;
    let catalog = local.catalog();

    match action {
        MemberCommand::Set {
            username,
            rank,
            name,
        } => {
            let mut member = Member::new(&username);
            member.rank = rank.as_deref().map(str::parse::<Rank>).transpose()?;
            if let Some(name) = name {
                member.display_name = name;
            }
            catalog.upsert_member(&member)?;
            println!(
                "Member {username}: {}",
                member
                    .rank
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "no rank".to_string())
            );
        }
        MemberCommand::List => {
            let members = catalog.list_members()?;
            if members.is_empty() {
                println!("No members found.");
                return Ok(());
            }
            println!("{:<20}  {:<24}  RANK", "USERNAME", "NAME");
            println!("{}", "-".repeat(72));
            for member in members {
                println!(
                    "{:<20}  {:<24}  {}",
                    member.username,
                    member.display_name,
                    member.rank.map(|r| r.name()).unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}

/// The viewing member's rank; anonymous viewers hold none.
async fn member_rank(source: &Source) -> Result<Option<Rank>> {
    match source.current_member().await {
        Ok(member) => {
            debug!(username = %member.username, "viewing as member");
            Ok(member.rank)
        }
        Err(e) if e.is_unauthorized() => {
            warn!(error = %e, "no signed-in member, viewing without a rank");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None if std::path::Path::new(CONFIG_FILE).exists() => Ok(Config::load(CONFIG_FILE)?),
        None => Ok(Config::default()),
    }
}

fn open_source(config: &Config) -> Result<Source> {
    match config.source.kind {
        SourceKind::Local => {
            let db_path = match &config.source.database {
                Some(path) => path.clone(),
                None => {
                    let data_dir = dirs_data_dir().unwrap_or_else(|| ".sabuk".into());
                    std::fs::create_dir_all(&data_dir)?;
                    data_dir.join("sabuk.db")
                }
            };
            let mut source = LocalSource::new(Catalog::open(&db_path)?);
            if let Some(username) = &config.member.username {
                source = source.with_member(username);
            }
            Ok(Source::Local(source))
        }
        SourceKind::Rest => {
            let base_url = config
                .source
                .base_url
                .clone()
                .ok_or(config::ConfigError::MissingBaseUrl)?;
            let mut builder = RestSource::builder(base_url);
            if let Some(token) = &config.source.token {
                builder = builder.token(token);
            }
            Ok(Source::Rest(builder.build()?))
        }
    }
}

fn dirs_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share/sabuk"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))
            .map(|p| p.join("sabuk"))
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|h| PathBuf::from(h).join("sabuk"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_material_add() {
        let cli = Cli::try_parse_from([
            "sabuk",
            "material",
            "add",
            "--title",
            "Jurus 1",
            "--kind",
            "video",
            "--rank",
            "Sabuk Putih",
            "--url",
            "https://v/1",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Material {
                action: MaterialCommand::Add { ref rank, .. }
            } if rank == "Sabuk Putih"
        ));
    }

    #[test]
    fn admin_commands_need_local_source() {
        let source = Source::Rest(RestSource::builder("http://127.0.0.1:9").build().unwrap());
        let err = cmd_material(&source, MaterialCommand::Remove { id: "1".into() }).unwrap_err();
        assert!(matches!(err, Error::LocalOnly { .. }));
    }

    #[test]
    fn default_log_filter_covers_library_crates() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
        for target in ["sabuk=info", "runtime=info", "storage=info"] {
            assert!(DEFAULT_LOG_FILTER.split(',').any(|d| d == target));
        }
    }

    #[test]
    fn locked_view_hides_the_url() {
        let text = render_view(&ViewState::Locked {
            id: MaterialId::from("hitam"),
            required: Rank::BlackWiraga3,
            held: Rank::Unranked,
        });
        assert_eq!(
            text,
            "Locked: this material requires Sabuk Hitam Wiraga 3; you hold Belum punya."
        );
        assert!(!text.contains("https://"));
    }

    #[test]
    fn loaded_view_shows_the_material() {
        let material = Material::new("Jurus 1", MaterialKind::Pdf, Rank::Yellow, "https://v/1.pdf")
            .with_description("Langkah dasar");
        let text = render_view(&ViewState::Loaded(material));
        assert!(text.starts_with("Jurus 1\n"));
        assert!(text.contains("  requires: Sabuk Kuning"));
        assert!(text.contains("  url:      https://v/1.pdf"));
        assert!(text.ends_with("\n\nLangkah dasar"));
    }

    #[test]
    fn error_and_empty_views() {
        let text = render_view(&ViewState::LoadError {
            id: MaterialId::from("7"),
            message: "material not found: 7".into(),
        });
        assert_eq!(text, "Failed to load material 7: material not found: 7");

        assert_eq!(render_view(&ViewState::NoSelection), "No material selected.");
        assert_eq!(
            render_view(&ViewState::Loading { id: MaterialId::from("7") }),
            "No material selected."
        );
    }

    #[test]
    fn rejections_explain_the_lock() {
        let locked = SelectError::Locked {
            id: MaterialId::from("c"),
            required: Rank::Red,
            held: Rank::White,
        };
        assert_eq!(
            render_rejection(&locked),
            "Locked: this material requires Sabuk Merah; you hold Sabuk Putih."
        );

        let unknown = SelectError::UnknownItem(MaterialId::from("zz"));
        assert_eq!(render_rejection(&unknown), unknown.to_string());
    }

    #[tokio::test]
    async fn member_rank_is_none_without_member() {
        let source = Source::Local(LocalSource::new(Catalog::in_memory().unwrap()));
        assert_eq!(member_rank(&source).await.unwrap(), None);
    }

    #[test]
    fn edit_and_set_go_through_the_catalog() {
        let source = Source::Local(LocalSource::new(Catalog::in_memory().unwrap()));
        let material = Material::new("Awal", MaterialKind::Video, Rank::White, "https://v/a");
        source
            .local()
            .unwrap()
            .catalog()
            .insert_material(&material)
            .unwrap();

        cmd_material(
            &source,
            MaterialCommand::Edit {
                id: material.id.to_string(),
                title: None,
                kind: None,
                rank: Some("Sabuk Hijau".into()),
                url: None,
                description: None,
            },
        )
        .unwrap();
        let catalog = source.local().unwrap().catalog();
        assert_eq!(
            catalog.get_material(&material.id).unwrap().required_rank,
            Rank::Green
        );
        drop(catalog);

        let err = cmd_material(
            &source,
            MaterialCommand::Edit {
                id: material.id.to_string(),
                title: None,
                kind: None,
                rank: Some("Sabuk Ungu".into()),
                url: None,
                description: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::Policy(_)));

        cmd_member(
            &source,
            MemberCommand::Set {
                username: "sari".into(),
                rank: Some("Sabuk Merah".into()),
                name: None,
            },
        )
        .unwrap();
        assert_eq!(
            source.local().unwrap().catalog().get_member("sari").unwrap().rank,
            Some(Rank::Red)
        );
    }
}
