use chrono::{Local, NaiveDate};
use clap::Parser;
use std::path::PathBuf;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;
use vjour::application::feed::FeedView;
use vjour::application::init::{init, sync_profile};
use vjour::application::manage_config::{touches_profile, ConfigService};
use vjour::application::Journal;
use vjour::cli::{
    format_entry_deletion, format_feed, format_image_deletion, format_submit, Cli, Commands,
};
use vjour::domain::{
    Draft, EntryId, ImageId, ImagePayload, PendingImage, SubmitRequest, TimeReference,
};
use vjour::error::VjourError;
use vjour::infrastructure::{
    Backend, Config, ConfigIdentity, FileSystemRepository, IdentityProvider, JournalRepository,
};

/// Log filter, e.g. `VJOUR_LOG=vjour=debug`
const LOG_ENV: &str = "VJOUR_LOG";

fn main() {
    init_logging();

    let cli = Cli::parse();

    match run(cli) {
        Ok(_) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e.display_with_suggestions());
            std::process::exit(e.exit_code());
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// An opened journal: config, stores and the signed-in identity
struct Session {
    repo: FileSystemRepository,
    config: Config,
    backend: Backend,
    journal: Journal,
    identity: ConfigIdentity,
}

impl Session {
    fn open() -> Result<Self, VjourError> {
        let repo = FileSystemRepository::discover()?;
        let config = repo.load_config()?;
        let backend = Backend::open(&repo, &config);
        let journal = Journal::new(backend.clone());
        let identity = ConfigIdentity::new(&config.user);
        Ok(Session {
            repo,
            config,
            backend,
            journal,
            identity,
        })
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn resolve_date(input: &str) -> Result<NaiveDate, VjourError> {
    Ok(TimeReference::parse(input)?.resolve(today()))
}

fn parse_entry_id(raw: &str) -> Result<EntryId, VjourError> {
    raw.parse()
        .map_err(|_| VjourError::Validation(format!("Invalid entry id: '{}'", raw)))
}

fn parse_image_id(raw: &str) -> Result<ImageId, VjourError> {
    raw.parse()
        .map_err(|_| VjourError::Validation(format!("Invalid image id: '{}'", raw)))
}

fn read_images(paths: &[PathBuf]) -> Result<Vec<PendingImage>, VjourError> {
    paths
        .iter()
        .map(|path| ImagePayload::from_path(path).map(PendingImage::New))
        .collect()
}

fn runtime() -> Result<Runtime, VjourError> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

fn run(cli: Cli) -> Result<(), VjourError> {
    match cli.command {
        Some(Commands::Init { path, name }) => {
            let name = name.unwrap_or_else(Config::detect_display_name);
            let config = runtime()?.block_on(init(&path, &name))?;
            println!("Initialized vjour journal at {}", path.display());
            println!("User: {} ({})", config.user.display_name, config.user.id);
            Ok(())
        }
        Some(Commands::Post { text, date, images }) => {
            let session = Session::open()?;
            let user = session.identity.require_user()?;

            let mut draft = Draft::new(text.unwrap_or_default(), resolve_date(&date)?);
            draft.images = read_images(&images)?;

            let outcome = runtime()?.block_on(
                session
                    .journal
                    .submit
                    .submit(&user.id, SubmitRequest::create(draft)),
            )?;
            print!("{}", format_submit(&outcome, true));
            Ok(())
        }
        Some(Commands::Edit {
            id,
            text,
            date,
            add_images,
            remove_images,
        }) => {
            let session = Session::open()?;
            let user = session.identity.require_user()?;
            let entry_id = parse_entry_id(&id)?;
            let date = date.as_deref().map(resolve_date).transpose()?;
            let removals = remove_images
                .iter()
                .map(|raw| parse_image_id(raw))
                .collect::<Result<Vec<_>, _>>()?;
            let additions = read_images(&add_images)?;

            let outcome = runtime()?.block_on(async {
                let submit = &session.journal.submit;
                let mut draft = submit.draft_for(&entry_id).await?;
                if let Some(text) = text {
                    draft.content = text;
                }
                if let Some(date) = date {
                    draft.date = date;
                }
                for image in &removals {
                    if !draft.remove_image(image) {
                        return Err(VjourError::Validation(format!(
                            "Image {} is not attached to entry {}",
                            image, entry_id
                        )));
                    }
                }
                draft.images.extend(additions);

                submit
                    .submit(&user.id, SubmitRequest::edit(entry_id, draft))
                    .await
            })?;
            print!("{}", format_submit(&outcome, false));
            Ok(())
        }
        Some(Commands::Delete { id }) => {
            let session = Session::open()?;
            let user = session.identity.require_user()?;
            let entry_id = parse_entry_id(&id)?;

            let report =
                runtime()?.block_on(session.journal.deletion.delete_entry(&user.id, &entry_id))?;
            print!("{}", format_entry_deletion(&report));
            Ok(())
        }
        Some(Commands::DeleteImage { id }) => {
            let session = Session::open()?;
            let user = session.identity.require_user()?;
            let image_id = parse_image_id(&id)?;

            let deletion =
                runtime()?.block_on(session.journal.deletion.delete_image(&user.id, &image_id))?;
            print!("{}", format_image_deletion(&deletion));
            Ok(())
        }
        Some(Commands::Feed { date, mine, ids }) => {
            let session = Session::open()?;
            let date = resolve_date(&date)?;

            let mut view = if mine {
                FeedView::mine(session.identity.require_user()?.id)
            } else {
                FeedView::new()
            };
            runtime()?.block_on(view.sync(
                &session.journal.feed,
                date,
                session.journal.refresh.current(),
            ))?;
            print!("{}", format_feed(date, today(), view.entries(), ids));
            Ok(())
        }
        Some(Commands::Config { key, value, list }) => {
            let repo = FileSystemRepository::discover()?;
            let service = ConfigService::new(repo.clone());

            if list {
                for (key, value) in service.list()? {
                    println!("{} = {}", key, value);
                }
                Ok(())
            } else if let Some(k) = key {
                if let Some(v) = value {
                    let config = service.set(&k, &v)?;
                    if touches_profile(&k) {
                        let backend = Backend::open(&repo, &config);
                        runtime()?.block_on(sync_profile(backend.records.as_ref(), &config))?;
                    }
                    println!("Set {} = {}", k, v);
                    Ok(())
                } else {
                    println!("{}", service.get(&k)?);
                    Ok(())
                }
            } else {
                println!("Usage: vjour config [--list | <key> [<value>]]");
                println!(
                    "Valid keys: {}",
                    vjour::application::manage_config::CONFIG_KEYS.join(", ")
                );
                Ok(())
            }
        }
        Some(Commands::Whoami) => {
            let session = Session::open()?;
            let user = session.identity.require_user()?;

            let name = if user.id == session.config.user.id {
                session.config.user.display_name.clone()
            } else {
                runtime()?
                    .block_on(session.backend.records.get_profile(&user.id))
                    .map(|profile| profile.display_name)
                    .unwrap_or_else(|_| "(no profile)".to_string())
            };
            println!("{} ({})", name, user.id);
            if let Some(email) = user.email {
                println!("{}", email);
            }
            println!("Journal: {}", session.repo.root().display());
            Ok(())
        }
        None => {
            println!("vjour - Visual journal");
            println!("Use --help for usage information");
            Ok(())
        }
    }
}
