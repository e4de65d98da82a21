mod cli;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bridge::DroppedFile;
use cli::{Command, LoadArgs, SaveArgs};
use deckconfig::DeckConfig;
use editor::{BufferKind, MemoryWidget};
use gistsync::{gist_id_from_url, GistClient};
use shaderdeck::paths::AppPaths;
use shaderdeck::run;
use shaderdeck::session::Session;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    let paths = AppPaths::discover()?;
    let config = run::load_config(&paths, cli.config.as_deref())?;
    let mut gists = run::build_gist_client(&paths, &config)?;
    match cli.command {
        Command::Load(args) => run_load(&paths, &config, gists, args),
        Command::Save(args) => {
            if let Some(token) = cli.token.as_deref() {
                gists.login(token).context("logging in with --token")?;
            }
            run_save(&config, gists, args)
        }
        Command::Login(args) => run_login(&mut gists, &args.access_token),
        Command::Logout => {
            gists.logout();
            println!("Logged out.");
            Ok(())
        }
        Command::Whoami => run_whoami(&mut gists),
        Command::History => run_history(&gists),
        Command::Where => run_where(&paths, &config),
    }
}

fn run_where(paths: &AppPaths, config: &DeckConfig) -> Result<()> {
    println!("Configuration directories:");
    println!("  config:     {}", paths.config_dir().display());
    println!("  data:       {}", paths.data_dir().display());
    println!("  settings:   {}", paths.config_file().display());
    println!("  state:      {}", paths.state_file().display());
    println!("Remote endpoints:");
    println!("  gist api:   {}", config.gist.api_base);
    println!("  share base: {}", config.gist.share_base);
    println!("  includes:   {}", config.editor.include_manifest);
    Ok(())
}

fn run_load(
    paths: &AppPaths,
    config: &DeckConfig,
    gists: GistClient,
    args: LoadArgs,
) -> Result<()> {
    let id = gist_id_from_url(&args.reference)?;
    let out = args.out.unwrap_or_else(|| paths.project_dir(&id));
    fs::create_dir_all(&out)
        .with_context(|| format!("failed to create export directory {}", out.display()))?;

    let mut session = run::build_session(config, gists, Some(out.clone()));
    let loaded = session.load_gist(&id);
    print_console(&session);
    let Some(loaded) = loaded? else {
        return Ok(());
    };

    let project = &loaded.project;
    write_export(&out.join("shader.frag"), &project.frag)?;
    write_export(&out.join("shader.vert"), &project.vert)?;
    if !project.commands.is_empty() {
        write_export(&out.join("commands.txt"), &(project.commands.join("\n") + "\n"))?;
    }
    println!("Exported gist {} to {}", loaded.id, out.display());
    Ok(())
}

fn run_save(config: &DeckConfig, gists: GistClient, args: SaveArgs) -> Result<()> {
    let frag = read_source(&args.frag)?;
    let vert = read_source(&args.vert)?;

    let mut session = run::build_session(config, gists, None);
    session.editor_mut().set_content(BufferKind::Fragment, &frag);
    session.editor_mut().set_content(BufferKind::Vertex, &vert);

    let mut dropped = Vec::with_capacity(args.assets.len());
    for path in &args.assets {
        dropped.push(read_asset(path)?);
    }
    if !dropped.is_empty() {
        session.drop_files(dropped);
    }
    for command in &args.commands {
        session.send_command(command);
    }

    let shared = session.save_gist(&args.name);
    print_console(&session);
    let shared = shared?;
    println!("Saved gist {} as {}", shared.saved.id, shared.saved.filename);
    if let Some(html_url) = &shared.saved.html_url {
        println!("  gist:   {html_url}");
    }
    println!("  share:  {}", shared.url);
    Ok(())
}

fn run_login(gists: &mut GistClient, token: &str) -> Result<()> {
    let identity = gists.login(token)?;
    println!("Logged in as {}", identity.login);
    Ok(())
}

fn run_whoami(gists: &mut GistClient) -> Result<()> {
    match gists.validate()? {
        Some(identity) => match identity.name {
            Some(name) => println!("{} ({name})", identity.login),
            None => println!("{}", identity.login),
        },
        None => println!("Not logged in."),
    }
    Ok(())
}

fn run_history(gists: &GistClient) -> Result<()> {
    let history = gists.history();
    if history.is_empty() {
        println!("No gist history recorded.");
        return Ok(());
    }
    println!("Gist history (oldest first):");
    for entry in history.entries() {
        let author = entry
            .owner
            .as_ref()
            .map(|owner| owner.login.as_str())
            .unwrap_or("-");
        println!("  {:<34} {:<20} {}", entry.gist_id, author, entry.timestamp);
    }
    Ok(())
}

fn print_console(session: &Session<MemoryWidget>) {
    for line in session.console().lines() {
        if line.is_error {
            eprintln!("{}", line.text);
        } else {
            println!("{}", line.text);
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read shader source {}", path.display()))
}

fn read_asset(path: &Path) -> Result<DroppedFile> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("asset path {} has no file name", path.display()))?;
    let bytes =
        fs::read(path).with_context(|| format!("failed to read asset {}", path.display()))?;
    Ok(DroppedFile::new(name, bytes))
}

fn write_export(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
