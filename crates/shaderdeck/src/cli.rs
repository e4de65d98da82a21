use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "shaderdeck",
    author,
    version,
    about = "Shader preview control surface with gist-backed sharing"
)]
pub struct Cli {
    /// GitHub access token; can also be supplied via the `SHADERDECK_TOKEN` env var.
    #[arg(long, global = true, env = "SHADERDECK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Read settings from this file instead of `config.toml` in the config directory.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a shared gist and export its shaders, commands and assets.
    Load(LoadArgs),
    /// Publish shader sources (and optional assets) as a new public gist.
    Save(SaveArgs),
    /// Validate and store a GitHub access token.
    Login(LoginArgs),
    /// Forget the stored access token.
    Logout,
    /// Show the account the stored token belongs to.
    Whoami,
    /// List the derivation history of the last loaded or saved project.
    History,
    /// Print resolved directories for the config and data roots.
    Where,
}

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Gist id, gist.github.com link, or share link carrying `?gist=<id>`.
    #[arg(value_name = "ID|URL")]
    pub reference: String,

    /// Export directory (defaults to `<data>/projects/<id>`).
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Project name; becomes the gist file name with a `.json` extension.
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Fragment shader source file.
    #[arg(long, value_name = "FILE")]
    pub frag: PathBuf,

    /// Vertex shader source file.
    #[arg(long, value_name = "FILE")]
    pub vert: PathBuf,

    /// Asset to embed (textures, models, HDR environment maps). Repeatable.
    #[arg(long = "asset", value_name = "FILE")]
    pub assets: Vec<PathBuf>,

    /// Command to replay when the project is opened (e.g. `sphere,1`). Repeatable.
    #[arg(long = "command", value_name = "COMMAND")]
    pub commands: Vec<String>,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(value_name = "TOKEN")]
    pub access_token: String,
}

pub fn parse() -> Cli {
    Cli::parse()
}
