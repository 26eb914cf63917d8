use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "snapshare",
    about = "SnapShare: shared inventory board with per-device likes",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the item collection, blobs and device records
    #[arg(long, global = true, default_value = ".snapshare")]
    pub data_dir: PathBuf,

    /// Device id; defaults to the one remembered in the data directory
    #[arg(long, global = true)]
    pub device: Option<String>,

    /// Signed-in user id
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Display name of the signed-in user
    #[arg(long, global = true, requires = "user")]
    pub user_name: Option<String>,

    /// Board configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show every item with its like count
    List,
    /// Post an item, or bump its count if it already exists
    Add(AddArgs),
    /// Decrement an item's count
    Remove(NameArgs),
    /// Like an item from this device
    Like(NameArgs),
    /// Withdraw this device's like
    Dislike(NameArgs),
    /// List the items this device has liked
    Liked,
    /// Serve the board over HTTP
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct AddArgs {
    pub name: String,
    /// Image file to upload with the item
    #[arg(long)]
    pub image: Option<PathBuf>,
}

#[derive(Args)]
pub struct NameArgs {
    pub name: String,
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<String>,
    /// Externally reachable base URL used for image links
    #[arg(long)]
    pub public_url: Option<String>,
    /// Server configuration file (TOML)
    #[arg(long)]
    pub server_config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list() {
        let cli = Cli::try_parse_from(["snapshare", "list"]).unwrap();
        assert!(matches!(cli.command, Command::List));
        assert_eq!(cli.data_dir, PathBuf::from(".snapshare"));
    }

    #[test]
    fn parse_add_with_image() {
        let cli = Cli::try_parse_from([
            "snapshare", "--user", "u-1", "add", "Apple", "--image", "apple.png",
        ])
        .unwrap();
        assert_eq!(cli.user, Some("u-1".into()));
        if let Command::Add(args) = cli.command {
            assert_eq!(args.name, "Apple");
            assert_eq!(args.image, Some(PathBuf::from("apple.png")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_like_with_global_flags_after() {
        let cli = Cli::try_parse_from(["snapshare", "like", "Apple", "--device", "phone"]).unwrap();
        assert_eq!(cli.device, Some("phone".into()));
        if let Command::Like(args) = cli.command {
            assert_eq!(args.name, "Apple");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn user_name_requires_user() {
        assert!(Cli::try_parse_from(["snapshare", "--user-name", "alice", "list"]).is_err());
    }

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["snapshare", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind, Some("0.0.0.0:8080".into()));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["snapshare", "--format", "json", "liked"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
