//! Command line definitions (clap derive).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::core::config::{SyncConfig, DEFAULT_CONCURRENCY, DEFAULT_MANIFEST_NAME};
use crate::core::manifest::{Destination, Loader};

/// Keep a Minecraft instance's mods, resource packs and shaders in sync
/// with a declarative manifest.
#[derive(Parser, Debug)]
#[command(
    name = "modsync",
    version,
    about = "Declarative Modrinth mod, resource pack and shader manager",
    after_help = "Examples:\n  \
                  modsync init --mc 1.21.1 --loader fabric\n  \
                  modsync add sodium\n  \
                  modsync add https://modrinth.com/shader/complementary-reimagined\n  \
                  modsync install\n  \
                  modsync update --dry-run"
)]
pub struct Cli {
    /// Game directory holding mods/, resourcepacks/ and shaderpacks/
    #[arg(long, short = 'd', global = true, env = "MODSYNC_DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Manifest filename inside the game directory
    #[arg(long, global = true, env = "MODSYNC_MANIFEST", default_value = DEFAULT_MANIFEST_NAME)]
    pub manifest: String,

    /// Entries installed in parallel
    #[arg(long, short = 'j', global = true, env = "MODSYNC_JOBS", default_value_t = DEFAULT_CONCURRENCY)]
    pub jobs: usize,

    /// Modrinth API base URL
    #[arg(long, global = true, env = "MODSYNC_API")]
    pub api: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn config(&self) -> SyncConfig {
        let config = SyncConfig::new(&self.dir)
            .with_manifest_name(&self.manifest)
            .with_concurrency(self.jobs);
        match &self.api {
            Some(api) => config.with_api_base(api),
            None => config,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new manifest
    Init {
        /// Minecraft version, e.g. 1.21.1
        #[arg(long = "mc")]
        minecraft: String,

        /// fabric, forge, neoforge or quilt
        #[arg(long, value_parser = parse_loader)]
        loader: Loader,

        /// Loader version (defaults to latest)
        #[arg(long)]
        loader_version: Option<String>,
    },

    /// Add a project by slug or Modrinth URL
    Add {
        /// Slug or https://modrinth.com/<type>/<slug>
        project: String,

        /// Override the destination inferred from the project type
        #[arg(long, value_enum)]
        to: Option<DestArg>,
    },

    /// Remove entries and delete their files
    Remove {
        #[arg(required = true)]
        slugs: Vec<String>,
    },

    /// Show manifest entries
    List,

    /// Install or repair every enabled entry
    Install,

    /// Check for and install newer compatible versions
    Update {
        /// Show updates without installing
        #[arg(long)]
        dry_run: bool,
    },

    /// Enable a disabled entry
    Enable { slug: String },

    /// Disable an entry without removing it
    Disable { slug: String },

    /// Verify files against recorded checksums
    Check,

    /// Search Modrinth (all project types unless filtered)
    Search {
        query: String,

        /// Include mods
        #[arg(long = "mod", short = 'm')]
        mods: bool,

        /// Include resource packs
        #[arg(long = "resourcepack", short = 'r')]
        resourcepacks: bool,

        /// Include shaders
        #[arg(long = "shaders", short = 's')]
        shaders: bool,

        #[arg(long, short = 'l', default_value_t = 30)]
        limit: u32,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestArg {
    Mods,
    Resourcepacks,
    Shaderpacks,
}

impl From<DestArg> for Destination {
    fn from(arg: DestArg) -> Self {
        match arg {
            DestArg::Mods => Destination::Mods,
            DestArg::Resourcepacks => Destination::ResourcePacks,
            DestArg::Shaderpacks => Destination::ShaderPacks,
        }
    }
}

fn parse_loader(s: &str) -> Result<Loader, String> {
    Loader::parse(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_init_with_default_loader_version() {
        let cli =
            Cli::try_parse_from(["modsync", "init", "--mc", "1.21.1", "--loader", "fabric"]).unwrap();
        match cli.command {
            Commands::Init {
                minecraft,
                loader,
                loader_version,
            } => {
                assert_eq!(minecraft, "1.21.1");
                assert_eq!(loader, Loader::Fabric);
                assert_eq!(loader_version, None);
            }
            other => panic!("expected init, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_loader() {
        assert!(
            Cli::try_parse_from(["modsync", "init", "--mc", "1.21.1", "--loader", "vanilla"])
                .is_err()
        );
    }

    #[test]
    fn global_flags_build_config() {
        let cli = Cli::try_parse_from([
            "modsync",
            "install",
            "--dir",
            "/srv/mc",
            "--manifest",
            "pack.json",
            "-j",
            "0",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Install));

        let config = cli.config();
        assert_eq!(config.manifest_path(), PathBuf::from("/srv/mc/pack.json"));
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn parses_add_with_destination_override() {
        let cli = Cli::try_parse_from(["modsync", "add", "faithful", "--to", "resourcepacks"]).unwrap();
        match cli.command {
            Commands::Add { project, to } => {
                assert_eq!(project, "faithful");
                assert_eq!(to.map(Destination::from), Some(Destination::ResourcePacks));
            }
            other => panic!("expected add, got {other:?}"),
        }
    }

    #[test]
    fn remove_requires_a_slug() {
        assert!(Cli::try_parse_from(["modsync", "remove"]).is_err());
        let cli = Cli::try_parse_from(["modsync", "remove", "a", "b"]).unwrap();
        assert!(matches!(cli.command, Commands::Remove { ref slugs } if slugs.len() == 2));
    }

    #[test]
    fn parses_search_filters() {
        let cli = Cli::try_parse_from(["modsync", "search", "sodium", "-m", "-s", "--limit", "5"])
            .unwrap();
        match cli.command {
            Commands::Search {
                query,
                mods,
                resourcepacks,
                shaders,
                limit,
            } => {
                assert_eq!(query, "sodium");
                assert!(mods && shaders && !resourcepacks);
                assert_eq!(limit, 5);
            }
            other => panic!("expected search, got {other:?}"),
        }
    }
}
