use tracing::{info, warn};

use crate::cli::{Cli, Commands};
use crate::core::config::SyncConfig;
use crate::core::error::SyncResult;
use crate::core::manifest::{Destination, Loader, ManifestStore, Minecraft};
use crate::core::modrinth::{ModrinthClient, Project, SearchGroups, SearchParams, PROJECT_TYPES};
use crate::core::reconcile::{InstallOutcome, Reconciler, UpdateKind};
use crate::core::toggle::Toggle;

/// Run one parsed command. `Ok(false)` means it completed but found
/// something the user has to look at (unresolved drift).
pub async fn dispatch(cli: Cli) -> SyncResult<bool> {
    let config = cli.config();
    match cli.command {
        Commands::Init {
            minecraft,
            loader,
            loader_version,
        } => init(&config, minecraft, loader, loader_version).await,
        Commands::Add { project, to } => add(config, &project, to.map(Destination::from)).await,
        Commands::Remove { slugs } => remove(config, &slugs).await,
        Commands::List => list(&config).await,
        Commands::Install => install(config).await,
        Commands::Update { dry_run } => update(config, dry_run).await,
        Commands::Enable { slug } => toggle(config, &slug, Toggle::Enable).await,
        Commands::Disable { slug } => toggle(config, &slug, Toggle::Disable).await,
        Commands::Check => check(config).await,
        Commands::Search {
            query,
            mods,
            resourcepacks,
            shaders,
            limit,
        } => search(&config, query, [mods, resourcepacks, shaders], limit).await,
    }
}

async fn init(
    config: &SyncConfig,
    minecraft: String,
    loader: Loader,
    loader_version: Option<String>,
) -> SyncResult<bool> {
    let store = ManifestStore::new(config.manifest_path());
    let manifest = store
        .create(Minecraft::new(minecraft, loader, loader_version))
        .await?;
    println!(
        "Created {} (minecraft {}, {} {})",
        store.path().display(),
        manifest.minecraft.version,
        manifest.minecraft.loader,
        manifest.minecraft.loader_version
    );
    Ok(true)
}

async fn add(config: SyncConfig, project: &str, to: Option<Destination>) -> SyncResult<bool> {
    let engine = Reconciler::open(config).await?;
    let out = engine.add(project, to).await?;
    println!(
        "{} {} {} -> {}",
        if out.created { "Added" } else { "Updated" },
        out.slug,
        out.version_label,
        out.destination
    );
    Ok(true)
}

async fn remove(config: SyncConfig, slugs: &[String]) -> SyncResult<bool> {
    let engine = Reconciler::open(config).await?;
    for slug in slugs {
        let entry = engine.remove(slug).await?;
        println!("Removed {} from {}", entry.slug, entry.destination);
    }
    Ok(true)
}

async fn list(config: &SyncConfig) -> SyncResult<bool> {
    let manifest = ManifestStore::new(config.manifest_path()).load().await?;
    println!("   {:<32} {:<24} TYPE", "ITEM", "VERSION");
    for (_, entry) in manifest.entries() {
        let mark = if entry.enabled { "✓" } else { "x" };
        println!(
            "{}  {:<32} {:<24} {}",
            mark, entry.slug, entry.version_label, entry.destination
        );
    }
    Ok(true)
}

async fn install(config: SyncConfig) -> SyncResult<bool> {
    let engine = Reconciler::open(config).await?;
    let outcomes = engine.install().await?;
    print_install(&outcomes);
    Ok(true)
}

fn print_install(outcomes: &[(String, InstallOutcome)]) {
    let mut changed = 0;
    for (slug, outcome) in outcomes {
        match outcome {
            InstallOutcome::UpToDate { .. } => {}
            InstallOutcome::Healed { from, to } => {
                changed += 1;
                println!("{slug}: found as {to} (was {from:?})");
            }
            InstallOutcome::Installed {
                filename,
                version_label,
                backups,
            } => {
                changed += 1;
                println!("{slug}: installed {version_label} ({filename})");
                for backup in backups {
                    println!("  backup: {}", backup.display());
                }
            }
        }
    }
    if changed == 0 {
        println!("Everything is installed ✓");
    }
}

async fn update(config: SyncConfig, dry_run: bool) -> SyncResult<bool> {
    let engine = Reconciler::open(config).await?;
    let plan = engine.plan().await?;
    if plan.is_empty() {
        println!("Everything is up-to-date ✓");
        return Ok(true);
    }

    let mut pending = 0;
    for item in &plan {
        let slug = &item.entry.slug;
        let (current, target) = (&item.current, &item.target_label);
        match item.kind() {
            UpdateKind::NewInstall => {
                pending += 1;
                println!("[ ] {slug:<20}  -> {target} (new)");
            }
            UpdateKind::Current => println!("[=] {slug:<20}  {current} (already up-to-date)"),
            UpdateKind::NoCompatibleVersion => {
                println!("[x] {slug:<20}  {current} -> (no compatible version found)")
            }
            UpdateKind::UpdateAvailable => {
                pending += 1;
                println!("[ ] {slug:<20}  {} -> {target}", item.entry.version_label);
            }
        }
    }
    println!("Found {pending} updates");

    if dry_run || pending == 0 {
        return Ok(true);
    }
    let outcomes = engine.install().await?;
    print_install(&outcomes);
    Ok(true)
}

async fn toggle(config: SyncConfig, slug: &str, target: Toggle) -> SyncResult<bool> {
    let engine = Reconciler::open(config).await?;
    let out = engine.toggle(slug, target).await?;
    if let Some(name) = &out.healed {
        info!("{}: filename recovered as {}", slug, name);
    }
    println!("{} {} ({})", slug, target, out.to.display());
    if let Some(backup) = &out.backup {
        println!("  backup: {}", backup.display());
    }
    Ok(true)
}

async fn check(config: SyncConfig) -> SyncResult<bool> {
    let engine = Reconciler::open(config).await?;
    let report = engine.check().await?;

    for drift in &report.drift {
        let tag = if drift.kind.is_healed() { "healed" } else { "drift" };
        println!("[{}] {}/{}", tag, drift.section, drift);
    }
    if let Some(err) = &report.persist_error {
        warn!("Healed filenames were not saved: {}", err);
    }
    if report.drift.is_empty() {
        println!("All files match the manifest ✓");
    }
    Ok(report.is_clean())
}

async fn search(
    config: &SyncConfig,
    query: String,
    include: [bool; 3],
    limit: u32,
) -> SyncResult<bool> {
    let manifest = ManifestStore::new(config.manifest_path()).load().await?;
    let client = ModrinthClient::from_config(config)?;

    let selected: Vec<String> = PROJECT_TYPES
        .iter()
        .zip(include)
        .filter(|(_, on)| *on)
        .map(|(t, _)| t.to_string())
        .collect();
    let project_types = if selected.is_empty() {
        PROJECT_TYPES.iter().map(|t| t.to_string()).collect()
    } else {
        selected
    };

    let params = SearchParams {
        query,
        project_types,
        game_version: Some(manifest.minecraft.version.clone()),
        limit,
    };
    let response = client.search(&params).await?;
    let groups = SearchGroups::group(
        response.hits,
        &manifest.minecraft.version,
        &manifest.minecraft.loader,
    );

    if groups.is_empty() {
        println!("No results for {:?}", params.query);
        return Ok(true);
    }
    print_group("MODS", "mod", &groups.mods);
    print_group("RESOURCE PACKS", "resourcepack", &groups.resourcepacks);
    print_group("SHADERS", "shader", &groups.shaders);
    Ok(true)
}

fn print_group(title: &str, kind: &str, projects: &[Project]) {
    if projects.is_empty() {
        return;
    }
    println!("{title}");
    for p in projects {
        println!(
            "  {:<32} {:<40} https://modrinth.com/{}/{}",
            p.slug, p.title, kind, p.slug
        );
    }
}

