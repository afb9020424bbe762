//! Command execution.

use std::path::Path;

use anyhow::{anyhow, bail, Context};
use tactics_core::{decode_layout, FormationBook, InMemoryDirectory, LayoutId, LayoutStore};
use tactics_renderer::{
    Compositor, ExportConfig, ExportFormat, IconSet, LayoutExporter, RenderConfig,
};

use crate::{CliConfig, Command, FormationArgs, LayoutsCommand, OutputArgs, RenderArgs};

/// Run the configured command.
///
/// # Errors
///
/// Returns an error if an input cannot be read, a stored layout is missing,
/// or rendering fails.
pub fn run(config: &CliConfig) -> anyhow::Result<()> {
    let store = open_store(config.data_dir.as_deref())?;
    match &config.command {
        Command::Render(args) => {
            let directory = load_players(config.players.as_deref())?;
            render(&store, &directory, args)
        }
        Command::Formation(args) => formation(args),
        Command::Layouts(command) => layouts(&store, command),
    }
}

fn open_store(data_dir: Option<&Path>) -> anyhow::Result<LayoutStore> {
    match data_dir {
        Some(dir) => LayoutStore::open(dir)
            .with_context(|| format!("opening layout store at {}", dir.display())),
        None => {
            tracing::debug!("No data directory, using an in-memory store");
            Ok(LayoutStore::new())
        }
    }
}

fn load_players(path: Option<&Path>) -> anyhow::Result<InMemoryDirectory> {
    let Some(path) = path else {
        tracing::warn!("No player directory given; player markers will be skipped");
        return Ok(InMemoryDirectory::new());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading players from {}", path.display()))?;
    let directory = InMemoryDirectory::from_json(&json)
        .with_context(|| format!("parsing players in {}", path.display()))?;
    tracing::debug!("Loaded {} players", directory.len());
    Ok(directory)
}

fn render(
    store: &LayoutStore,
    directory: &InMemoryDirectory,
    args: &RenderArgs,
) -> anyhow::Result<()> {
    let records = match (&args.file, &args.name) {
        (Some(file), _) => {
            let json = std::fs::read_to_string(file)
                .with_context(|| format!("reading layout from {}", file.display()))?;
            let decoded = decode_layout(&json);
            if decoded.skipped > 0 {
                tracing::warn!(
                    "{} malformed entries skipped in {}",
                    decoded.skipped,
                    file.display()
                );
            }
            decoded.records
        }
        (None, Some(name)) => store.load(name)?,
        (None, None) => bail!("either --file or --name is required"),
    };

    let (exporter, format, width, height) = prepare(&args.output)?;
    let bytes = exporter.export_layout_sized(&records, directory, format, width, height)?;
    write_output(&args.output.output, &bytes)
}

fn formation(args: &FormationArgs) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(&args.book)
        .with_context(|| format!("reading formations from {}", args.book.display()))?;
    let book = FormationBook::from_json(&json)
        .with_context(|| format!("parsing formations in {}", args.book.display()))?;
    let formation = book
        .get(&args.name)
        .ok_or_else(|| anyhow!("no formation named {:?}", args.name))?;

    let (exporter, format, width, height) = prepare(&args.output)?;
    let bytes = exporter.export_formation(formation, format, width, height)?;
    write_output(&args.output.output, &bytes)
}

fn prepare(output: &OutputArgs) -> anyhow::Result<(LayoutExporter, ExportFormat, u32, u32)> {
    let format = match &output.format {
        Some(name) => ExportFormat::from_extension(name)
            .ok_or_else(|| anyhow!("unknown format {name:?}"))?,
        None => ExportFormat::from_path(&output.output).ok_or_else(|| {
            anyhow!(
                "cannot tell the format of {}; pass --format",
                output.output.display()
            )
        })?,
    };

    let render_config = match &output.render_config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading render settings from {}", path.display()))?;
            RenderConfig::from_json(&json)?
        }
        None => RenderConfig::default(),
    };
    let icons = output
        .icons
        .as_deref()
        .map_or_else(IconSet::builtin, IconSet::from_dir);

    let width = output.width.unwrap_or(render_config.width);
    let height = output.height.unwrap_or(render_config.height);
    let compositor = Compositor::new(render_config, icons);
    Ok((
        LayoutExporter::new(compositor, ExportConfig::default()),
        format,
        width,
        height,
    ))
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn layouts(store: &LayoutStore, command: &LayoutsCommand) -> anyhow::Result<()> {
    match command {
        LayoutsCommand::List { json } => {
            let listing = store.list();
            if *json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                for summary in listing {
                    println!(
                        "{:>4}  {:<32} {:>3} elements",
                        summary.id.to_string(),
                        summary.name,
                        summary.element_count
                    );
                }
            }
        }
        LayoutsCommand::Show { name } => {
            let records = store.load(name)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        LayoutsCommand::Import { name, file } => {
            let json = std::fs::read_to_string(file)
                .with_context(|| format!("reading layout from {}", file.display()))?;
            let decoded = decode_layout(&json);
            if decoded.skipped > 0 {
                tracing::warn!("{} malformed entries skipped", decoded.skipped);
            }
            let id = store.save(name, &decoded.records)?;
            tracing::info!("Stored {:?} as layout {id}", name.trim());
        }
        LayoutsCommand::Delete { name } => {
            store.delete(id_of(store, name)?)?;
            tracing::info!("Deleted {name:?}");
        }
        LayoutsCommand::Rename { from, to } => {
            store.rename(id_of(store, from)?, to)?;
            tracing::info!("Renamed {from:?} to {to:?}");
        }
    }
    Ok(())
}

fn id_of(store: &LayoutStore, name: &str) -> anyhow::Result<LayoutId> {
    let name = name.trim();
    store
        .list()
        .into_iter()
        .find(|summary| summary.name == name)
        .map(|summary| summary.id)
        .ok_or_else(|| anyhow!("no layout named {name:?}"))
}
