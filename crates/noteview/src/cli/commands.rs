use super::render;
use super::setup::{Cli, Commands, ViewsCommands};
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use noteviewapp::api::NoteViewApi;
use noteviewapp::document::FileInfo;
use noteviewapp::filters::apply_filter_chain;
use noteviewapp::markdown::PulldownRenderer;
use noteviewapp::rules::{Filter, FilterGroup, Operator};
use noteviewapp::settings::Settings;
use noteviewapp::value::{parse_number, FilterValue};
use noteviewapp::vault::FsVault;
use noteviewapp::views::{position, ViewConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "NOTEVIEW_LOG";
const SETTINGS_DIR: &str = ".noteview";
const SETTINGS_FILE: &str = "settings.json";

struct AppContext {
    api: NoteViewApi<PulldownRenderer>,
    settings_path: PathBuf,
}

impl AppContext {
    fn note_path(&self, note: &Path) -> Result<String> {
        self.api
            .vault()
            .relative_path(note)
            .ok_or_else(|| anyhow!("{} is not a note in this vault", note.display()))
    }

    fn save(&self) -> Result<()> {
        self.api
            .save_settings(&self.settings_path)
            .with_context(|| format!("writing {}", self.settings_path.display()))
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Chain { value, chain } => handle_chain(value, chain),
        Commands::Match { note } => handle_match(&create_context(&cli)?, note),
        Commands::Render {
            note,
            output,
            no_scripts,
            fragment,
        } => handle_render(
            &create_context(&cli)?,
            note,
            output.as_deref(),
            *no_scripts,
            *fragment,
        ),
        Commands::Views { action } => {
            let mut ctx = create_context(&cli)?;
            match action {
                None | Some(ViewsCommands::List) => handle_views_list(&ctx),
                Some(ViewsCommands::Add {
                    name,
                    template,
                    rules,
                    any,
                }) => handle_views_add(&mut ctx, name, template.as_deref(), rules, *any),
                Some(ViewsCommands::Remove { view }) => handle_views_remove(&mut ctx, view),
                Some(ViewsCommands::Move { from, to }) => handle_views_move(&mut ctx, *from, *to),
            }
        }
        Commands::Properties { json } => handle_properties(&create_context(&cli)?, *json),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A second init (tests driving `run` twice) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn settings_path(cli: &Cli, vault_root: &Path) -> PathBuf {
    if let Some(path) = &cli.settings {
        return path.clone();
    }
    let local = vault_root.join(SETTINGS_DIR).join(SETTINGS_FILE);
    if local.exists() {
        return local;
    }
    ProjectDirs::from("", "", "noteview")
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
        .unwrap_or(local)
}

fn create_context(cli: &Cli) -> Result<AppContext> {
    let root = match &cli.vault {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("reading current directory")?,
    };
    let vault = FsVault::open(&root)?;
    let settings_path = settings_path(cli, vault.root());
    debug!(settings = %settings_path.display(), "loading settings");
    let settings = Settings::load(&settings_path)
        .with_context(|| format!("reading {}", settings_path.display()))?;
    Ok(AppContext {
        api: NoteViewApi::new(vault, settings, PulldownRenderer::new()),
        settings_path,
    })
}

fn handle_match(ctx: &AppContext, note: &Path) -> Result<()> {
    if !ctx.api.settings().enabled {
        println!("{}", render::disabled());
        return Ok(());
    }
    let path = ctx.note_path(note)?;
    match ctx.api.match_document(&path)? {
        Some(view) => {
            let index = position(&ctx.api.settings().views, &view.id).unwrap_or(0);
            println!("{}", render::matched(index, view));
        }
        None => println!("{}", render::no_match(&path)),
    }
    Ok(())
}

fn handle_render(
    ctx: &AppContext,
    note: &Path,
    output: Option<&Path>,
    no_scripts: bool,
    fragment: bool,
) -> Result<()> {
    if !ctx.api.settings().enabled {
        bail!("noteview is disabled in {}", ctx.settings_path.display());
    }
    let path = ctx.note_path(note)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("starting renderer")?;
    let Some(mut view) = runtime.block_on(ctx.api.render_document(&path))? else {
        bail!("no view matches {}", path);
    };
    if no_scripts {
        view = view.without_scripts();
    }

    let text = if fragment {
        format!("{}\n", view.html)
    } else {
        view.to_document(&FileInfo::from_path(&path).basename)
    };
    match output {
        Some(file) => {
            fs::write(file, text).with_context(|| format!("writing {}", file.display()))?;
            eprintln!("{}", render::wrote(file));
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn handle_views_list(ctx: &AppContext) -> Result<()> {
    let settings = ctx.api.settings();
    print!("{}", render::view_list(&settings.views, settings.enabled));
    Ok(())
}

/// Accepts the ASCII spellings of the symbol operators.
fn parse_operator(name: &str) -> Operator {
    let name = match name {
        "!=" => "≠",
        "<=" => "≤",
        ">=" => "≥",
        other => other,
    };
    Operator::parse(name)
}

fn parse_rules(rules: &[String], any: bool) -> Result<FilterGroup> {
    let mut group = if any {
        FilterGroup::or()
    } else {
        FilterGroup::and()
    };
    for rule in rules.chunks(3) {
        let [field, operator, value] = rule else {
            bail!("--rule takes FIELD OPERATOR VALUE");
        };
        let operator = parse_operator(operator);
        if let Operator::Other(name) = &operator {
            bail!("unknown operator: {}", name);
        }
        group = group.with_filter(Filter::new(field.as_str(), operator, value.as_str()));
    }
    Ok(group)
}

fn handle_views_add(
    ctx: &mut AppContext,
    name: &str,
    template: Option<&Path>,
    rules: &[String],
    any: bool,
) -> Result<()> {
    let mut view = ViewConfig::new(name).with_rules(parse_rules(rules, any)?);
    if let Some(file) = template {
        let text =
            fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
        view = view.with_template(text);
    }
    let settings = ctx.api.settings_mut();
    settings.add_view(view);
    let index = settings.views.len() - 1;
    let added = render::added(index, &settings.views[index]);
    ctx.save()?;
    println!("{}", added);
    Ok(())
}

/// A 1-based position, or failing that a view id.
fn find_view(settings: &Settings, view: &str) -> Result<usize> {
    if let Ok(number) = view.parse::<usize>() {
        if (1..=settings.views.len()).contains(&number) {
            return Ok(number - 1);
        }
    }
    position(&settings.views, view).ok_or_else(|| anyhow!("no view {}", view))
}

fn handle_views_remove(ctx: &mut AppContext, view: &str) -> Result<()> {
    let index = find_view(ctx.api.settings(), view)?;
    let id = ctx.api.settings().views[index].id.clone();
    let removed = ctx.api.settings_mut().remove_view(&id)?;
    ctx.save()?;
    println!("{}", render::removed(&removed));
    Ok(())
}

fn handle_views_move(ctx: &mut AppContext, from: usize, to: usize) -> Result<()> {
    if from == 0 || to == 0 {
        bail!("positions start at 1");
    }
    ctx.api.settings_mut().move_view(from - 1, to - 1)?;
    ctx.save()?;
    handle_views_list(ctx)
}

fn handle_properties(ctx: &AppContext, json: bool) -> Result<()> {
    let properties = ctx.api.properties();
    if json {
        println!("{}", serde_json::to_string_pretty(&properties)?);
    } else {
        print!("{}", render::properties(&properties));
    }
    Ok(())
}

fn handle_chain(value: &str, chain: &str) -> Result<()> {
    let input = match parse_number(value) {
        Some(n) => FilterValue::Number(n),
        None => FilterValue::text(value),
    };
    println!("{}", apply_filter_chain(input, chain));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_rules() {
        let group = parse_rules(&strings(&["file", "in folder", "Movies", "rating", ">=", "4"]), true)
            .unwrap();
        assert_eq!(
            group,
            FilterGroup::or()
                .with_filter(Filter::new("file", Operator::InFolder, "Movies"))
                .with_filter(Filter::new("rating", Operator::Ge, "4"))
        );
    }

    #[test]
    fn test_parse_operator_ascii_spellings() {
        assert_eq!(parse_operator("<="), Operator::Le);
        assert_eq!(parse_operator("≠"), Operator::Ne);
        assert_eq!(parse_operator("links to"), Operator::LinksTo);
    }

    #[test]
    fn test_parse_rules_rejects_unknown_operator() {
        assert!(parse_rules(&strings(&["a", "resembles", "b"]), false).is_err());
    }

    #[test]
    fn test_find_view_by_position_or_id() {
        let mut settings = Settings::default();
        settings.add_view(ViewConfig::new("A"));
        let id = settings.add_view(ViewConfig::new("B"));
        assert_eq!(find_view(&settings, "1").unwrap(), 0);
        assert_eq!(find_view(&settings, &id).unwrap(), 1);
        assert!(find_view(&settings, "3").is_err());
    }
}
