use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use serde::Serialize;
use sharad_chargen::{
    Action, Catalog, CharacterState, DashboardData, DraftStore, Settings, ValidationResult,
    apply, compute_dashboard, compute_next_state, logging, validate,
};
use std::fs;
use std::path::PathBuf;

// Load a catalog and a character, apply one action, print the result as JSON.
#[derive(Parser, Debug)]
#[command(name = "sharad_chargen", version, about)]
struct Cli {
    /// Catalog JSON supplied by the server
    #[arg(long)]
    catalog: PathBuf,

    /// Character state JSON; a fresh sheet is used when omitted
    #[arg(long)]
    state: Option<PathBuf>,

    /// Action as JSON, e.g. '{"type":"bump_attribute","id":"body","delta":1}'
    #[arg(long)]
    action: Option<String>,

    /// Draft id to load from and persist to
    #[arg(long)]
    draft: Option<String>,

    /// Settings file; defaults to ~/sharad/data/chargen_settings.json
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[derive(Serialize)]
struct Report {
    state: CharacterState,
    dashboard: DashboardData,
    validation: ValidationResult,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => Settings::load_settings_from_file(path)?,
        None => Settings::load().unwrap_or_default(),
    };
    logging::init(Settings::data_dir()?, settings.debug_mode)?;

    let catalog = Catalog::from_json(&fs::read_to_string(&cli.catalog)?)?;
    if let Err(e) = catalog.check_required() {
        log::error!("Unusable catalog {}: {e}", cli.catalog.display());
        return Err(eyre!("{e}"));
    }

    let store = DraftStore::from_settings(&settings)?;
    let state = match (&cli.state, &cli.draft) {
        (Some(path), _) => CharacterState::from_json(&fs::read_to_string(path)?)?,
        (None, Some(draft_id)) => store
            .load(draft_id)?
            .map(|draft| draft.state)
            .unwrap_or_else(|| CharacterState::new(&catalog)),
        (None, None) => CharacterState::new(&catalog),
    };

    let action: Option<Action> = cli
        .action
        .as_deref()
        .map(serde_json::from_str::<Action>)
        .transpose()?;

    let state = match (action, &cli.draft) {
        (Some(action), Some(draft_id)) => {
            let mut store = store.with_draft_id(draft_id.clone());
            compute_next_state(&state, &catalog, &action, &mut store)
        }
        (Some(action), None) => apply(&state, &catalog, &action),
        (None, _) => sharad_chargen::normalize(&state, &catalog),
    };

    let dashboard = compute_dashboard(&state, &catalog);
    let validation = validate(&dashboard, &state);
    let report = Report {
        state,
        dashboard,
        validation,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
