//! Binary entry point: resolve the data directory, start logging, open the
//! database and drive the Ratatui event loop until the user exits.
use pocket_player::logging::init_logging;
use pocket_player::{ensure_schema, run_app, App, AppPaths, Importer, RodioEngine};

fn main() -> anyhow::Result<()> {
    let paths = AppPaths::resolve()?;
    paths.ensure_root()?;
    init_logging(&paths)?;
    tracing::info!(root = %paths.root().display(), "starting pocket player");

    let conn = ensure_schema(&paths.database())?;
    let importer = Importer::new(&paths);
    let mut app = App::new(conn, importer, RodioEngine::new())?;

    let result = run_app(&mut app);
    if let Err(err) = &result {
        tracing::error!(error = ?err, "terminal loop failed");
    }
    result
}
