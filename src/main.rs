use clap::Parser;
use color_eyre::Result;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use std::io::stdout;

use ifc_space_viewer::api::ApiClient;
use ifc_space_viewer::config::Args;
use ifc_space_viewer::exchange::{export_file, Format};
use ifc_space_viewer::logging;
use ifc_space_viewer::store::SpaceRepository;
use ifc_space_viewer::ui::tasks::{load_model, Tasks};
use ifc_space_viewer::ui::App;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let config = args.config();
    logging::init(config.log_file.as_deref())?;

    let runtime = tokio::runtime::Runtime::new()?;
    let client = ApiClient::new(&config.api_url, config.timeout)?;

    if args.is_headless() {
        let Some(file) = &config.initial_file else {
            return Ok(());
        };
        let loaded = runtime.block_on(load_model(&client, file))?;
        let mut repository = SpaceRepository::new();
        repository.load(loaded.spaces, loaded.info);
        let spaces = repository.filtered_spaces();

        for (format, path) in [
            (Format::Csv, &args.csv),
            (Format::Json, &args.json),
            (Format::Excel, &args.xlsx),
        ] {
            if let Some(path) = path {
                export_file(format, &spaces, path)?;
                println!("Exported to {}: {}", format.label(), path.display());
            }
        }
        return Ok(());
    }

    let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
    let tasks = Tasks::new(client, runtime.handle().clone(), sender);
    let mut app = App::new(config).with_tasks(tasks, receiver);
    app.start();

    let terminal = ratatui::init();
    execute!(stdout(), EnableMouseCapture)?;
    let result = app.run(terminal);
    execute!(stdout(), DisableMouseCapture)?;
    ratatui::restore();
    result
}
