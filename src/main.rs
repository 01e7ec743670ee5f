use std::error::Error;

use clap::Parser;
use geckoview_local::{
    cli::{
        args::{CliArgs, Command},
        command_handlers::{do_apply, do_environment, do_properties},
    },
    config::GeckoViewLocalConfig,
    GeckoViewLocal,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = CliArgs::parse();
    let config = GeckoViewLocalConfig::load()?;

    let mut builder = GeckoViewLocal::builder()
        .root(&cli_args.root)
        .appservices(config.appservices);
    if let Some(properties_file) = cli_args.properties_file.or(config.properties_file) {
        builder = builder.properties_file_name(properties_file);
    }
    let plugin = builder.try_build()?;

    match cli_args.cmd {
        Command::Apply { project, output } => {
            do_apply(&plugin, &cli_args.root.join(project), output.as_deref())
        }
        Command::Environment => do_environment(&plugin),
        Command::Properties => do_properties(&plugin),
    }
}
