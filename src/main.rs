use std::sync::Arc;

use anyhow::Result;
use log::info;

use notewave_engine::audio::source::CpalSource;
use notewave_engine::config::Config;
use notewave_engine::net::CommandListener;
use notewave_engine::params::ParameterStore;
use notewave_engine::pipeline::PipelineDriver;

fn main() -> Result<()> {
    env_logger::init();
    info!("starting audio analysis engine");

    let config = Config::default();
    let params = Arc::new(ParameterStore::new());

    let _command_listener = CommandListener::spawn(config.command_addr, params.clone())?;
    info!("command listener bound on {}", config.command_addr);

    let mut source = CpalSource::new(config.chunk)?;
    let mut pipeline = PipelineDriver::new(config.clone(), params)?;
    info!("transmitting feature packets to {}", config.engine_addr);

    pipeline.run(&mut source)?;

    Ok(())
}
