use log::{error, info};
use swarm_peer::config::{Config, PeerConfig, Strategy};
use swarm_peer::core_models::errors::ConfigError;
use swarm_peer::swarm::Swarm;

const MAX_ROUNDS: usize = 500;

fn main() {
    env_logger::init();

    let mut swarm = match build_swarm(Config::init()) {
        Ok(swarm) => swarm,
        Err(err) => {
            error!("could not build the swarm: {}", err);
            return;
        }
    };

    match swarm.run_until_complete(MAX_ROUNDS) {
        Ok(Some(rounds)) => info!("swarm complete after {} rounds", rounds),
        Ok(None) => info!("swarm still incomplete after {} rounds", MAX_ROUNDS),
        Err(err) => error!("round {} aborted: {}", swarm.current_round(), err),
    }
}

// two seeds plus one peer per allocation strategy
fn build_swarm(config: Config) -> Result<Swarm, ConfigError> {
    let mut swarm = Swarm::init(config);
    let seed_conf = PeerConfig::init(Strategy::from_name("propshare")?);
    swarm.add_seed("Seed0", &seed_conf.clone().with_seed(0))?;
    swarm.add_seed("Seed1", &seed_conf.with_seed(1))?;
    for (idx, name) in ["propshare", "std", "tyrant"].iter().enumerate() {
        let peer_conf = PeerConfig::init(Strategy::from_name(name)?).with_seed(10 + idx as u64);
        swarm.add_peer(&format!("{}{}", name, idx), &peer_conf)?;
    }
    return Ok(swarm);
}
