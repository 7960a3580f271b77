use super::*;

pub fn from_config(cfg: &Algorithm) -> Box<dyn Scheduler + 'static> {
    info!(scheduler = %cfg, "using");
    match cfg {
        Algorithm::Sjf => Box::new(Sjf),
        Algorithm::Srtf => Box::new(Srtf),
        Algorithm::Hrrn => Box::new(Hrrn),
    }
}
