use crate::{
    config::Config,
    db::Database,
    services::{ConsultationService, ResultService},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub consultations: ConsultationService,
    pub results: ResultService,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        Self {
            consultations: ConsultationService::new(db.clone()),
            results: ResultService::new(db.clone()),
            db,
            config: Arc::new(config),
        }
    }
}
